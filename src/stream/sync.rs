//! Frame synchronization: header lock-on, resync, double-buffered bodies
//!
//! The input is a self-synchronizing bitstream with no out-of-band
//! framing, so a header can start at any byte offset and a plausible sync
//! pattern can appear inside audio data. `read_next` locks on by reading a
//! 32-bit candidate word and, on mismatch, shifting it one byte at a time
//! until a word survives both the pre-filter and full decoding, within a
//! bounded budget.
//!
//! Bodies land in one of two fixed buffers toggled per frame, so the
//! previous frame's trailing bytes stay addressable after the current
//! frame is read. Layer III needs them: its bit reservoir lets a frame's
//! main data begin inside the previous frame's body, reconstructed here by
//! `set_backstep`. Only one prior frame is ever needed, which is why two
//! buffers suffice.

use crate::error::SyncError;
use crate::mpeg::header::{self, FrameHeader};
use crate::mpeg::size::{self, MAX_FRAME_SIZE};
use crate::stream::source::{full_read, ByteSource, StreamInfo};
use log::warn;

/// Guard bytes ahead of each body region. The backstep may place the
/// cursor up to this far before the body start, so each buffer reserves
/// the space rather than checking at runtime.
pub const GUARD: usize = 512;

/// Upper bound on byte-shift attempts while hunting for a frame header.
/// Keeps a stream with no valid audio from turning into an unbounded scan
/// while still riding out realistic corruption and tag gaps.
pub const RESYNC_LIMIT: usize = 1024 * 1024;

/// Descriptor for the most recently synchronized frame.
///
/// One instance is reused across reads; `read_next` repopulates it on
/// every successful call. The previous contents only matter as Layer III
/// backstep context, which the synchronizer tracks internally.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub header: FrameHeader,
    /// Body bytes following the 4-byte header word.
    pub frame_size: usize,
    /// Side-information bytes at the start of the body (Layer III only).
    pub side_info_size: usize,
}

impl Frame {
    pub fn new() -> Self {
        Frame::default()
    }

    /// Decode `word` into this descriptor. Returns false when the word is
    /// unusable: free-format bitrate, reserved fields, or a frame size out
    /// of bounds. The descriptor is only updated on success.
    pub fn decode(&mut self, word: u32) -> bool {
        let header = match FrameHeader::decode(word) {
            Some(h) => h,
            None => return false,
        };
        let frame_size = match size::frame_size(&header) {
            Some(s) => s,
            None => return false,
        };
        self.header = header;
        self.frame_size = frame_size;
        self.side_info_size = header.side_info_size();
        true
    }
}

/// Byte-and-bit position into the active frame buffer.
///
/// Reset to the body start on every `read_next`; advanced by the external
/// layer decoder and repositioned by `set_backstep`. `byte` indexes the
/// full buffer returned by [`FrameSynchronizer::buffer`], guard included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitCursor {
    pub byte: usize,
    pub bit: u8,
}

/// Locates frame boundaries in a byte source and owns all mutable decode
/// state: the two body buffers, the bit cursor, and the stream
/// bookkeeping. One writer, no locks; independent decodes take
/// independent instances.
pub struct FrameSynchronizer<S> {
    pub(crate) source: S,
    pub(crate) info: StreamInfo,
    buffers: [Box<[u8]>; 2],
    active: usize,
    prev_frame_size: usize,
    cursor: BitCursor,
}

impl<S: ByteSource> FrameSynchronizer<S> {
    pub fn new(source: S) -> Self {
        let network_stream = !source.is_seekable();
        FrameSynchronizer {
            source,
            info: StreamInfo {
                network_stream,
                ..StreamInfo::default()
            },
            buffers: [
                vec![0u8; GUARD + MAX_FRAME_SIZE].into_boxed_slice(),
                vec![0u8; GUARD + MAX_FRAME_SIZE].into_boxed_slice(),
            ],
            active: 1,
            prev_frame_size: 0,
            cursor: BitCursor::default(),
        }
    }

    pub fn stream_info(&self) -> &StreamInfo {
        &self.info
    }

    pub fn stream_info_mut(&mut self) -> &mut StreamInfo {
        &mut self.info
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Full active buffer, guard region included. The body of the current
    /// frame starts at [`GUARD`].
    pub fn buffer(&self) -> &[u8] {
        &self.buffers[self.active]
    }

    /// Body region of the current frame, guard excluded. The slice runs to
    /// buffer capacity; the valid prefix is the frame's `frame_size`.
    pub fn body(&self) -> &[u8] {
        &self.buffers[self.active][GUARD..]
    }

    pub fn cursor(&self) -> BitCursor {
        self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut BitCursor {
        &mut self.cursor
    }

    /// Zero both body buffers. Called before seeks so stale reservoir
    /// bytes from the pre-seek position cannot leak into the first frame
    /// decoded afterwards.
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0);
        }
    }

    /// Synchronize on the next frame and read its body.
    ///
    /// `Ok(true)` leaves `frame` describing the new frame, its body in
    /// [`FrameSynchronizer::body`], and the cursor at the body start.
    /// `Ok(false)` is clean end of stream, including a truncated header
    /// word and end of stream hit while resynchronizing. Every byte
    /// skipped during resynchronization is deducted from
    /// `stream_info().total_bytes`.
    pub fn read_next(&mut self, frame: &mut Frame) -> Result<bool, SyncError> {
        // Previous body length, needed if the next frame backsteps.
        self.prev_frame_size = frame.frame_size;

        let mut head = [0u8; 4];
        if full_read(&mut self.source, &mut head)? != 4 {
            self.info.end_of_stream = true;
            return Ok(false);
        }
        let mut word = u32::from_be_bytes(head);

        if !header::check(word) || !frame.decode(word) {
            let mut tries = 0usize;
            loop {
                tries += 1;
                let mut next = [0u8; 1];
                if full_read(&mut self.source, &mut next)? == 0 {
                    self.info.end_of_stream = true;
                    return Ok(false);
                }
                word = (word << 8) | u32::from(next[0]);
                if (header::check(word) && frame.decode(word)) || tries >= RESYNC_LIMIT {
                    break;
                }
            }
            if tries >= RESYNC_LIMIT {
                return Err(SyncError::Desync { scanned: tries });
            }
            warn!("illegal bitstream, skipped {} bytes to regain sync", tries);
            self.info.total_bytes = self.info.total_bytes.saturating_sub(tries as u64);
        }

        // Flip to the other buffer; the one just vacated keeps the
        // previous body for the Layer III backstep.
        self.active = 1 - self.active;

        let body = &mut self.buffers[self.active][GUARD..GUARD + frame.frame_size];
        let got = full_read(&mut self.source, body)?;
        if got == 0 {
            self.info.end_of_stream = true;
            return Ok(false);
        }
        if got < frame.frame_size {
            // Truncated final frame: decode it degraded rather than
            // rejecting the whole stream.
            body[got..].fill(0);
        }

        self.cursor = BitCursor {
            byte: GUARD,
            bit: 0,
        };
        Ok(true)
    }

    /// Reposition the cursor for a Layer III frame whose main data begins
    /// `backstep` bytes back in the bit reservoir.
    ///
    /// The cursor lands at `side_info_size - backstep` relative to the
    /// body start, and the last `backstep` bytes of the previous body are
    /// copied there so the reservoir bytes sit contiguously under the
    /// cursor. Callers must keep `backstep` within the guard region and,
    /// when nonzero, within the previous body's length.
    pub fn set_backstep(&mut self, frame: &Frame, backstep: usize) {
        debug_assert!(backstep <= GUARD);
        let pos = GUARD + frame.side_info_size - backstep;
        if backstep > 0 {
            debug_assert!(backstep <= self.prev_frame_size);
            let src_start = GUARD + self.prev_frame_size - backstep;
            let [first, second] = &mut self.buffers;
            let (current, previous) = if self.active == 0 {
                (first, second)
            } else {
                (second, first)
            };
            current[pos..pos + backstep].copy_from_slice(&previous[src_start..src_start + backstep]);
        }
        self.cursor = BitCursor { byte: pos, bit: 0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // 128 kbps MPEG1 Layer3 at 44100 Hz: 413 body bytes after the header
    const HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];
    const BODY: usize = 413;

    /// One frame whose body is filled with `fill`.
    fn frame_bytes(fill: u8) -> Vec<u8> {
        let mut data = HEADER.to_vec();
        data.extend(std::iter::repeat(fill).take(BODY));
        data
    }

    fn sync_over(data: Vec<u8>) -> FrameSynchronizer<Cursor<Vec<u8>>> {
        FrameSynchronizer::new(Cursor::new(data))
    }

    // ==========================================================================
    // CLEAN STREAM TESTS
    // ==========================================================================

    #[test]
    fn test_reads_consecutive_frames_then_eof() {
        let mut data = Vec::new();
        for i in 0..3u8 {
            data.extend(frame_bytes(i));
        }
        let total = data.len() as u64;
        let mut sync = sync_over(data);
        let mut frame = Frame::new();

        for _ in 0..3 {
            assert!(sync.read_next(&mut frame).expect("read should succeed"));
            assert_eq!(frame.frame_size, BODY);
            assert_eq!(frame.header.bitrate_kbps(), 128);
        }
        assert!(!sync.read_next(&mut frame).expect("eof should be clean"));
        assert!(sync.stream_info().end_of_stream);
        // Exactly (4 + body) bytes consumed per frame
        assert_eq!(sync.source.position(), total);
    }

    #[test]
    fn test_body_lands_at_guard_offset() {
        let mut sync = sync_over(frame_bytes(0xAB));
        let mut frame = Frame::new();
        assert!(sync.read_next(&mut frame).unwrap());
        assert_eq!(sync.cursor(), BitCursor { byte: GUARD, bit: 0 });
        assert!(sync.body()[..BODY].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_truncated_final_frame_is_zero_filled() {
        let mut data = frame_bytes(0x55);
        data.truncate(4 + 100);
        let mut sync = sync_over(data);
        let mut frame = Frame::new();

        assert!(sync.read_next(&mut frame).expect("short body should still decode"));
        assert!(sync.body()[..100].iter().all(|&b| b == 0x55));
        assert!(sync.body()[100..BODY].iter().all(|&b| b == 0));
        assert!(!sync.read_next(&mut frame).expect("then clean eof"));
    }

    #[test]
    fn test_truncated_header_word_is_eof() {
        let mut sync = sync_over(vec![0xFF, 0xFB]);
        let mut frame = Frame::new();
        assert!(!sync.read_next(&mut frame).expect("partial header is eof"));
    }

    // ==========================================================================
    // RESYNCHRONIZATION TESTS
    // ==========================================================================

    #[test]
    fn test_resync_skips_leading_garbage_and_accounts_for_it() {
        let garbage = 37usize;
        let mut data = vec![0u8; garbage];
        data.extend(frame_bytes(0x11));
        let total = data.len() as u64;

        let mut sync = sync_over(data);
        sync.stream_info_mut().total_bytes = total;
        let mut frame = Frame::new();

        assert!(sync.read_next(&mut frame).expect("should lock past garbage"));
        assert_eq!(frame.header.sample_rate(), 44100);
        assert_eq!(sync.stream_info().total_bytes, total - garbage as u64);
    }

    #[test]
    fn test_resync_rejects_false_sync_then_locks_real_header() {
        // A sync-looking word with bitrate index 15 must be stepped over
        let mut data = vec![0xFF, 0xFB, 0xF0, 0x00];
        data.extend(frame_bytes(0x22));
        let mut sync = sync_over(data);
        let mut frame = Frame::new();

        assert!(sync.read_next(&mut frame).expect("should lock on real header"));
        assert_eq!(frame.frame_size, BODY);
    }

    #[test]
    fn test_desync_after_budget_exhausted() {
        let data = vec![0u8; RESYNC_LIMIT + 64];
        let mut sync = sync_over(data);
        let mut frame = Frame::new();

        match sync.read_next(&mut frame) {
            Err(SyncError::Desync { scanned }) => assert_eq!(scanned, RESYNC_LIMIT),
            other => panic!("expected desync failure, got {:?}", other),
        }
    }

    #[test]
    fn test_eof_during_resync_is_clean() {
        let mut sync = sync_over(vec![0u8; 100]);
        let mut frame = Frame::new();
        assert!(!sync.read_next(&mut frame).expect("garbage-only short stream is eof"));
        assert!(sync.stream_info().end_of_stream);
    }

    // ==========================================================================
    // BACKSTEP TESTS
    // ==========================================================================

    #[test]
    fn test_backstep_copies_previous_frame_tail() {
        let mut data = frame_bytes(0x77);
        data.extend(frame_bytes(0x88));
        let mut sync = sync_over(data);
        let mut frame = Frame::new();

        assert!(sync.read_next(&mut frame).unwrap());
        assert!(sync.read_next(&mut frame).unwrap());

        let backstep = 11usize;
        sync.set_backstep(&frame, backstep);

        let cursor = sync.cursor();
        assert_eq!(cursor.byte, GUARD + frame.side_info_size - backstep);
        assert_eq!(cursor.bit, 0);
        // The reservoir bytes under the cursor are the previous body tail
        let buffer = sync.buffer();
        assert!(buffer[cursor.byte..cursor.byte + backstep]
            .iter()
            .all(|&b| b == 0x77));
        // Main data still follows at the end of the side info
        assert_eq!(buffer[GUARD + frame.side_info_size + 1], 0x88);
    }

    #[test]
    fn test_backstep_zero_only_moves_cursor() {
        let mut sync = sync_over(frame_bytes(0x10));
        let mut frame = Frame::new();
        assert!(sync.read_next(&mut frame).unwrap());

        sync.set_backstep(&frame, 0);
        assert_eq!(sync.cursor().byte, GUARD + frame.side_info_size);
    }

    #[test]
    fn test_two_buffers_preserve_previous_body() {
        let mut data = frame_bytes(0x01);
        data.extend(frame_bytes(0x02));
        data.extend(frame_bytes(0x03));
        let mut sync = sync_over(data);
        let mut frame = Frame::new();

        assert!(sync.read_next(&mut frame).unwrap());
        assert!(sync.read_next(&mut frame).unwrap());
        assert!(sync.read_next(&mut frame).unwrap());

        // Frame 3 is active; frame 2's body must still be intact in the
        // inactive buffer for a backstep
        sync.set_backstep(&frame, 5);
        let cursor = sync.cursor();
        assert!(sync.buffer()[cursor.byte..cursor.byte + 5]
            .iter()
            .all(|&b| b == 0x02));
    }
}
