//! Stream navigation: size probing, frame/byte seeks, Xing lookup
//!
//! Everything here needs a seekable source; live network streams get
//! `Unseekable` instead of silently wrong answers.

use crate::error::SyncError;
use crate::mpeg::size;
use crate::stream::source::{full_read, ByteSource};
use crate::stream::sync::{Frame, FrameSynchronizer};
use std::io::{self, SeekFrom};

/// First three bytes of a trailing 128-byte tag block.
const TAG_MARKER: [u8; 3] = *b"TAG";

/// Size of the trailing tag block excluded from playable bytes.
const TAG_SIZE: u64 = 128;

impl<S: ByteSource> FrameSynchronizer<S> {
    /// Measure the playable stream size and record it in `stream_info`.
    ///
    /// Seeks to the end for the total, checks the last 128 bytes for a
    /// trailing tag block and excludes it, then rewinds to the start.
    pub fn probe_size(&mut self) -> Result<u64, SyncError> {
        if !self.source.is_seekable() {
            return Err(SyncError::Unseekable);
        }

        let mut total = self.source.seek(SeekFrom::End(0))?;

        self.source.seek(SeekFrom::End(-(TAG_SIZE as i64)))?;
        let mut marker = [0u8; 3];
        if full_read(&mut self.source, &mut marker)? != 3 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        if marker == TAG_MARKER {
            total -= TAG_SIZE;
        }

        self.source.seek(SeekFrom::Start(0))?;

        if total == 0 {
            return Err(SyncError::EmptyStream);
        }
        self.info.total_bytes = total;
        Ok(total)
    }

    /// Jump to frame `index` counted from the stream start, then read it.
    ///
    /// The stride is the last decoded frame size plus the header word, so
    /// this is only exact for constant-bitrate streams; on VBR input the
    /// landing point is undefined and the resync loop picks up whatever
    /// header follows it.
    pub fn seek_to_frame(&mut self, frame: &mut Frame, index: u64) -> Result<bool, SyncError> {
        if !self.source.is_seekable() {
            return Err(SyncError::Unseekable);
        }
        self.reset();
        let stride = frame.frame_size as u64 + 4;
        self.source.seek(SeekFrom::Start(index * stride))?;
        self.read_next(frame)
    }

    /// Jump to an absolute byte offset, then read the next frame from
    /// there.
    pub fn seek_to_byte(&mut self, frame: &mut Frame, offset: u64) -> Result<bool, SyncError> {
        if !self.source.is_seekable() {
            return Err(SyncError::Unseekable);
        }
        self.source.seek(SeekFrom::Start(offset))?;
        self.read_next(frame)
    }

    /// Current position as a fraction of the playable size, in [0, 1].
    /// Reports 0 when the source cannot seek or the size is unknown.
    pub fn relative_position(&mut self) -> f64 {
        if !self.source.is_seekable() || self.info.total_bytes == 0 {
            return 0.0;
        }
        match self.source.tell() {
            Ok(position) => position as f64 / self.info.total_bytes as f64,
            Err(_) => 0.0,
        }
    }

    /// Check the most recently read frame for a Xing/Info VBR tag.
    ///
    /// Seeks back over the frame, re-reads it, and tests the marker at its
    /// fixed structural offset (the header word plus the side-info layout
    /// for the frame's version and channel count). Returns the marker's
    /// offset from the frame's first header byte. The source ends up
    /// positioned where it started.
    pub fn locate_xing_header(&mut self, frame: &Frame) -> Result<Option<usize>, SyncError> {
        if !self.source.is_seekable() {
            return Err(SyncError::Unseekable);
        }
        let span = frame.frame_size + 4;
        self.source.seek(SeekFrom::Current(-(span as i64)))?;
        let mut data = vec![0u8; span];
        let got = full_read(&mut self.source, &mut data)?;

        let header = &frame.header;
        let offset = 4 + match (header.lsf(), header.channel_count()) {
            (false, 1) => 17,
            (false, _) => 32,
            (true, 1) => 9,
            (true, _) => 17,
        };
        if offset + 4 <= got && matches!(&data[offset..offset + 4], b"Xing" | b"Info") {
            Ok(Some(offset))
        } else {
            Ok(None)
        }
    }

    /// Estimate the stream's total frame count from its playable size and
    /// the untruncated bytes-per-frame of `frame`'s encoding parameters.
    pub fn estimated_frame_count(&self, frame: &Frame) -> u64 {
        (self.info.total_bytes as f64 / size::bytes_per_frame(&frame.header)) as u64
    }
}
