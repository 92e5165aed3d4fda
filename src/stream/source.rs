//! Byte sources feeding the synchronizer
//!
//! The synchronizer only ever needs sequential reads plus (for local
//! files) the ability to seek and tell. Network-style inputs implement the
//! same trait through [`Streaming`], which simply refuses to seek; callers
//! discover that through `is_seekable` instead of a stream-type tag.

use serde::Serialize;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// Sequential-read plus seek capability consumed by the synchronizer.
///
/// `read` follows the usual contract: `Ok(0)` is end of stream. Blocking,
/// timeouts, and reconnects are the implementation's business; the
/// synchronizer never retries a failed call.
pub trait ByteSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;
    fn tell(&mut self) -> io::Result<u64>;
    fn is_seekable(&self) -> bool {
        true
    }
}

impl ByteSource for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Seek::seek(self, pos)
    }

    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}

impl<T: AsRef<[u8]>> ByteSource for Cursor<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Seek::seek(self, pos)
    }

    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }
}

/// Adapter for sequential-only inputs such as HTTP or RTSP body readers.
///
/// Seeking fails with `Unsupported` and `is_seekable` reports false, which
/// routes callers onto the non-seeking paths (no size probe, relative
/// position pinned to 0).
pub struct Streaming<R> {
    inner: R,
}

impl<R: Read> Streaming<R> {
    pub fn new(inner: R) -> Self {
        Streaming { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for Streaming<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "sequential stream cannot seek",
        ))
    }

    fn tell(&mut self) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "sequential stream has no position",
        ))
    }

    fn is_seekable(&self) -> bool {
        false
    }
}

/// Read until `buf` is full, end of stream, or a hard error. Returns the
/// number of bytes placed in `buf`; short counts only happen at end of
/// stream.
pub(crate) fn full_read<S: ByteSource>(source: &mut S, buf: &mut [u8]) -> io::Result<usize> {
    let mut count = 0;
    while count < buf.len() {
        match source.read(&mut buf[count..]) {
            Ok(0) => break,
            Ok(n) => count += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(count)
}

/// Bookkeeping the navigator and synchronizer maintain about the stream.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StreamInfo {
    /// Playable bytes: excludes a trailing tag block and shrinks by one
    /// for every garbage byte skipped during resynchronization, so
    /// frame-count estimates stay consistent.
    pub total_bytes: u64,
    pub network_stream: bool,
    pub end_of_stream: bool,
}
