//! Error taxonomy for stream synchronization
//!
//! Clean end-of-stream is not an error: `read_next` reports it as
//! `Ok(false)`. Invalid candidate headers are consumed by the resync loop
//! and never surface here.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// The byte source failed on a read or seek. Terminal for the stream;
    /// retry policy (e.g. network reconnect) belongs to the source.
    #[error("byte source I/O failure")]
    Io(#[from] io::Error),

    /// No valid frame header was found within the resync budget.
    /// Fatal for this stream, not for the process.
    #[error("lost sync: no valid frame header within {scanned} shifted bytes")]
    Desync { scanned: usize },

    /// The operation needs a seekable source (e.g. a live network stream
    /// cannot be probed or repositioned).
    #[error("byte source is not seekable")]
    Unseekable,

    /// The source reported a playable size of zero bytes.
    #[error("stream contains no playable bytes")]
    EmptyStream,
}
