//! framelock: MPEG-1/2/2.5 Layer I-III frame synchronization
//!
//! Locates valid frame headers in an arbitrary byte stream, decodes them
//! into structured descriptors, computes byte-exact frame sizes, and hands
//! fixed-size frame bodies to a layer decoder. The stream is
//! self-synchronizing with no out-of-band framing: headers can start at
//! any byte offset, sync-looking garbage must be rejected by
//! cross-validation, and corrupt or truncated input has to be survived
//! without stalling.
//!
//! The per-layer sample decoding itself is not here; consumers match on
//! [`Layer`] and feed the synchronized body to their own Layer I/II/III
//! routines, using the cursor and backstep support for Layer III's bit
//! reservoir.
//!
//! ```no_run
//! use framelock::{Frame, FrameSynchronizer, SyncError};
//!
//! fn main() -> Result<(), SyncError> {
//!     let file = std::fs::File::open("song.mp3")?;
//!     let mut sync = FrameSynchronizer::new(file);
//!     sync.probe_size()?;
//!
//!     let mut frame = Frame::new();
//!     while sync.read_next(&mut frame)? {
//!         println!(
//!             "{:?} {:?}, {} kbps, {} body bytes",
//!             frame.header.version,
//!             frame.header.layer,
//!             frame.header.bitrate_kbps(),
//!             frame.frame_size,
//!         );
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod mpeg;
pub mod probe;
pub mod stream;

pub use error::SyncError;
pub use mpeg::header::{ChannelMode, FrameHeader, Layer, MpegVersion};
pub use mpeg::size::{bytes_per_frame, frame_size, MAX_FRAME_SIZE};
pub use stream::source::{ByteSource, StreamInfo, Streaming};
pub use stream::sync::{BitCursor, Frame, FrameSynchronizer, GUARD, RESYNC_LIMIT};
