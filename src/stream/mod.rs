pub mod navigate;
pub mod source;
pub mod sync;

pub use source::{ByteSource, StreamInfo, Streaming};
pub use sync::{BitCursor, Frame, FrameSynchronizer};
