//! Layer-specific frame-size and bits-per-frame arithmetic
//!
//! Frame sizes use integer division with per-layer rounding; downstream
//! decoding depends on these being byte-exact, so the truncation order in
//! each formula is part of the contract. `bytes_per_frame` is the same
//! computation without truncation, for bitrate and duration estimates.

use crate::mpeg::header::{FrameHeader, Layer};

/// Hard upper bound on a computed frame body, in bytes. Anything larger is
/// treated as a decode failure, not a large-but-valid frame.
pub const MAX_FRAME_SIZE: usize = 1729;

/// Bitrate lookup in kbps, indexed by [lsf][layer - 1][bitrate index].
/// Index 0 is free format and index 15 is invalid; both rows keep a 0
/// there so the table lines up with the 4-bit header field.
pub const BITRATE_KBPS: [[[u32; 16]; 3]; 2] = [
    [
        [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
        [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
    ],
    [
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
    ],
];

/// Sampling frequencies in Hz, indexed by the version-adjusted
/// sampling index (MPEG1 at 0..3, MPEG2 at 3..6, MPEG2.5 at 6..9).
pub const SAMPLE_RATES: [u32; 9] = [
    44100, 48000, 32000, 22050, 24000, 16000, 11025, 12000, 8000,
];

/// Body size in bytes for one frame, excluding the 4-byte header word.
///
/// Returns `None` when the result falls outside `1..=MAX_FRAME_SIZE`.
pub fn frame_size(header: &FrameHeader) -> Option<usize> {
    let kbps = i64::from(header.bitrate_kbps());
    let rate = i64::from(header.sample_rate());
    let padding = i64::from(header.padding);

    let size = match header.layer {
        Layer::Layer1 => (kbps * 12000 / rate + padding) * 4 - 4,
        Layer::Layer2 => kbps * 144_000 / rate + padding - 4,
        Layer::Layer3 => {
            kbps * 144_000 / (rate << i64::from(header.lsf())) + padding - 4
        }
    };

    if size > 0 && size as usize <= MAX_FRAME_SIZE {
        Some(size as usize)
    } else {
        None
    }
}

/// Average bytes per frame without integer truncation.
///
/// The Layer II divisor shifts by lsf here even though the integer frame
/// size does not; both behaviors are kept as-is since frame-count
/// estimates were tuned against them.
pub fn bytes_per_frame(header: &FrameHeader) -> f64 {
    let kbps = f64::from(header.bitrate_kbps());
    let rate = f64::from(header.sample_rate() << u32::from(header.lsf()));

    match header.layer {
        Layer::Layer1 => kbps * 12000.0 * 4.0 / rate,
        Layer::Layer2 | Layer::Layer3 => kbps * 144_000.0 / rate,
    }
}
