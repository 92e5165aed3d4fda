//! MPEG audio frame header validation and field extraction
//!
//! Every frame starts with a sync word (11 bits of 1s) followed by header
//! info. Frame header structure (4 bytes, big-endian):
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//!
//! A = sync (11 bits)
//! B = MPEG version (2 bits): 00=2.5, 01=reserved, 10=2, 11=1
//! C = Layer (2 bits): 00=reserved, 01=III, 10=II, 11=I
//! D = Protection bit (0 = CRC-16 follows the header)
//! E = Bitrate index (4 bits)
//! F = Sample rate index (2 bits)
//! G = Padding bit
//! H = Private bit
//! I = Channel mode (2 bits)
//! J = Mode extension (2 bits)
//! K = Copyright
//! L = Original
//! M = Emphasis (2 bits)
//!
//! `check` is a cheap pre-filter over the whole 32-bit word; it is
//! necessary but not sufficient. False positives are caught by `decode`
//! and by the frame-size bound before any body bytes are consumed.

use crate::mpeg::size;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MpegVersion {
    #[default]
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Layer {
    Layer1,
    Layer2,
    #[default]
    Layer3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ChannelMode {
    #[default]
    Stereo = 0,
    JointStereo = 1,
    DualChannel = 2,
    Mono = 3,
}

/// Decoded fields of one 32-bit frame header word.
///
/// `sampling_index` is already version-adjusted: the raw 2-bit field plus 3
/// for MPEG2 and plus 6 for MPEG2.5, indexing the single 9-entry
/// [`size::SAMPLE_RATES`] table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    /// Set when the header's protection bit is zero, meaning a CRC-16
    /// follows the header word. The CRC occupies the side-info region, so
    /// [`FrameHeader::side_info_size`] grows by 2 when this is set.
    pub error_protection: bool,
    /// 1..=14; 0 (free format) and 15 are rejected.
    pub bitrate_index: u8,
    /// 0..=8, version-adjusted.
    pub sampling_index: u8,
    pub padding: bool,
    pub extension: bool,
    pub channel_mode: ChannelMode,
    /// Only meaningful for joint stereo.
    pub mode_extension: u8,
    pub copyright: bool,
    pub original: bool,
    pub emphasis: u8,
}

/// Fast plausibility filter for a candidate 32-bit header word.
///
/// Rejects words that cannot be a frame header: missing sync pattern,
/// reserved layer, free-format or invalid bitrate index, reserved sampling
/// rate, the reserved version/layer/protection combination, and the
/// known-bad `0xFFFE` vendor marker in the top half. A word that passes may
/// still be garbage; `decode` and the frame-size bound make the final call.
pub fn check(word: u32) -> bool {
    if word & 0xffe0_0000 != 0xffe0_0000 {
        return false;
    }
    if (word >> 17) & 0x3 == 0 {
        return false;
    }
    if (word >> 12) & 0xf == 0xf {
        return false;
    }
    if (word >> 12) & 0xf == 0 {
        return false;
    }
    if (word >> 10) & 0x3 == 0x3 {
        return false;
    }
    if (word >> 19) & 0x1 == 1 && (word >> 17) & 0x3 == 0x3 && (word >> 16) & 0x1 == 1 {
        return false;
    }
    if word & 0xffff_0000 == 0xfffe_0000 {
        return false;
    }
    true
}

impl FrameHeader {
    /// Extract every header field from a 32-bit word.
    ///
    /// Returns `None` for the reserved layer, a reserved sampling-rate
    /// field, and bitrate index 0 (free-format streams are unsupported).
    pub fn decode(word: u32) -> Option<FrameHeader> {
        let lsf;
        let mpeg25;
        if word & (1 << 20) != 0 {
            lsf = word & (1 << 19) == 0;
            mpeg25 = false;
        } else {
            lsf = true;
            mpeg25 = true;
        }

        let version = if mpeg25 {
            MpegVersion::Mpeg25
        } else if lsf {
            MpegVersion::Mpeg2
        } else {
            MpegVersion::Mpeg1
        };

        // Layer = 4 - field; field 0 is reserved.
        let layer = match (word >> 17) & 0x3 {
            1 => Layer::Layer3,
            2 => Layer::Layer2,
            3 => Layer::Layer1,
            _ => return None,
        };

        let raw_rate = ((word >> 10) & 0x3) as u8;
        if raw_rate == 3 {
            return None;
        }
        let sampling_index = if mpeg25 {
            6 + raw_rate
        } else if lsf {
            raw_rate + 3
        } else {
            raw_rate
        };

        let bitrate_index = ((word >> 12) & 0xf) as u8;
        if bitrate_index == 0 {
            return None;
        }

        let channel_mode = match (word >> 6) & 0x3 {
            0 => ChannelMode::Stereo,
            1 => ChannelMode::JointStereo,
            2 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };

        Some(FrameHeader {
            version,
            layer,
            error_protection: (word >> 16) & 0x1 == 0,
            bitrate_index,
            sampling_index,
            padding: (word >> 9) & 0x1 != 0,
            extension: (word >> 8) & 0x1 != 0,
            channel_mode,
            mode_extension: ((word >> 4) & 0x3) as u8,
            copyright: (word >> 3) & 0x1 != 0,
            original: (word >> 2) & 0x1 != 0,
            emphasis: (word & 0x3) as u8,
        })
    }

    /// Rebuild the 32-bit header word. Inverse of `decode` for every field
    /// combination `decode` can produce; used for fixtures and testing.
    pub fn encode(&self) -> u32 {
        let (version_bits, raw_rate) = match self.version {
            MpegVersion::Mpeg1 => (0x3u32, u32::from(self.sampling_index)),
            MpegVersion::Mpeg2 => (0x2, u32::from(self.sampling_index - 3)),
            MpegVersion::Mpeg25 => (0x0, u32::from(self.sampling_index - 6)),
        };
        let layer_field: u32 = match self.layer {
            Layer::Layer1 => 3,
            Layer::Layer2 => 2,
            Layer::Layer3 => 1,
        };

        0xffe0_0000
            | version_bits << 19
            | layer_field << 17
            | u32::from(!self.error_protection) << 16
            | u32::from(self.bitrate_index) << 12
            | raw_rate << 10
            | u32::from(self.padding) << 9
            | u32::from(self.extension) << 8
            | (self.channel_mode as u32) << 6
            | u32::from(self.mode_extension) << 4
            | u32::from(self.copyright) << 3
            | u32::from(self.original) << 2
            | u32::from(self.emphasis)
    }

    /// Low-sample-frequency flag: true for MPEG2 and MPEG2.5 (half-rate
    /// tables apply).
    pub fn lsf(&self) -> bool {
        self.version != MpegVersion::Mpeg1
    }

    pub fn channel_count(&self) -> u32 {
        if self.channel_mode == ChannelMode::Mono {
            1
        } else {
            2
        }
    }

    pub fn sample_rate(&self) -> u32 {
        size::SAMPLE_RATES[usize::from(self.sampling_index)]
    }

    pub fn bitrate_kbps(&self) -> u32 {
        let row = match self.layer {
            Layer::Layer1 => 0,
            Layer::Layer2 => 1,
            Layer::Layer3 => 2,
        };
        size::BITRATE_KBPS[usize::from(self.lsf())][row][usize::from(self.bitrate_index)]
    }

    pub fn samples_per_frame(&self) -> u32 {
        match (self.layer, self.lsf()) {
            (Layer::Layer1, _) => 384,
            (Layer::Layer2, _) => 1152,
            (Layer::Layer3, false) => 1152,
            (Layer::Layer3, true) => 576,
        }
    }

    /// Side-information bytes at the start of a Layer III body; 0 for
    /// Layers I and II.
    ///
    /// The base size depends on sampling family and channel count. When
    /// `error_protection` is set the CRC-16 sits in the same region, so two
    /// more bytes are counted before the main audio data.
    pub fn side_info_size(&self) -> usize {
        if self.layer != Layer::Layer3 {
            return 0;
        }
        let mut ssize = match (self.lsf(), self.channel_mode == ChannelMode::Mono) {
            (true, true) => 9,
            (true, false) => 17,
            (false, true) => 17,
            (false, false) => 32,
        };
        if self.error_protection {
            ssize += 2;
        }
        ssize
    }
}
