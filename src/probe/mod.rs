//! Whole-stream scanning and statistics
//!
//! Drives the synchronizer across a stream and aggregates what it finds:
//! per-frame bitrates, VBR detection, resync skips, and duration
//! estimates. This is the layer the CLI prints; the fields serialize
//! directly for machine-readable reports.

use crate::error::SyncError;
use crate::mpeg::header::{ChannelMode, Layer, MpegVersion};
use crate::stream::source::ByteSource;
use crate::stream::sync::{Frame, FrameSynchronizer};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

/// Aggregated result of scanning one stream.
///
/// The header-derived fields come from the first frame and are `None` when
/// no frame was found at all. Bitrate statistics cover every scanned
/// frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamReport {
    pub file_path: String,
    pub total_bytes: u64,
    pub frame_count: usize,
    pub version: Option<MpegVersion>,
    pub layer: Option<Layer>,
    pub sample_rate: u32,
    pub channel_mode: Option<ChannelMode>,
    pub avg_bitrate: u32,
    pub min_bitrate: u32,
    pub max_bitrate: u32,
    pub is_vbr: bool,
    /// A Xing/Info tag was present in the first frame.
    pub vbr_header: bool,
    /// Garbage bytes stepped over while regaining sync.
    pub skipped_bytes: u64,
    /// Frame-count estimate from stream size and bytes per frame.
    pub estimated_frames: u64,
    pub duration_secs: f64,
}

/// Scan up to `max_frames` frames and aggregate statistics.
///
/// Stops at end of stream. A desync or source failure is returned as-is;
/// everything scanned before it is lost to the caller, which matches how
/// playback would fail on the same stream.
pub fn scan<S: ByteSource>(
    sync: &mut FrameSynchronizer<S>,
    max_frames: usize,
) -> Result<StreamReport, SyncError> {
    let start_total = sync.stream_info().total_bytes;
    let mut frame = Frame::new();

    let mut frame_count = 0usize;
    let mut version = None;
    let mut layer = None;
    let mut sample_rate = 0u32;
    let mut channel_mode = None;
    let mut vbr_header = false;
    let mut estimated_frames = 0u64;
    let mut distinct_rates = HashSet::new();
    let mut rate_sum = 0u64;
    let mut min_bitrate = u32::MAX;
    let mut max_bitrate = 0u32;

    while frame_count < max_frames {
        if !sync.read_next(&mut frame)? {
            break;
        }
        if frame_count == 0 {
            version = Some(frame.header.version);
            layer = Some(frame.header.layer);
            sample_rate = frame.header.sample_rate();
            channel_mode = Some(frame.header.channel_mode);
            estimated_frames = sync.estimated_frame_count(&frame);
            vbr_header = match sync.locate_xing_header(&frame) {
                Ok(offset) => offset.is_some(),
                Err(SyncError::Unseekable) => false,
                Err(e) => return Err(e),
            };
        }
        frame_count += 1;

        let kbps = frame.header.bitrate_kbps();
        distinct_rates.insert(kbps);
        rate_sum += u64::from(kbps);
        min_bitrate = min_bitrate.min(kbps);
        max_bitrate = max_bitrate.max(kbps);
    }

    let total_bytes = sync.stream_info().total_bytes;
    let avg_bitrate = if frame_count > 0 {
        (rate_sum / frame_count as u64) as u32
    } else {
        0
    };
    let duration_secs = if avg_bitrate > 0 {
        total_bytes as f64 * 8.0 / (f64::from(avg_bitrate) * 1000.0)
    } else {
        0.0
    };

    Ok(StreamReport {
        file_path: String::new(),
        total_bytes,
        frame_count,
        version,
        layer,
        sample_rate,
        channel_mode,
        avg_bitrate,
        min_bitrate: if frame_count > 0 { min_bitrate } else { 0 },
        max_bitrate,
        is_vbr: distinct_rates.len() > 1,
        vbr_header,
        skipped_bytes: start_total.saturating_sub(total_bytes),
        estimated_frames,
        duration_secs,
    })
}

/// Open a file, probe its playable size, and scan it.
pub fn scan_path<P: AsRef<Path>>(path: P, max_frames: usize) -> Result<StreamReport, SyncError> {
    let file = File::open(path.as_ref())?;
    let mut sync = FrameSynchronizer::new(file);
    sync.probe_size()?;
    let mut report = scan(&mut sync, max_frames)?;
    report.file_path = path.as_ref().display().to_string();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn frame_bytes(bitrate_nibble: u8, fill: u8) -> Vec<u8> {
        let mut data = vec![0xFF, 0xFB, bitrate_nibble << 4, 0x00];
        let body = match bitrate_nibble {
            0x9 => 413, // 128 kbps at 44100 Hz
            0xA => 518, // 160 kbps at 44100 Hz
            _ => panic!("unexpected fixture bitrate"),
        };
        data.extend(vec![fill; body]);
        data
    }

    #[test]
    fn test_scan_cbr_stream() {
        let mut data = Vec::new();
        for i in 0..4u8 {
            data.extend(frame_bytes(0x9, i));
        }
        let total = data.len() as u64;
        let mut sync = FrameSynchronizer::new(Cursor::new(data));
        sync.stream_info_mut().total_bytes = total;

        let report = scan(&mut sync, usize::MAX).expect("scan should succeed");
        assert_eq!(report.frame_count, 4);
        assert_eq!(report.version, Some(MpegVersion::Mpeg1));
        assert_eq!(report.layer, Some(Layer::Layer3));
        assert_eq!(report.sample_rate, 44100);
        assert_eq!(report.avg_bitrate, 128);
        assert_eq!(report.min_bitrate, 128);
        assert_eq!(report.max_bitrate, 128);
        assert!(!report.is_vbr);
        assert_eq!(report.skipped_bytes, 0);
    }

    #[test]
    fn test_scan_detects_vbr() {
        let mut data = frame_bytes(0x9, 0);
        data.extend(frame_bytes(0xA, 1));
        let mut sync = FrameSynchronizer::new(Cursor::new(data));

        let report = scan(&mut sync, usize::MAX).expect("scan should succeed");
        assert_eq!(report.frame_count, 2);
        assert!(report.is_vbr);
        assert_eq!(report.min_bitrate, 128);
        assert_eq!(report.max_bitrate, 160);
        assert_eq!(report.avg_bitrate, 144);
    }

    #[test]
    fn test_scan_reports_skipped_garbage() {
        let mut data = vec![0u8; 21];
        data.extend(frame_bytes(0x9, 0));
        let total = data.len() as u64;
        let mut sync = FrameSynchronizer::new(Cursor::new(data));
        sync.stream_info_mut().total_bytes = total;

        let report = scan(&mut sync, usize::MAX).expect("scan should succeed");
        assert_eq!(report.frame_count, 1);
        assert_eq!(report.skipped_bytes, 21);
    }

    #[test]
    fn test_scan_empty_stream_yields_empty_report() {
        let mut sync = FrameSynchronizer::new(Cursor::new(Vec::new()));
        let report = scan(&mut sync, usize::MAX).expect("empty stream is not an error");
        assert_eq!(report.frame_count, 0);
        assert_eq!(report.version, None);
        assert_eq!(report.avg_bitrate, 0);
    }

    #[test]
    fn test_scan_respects_frame_limit() {
        let mut data = Vec::new();
        for i in 0..10u8 {
            data.extend(frame_bytes(0x9, i));
        }
        let mut sync = FrameSynchronizer::new(Cursor::new(data));
        let report = scan(&mut sync, 3).expect("scan should succeed");
        assert_eq!(report.frame_count, 3);
    }

    #[test]
    fn test_scan_path_probes_and_scans() {
        let mut data = Vec::new();
        for i in 0..3u8 {
            data.extend(frame_bytes(0x9, i));
        }
        let payload = data.len() as u64;
        data.extend(*b"TAG");
        data.extend(vec![0u8; 125]);

        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(&data).unwrap();

        let report = scan_path(file.path(), usize::MAX).expect("scan should succeed");
        assert_eq!(report.frame_count, 3);
        assert_eq!(report.total_bytes, payload);
        assert!(!report.file_path.is_empty());
        assert!(report.duration_secs > 0.0);
    }
}
