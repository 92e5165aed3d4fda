//! CLI stream probe: sync onto MPEG audio files and report what's there

use clap::Parser;
use colored::Colorize;
use framelock::probe::{self, StreamReport};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "framelock",
    version,
    about = "Probe MPEG audio streams: frame sync, header fields, bitrate statistics"
)]
struct Args {
    /// Files to probe
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Emit a JSON report instead of human-readable output
    #[arg(long)]
    json: bool,

    /// Stop after this many frames per file (0 scans the whole stream)
    #[arg(long, default_value_t = 0)]
    max_frames: usize,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    let limit = if args.max_frames == 0 {
        usize::MAX
    } else {
        args.max_frames
    };

    let mut reports = Vec::new();
    let mut failures = 0usize;

    for path in &args.files {
        match probe::scan_path(path, limit) {
            Ok(report) => {
                if !args.json {
                    print_report(&report);
                }
                reports.push(report);
            }
            Err(e) => {
                failures += 1;
                eprintln!("{} {}: {}", "error:".red().bold(), path.display(), e);
            }
        }
    }

    if args.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{} serializing report: {}", "error:".red().bold(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_report(report: &StreamReport) {
    println!("{}", report.file_path.bold());

    if report.frame_count == 0 {
        println!("  {}", "no frames found".yellow());
        return;
    }

    if let (Some(version), Some(layer), Some(mode)) =
        (report.version, report.layer, report.channel_mode)
    {
        println!(
            "  {:?} {:?}, {} Hz, {:?}",
            version, layer, report.sample_rate, mode
        );
    }

    let mode = if report.is_vbr {
        format!(
            "{} {}-{} kbps (avg {})",
            "VBR".yellow(),
            report.min_bitrate,
            report.max_bitrate,
            report.avg_bitrate
        )
    } else {
        format!("{} {} kbps", "CBR".green(), report.avg_bitrate)
    };
    println!("  {}", mode);

    println!(
        "  {} frames scanned, ~{} in stream, {:.1}s",
        report.frame_count, report.estimated_frames, report.duration_secs
    );

    if report.vbr_header {
        println!("  Xing/Info header present");
    }
    if report.skipped_bytes > 0 {
        println!(
            "  {}",
            format!("{} garbage bytes skipped", report.skipped_bytes).yellow()
        );
    }
    println!("  {} playable bytes", report.total_bytes);
}
