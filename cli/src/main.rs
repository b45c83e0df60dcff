//! SkySift command line
//!
//! Scans an acquisition tree, classifies every FITS frame, and prints either
//! a human-readable summary or the full report as JSON. Logs go to stderr so
//! JSON output stays pipeable.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use skysift_ingest::{
    threshold_from_str, FrameClass, FrameScanner, IngestConfig, ScanReport,
};
use tracing_subscriber::EnvFilter;

/// Sort a night's FITS frames into calibration classes.
#[derive(Debug, Parser)]
#[command(name = "skysift", version, about)]
struct Args {
    /// Root directory to scan.
    root: PathBuf,

    /// Longest exposure in seconds still counted as a bias frame when a dark
    /// is reclassified. Depends on the camera, so there is no default.
    #[arg(
        long,
        env = "SKYSIFT_BIAS_EXPOSURE_MAX",
        value_name = "SECONDS",
        value_parser = threshold_from_str
    )]
    bias_exposure_max: f64,

    /// Emit the full report as JSON instead of a text summary.
    #[arg(long)]
    json: bool,

    /// Print only the paths of frames in this class
    /// (BIAS, DARK, FLAT, LIGHT, UNKNOWN).
    #[arg(long, value_name = "CLASS")]
    only: Option<FrameClass>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = IngestConfig::new(args.bias_exposure_max)?;
    let scanner = FrameScanner::new(&config);
    let report = scanner
        .scan(&args.root)
        .with_context(|| format!("scanning {}", args.root.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match args.only {
        Some(class) => print_class(&report, class),
        None => print_summary(&report),
    }
    Ok(())
}

fn print_summary(report: &ScanReport) {
    println!(
        "Scanned {}: {} frames in {} directories",
        report.root.display(),
        report.total_frames(),
        report.directories.len()
    );
    for (class, count) in report.class_counts() {
        println!("  {:<7} {}", class, count);
    }

    if !report.directories.is_empty() {
        println!();
        for directory in &report.directories {
            println!(
                "  {}: {} frames",
                directory.directory.display(),
                directory.frames.len()
            );
        }
    }

    let diagnostics = report.diagnostics();
    if !diagnostics.is_empty() {
        println!();
        println!("Diagnostics ({}):", diagnostics.len());
        for (path, message) in &diagnostics {
            println!("  {}: {}", path.display(), message);
        }
    }
}

fn print_class(report: &ScanReport, class: FrameClass) {
    if let Some(groups) = report.frames_by_class().get(&class) {
        for (directory, names) in groups {
            for name in names {
                println!("{}", directory.join(name).display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_required_arguments() {
        let args =
            Args::try_parse_from(["skysift", "/data/night1", "--bias-exposure-max", "0.09"])
                .unwrap();
        assert_eq!(args.root, PathBuf::from("/data/night1"));
        assert_eq!(args.bias_exposure_max, 0.09);
        assert!(!args.json);
        assert!(args.only.is_none());
    }

    #[test]
    fn test_only_accepts_class_tags() {
        let args = Args::try_parse_from([
            "skysift",
            "/data",
            "--bias-exposure-max",
            "0.09",
            "--only",
            "dark",
        ])
        .unwrap();
        assert_eq!(args.only, Some(FrameClass::Dark));
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let result = Args::try_parse_from(["skysift", "/data", "--bias-exposure-max=-1.0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_class() {
        let result = Args::try_parse_from([
            "skysift",
            "/data",
            "--bias-exposure-max",
            "0.09",
            "--only",
            "solar",
        ]);
        assert!(result.is_err());
    }
}
