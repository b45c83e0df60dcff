//! Frame ingestion for SkySift
//!
//! Everything between a directory full of freshly captured FITS files and a
//! classified inventory: discovering the files, reading their headers, and
//! sorting each frame into a calibration class. The classification rules
//! live in [`classify`], file discovery in [`enumerate`], and [`scan`] runs
//! the whole pipeline over a tree.

pub mod classify;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod scan;

pub use classify::{Classification, FrameClass, FrameClassifier, ParseFrameClassError};
pub use config::{threshold_from_str, ConfigError, IngestConfig, BIAS_EXPOSURE_MAX_KEY};
pub use enumerate::{enumerate_fits_files, is_fits_name, DirectoryListing, FITS_SUFFIXES};
pub use error::ScanError;
pub use scan::{DirectoryFrames, FrameRecord, FrameScanner, ScanReport};
