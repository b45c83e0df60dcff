//! Frame classification
//!
//! Decides, for a single frame, which calibration class it belongs to. The
//! decision never fails: when the metadata is insufficient the frame lands in
//! [`FrameClass::Unknown`] and the reason travels with the result as a
//! diagnostic, so callers can batch thousands of frames without handling
//! per-frame errors.
//!
//! Inputs are weighed in a fixed order:
//! 1. the exposure duration must be readable, or nothing else is considered
//! 2. an `IMAGETYP` label, when present and non-empty, is authoritative
//! 3. otherwise the filename is matched against an ordered pattern table
//!
//! Darks get one extra twist: an exposure at or below the configured ceiling
//! reclassifies the frame as a bias, since the thermal signal of a
//! millisecond "dark" is indistinguishable from read noise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use skysift_fits::{keywords, FitsHeader, KeywordError};
use thiserror::Error;

use crate::config::IngestConfig;

/// Calibration class of a single frame.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrameClass {
    Bias,
    Dark,
    Flat,
    Light,
    Unknown,
}

impl FrameClass {
    /// Every class, in display order.
    pub const ALL: [FrameClass; 5] = [
        FrameClass::Bias,
        FrameClass::Dark,
        FrameClass::Flat,
        FrameClass::Light,
        FrameClass::Unknown,
    ];

    /// Canonical uppercase tag, stable across output formats.
    pub fn tag(&self) -> &'static str {
        match self {
            FrameClass::Bias => "BIAS",
            FrameClass::Dark => "DARK",
            FrameClass::Flat => "FLAT",
            FrameClass::Light => "LIGHT",
            FrameClass::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for FrameClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a frame class: {0:?}")]
pub struct ParseFrameClassError(pub String);

impl FromStr for FrameClass {
    type Err = ParseFrameClassError;

    /// Parses a canonical tag. Matching ignores ASCII case so command-line
    /// input like `dark` works; anything outside the five tags is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BIAS" => Ok(FrameClass::Bias),
            "DARK" => Ok(FrameClass::Dark),
            "FLAT" => Ok(FrameClass::Flat),
            "LIGHT" => Ok(FrameClass::Light),
            "UNKNOWN" => Ok(FrameClass::Unknown),
            _ => Err(ParseFrameClassError(s.to_string())),
        }
    }
}

/// Outcome of classifying one frame.
///
/// `diagnostics` lists, in decision order, everything that made the result
/// less than certain. An empty list means the metadata was conclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub class: FrameClass,
    pub diagnostics: Vec<String>,
}

impl Classification {
    pub fn certain(class: FrameClass) -> Self {
        Self {
            class,
            diagnostics: Vec::new(),
        }
    }

    pub fn flagged(class: FrameClass, diagnostic: String) -> Self {
        Self {
            class,
            diagnostics: vec![diagnostic],
        }
    }
}

/// Classifies frames from header metadata and filenames.
///
/// Construction fixes the bias/dark exposure ceiling and the filename
/// pattern table; a classifier is immutable afterwards and classifying the
/// same inputs always produces the same result.
pub struct FrameClassifier {
    bias_exposure_max_secs: f64,
    /// Checked in order; the first substring hit wins.
    name_patterns: Vec<(&'static str, FrameClass)>,
}

impl FrameClassifier {
    pub fn new(bias_exposure_max_secs: f64) -> Self {
        Self {
            bias_exposure_max_secs,
            name_patterns: vec![
                ("bias", FrameClass::Bias),
                ("dark", FrameClass::Dark),
                ("flat", FrameClass::Flat),
            ],
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.bias_exposure_max_secs)
    }

    /// Classify one frame from its filename and header.
    ///
    /// # Arguments
    /// * `file_name` - the frame's file name, used only when the header has
    ///   no usable `IMAGETYP` label
    /// * `header` - parsed FITS header of the frame
    pub fn classify(&self, file_name: &str, header: &FitsHeader) -> Classification {
        // Without an exposure duration no class can be assigned, not even
        // from an explicit label: the bias/dark split depends on it.
        let exposure_secs = match header.float_value(keywords::EXPTIME) {
            Ok(secs) => secs,
            Err(err) => {
                let diagnostic = match &err {
                    KeywordError::Missing { .. } => "no exposure duration".to_string(),
                    KeywordError::WrongType { .. } => {
                        format!("no exposure duration ({})", err)
                    }
                };
                return Classification::flagged(FrameClass::Unknown, diagnostic);
            }
        };

        let mut diagnostics = Vec::new();
        match header.str_value(keywords::IMAGETYP) {
            Ok(label) if !label.trim().is_empty() => {
                return self.classify_by_label(label, exposure_secs);
            }
            // An empty label carries no information; fall through to the
            // filename without comment.
            Ok(_) => {}
            Err(KeywordError::Missing { .. }) => {}
            Err(err) => {
                diagnostics.push(format!("ignoring image-type keyword: {}", err));
            }
        }

        let mut result = self.classify_by_name(file_name, exposure_secs);
        diagnostics.append(&mut result.diagnostics);
        result.diagnostics = diagnostics;
        result
    }

    /// Classify from an explicit `IMAGETYP` label.
    ///
    /// Labels are matched exactly: acquisition software writes them from a
    /// fixed vocabulary, so a near miss means a vendor we do not know and
    /// guessing would misfile the frame.
    fn classify_by_label(&self, label: &str, exposure_secs: f64) -> Classification {
        match label {
            "BIAS" | "Bias Frame" => Classification::certain(FrameClass::Bias),
            "DARK" | "Dark Frame" => Classification::certain(self.split_dark(exposure_secs)),
            "FLAT" | "Flat Field" => Classification::certain(FrameClass::Flat),
            "LIGHT" | "Light Frame" => Classification::certain(FrameClass::Light),
            other => Classification::flagged(
                FrameClass::Unknown,
                format!("unrecognized image-type label '{}'", other),
            ),
        }
    }

    /// Classify from the filename alone, case-insensitively.
    ///
    /// `light` is deliberately absent from the pattern table: it is the
    /// fallback for every unmatched name, and that guess is always flagged.
    fn classify_by_name(&self, file_name: &str, exposure_secs: f64) -> Classification {
        let lowered = file_name.to_ascii_lowercase();
        for (pattern, class) in &self.name_patterns {
            if lowered.contains(pattern) {
                let class = match class {
                    FrameClass::Dark => self.split_dark(exposure_secs),
                    other => *other,
                };
                return Classification::certain(class);
            }
        }
        Classification::flagged(
            FrameClass::Light,
            format!("guessing LIGHT for unmatched filename '{}'", file_name),
        )
    }

    /// A dark at or below the configured exposure ceiling is a bias frame
    /// in disguise.
    fn split_dark(&self, exposure_secs: f64) -> FrameClass {
        if exposure_secs <= self.bias_exposure_max_secs {
            FrameClass::Bias
        } else {
            FrameClass::Dark
        }
    }
}
