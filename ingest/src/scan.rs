//! Scan orchestration
//!
//! Ties enumeration and classification together: walk a tree, read each FITS
//! header, classify every frame, and assemble a report. One frame in, one
//! record out. A frame whose header cannot be read still produces a record,
//! marked unknown with the failure as its diagnostic.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use skysift_fits::keywords;

use crate::classify::{FrameClass, FrameClassifier};
use crate::config::IngestConfig;
use crate::enumerate::{enumerate_fits_files, DirectoryListing};
use crate::error::ScanError;

/// One classified frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    pub file_name: String,
    pub class: FrameClass,
    /// Exposure duration in seconds, when the header provided one.
    pub exposure_secs: Option<f64>,
    pub diagnostics: Vec<String>,
}

/// All classified frames in one directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryFrames {
    pub directory: PathBuf,
    pub frames: Vec<FrameRecord>,
}

impl DirectoryFrames {
    /// Absolute path of one of this directory's frames.
    pub fn path_of(&self, record: &FrameRecord) -> PathBuf {
        self.directory.join(&record.file_name)
    }
}

/// Everything a scan produced, ready for display or serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub scanned_at: DateTime<Utc>,
    /// The bias/dark split the scan was run with, echoed for reproducibility.
    pub bias_exposure_max_secs: f64,
    pub directories: Vec<DirectoryFrames>,
}

impl ScanReport {
    pub fn total_frames(&self) -> usize {
        self.directories.iter().map(|d| d.frames.len()).sum()
    }

    /// Frame count per class. Every class is present, zero included, so
    /// summaries always print the full vocabulary in a stable order.
    pub fn class_counts(&self) -> BTreeMap<FrameClass, usize> {
        let mut counts: BTreeMap<FrameClass, usize> =
            FrameClass::ALL.iter().map(|c| (*c, 0)).collect();
        for directory in &self.directories {
            for frame in &directory.frames {
                if let Some(count) = counts.get_mut(&frame.class) {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Frame locations grouped by class: for each class, the directories
    /// holding such frames paired with the matching file names, in scan
    /// order. This is the shape calibration stages consume. Classes with no
    /// frames are absent.
    pub fn frames_by_class(&self) -> BTreeMap<FrameClass, Vec<(PathBuf, Vec<String>)>> {
        let mut groups: BTreeMap<FrameClass, Vec<(PathBuf, Vec<String>)>> = BTreeMap::new();
        for directory in &self.directories {
            for frame in &directory.frames {
                let group = groups.entry(frame.class).or_default();
                match group.last_mut() {
                    Some((dir, names)) if *dir == directory.directory => {
                        names.push(frame.file_name.clone());
                    }
                    _ => group.push((directory.directory.clone(), vec![frame.file_name.clone()])),
                }
            }
        }
        groups
    }

    /// All diagnostics attached to any frame, with the frame's full path.
    pub fn diagnostics(&self) -> Vec<(PathBuf, &str)> {
        let mut out = Vec::new();
        for directory in &self.directories {
            for frame in &directory.frames {
                for diagnostic in &frame.diagnostics {
                    out.push((directory.path_of(frame), diagnostic.as_str()));
                }
            }
        }
        out
    }
}

/// Scans an acquisition tree and classifies every FITS frame in it.
pub struct FrameScanner {
    classifier: FrameClassifier,
    bias_exposure_max_secs: f64,
}

impl FrameScanner {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            classifier: FrameClassifier::from_config(config),
            bias_exposure_max_secs: config.bias_exposure_max_secs,
        }
    }

    /// Walk `root` and classify everything found.
    ///
    /// Fails only when the root itself is unusable. Individual frames never
    /// fail the scan; their problems are recorded on the frame.
    pub fn scan(&self, root: &Path) -> Result<ScanReport, ScanError> {
        let listings = enumerate_fits_files(root)?;
        tracing::info!(
            "scanning {} ({} directories with FITS files)",
            root.display(),
            listings.len()
        );

        let mut directories = Vec::with_capacity(listings.len());
        for listing in listings {
            directories.push(self.classify_directory(listing));
        }

        let report = ScanReport {
            root: root.to_path_buf(),
            scanned_at: Utc::now(),
            bias_exposure_max_secs: self.bias_exposure_max_secs,
            directories,
        };
        tracing::info!("scan of {} complete: {} frames", root.display(), report.total_frames());
        Ok(report)
    }

    fn classify_directory(&self, listing: DirectoryListing) -> DirectoryFrames {
        let DirectoryListing {
            directory,
            file_names,
        } = listing;
        let mut frames = Vec::with_capacity(file_names.len());
        for file_name in file_names {
            let path = directory.join(&file_name);
            frames.push(self.classify_file(&path, file_name));
        }
        DirectoryFrames { directory, frames }
    }

    fn classify_file(&self, path: &Path, file_name: String) -> FrameRecord {
        let record = match skysift_fits::read_header(path) {
            Ok(header) => {
                let classification = self.classifier.classify(&file_name, &header);
                FrameRecord {
                    file_name,
                    class: classification.class,
                    exposure_secs: header.get_float(keywords::EXPTIME),
                    diagnostics: classification.diagnostics,
                }
            }
            Err(err) => FrameRecord {
                file_name,
                class: FrameClass::Unknown,
                exposure_secs: None,
                diagnostics: vec![format!("unreadable FITS header: {}", err)],
            },
        };
        tracing::debug!("{} -> {}", path.display(), record.class);
        // Diagnostics stay on the record for the report; echo them to the
        // log so unattended runs leave a trace.
        for diagnostic in &record.diagnostics {
            tracing::warn!("{}: {}", path.display(), diagnostic);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skysift_fits::{BLOCK_SIZE, CARD_SIZE};
    use std::fs;
    use tempfile::TempDir;

    const THRESHOLD: f64 = 0.09;

    fn card(text: &str) -> Vec<u8> {
        let mut bytes = vec![b' '; CARD_SIZE];
        bytes[..text.len()].copy_from_slice(text.as_bytes());
        bytes
    }

    fn kv(keyword: &str, value: &str) -> String {
        format!("{:<8}= {}", keyword, value)
    }

    /// Write a minimal FITS file: SIMPLE, the given cards, END, block padding.
    fn write_fits(dir: &Path, name: &str, cards: &[String]) {
        let mut bytes = card(&kv("SIMPLE", "T"));
        for text in cards {
            bytes.extend(card(text));
        }
        bytes.extend(card("END"));
        while bytes.len() % BLOCK_SIZE != 0 {
            bytes.push(b' ');
        }
        fs::write(dir.join(name), bytes).unwrap();
    }

    fn scanner() -> FrameScanner {
        FrameScanner::new(&IngestConfig::new(THRESHOLD).unwrap())
    }

    fn record<'a>(report: &'a ScanReport, name: &str) -> &'a FrameRecord {
        report
            .directories
            .iter()
            .flat_map(|d| d.frames.iter())
            .find(|f| f.file_name == name)
            .unwrap_or_else(|| panic!("no record for {}", name))
    }

    #[test]
    fn test_scan_classifies_every_frame() {
        let temp = TempDir::new().unwrap();
        let session = temp.path().join("night1");
        fs::create_dir_all(&session).unwrap();

        write_fits(
            &session,
            "bias_01.fits",
            &[kv("IMAGETYP", "'Bias Frame'"), kv("EXPTIME", "0.0")],
        );
        write_fits(
            &session,
            "dark_120.fits",
            &[kv("IMAGETYP", "'Dark Frame'"), kv("EXPTIME", "120.0")],
        );
        write_fits(&session, "flat_r.fits", &[kv("EXPTIME", "2.5")]);
        write_fits(&session, "ngc253_300.fits", &[kv("EXPTIME", "300.0")]);
        fs::write(session.join("broken.fits"), b"not a fits file").unwrap();
        fs::write(session.join("notes.txt"), b"ignore me").unwrap();

        let report = scanner().scan(temp.path()).unwrap();

        assert_eq!(report.total_frames(), 5);
        assert_eq!(report.bias_exposure_max_secs, THRESHOLD);

        assert_eq!(record(&report, "bias_01.fits").class, FrameClass::Bias);
        assert_eq!(record(&report, "dark_120.fits").class, FrameClass::Dark);
        assert_eq!(record(&report, "flat_r.fits").class, FrameClass::Flat);

        let guessed = record(&report, "ngc253_300.fits");
        assert_eq!(guessed.class, FrameClass::Light);
        assert_eq!(guessed.exposure_secs, Some(300.0));
        assert_eq!(guessed.diagnostics.len(), 1);

        let broken = record(&report, "broken.fits");
        assert_eq!(broken.class, FrameClass::Unknown);
        assert_eq!(broken.exposure_secs, None);
        assert!(broken.diagnostics[0].contains("unreadable FITS header"));
    }

    #[test]
    fn test_short_dark_ends_up_with_the_biases() {
        let temp = TempDir::new().unwrap();
        write_fits(
            temp.path(),
            "dark_fast.fits",
            &[kv("IMAGETYP", "'Dark Frame'"), kv("EXPTIME", "0.05")],
        );

        let report = scanner().scan(temp.path()).unwrap();
        assert_eq!(record(&report, "dark_fast.fits").class, FrameClass::Bias);
    }

    #[test]
    fn test_class_counts_cover_the_full_vocabulary() {
        let temp = TempDir::new().unwrap();
        write_fits(
            temp.path(),
            "bias.fits",
            &[kv("IMAGETYP", "'Bias Frame'"), kv("EXPTIME", "0.0")],
        );

        let report = scanner().scan(temp.path()).unwrap();
        let counts = report.class_counts();
        assert_eq!(counts.len(), FrameClass::ALL.len());
        assert_eq!(counts[&FrameClass::Bias], 1);
        assert_eq!(counts[&FrameClass::Dark], 0);
        assert_eq!(counts[&FrameClass::Unknown], 0);
    }

    #[test]
    fn test_frames_by_class_groups_by_directory() {
        let temp = TempDir::new().unwrap();
        let night1 = temp.path().join("night1");
        let night2 = temp.path().join("night2");
        fs::create_dir_all(&night1).unwrap();
        fs::create_dir_all(&night2).unwrap();
        for (dir, name) in [
            (&night1, "flat_1.fits"),
            (&night1, "flat_2.fits"),
            (&night2, "flat_9.fits"),
        ] {
            write_fits(
                dir,
                name,
                &[kv("IMAGETYP", "'Flat Field'"), kv("EXPTIME", "1.0")],
            );
        }
        write_fits(
            &night1,
            "dark_60.fits",
            &[kv("IMAGETYP", "'Dark Frame'"), kv("EXPTIME", "60.0")],
        );

        let groups = scanner().scan(temp.path()).unwrap().frames_by_class();
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[&FrameClass::Flat],
            vec![
                (night1.clone(), vec!["flat_1.fits".to_string(), "flat_2.fits".to_string()]),
                (night2.clone(), vec!["flat_9.fits".to_string()]),
            ]
        );
        assert_eq!(
            groups[&FrameClass::Dark],
            vec![(night1.clone(), vec!["dark_60.fits".to_string()])]
        );
    }

    #[test]
    fn test_diagnostics_carry_full_paths() {
        let temp = TempDir::new().unwrap();
        write_fits(temp.path(), "mystery.fits", &[]);

        let report = scanner().scan(temp.path()).unwrap();
        let diagnostics = report.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].0, temp.path().join("mystery.fits"));
        assert_eq!(diagnostics[0].1, "no exposure duration");
    }

    #[test]
    fn test_empty_tree_gives_empty_report() {
        let temp = TempDir::new().unwrap();
        let report = scanner().scan(temp.path()).unwrap();
        assert_eq!(report.total_frames(), 0);
        assert!(report.directories.is_empty());
        assert!(report.diagnostics().is_empty());
    }

    #[test]
    fn test_missing_root_fails_the_scan() {
        let temp = TempDir::new().unwrap();
        let gone = temp.path().join("nothing_here");
        assert!(matches!(
            scanner().scan(&gone),
            Err(ScanError::RootNotFound { .. })
        ));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let temp = TempDir::new().unwrap();
        write_fits(
            temp.path(),
            "dark_10.fits",
            &[kv("IMAGETYP", "'Dark Frame'"), kv("EXPTIME", "10.0")],
        );

        let report = scanner().scan(temp.path()).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["bias_exposure_max_secs"], 0.09);
        assert!(value["scanned_at"].is_string());
        let frame = &value["directories"][0]["frames"][0];
        assert_eq!(frame["file_name"], "dark_10.fits");
        assert_eq!(frame["class"], "DARK");
        assert_eq!(frame["exposure_secs"], 10.0);
    }
}
