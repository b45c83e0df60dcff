//! Scan-level failures

use std::path::PathBuf;
use thiserror::Error;

/// Conditions that abort a scan before any frame is examined.
///
/// Per-frame problems never surface here. A frame with an unreadable header
/// is recorded as unknown with a diagnostic so the rest of the tree is still
/// processed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan root does not exist: {}", .path.display())]
    RootNotFound { path: PathBuf },

    #[error("scan root is not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },
}
