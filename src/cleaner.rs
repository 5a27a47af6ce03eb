//! Finding and deleting dead files: zero-byte files and leftovers with a
//! temporary extension, anywhere under the watched root.

use crate::file_category::split_extension;
use crate::file_organizer::{OrganizeError, OrganizeResult};
use crate::report::{ItemFailure, ProgressSink};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions treated as temporary leftovers (compared lower-cased).
pub const TEMP_EXTENSIONS: [&str; 6] = [".tmp", ".bak", ".~tmp", ".~bak", ".temp", ".~lock"];

/// Why a file is proposed for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupReason {
    /// The file has zero bytes.
    Empty,
    /// The file carries one of [`TEMP_EXTENSIONS`].
    Temporary(String),
}

impl fmt::Display for CleanupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Temporary(ext) => write!(f, "temporary ({})", ext),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupCandidate {
    pub path: PathBuf,
    pub reason: CleanupReason,
    pub size: u64,
}

/// Files proposed for deletion and anything that could not be inspected.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub candidates: Vec<CleanupCandidate>,
    pub total_bytes: u64,
    pub errors: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub removed: usize,
    /// Bytes freed by successful deletions only.
    pub reclaimed_bytes: u64,
    pub failures: Vec<ItemFailure>,
}

/// Decides whether a file is dead. Emptiness is checked first, so a
/// zero-byte `.tmp` file is reported as [`CleanupReason::Empty`].
///
/// # Examples
///
/// ```
/// use downtidy::cleaner::{classify, CleanupReason};
///
/// assert_eq!(classify("x.jpg", 0), Some(CleanupReason::Empty));
/// assert_eq!(classify("y.BAK", 12), Some(CleanupReason::Temporary(".bak".into())));
/// assert_eq!(classify("notes.txt", 12), None);
/// ```
pub fn classify(file_name: &str, size: u64) -> Option<CleanupReason> {
    if size == 0 {
        return Some(CleanupReason::Empty);
    }

    let (_, ext) = split_extension(file_name);
    let ext = ext.to_lowercase();
    if TEMP_EXTENSIONS.contains(&ext.as_str()) {
        Some(CleanupReason::Temporary(ext))
    } else {
        None
    }
}

/// Walks the whole tree under `root` and collects dead files.
///
/// Symlinks are neither followed nor proposed.
pub fn scan(root: &Path) -> OrganizeResult<ScanResult> {
    if !root.is_dir() {
        return Err(OrganizeError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut result = ScanResult::default();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                result.errors.push(ItemFailure::new(&path, &e));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                result.errors.push(ItemFailure::new(entry.path(), &e));
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy();
        if let Some(reason) = classify(&name, size) {
            result.total_bytes += size;
            result.candidates.push(CleanupCandidate {
                path: entry.into_path(),
                reason,
                size,
            });
        }
    }

    Ok(result)
}

/// Deletes every candidate, one at a time. Failures are recorded and the
/// remaining candidates are still attempted.
pub fn delete_all(candidates: &[CleanupCandidate], progress: &mut dyn ProgressSink) -> CleanupReport {
    let mut report = CleanupReport::default();
    let total = candidates.len();

    for (index, candidate) in candidates.iter().enumerate() {
        match fs::remove_file(&candidate.path) {
            Ok(()) => {
                tracing::info!(file = %candidate.path.display(), reason = %candidate.reason, "removed file");
                report.removed += 1;
                report.reclaimed_bytes += candidate.size;
            }
            Err(e) => {
                tracing::warn!(file = %candidate.path.display(), error = %e, "file not removed");
                report.failures.push(ItemFailure::new(&candidate.path, &e));
            }
        }
        progress.advance(index + 1, total);
    }

    progress.finish();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NoProgress;
    use tempfile::TempDir;

    #[test]
    fn test_empty_takes_precedence_over_temporary() {
        assert_eq!(classify("lock.~lock", 0), Some(CleanupReason::Empty));
        assert_eq!(classify("a.tmp", 0), Some(CleanupReason::Empty));
    }

    #[test]
    fn test_every_temp_extension_is_recognized() {
        for ext in TEMP_EXTENSIONS {
            let name = format!("file{}", ext.to_uppercase());
            assert_eq!(
                classify(&name, 1),
                Some(CleanupReason::Temporary(ext.to_string())),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_regular_files_are_not_candidates() {
        assert_eq!(classify("photo.jpg", 100), None);
        assert_eq!(classify("tmp", 100), None);
        assert_eq!(classify(".bak", 100), None);
    }

    #[test]
    fn test_scan_walks_subdirectories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("Arquivos/Fotos")).expect("Failed to create directory");
        fs::write(root.join("Arquivos/Fotos/x.jpg"), "").expect("Failed to write file");
        fs::write(root.join("y.bak"), "twelve bytes").expect("Failed to write file");
        fs::write(root.join("keep.txt"), "content").expect("Failed to write file");

        let result = scan(root).expect("Failed to scan");
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.total_bytes, 12);
        assert_eq!(result.candidates[0].path, root.join("Arquivos/Fotos/x.jpg"));
        assert_eq!(result.candidates[0].reason, CleanupReason::Empty);
        assert_eq!(
            result.candidates[1].reason,
            CleanupReason::Temporary(".bak".to_string())
        );
    }

    #[test]
    fn test_delete_all_counts_only_successes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("a.tmp"), "1234").expect("Failed to write file");
        fs::write(root.join("b.tmp"), "123456").expect("Failed to write file");

        let result = scan(root).expect("Failed to scan");
        fs::remove_file(root.join("b.tmp")).expect("Failed to remove file");

        let report = delete_all(&result.candidates, &mut NoProgress);
        assert_eq!(report.removed, 1);
        assert_eq!(report.reclaimed_bytes, 4);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_scan_missing_root() {
        assert!(scan(Path::new("/non/existent/path")).is_err());
    }
}
