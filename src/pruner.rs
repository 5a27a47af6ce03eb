//! Removal of empty directories that the organizer does not own.
//!
//! The tree is walked deepest-first, so a directory whose only contents are
//! empty directories is found in the same pass as its children. Removal uses
//! `fs::remove_dir`, which refuses non-empty directories.

use crate::file_organizer::{OrganizeError, OrganizeResult};
use crate::protection::ProtectionSet;
use crate::report::{ItemFailure, ProgressSink};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Empty directories found under a root, deepest first.
#[derive(Debug, Clone, Default)]
pub struct PruneScan {
    pub candidates: Vec<PathBuf>,
    pub errors: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PruneReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<ItemFailure>,
}

/// Finds every directory under `root` that is empty, or holds only
/// directories that are themselves candidates, and is not protected.
///
/// The root itself is never a candidate.
pub fn scan(root: &Path, protection: &ProtectionSet) -> OrganizeResult<PruneScan> {
    if !root.is_dir() {
        return Err(OrganizeError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut result = PruneScan::default();
    let mut doomed: HashSet<PathBuf> = HashSet::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                result.errors.push(ItemFailure::new(&path, &e));
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        if protection.is_protected(dir) {
            continue;
        }

        match only_doomed_children(dir, &doomed) {
            Ok(true) => {
                doomed.insert(dir.to_path_buf());
                result.candidates.push(dir.to_path_buf());
            }
            Ok(false) => {}
            Err(e) => result.errors.push(ItemFailure::new(dir, &e)),
        }
    }

    Ok(result)
}

fn only_doomed_children(dir: &Path, doomed: &HashSet<PathBuf>) -> std::io::Result<bool> {
    for child in fs::read_dir(dir)? {
        let child = child?;
        if !child.file_type()?.is_dir() || !doomed.contains(&child.path()) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Removes the candidates in order. Each removal stands alone; a directory
/// that gained content since the scan is reported, not deleted.
pub fn remove(candidates: &[PathBuf], progress: &mut dyn ProgressSink) -> PruneReport {
    let mut report = PruneReport::default();
    let total = candidates.len();

    for (index, dir) in candidates.iter().enumerate() {
        match fs::remove_dir(dir) {
            Ok(()) => {
                tracing::info!(dir = %dir.display(), "removed empty directory");
                report.removed.push(dir.clone());
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "directory not removed");
                report.failures.push(ItemFailure::new(dir, &e));
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
    use crate::file_category::CategoryTable;
    use crate::report::NoProgress;
    use tempfile::TempDir;

    fn protection(root: &Path) -> ProtectionSet {
        ProtectionSet::build(&CategoryTable::default(), root)
    }

    #[test]
    fn test_empty_directory_is_candidate() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("empty")).expect("Failed to create directory");

        let scan = scan(root, &protection(root)).expect("Failed to scan");
        assert_eq!(scan.candidates, vec![root.join("empty")]);
    }

    #[test]
    fn test_directory_with_small_file_is_kept() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("keep")).expect("Failed to create directory");
        fs::write(root.join("keep/.nomedia"), "").expect("Failed to write file");

        let scan = scan(root, &protection(root)).expect("Failed to scan");
        assert!(scan.candidates.is_empty());
    }

    #[test]
    fn test_nested_empty_chain_is_found_deepest_first() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b/c")).expect("Failed to create directories");

        let scan = scan(root, &protection(root)).expect("Failed to scan");
        assert_eq!(
            scan.candidates,
            vec![root.join("a/b/c"), root.join("a/b"), root.join("a")]
        );

        let report = remove(&scan.candidates, &mut NoProgress);
        assert_eq!(report.removed.len(), 3);
        assert!(report.failures.is_empty());
        assert!(!root.join("a").exists());
    }

    #[test]
    fn test_protected_directories_survive() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("Arquivos/Fotos/FOTOS.JPG")).expect("Failed to create");
        fs::create_dir_all(root.join("Arquivos/Diversos/DIVERSOS.NEW")).expect("Failed to create");
        fs::create_dir(root.join("Pastas_Organizadas")).expect("Failed to create");
        fs::create_dir_all(root.join("Organizado_Por_Data/2023/01 - January"))
            .expect("Failed to create");

        let scan = scan(root, &protection(root)).expect("Failed to scan");
        assert_eq!(
            scan.candidates,
            vec![
                root.join("Organizado_Por_Data/2023/01 - January"),
                root.join("Organizado_Por_Data/2023"),
            ]
        );
    }

    #[test]
    fn test_parent_with_protected_child_is_kept() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("Arquivos/Fotos/FOTOS.JPG/album")).expect("Failed to create");

        let scan = scan(root, &protection(root)).expect("Failed to scan");
        assert_eq!(scan.candidates, vec![root.join("Arquivos/Fotos/FOTOS.JPG/album")]);
    }

    #[test]
    fn test_remove_refuses_directory_that_gained_content() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("late")).expect("Failed to create directory");

        let scan = scan(root, &protection(root)).expect("Failed to scan");
        fs::write(root.join("late/new.txt"), "arrived").expect("Failed to write file");

        let report = remove(&scan.candidates, &mut NoProgress);
        assert!(report.removed.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(root.join("late/new.txt").exists());
    }

    #[test]
    fn test_missing_root() {
        let set = protection(Path::new("/non/existent/path"));
        let result = scan(Path::new("/non/existent/path"), &set);
        assert!(result.is_err());
    }
}
