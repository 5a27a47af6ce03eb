/// Planning and executing the organize-by-category batch.
///
/// Loose files in the watched root are moved into
/// `Arquivos/<Category>/<CATEGORY><EXT>/`; pre-existing subfolders are moved
/// whole into `Pastas_Organizadas/`. Every move is independent: a failure is
/// recorded in the [`OrganizeReport`] and the batch carries on.
use crate::collision::{resolve_dir_path, resolve_path};
use crate::file_category::{DestinationPlan, DestinationResolver};
use crate::layout;
use crate::report::{ItemFailure, MoveRecord, ProgressSink};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during file organization operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The watched directory does not exist or is not a directory.
    #[error("Watched directory not found: {}", path.display())]
    RootNotFound { path: PathBuf },
    /// The watched directory could not be listed.
    #[error("Failed to read directory {}: {source}", path.display())]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to create a destination directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to move an item to its destination.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A relocated folder's name is already taken and the policy forbids suffixing.
    #[error("Folder {} already exists", path.display())]
    FolderExists { path: PathBuf },
    /// Failed to read an item's metadata.
    #[error("Failed to read metadata of {}: {source}", path.display())]
    MetadataFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The modification time is outside the representable calendar range.
    #[error("Modification time of {} is out of range", path.display())]
    TimestampOutOfRange { path: PathBuf },
    /// The path has no final name component.
    #[error("{} has no file name", path.display())]
    NoFileName { path: PathBuf },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// What to do when a relocated folder's name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderCollisionPolicy {
    /// Move to `<name>_<n>`.
    #[default]
    Suffix,
    /// Leave the folder in place and report [`OrganizeError::FolderExists`].
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

/// An entry of the watched root, captured once when the batch is planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveItem {
    pub path: PathBuf,
    pub name: String,
    pub kind: ItemKind,
}

/// Entries directly inside the watched root, split by kind.
#[derive(Debug, Clone, Default)]
pub struct RootListing {
    pub files: Vec<MoveItem>,
    pub folders: Vec<MoveItem>,
    /// Entries that could not be read or classified.
    pub errors: Vec<ItemFailure>,
}

/// Snapshot of the watched root taken before confirmation.
#[derive(Debug, Clone)]
pub struct OrganizePlan {
    pub root: PathBuf,
    pub files: Vec<MoveItem>,
    pub folders: Vec<MoveItem>,
    /// Entries left out of the plan because they could not be inspected.
    pub errors: Vec<ItemFailure>,
}

impl OrganizePlan {
    pub fn total(&self) -> usize {
        self.files.len() + self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Outcome of an organize batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizeReport {
    /// Items in the plan.
    pub total: usize,
    /// Items attempted, successful or not.
    pub processed: usize,
    pub folders_moved: usize,
    /// Successful file moves per category label.
    pub moved_by_category: BTreeMap<String, usize>,
    pub moves: Vec<MoveRecord>,
    pub failures: Vec<ItemFailure>,
}

impl OrganizeReport {
    pub fn files_moved(&self) -> usize {
        self.moved_by_category.values().sum()
    }
}

/// Lists the non-hidden entries directly inside `root`, skipping the
/// organizer's own top-level folders. Both lists are sorted by name.
///
/// Symlinks are classified by what they point at and moved as links. An
/// entry whose metadata cannot be read (a dangling symlink, say) is
/// recorded in [`RootListing::errors`] instead.
pub fn list_root(root: &Path) -> OrganizeResult<RootListing> {
    if !root.is_dir() {
        return Err(OrganizeError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let entries = fs::read_dir(root).map_err(|e| OrganizeError::ReadDirFailed {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut listing = RootListing::default();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "unreadable directory entry");
                listing.errors.push(ItemFailure::new(root, e));
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if layout::is_hidden(&name) {
            continue;
        }

        let path = entry.path();
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "entry left out of the plan");
                listing.errors.push(ItemFailure::new(&path, e));
                continue;
            }
        };

        if metadata.is_file() {
            listing.files.push(MoveItem {
                path,
                name,
                kind: ItemKind::File,
            });
        } else if metadata.is_dir() && !layout::is_organizer_dir(&name) {
            listing.folders.push(MoveItem {
                path,
                name,
                kind: ItemKind::Folder,
            });
        }
    }

    listing.files.sort_by(|a, b| a.name.cmp(&b.name));
    listing.folders.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(listing)
}

/// Creates `path` and any missing parents; existing directories are fine.
pub(crate) fn ensure_dir(path: &Path) -> OrganizeResult<()> {
    fs::create_dir_all(path).map_err(|e| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Renames `from` to `to`. A regular file on another device is copied then
/// removed; directories are never copied.
pub(crate) fn move_entry(from: &Path, to: &Path) -> OrganizeResult<()> {
    let move_failed = |e: io::Error| OrganizeError::MoveFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    };

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices && from.is_file() => {
            tracing::debug!(from = %from.display(), "rename crosses devices, copying instead");
            fs::copy(from, to).map_err(move_failed)?;
            fs::remove_file(from).map_err(move_failed)
        }
        Err(e) => Err(move_failed(e)),
    }
}

/// Organizes the watched root by extension category.
#[derive(Debug, Clone, Default)]
pub struct FileOrganizer {
    resolver: DestinationResolver,
    folder_collision: FolderCollisionPolicy,
}

impl FileOrganizer {
    pub fn new(resolver: DestinationResolver, folder_collision: FolderCollisionPolicy) -> Self {
        Self {
            resolver,
            folder_collision,
        }
    }

    /// Takes the snapshot of files and folders to move.
    ///
    /// Returns [`OrganizeError::RootNotFound`] if `root` is missing; nothing is
    /// touched in that case.
    pub fn plan(&self, root: &Path) -> OrganizeResult<OrganizePlan> {
        let listing = list_root(root)?;
        Ok(OrganizePlan {
            root: root.to_path_buf(),
            files: listing.files,
            folders: listing.folders,
            errors: listing.errors,
        })
    }

    /// Destination folders for a planned file, for previews.
    pub fn destination_for(&self, root: &Path, file_name: &str) -> DestinationPlan {
        self.resolver
            .resolve(file_name, &layout::archive_root(root))
    }

    /// Runs the plan: folders first, then files, one shared progress counter.
    pub fn execute(&self, plan: &OrganizePlan, progress: &mut dyn ProgressSink) -> OrganizeReport {
        let total = plan.total();
        let mut report = OrganizeReport {
            total,
            ..Default::default()
        };

        let relocated_root = layout::relocated_root(&plan.root);
        for folder in &plan.folders {
            match self.relocate_folder(&folder.path, &relocated_root) {
                Ok(record) => {
                    tracing::info!(from = %record.from.display(), to = %record.to.display(), "relocated folder");
                    report.folders_moved += 1;
                    report.moves.push(record);
                }
                Err(e) => {
                    tracing::warn!(folder = %folder.path.display(), error = %e, "folder not relocated");
                    report.failures.push(ItemFailure::new(&folder.path, &e));
                }
            }
            report.processed += 1;
            progress.advance(report.processed, total);
        }

        let archive_root = layout::archive_root(&plan.root);
        for file in &plan.files {
            match self.move_file(&file.path, &archive_root) {
                Ok((record, category)) => {
                    tracing::info!(from = %record.from.display(), to = %record.to.display(), %category, "moved file");
                    *report.moved_by_category.entry(category).or_insert(0) += 1;
                    report.moves.push(record);
                }
                Err(e) => {
                    tracing::warn!(file = %file.path.display(), error = %e, "file not moved");
                    report.failures.push(ItemFailure::new(&file.path, &e));
                }
            }
            report.processed += 1;
            progress.advance(report.processed, total);
        }

        progress.finish();
        report
    }

    /// Moves one file into its leaf folder under `archive_root`, creating the
    /// folders and suffixing the name when it is taken.
    ///
    /// Returns the move and the category label it was counted under.
    pub fn move_file(
        &self,
        file_path: &Path,
        archive_root: &Path,
    ) -> OrganizeResult<(MoveRecord, String)> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::NoFileName {
                path: file_path.to_path_buf(),
            })?;

        let destination = self
            .resolver
            .resolve(&file_name.to_string_lossy(), archive_root);
        ensure_dir(&destination.leaf_dir)?;

        let desired = destination.leaf_dir.join(file_name);
        let target = resolve_path(&desired);
        move_entry(file_path, &target)?;

        Ok((
            MoveRecord {
                from: file_path.to_path_buf(),
                renamed: target != desired,
                to: target,
            },
            destination.category,
        ))
    }

    /// Moves a whole folder into `relocated_root`, keeping its name unless
    /// the name is taken.
    pub fn relocate_folder(
        &self,
        folder_path: &Path,
        relocated_root: &Path,
    ) -> OrganizeResult<MoveRecord> {
        let folder_name = folder_path
            .file_name()
            .ok_or_else(|| OrganizeError::NoFileName {
                path: folder_path.to_path_buf(),
            })?;

        ensure_dir(relocated_root)?;

        let desired = relocated_root.join(folder_name);
        let target = match self.folder_collision {
            FolderCollisionPolicy::Suffix => resolve_dir_path(&desired),
            FolderCollisionPolicy::Fail => {
                // rename() would silently replace an empty directory
                if desired.symlink_metadata().is_ok() {
                    return Err(OrganizeError::FolderExists { path: desired });
                }
                desired.clone()
            }
        };

        move_entry(folder_path, &target)?;

        Ok(MoveRecord {
            from: folder_path.to_path_buf(),
            renamed: target != desired,
            to: target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NoProgress;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_plan_skips_hidden_and_organizer_dirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("b.txt"), "b").expect("Failed to write file");
        fs::write(root.join("a.jpg"), "a").expect("Failed to write file");
        fs::write(root.join(".nomedia"), "").expect("Failed to write file");
        for dir in ["Arquivos", "Pastas_Organizadas", "Organizado_Por_Data", ".cache", "Old"] {
            fs::create_dir(root.join(dir)).expect("Failed to create directory");
        }

        let plan = FileOrganizer::default().plan(root).expect("Failed to plan");
        let files: Vec<_> = plan.files.iter().map(|i| i.name.as_str()).collect();
        let folders: Vec<_> = plan.folders.iter().map(|i| i.name.as_str()).collect();

        assert_eq!(files, vec!["a.jpg", "b.txt"]);
        assert_eq!(folders, vec!["Old"]);
        assert_eq!(plan.total(), 3);
    }

    #[test]
    fn test_plan_missing_root() {
        let result = FileOrganizer::default().plan(Path::new("/non/existent/path"));
        assert!(matches!(result, Err(OrganizeError::RootNotFound { .. })));
    }

    struct Recorder {
        steps: Vec<(usize, usize)>,
        finished: bool,
    }

    impl ProgressSink for Recorder {
        fn advance(&mut self, processed: usize, total: usize) {
            self.steps.push((processed, total));
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn test_execute_advances_once_per_item_including_failures() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("Old")).expect("Failed to create directory");
        fs::write(root.join("a.jpg"), "a").expect("Failed to write file");
        fs::write(root.join("b.txt"), "b").expect("Failed to write file");

        let organizer = FileOrganizer::default();
        let plan = organizer.plan(root).expect("Failed to plan");
        fs::remove_file(root.join("b.txt")).expect("Failed to remove file");

        let mut recorder = Recorder {
            steps: Vec::new(),
            finished: false,
        };
        let report = organizer.execute(&plan, &mut recorder);

        assert_eq!(recorder.steps, vec![(1, 3), (2, 3), (3, 3)]);
        assert!(recorder.finished);
        assert_eq!(report.processed, 3);
        assert_eq!(report.folders_moved, 1);
        assert_eq!(report.files_moved(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, root.join("b.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_plan_records_dangling_symlink() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("a.jpg"), "a").expect("Failed to write file");
        std::os::unix::fs::symlink(root.join("gone.txt"), root.join("link.txt"))
            .expect("Failed to create symlink");

        let plan = FileOrganizer::default().plan(root).expect("Failed to plan");

        assert_eq!(plan.files.len(), 1);
        assert_eq!(plan.errors.len(), 1);
        assert_eq!(plan.errors[0].path, root.join("link.txt"));
        assert!(root.join("link.txt").symlink_metadata().is_ok());
    }

    #[test]
    fn test_move_file_creates_leaf_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let file_path = root.join("song.mp3");
        fs::write(&file_path, "la").expect("Failed to write file");

        let (record, category) = FileOrganizer::default()
            .move_file(&file_path, &root.join("Arquivos"))
            .expect("Failed to move file");

        assert_eq!(category, "Audio");
        assert_eq!(record.to, root.join("Arquivos/Audio/AUDIO.MP3/song.mp3"));
        assert!(!record.renamed);
        assert!(record.to.exists());
        assert!(!file_path.exists());
    }

    #[test]
    fn test_move_file_renames_on_collision() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let leaf = root.join("Arquivos/Documentos/DOCUMENTOS.PDF");
        fs::create_dir_all(&leaf).expect("Failed to create leaf");
        fs::write(leaf.join("report.pdf"), "old").expect("Failed to write file");

        let file_path = root.join("report.pdf");
        fs::write(&file_path, "new").expect("Failed to write file");

        let (record, _) = FileOrganizer::default()
            .move_file(&file_path, &root.join("Arquivos"))
            .expect("Failed to move file");

        assert!(record.renamed);
        assert_eq!(record.to, leaf.join("report_1.pdf"));
        assert_eq!(fs::read_to_string(leaf.join("report.pdf")).unwrap(), "old");
        assert_eq!(fs::read_to_string(leaf.join("report_1.pdf")).unwrap(), "new");
    }

    #[test]
    fn test_relocate_folder_suffixes_by_default() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let relocated = root.join("Pastas_Organizadas");
        fs::create_dir_all(relocated.join("Old")).expect("Failed to create directory");
        fs::create_dir(root.join("Old")).expect("Failed to create directory");
        fs::write(root.join("Old/keep.txt"), "keep").expect("Failed to write file");

        let record = FileOrganizer::default()
            .relocate_folder(&root.join("Old"), &relocated)
            .expect("Failed to relocate folder");

        assert_eq!(record.to, relocated.join("Old_1"));
        assert!(relocated.join("Old_1/keep.txt").exists());
    }

    #[test]
    fn test_relocate_folder_fail_policy_leaves_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let relocated = root.join("Pastas_Organizadas");
        fs::create_dir_all(relocated.join("Old")).expect("Failed to create directory");
        fs::create_dir(root.join("Old")).expect("Failed to create directory");

        let organizer = FileOrganizer::new(
            DestinationResolver::default(),
            FolderCollisionPolicy::Fail,
        );
        let result = organizer.relocate_folder(&root.join("Old"), &relocated);

        assert!(matches!(result, Err(OrganizeError::FolderExists { .. })));
        assert!(root.join("Old").exists());
    }

    #[test]
    fn test_execute_continues_after_failure() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("a.jpg"), "a").expect("Failed to write file");
        fs::write(root.join("b.pdf"), "b").expect("Failed to write file");

        let organizer = FileOrganizer::default();
        let plan = organizer.plan(root).expect("Failed to plan");

        // Vanishes between snapshot and execution
        fs::remove_file(root.join("a.jpg")).expect("Failed to remove file");

        let report = organizer.execute(&plan, &mut NoProgress);
        assert_eq!(report.total, 2);
        assert_eq!(report.processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, root.join("a.jpg"));
        assert_eq!(report.moved_by_category.get("Documentos"), Some(&1));
        assert_eq!(report.moved_by_category.get("Fotos"), None);
        assert!(root.join("Arquivos/Documentos/DOCUMENTOS.PDF/b.pdf").exists());
    }
}
