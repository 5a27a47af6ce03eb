//! Which directories belong to the organizer and must survive pruning.
//!
//! Protection is decided by structural rule, not by listing every
//! category and extension: a directory is protected when its path relative
//! to the watched root matches one of [`STRUCTURAL_RULES`]. This also covers
//! leaf folders for extensions the category table has never seen.

use crate::file_category::{CategoryTable, FALLBACK_CATEGORY, leaf_folder_name};
use crate::layout::{self, ARCHIVE_DIR, DATE_DIR, RELOCATED_DIR};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Glob rules, relative to the watched root, for organizer-owned directories.
pub const STRUCTURAL_RULES: [&str; 5] = [
    ARCHIVE_DIR,
    "Arquivos/*",
    "Arquivos/*/*",
    RELOCATED_DIR,
    DATE_DIR,
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Organizer-owned directories of one watched root.
#[derive(Debug, Clone)]
pub struct ProtectionSet {
    root: PathBuf,
    rules: Vec<Pattern>,
    members: BTreeSet<PathBuf>,
}

impl ProtectionSet {
    /// Builds the set for `root` from the structural rules and the table.
    ///
    /// # Examples
    ///
    /// ```
    /// use downtidy::file_category::CategoryTable;
    /// use downtidy::protection::ProtectionSet;
    /// use std::path::Path;
    ///
    /// let set = ProtectionSet::build(&CategoryTable::default(), Path::new("/dl"));
    /// assert!(set.is_protected(Path::new("/dl/Arquivos/Fotos/FOTOS.JPG")));
    /// assert!(set.is_protected(Path::new("/dl/Arquivos/Diversos/DIVERSOS.NEW")));
    /// assert!(!set.is_protected(Path::new("/dl/Organizado_Por_Data/2024")));
    /// assert!(!set.is_protected(Path::new("/dl/OldStuff")));
    /// ```
    pub fn build(table: &CategoryTable, root: &Path) -> Self {
        let rules = STRUCTURAL_RULES
            .iter()
            .map(|rule| Pattern::new(rule).expect("structural rule is a valid glob"))
            .collect();

        let archive_root = layout::archive_root(root);
        let mut members = BTreeSet::new();
        members.insert(archive_root.clone());
        members.insert(layout::relocated_root(root));
        members.insert(layout::date_root(root));

        for label in table.labels() {
            let category_dir = archive_root.join(label);
            for ext in table.extensions_for(label) {
                members.insert(category_dir.join(leaf_folder_name(label, ext)));
            }
            members.insert(category_dir);
        }
        members.insert(archive_root.join(FALLBACK_CATEGORY));

        Self {
            root: root.to_path_buf(),
            rules,
            members,
        }
    }

    /// Returns true if `path` must never be pruned.
    ///
    /// The watched root itself is protected; paths outside it are not.
    pub fn is_protected(&self, path: &Path) -> bool {
        if self.members.contains(path) {
            return true;
        }

        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            return true;
        }

        self.rules
            .iter()
            .any(|rule| rule.matches_path_with(relative, MATCH_OPTIONS))
    }

    /// Directories derivable from the category table, sorted.
    pub fn members(&self) -> impl Iterator<Item = &Path> {
        self.members.iter().map(PathBuf::as_path)
    }
}
