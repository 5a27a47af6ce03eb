//! Names of the directories the organizer owns inside the watched root.
//!
//! These path segments are the on-disk contract other tooling reads:
//!
//! ```text
//! <root>/Arquivos/<Category>/<Category><EXT>/<file>
//! <root>/Pastas_Organizadas/<folder>/...
//! <root>/Organizado_Por_Data/<YYYY>/<MM - Month>/<file>
//! ```

use std::path::{Path, PathBuf};

/// Top-level folder holding every category folder.
pub const ARCHIVE_DIR: &str = "Arquivos";

/// Top-level folder receiving relocated subfolders.
pub const RELOCATED_DIR: &str = "Pastas_Organizadas";

/// Top-level folder holding the year/month buckets.
pub const DATE_DIR: &str = "Organizado_Por_Data";

/// All top-level folders owned by the organizer.
pub const ORGANIZER_DIRS: [&str; 3] = [ARCHIVE_DIR, RELOCATED_DIR, DATE_DIR];

/// Returns true if `name` is one of the organizer-owned top-level folders.
pub fn is_organizer_dir(name: &str) -> bool {
    ORGANIZER_DIRS.contains(&name)
}

/// Returns true for names the listing skips (dotfiles).
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

pub fn archive_root(root: &Path) -> PathBuf {
    root.join(ARCHIVE_DIR)
}

pub fn relocated_root(root: &Path) -> PathBuf {
    root.join(RELOCATED_DIR)
}

pub fn date_root(root: &Path) -> PathBuf {
    root.join(DATE_DIR)
}
