//! Non-clobbering destination names.
//!
//! When a destination is taken, `name.ext` becomes `name_1.ext`, `name_2.ext`,
//! and so on. Availability is always checked against the filesystem, so two
//! items of one batch that want the same name get consecutive suffixes in
//! processing order.

use crate::file_category::split_extension;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Returns `desired` if nothing exists there, otherwise the first free
/// `<stem>_<n><ext>` sibling with `n >= 1`.
///
/// # Examples
///
/// ```no_run
/// use downtidy::collision::resolve_path;
/// use std::path::Path;
///
/// // With report.pdf already present this yields report_1.pdf
/// let target = resolve_path(Path::new("/dl/Arquivos/Documentos/DOCUMENTOS.PDF/report.pdf"));
/// println!("{}", target.display());
/// ```
pub fn resolve_path(desired: &Path) -> PathBuf {
    if !exists(desired) {
        return desired.to_path_buf();
    }

    let (stem, ext) = split_name(desired.file_name().unwrap_or_default());
    first_free(desired, |n| {
        let mut candidate = stem.clone();
        candidate.push(format!("_{}", n));
        candidate.push(&ext);
        candidate
    })
}

/// Like [`resolve_path`] but suffixes the whole name, for relocated folders.
///
/// `Old.Stuff` becomes `Old.Stuff_1` rather than `Old_1.Stuff`.
pub fn resolve_dir_path(desired: &Path) -> PathBuf {
    if !exists(desired) {
        return desired.to_path_buf();
    }

    let name = desired.file_name().unwrap_or_default();
    first_free(desired, |n| {
        let mut candidate = name.to_os_string();
        candidate.push(format!("_{}", n));
        candidate
    })
}

fn first_free(desired: &Path, candidate_name: impl Fn(u64) -> OsString) -> PathBuf {
    let mut n: u64 = 1;
    loop {
        let candidate = desired.with_file_name(candidate_name(n));
        if !exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Splits a name into stem and dotted extension without touching its bytes.
fn split_name(name: &OsStr) -> (OsString, OsString) {
    if let Some(name) = name.to_str() {
        let (stem, ext) = split_extension(name);
        return (stem.into(), ext.into());
    }

    // Not UTF-8: fall back to std's split, which keeps the raw bytes.
    let path = Path::new(name);
    let stem = path.file_stem().unwrap_or(name).to_os_string();
    let ext = match path.extension() {
        Some(ext) => {
            let mut dotted = OsString::from(".");
            dotted.push(ext);
            dotted
        }
        None => OsString::new(),
    };
    (stem, ext)
}

// Broken symlinks occupy the name too, so check the link itself.
fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
