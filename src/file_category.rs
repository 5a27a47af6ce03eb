//! Extension-based categorization and destination resolution.
//!
//! A file is placed by its extension into `<archive>/<Category>/<Category><EXT>/`.
//! The mapping lives in an immutable [`CategoryTable`]; anything the table
//! does not know lands in the [`FALLBACK_CATEGORY`].
//!
//! # Examples
//!
//! ```
//! use downtidy::file_category::{CategoryTable, DestinationResolver};
//! use std::path::Path;
//!
//! let resolver = DestinationResolver::new(CategoryTable::default());
//! let plan = resolver.resolve("a.jpg", Path::new("/dl/Arquivos"));
//! assert_eq!(plan.category, "Fotos");
//! assert_eq!(plan.leaf_dir, Path::new("/dl/Arquivos/Fotos/FOTOS.JPG"));
//! ```
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Label used for every extension the table does not map.
pub const FALLBACK_CATEGORY: &str = "Diversos";

/// Maps lower-cased extensions (with their leading dot) to category labels.
///
/// Lookup is total: unknown extensions resolve to [`FALLBACK_CATEGORY`].
#[derive(Debug, Clone)]
pub struct CategoryTable {
    extension_map: HashMap<String, String>,
}

impl CategoryTable {
    /// Creates a table with the standard download categories.
    pub fn new() -> Self {
        let mut table = Self::empty();
        table.populate_standard_mappings();
        table
    }

    /// Creates a table with no mappings; every extension falls back.
    pub fn empty() -> Self {
        Self {
            extension_map: HashMap::new(),
        }
    }

    fn populate_standard_mappings(&mut self) {
        for ext in [
            ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".tiff", ".tif", ".heic",
        ] {
            self.add_extension_mapping(ext, "Fotos");
        }

        for ext in [
            ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm", ".3gp",
        ] {
            self.add_extension_mapping(ext, "Videos");
        }

        for ext in [
            ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".rtf", ".odt",
            ".ods", ".odp", ".csv", ".md",
        ] {
            self.add_extension_mapping(ext, "Documentos");
        }

        for ext in [".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a"] {
            self.add_extension_mapping(ext, "Audio");
        }

        // Compressed archives, installers and disk images
        for ext in [
            ".zip", ".rar", ".7z", ".exe", ".apk", ".iso", ".tar", ".gz", ".tgz", ".bz2", ".xz",
            ".msi", ".dmg",
        ] {
            self.add_extension_mapping(ext, "Arquivos_Comuns");
        }
    }

    /// Adds an extension to category mapping. A missing leading dot is added.
    pub fn add_extension_mapping(&mut self, ext: &str, category: &str) {
        let ext = ext.to_lowercase();
        let key = if ext.starts_with('.') {
            ext
        } else {
            format!(".{}", ext)
        };
        self.extension_map.insert(key, category.to_string());
    }

    /// Returns the category label for an extension such as `".JPG"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use downtidy::file_category::CategoryTable;
    ///
    /// let table = CategoryTable::default();
    /// assert_eq!(table.category_for(".PDF"), "Documentos");
    /// assert_eq!(table.category_for(".xyz"), "Diversos");
    /// assert_eq!(table.category_for(""), "Diversos");
    /// ```
    pub fn category_for(&self, ext: &str) -> &str {
        self.extension_map
            .get(&ext.to_lowercase())
            .map(String::as_str)
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// Distinct category labels known to the table, sorted.
    pub fn labels(&self) -> Vec<&str> {
        self.extension_map
            .values()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Extensions mapped to `label`, sorted.
    pub fn extensions_for(&self, label: &str) -> Vec<&str> {
        let mut exts: Vec<&str> = self
            .extension_map
            .iter()
            .filter(|(_, category)| category.as_str() == label)
            .map(|(ext, _)| ext.as_str())
            .collect();
        exts.sort_unstable();
        exts
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a file name into `(stem, extension)`.
///
/// The extension runs from the last dot to the end of the name and keeps
/// its dot. Dots leading the name never start an extension, so `".bashrc"`
/// and `"."` have none.
///
/// # Examples
///
/// ```
/// use downtidy::file_category::split_extension;
///
/// assert_eq!(split_extension("report.final.pdf"), ("report.final", ".pdf"));
/// assert_eq!(split_extension("README"), ("README", ""));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// ```
pub fn split_extension(file_name: &str) -> (&str, &str) {
    let leading_dots = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name[leading_dots..].rfind('.') {
        Some(idx) => file_name.split_at(leading_dots + idx),
        None => (file_name, ""),
    }
}

/// Name of the innermost folder for a category and extension.
///
/// The whole name is upper-cased: `Fotos` + `.jpg` gives `FOTOS.JPG`.
pub fn leaf_folder_name(category: &str, ext: &str) -> String {
    format!("{}{}", category, ext).to_uppercase()
}

/// Where a single file should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPlan {
    /// `<archive>/<Category>`
    pub category_dir: PathBuf,
    /// `<archive>/<Category>/<Category><EXT>`
    pub leaf_dir: PathBuf,
    /// The category label.
    pub category: String,
}

/// Computes destinations from file names using an injected [`CategoryTable`].
#[derive(Debug, Clone, Default)]
pub struct DestinationResolver {
    table: CategoryTable,
}

impl DestinationResolver {
    pub fn new(table: CategoryTable) -> Self {
        Self { table }
    }

    /// Resolves the destination folders for `file_name` under `archive_root`.
    ///
    /// Pure and total: the same inputs always give the same plan, and every
    /// string (including `""` and `"."`) resolves.
    pub fn resolve(&self, file_name: &str, archive_root: &Path) -> DestinationPlan {
        let (_, ext) = split_extension(file_name);
        let ext = ext.to_lowercase();
        let category = self.table.category_for(&ext).to_string();

        let category_dir = archive_root.join(&category);
        let leaf_dir = category_dir.join(leaf_folder_name(&category, &ext));

        DestinationPlan {
            category_dir,
            leaf_dir,
            category,
        }
    }
}
