//! Filing loose files by modification date into
//! `Organizado_Por_Data/<YYYY>/<MM - Month>/`.
//!
//! Only regular files directly in the watched root are eligible. Subfolders,
//! including the organizer's own, are left alone.

use crate::collision::resolve_path;
use crate::file_organizer::{
    MoveItem, OrganizeError, OrganizeResult, ensure_dir, list_root, move_entry,
};
use crate::layout;
use crate::report::{ItemFailure, MoveRecord, ProgressSink};
use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Year and month folder names derived from a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonthBucket {
    /// Four-digit year, e.g. `2024`.
    pub year: String,
    /// Two-digit month and English month name, e.g. `06 - June`.
    pub month: String,
}

impl YearMonthBucket {
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use downtidy::date_bucket::YearMonthBucket;
    ///
    /// let when = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    /// let bucket = YearMonthBucket::from_datetime(&when);
    /// assert_eq!(bucket.year, "2024");
    /// assert_eq!(bucket.month, "06 - June");
    /// ```
    pub fn from_datetime<Tz: TimeZone>(when: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self {
            year: when.format("%Y").to_string(),
            month: when.format("%m - %B").to_string(),
        }
    }

    /// Buckets a filesystem timestamp in local time.
    ///
    /// Returns `None` for timestamps chrono cannot represent.
    pub fn from_system_time(time: SystemTime) -> Option<Self> {
        let local = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => {
                let secs = i64::try_from(after.as_secs()).ok()?;
                Local.timestamp_opt(secs, after.subsec_nanos())
            }
            Err(e) => {
                let before = e.duration();
                let secs = i64::try_from(before.as_secs()).ok()?;
                match before.subsec_nanos() {
                    0 => Local.timestamp_opt(-secs, 0),
                    nanos => Local.timestamp_opt(-secs - 1, 1_000_000_000 - nanos),
                }
            }
        };
        local.earliest().map(|when| Self::from_datetime(&when))
    }

    /// `<YYYY>/<MM - Month>` relative to the date root.
    pub fn relative_dir(&self) -> PathBuf {
        Path::new(&self.year).join(&self.month)
    }
}

impl fmt::Display for YearMonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.month)
    }
}

/// Reads the last-modified time of `file_path` and buckets it.
pub fn resolve_by_date(file_path: &Path) -> OrganizeResult<YearMonthBucket> {
    let modified = fs::metadata(file_path)
        .and_then(|metadata| metadata.modified())
        .map_err(|e| OrganizeError::MetadataFailed {
            path: file_path.to_path_buf(),
            source: e,
        })?;
    YearMonthBucket::from_system_time(modified).ok_or_else(|| {
        OrganizeError::TimestampOutOfRange {
            path: file_path.to_path_buf(),
        }
    })
}

#[derive(Debug, Clone)]
pub struct DatePlan {
    pub root: PathBuf,
    pub files: Vec<MoveItem>,
    /// Root entries that could not be inspected.
    pub errors: Vec<ItemFailure>,
}

impl DatePlan {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DateReport {
    pub total: usize,
    pub processed: usize,
    /// Successful moves per `<YYYY>/<MM - Month>` key.
    pub moved_by_bucket: BTreeMap<String, usize>,
    pub moves: Vec<MoveRecord>,
    pub failures: Vec<ItemFailure>,
}

impl DateReport {
    pub fn files_moved(&self) -> usize {
        self.moved_by_bucket.values().sum()
    }
}

/// Organizes loose files by modification date.
pub struct DateOrganizer;

impl DateOrganizer {
    pub fn plan(root: &Path) -> OrganizeResult<DatePlan> {
        let listing = list_root(root)?;
        Ok(DatePlan {
            root: root.to_path_buf(),
            files: listing.files,
            errors: listing.errors,
        })
    }

    pub fn execute(plan: &DatePlan, progress: &mut dyn ProgressSink) -> DateReport {
        let total = plan.files.len();
        let mut report = DateReport {
            total,
            ..Default::default()
        };
        let date_root = layout::date_root(&plan.root);

        for file in &plan.files {
            match Self::move_file(&file.path, &date_root) {
                Ok((record, bucket)) => {
                    tracing::info!(from = %record.from.display(), to = %record.to.display(), %bucket, "moved file by date");
                    *report.moved_by_bucket.entry(bucket.to_string()).or_insert(0) += 1;
                    report.moves.push(record);
                }
                Err(e) => {
                    tracing::warn!(file = %file.path.display(), error = %e, "file not moved by date");
                    report.failures.push(ItemFailure::new(&file.path, &e));
                }
            }
            report.processed += 1;
            progress.advance(report.processed, total);
        }

        progress.finish();
        report
    }

    /// Moves one file into its year/month folder under `date_root`.
    pub fn move_file(
        file_path: &Path,
        date_root: &Path,
    ) -> OrganizeResult<(MoveRecord, YearMonthBucket)> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::NoFileName {
                path: file_path.to_path_buf(),
            })?;

        let bucket = resolve_by_date(file_path)?;
        let bucket_dir = date_root.join(bucket.relative_dir());
        ensure_dir(&bucket_dir)?;

        let desired = bucket_dir.join(file_name);
        let target = resolve_path(&desired);
        move_entry(file_path, &target)?;

        Ok((
            MoveRecord {
                from: file_path.to_path_buf(),
                renamed: target != desired,
                to: target,
            },
            bucket,
        ))
    }
}
