//! Per-item outcomes and the progress hook shared by every batch operation.

use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// An item the batch could not handle, with the reason as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(path: &Path, reason: impl Display) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// A completed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub from: PathBuf,
    pub to: PathBuf,
    /// True when the destination name was suffixed to avoid a clash.
    pub renamed: bool,
}

/// Receives `(processed, total)` after every item of a batch.
pub trait ProgressSink {
    fn advance(&mut self, processed: usize, total: usize);

    /// Called once when the batch is over.
    fn finish(&mut self) {}
}

/// Discards progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn advance(&mut self, _processed: usize, _total: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Vec<(usize, usize)>);

    impl ProgressSink for Recorder {
        fn advance(&mut self, processed: usize, total: usize) {
            self.0.push((processed, total));
        }
    }

    #[test]
    fn test_item_failure_keeps_reason_text() {
        let failure = ItemFailure::new(Path::new("/dl/a.jpg"), "permission denied");
        assert_eq!(failure.path, PathBuf::from("/dl/a.jpg"));
        assert_eq!(failure.reason, "permission denied");
    }

    #[test]
    fn test_progress_sink_trait_object() {
        let mut recorder = Recorder(Vec::new());
        {
            let sink: &mut dyn ProgressSink = &mut recorder;
            sink.advance(1, 2);
            sink.advance(2, 2);
            sink.finish();
        }
        assert_eq!(recorder.0, vec![(1, 2), (2, 2)]);
    }
}
