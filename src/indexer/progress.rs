use crate::indexer::FileStatus;

/// Notification emitted by [`crate::IndexBuilder::build_with_progress`], in run order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Candidates were enumerated
    Started { total: usize },
    /// File `position` of `total` (1-based) is about to be read
    FileStarted { position: usize, total: usize, file_name: String },
    /// File `position` of `total` was indexed or failed
    FileFinished { position: usize, total: usize, status: FileStatus },
    Finished { processed: usize, errors: usize, cancelled: bool },
}

impl ProgressEvent {
    /// Completed share of the run in `0.0..=1.0`; a run without candidates is complete from the start
    pub fn fraction(&self) -> f64 {
        let (done, total) = match self {
            ProgressEvent::Started { total } => (0, *total),
            ProgressEvent::FileStarted { position, total, .. } => (position.saturating_sub(1), *total),
            ProgressEvent::FileFinished { position, total, .. } => (*position, *total),
            ProgressEvent::Finished { .. } => return 1.0,
        };
        if total == 0 {
            1.0
        } else {
            (done as f64 / total as f64).min(1.0)
        }
    }
}
