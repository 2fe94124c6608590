use crate::error::MasterIndexError;
use crate::indexer::link::link_location;
use crate::indexer::scan::scan_candidates;
use crate::indexer::CandidateFile;
use crate::indexer::FileStatus;
use crate::indexer::IndexOptions;
use crate::indexer::MasterIndex;
use crate::indexer::ProgressEvent;
use crate::indexer::RunReport;
use crate::indexer::SheetEntry;
use crate::indexer::LINK_LOCATION_LIMIT;
use crate::spreadsheet::NativeSheetReader;
use crate::spreadsheet::SheetReader;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Rows and report of one completed run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexRun {
    pub index: MasterIndex,
    pub report: RunReport,
}

/// Builds a master index from the workbooks of one directory.
///
/// Files are read one at a time in file name order. A file that cannot be read
/// contributes no rows and a failure line to the report; only an unreadable
/// directory fails the run.
///
/// ```no_run
/// use master_index::IndexBuilder;
/// use std::path::Path;
///
/// let run = IndexBuilder::new().build(Path::new("reports"))?;
/// for line in run.report.detail_lines() {
///     println!("{line}");
/// }
/// # Ok::<(), master_index::MasterIndexError>(())
/// ```
pub struct IndexBuilder<R = NativeSheetReader> {
    options: IndexOptions,
    reader: R,
    cancel: Option<Arc<AtomicBool>>,
}

impl IndexBuilder<NativeSheetReader> {
    pub fn new() -> Self {
        IndexBuilder::with_reader(NativeSheetReader)
    }
}

impl Default for IndexBuilder<NativeSheetReader> {
    fn default() -> Self {
        IndexBuilder::new()
    }
}

impl<R: SheetReader> IndexBuilder<R> {
    /// Uses `reader` instead of the built-in workbook parsers
    pub fn with_reader(reader: R) -> Self {
        IndexBuilder {
            options: IndexOptions::default(),
            reader,
            cancel: None,
        }
    }

    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    /// Stops the run before the next file once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Candidate workbooks of `directory`, in the order they will be read
    pub fn candidates(&self, directory: &Path) -> Result<Vec<CandidateFile>, MasterIndexError> {
        scan_candidates(directory, &self.options)
    }

    pub fn build(&self, directory: &Path) -> Result<IndexRun, MasterIndexError> {
        self.build_with_progress(directory, |_| ())
    }

    /// Builds the index, reporting every step to `on_event` as it happens
    pub fn build_with_progress<F>(&self, directory: &Path, mut on_event: F) -> Result<IndexRun, MasterIndexError>
    where
        F: FnMut(ProgressEvent),
    {
        let candidates = self.candidates(directory)?;
        let total = candidates.len();
        info!(directory = %directory.display(), files = total, "building master index");
        on_event(ProgressEvent::Started { total });

        let mut run = IndexRun::default();
        for (offset, candidate) in candidates.iter().enumerate() {
            if self.is_cancelled() {
                info!(attempted = offset, files = total, "index run cancelled");
                run.report.cancelled = true;
                break;
            }
            let position = offset + 1;
            on_event(ProgressEvent::FileStarted {
                position,
                total,
                file_name: candidate.file_name.clone(),
            });
            let status = self.index_file(candidate, &mut run.index.rows);
            run.report.record(status.clone());
            on_event(ProgressEvent::FileFinished { position, total, status });
        }

        let RunReport { processed, errors, cancelled, .. } = run.report;
        info!(processed, errors, rows = run.index.rows.len(), "master index built");
        on_event(ProgressEvent::Finished { processed, errors, cancelled });
        Ok(run)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|flag| flag.load(Ordering::SeqCst)).unwrap_or(false)
    }

    /// Appends the rows of one file; rows are only added once all sheet names were read
    fn index_file(&self, candidate: &CandidateFile, rows: &mut Vec<SheetEntry>) -> FileStatus {
        debug!(file = %candidate.path.display(), "reading sheet names");
        match self.reader.sheet_names(&candidate.path) {
            Ok(sheet_names) => {
                let path = candidate.path.to_string_lossy();
                for sheet_name in &sheet_names {
                    let length = link_location(&path, sheet_name).chars().count();
                    if length > LINK_LOCATION_LIMIT {
                        warn!(file = %candidate.file_name, sheet = %sheet_name, length, "link target may be too long to follow");
                    }
                    rows.push(SheetEntry::new(candidate, sheet_name));
                }
                info!(file = %candidate.file_name, sheets = sheet_names.len(), "indexed");
                FileStatus::indexed(&candidate.file_name, sheet_names.len())
            }
            Err(error) => {
                warn!(file = %candidate.file_name, %error, "failed to read workbook");
                FileStatus::failed(&candidate.file_name, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::FileOutcome;
    use crate::indexer::OUTPUT_FILE_NAME;
    use crate::spreadsheet::SpreadsheetError;
    use crate::test_support::{encrypted_package_bytes, write_bytes, write_xls, write_xlsb, write_xlsx};
    use std::fs;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    #[test]
    fn test_good_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        write_xlsx(dir.path(), "A.xlsx", &["Sheet1", "Data"]);
        write_bytes(dir.path(), "B.xlsx", b"this is not a workbook");

        let run = IndexBuilder::new().build(dir.path()).unwrap();
        let rows: Vec<(&str, &str)> = run.index.rows.iter()
            .map(|row| (row.file_name.as_str(), row.sheet_name.as_str()))
            .collect();
        assert_eq!(rows, vec![("A.xlsx", "Sheet1"), ("A.xlsx", "Data")]);
        assert_eq!((run.report.processed, run.report.errors), (1, 1));

        let lines = run.report.detail_lines();
        assert_eq!(lines[0], "✅ A.xlsx: 2 sheets indexed");
        assert!(lines[1].starts_with("❌ Error reading B.xlsx: "), "{}", lines[1]);
        assert!(!run.report.cancelled);
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let mut events = Vec::new();
        let run = IndexBuilder::new().build_with_progress(dir.path(), |event| events.push(event)).unwrap();
        assert!(run.index.rows.is_empty());
        assert_eq!(run.report, RunReport::default());
        assert_eq!(events, vec![
            ProgressEvent::Started { total: 0 },
            ProgressEvent::Finished { processed: 0, errors: 0, cancelled: false },
        ]);
        assert!(events.iter().all(|event| event.fraction() == 1.0));
    }

    #[test]
    fn test_every_format_in_file_order() {
        let dir = TempDir::new().unwrap();
        write_xlsx(dir.path(), "c.xlsx", &["Gamma"]);
        write_xls(dir.path(), "a.xls", &["Alpha 1", "Alpha 2"]);
        write_xlsb(dir.path(), "b.xlsb", &["Beta"]);
        write_bytes(dir.path(), "d.xlsx", &encrypted_package_bytes());
        // Output of an earlier run is never indexed
        write_xlsx(dir.path(), OUTPUT_FILE_NAME, &["Master Index"]);

        let run = IndexBuilder::new().build(dir.path()).unwrap();
        let sheets: Vec<&str> = run.index.rows.iter().map(|row| row.sheet_name.as_str()).collect();
        assert_eq!(sheets, vec!["Alpha 1", "Alpha 2", "Beta", "Gamma"]);
        assert_eq!((run.report.processed, run.report.errors), (3, 1));
        assert_eq!(run.report.details[3].outcome, FileOutcome::Failed {
            error: SpreadsheetError::SpreadsheetPasswordProtectedError.to_string(),
        });

        let root = dunce::canonicalize(dir.path()).unwrap();
        let expected = crate::indexer::link_formula(&root.join("a.xls").to_string_lossy(), "Alpha 1");
        assert_eq!(run.index.rows[0].link_formula, expected);
    }

    #[test]
    fn test_links_use_resolved_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_xlsx(dir.path(), "A.xlsx", &["One"]);

        let run = IndexBuilder::new().build(&dir.path().join("sub").join("..")).unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        let expected = crate::indexer::link_formula(&root.join("A.xlsx").to_string_lossy(), "One");
        assert_eq!(run.index.rows[0].link_formula, expected);
        assert!(!run.index.rows[0].link_formula.contains(".."));
    }

    #[test]
    fn test_rerun_is_stable() {
        let dir = TempDir::new().unwrap();
        write_xlsx(dir.path(), "A.xlsx", &["One", "Two"]);
        let builder = IndexBuilder::new();
        let first = builder.build(dir.path()).unwrap();
        write_xlsx(dir.path(), OUTPUT_FILE_NAME, &["Master Index"]);
        let second = builder.build(dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_injected_failures_do_not_stop_the_run() {
        let dir = TempDir::new().unwrap();
        for name in ["1.xlsx", "2.xlsx", "3.xlsx"] {
            write_bytes(dir.path(), name, b"");
        }
        let reader = |path: &Path| -> Result<Vec<String>, MasterIndexError> {
            match path.file_name().and_then(|name| name.to_str()) {
                Some("2.xlsx") => Err(SpreadsheetError::SpreadsheetEmptyError.into()),
                Some(name) => Ok(vec![format!("{name} sheet")]),
                None => Ok(Vec::new()),
            }
        };
        let run = IndexBuilder::with_reader(reader).build(dir.path()).unwrap();
        assert_eq!(run.index.rows.len(), 2);
        assert_eq!(run.report.attempted(), 3);
        assert_eq!(run.report.detail_lines()[1], "❌ Error reading 2.xlsx: Workbook contains no sheets");
        assert!(run.index.rows.iter().all(|row| row.file_name != "2.xlsx"));
    }

    #[test]
    fn test_progress_events_follow_file_order() {
        let dir = TempDir::new().unwrap();
        write_xlsx(dir.path(), "B.xlsx", &["S"]);
        write_xlsx(dir.path(), "A.xlsx", &["S"]);
        let mut events = Vec::new();
        IndexBuilder::new().build_with_progress(dir.path(), |event| events.push(event)).unwrap();

        assert_eq!(events.len(), 6);
        assert_eq!(events[0], ProgressEvent::Started { total: 2 });
        assert_eq!(events[1], ProgressEvent::FileStarted { position: 1, total: 2, file_name: "A.xlsx".into() });
        assert!(matches!(&events[2], ProgressEvent::FileFinished { position: 1, status, .. } if status.file_name == "A.xlsx"));
        assert_eq!(events[3], ProgressEvent::FileStarted { position: 2, total: 2, file_name: "B.xlsx".into() });
        assert_eq!(events[4].fraction(), 1.0);
        assert_eq!(events[5], ProgressEvent::Finished { processed: 2, errors: 0, cancelled: false });
    }

    #[test]
    fn test_cancel_between_files() {
        let dir = TempDir::new().unwrap();
        for name in ["1.xlsx", "2.xlsx", "3.xlsx"] {
            write_bytes(dir.path(), name, b"");
        }
        let flag = Arc::new(AtomicBool::new(false));
        let reads = AtomicUsize::new(0);
        let reader = |_: &Path| -> Result<Vec<String>, MasterIndexError> {
            reads.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["S".to_owned()])
        };
        let builder = IndexBuilder::with_reader(reader).with_cancel_flag(flag.clone());
        let run = builder.build_with_progress(dir.path(), |event| {
            if let ProgressEvent::FileFinished { position: 1, .. } = event {
                flag.store(true, Ordering::SeqCst);
            }
        }).unwrap();

        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert!(run.report.cancelled);
        assert_eq!(run.report.attempted(), 1);
        assert_eq!(run.index.rows.len(), 1);
    }

    #[test]
    fn test_unreadable_directory_fails_the_run() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let mut events = 0;
        let result = IndexBuilder::new().build_with_progress(&missing, |_| events += 1);
        assert!(matches!(result, Err(MasterIndexError::DirectoryAccess { .. })));
        assert_eq!(events, 0);
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
