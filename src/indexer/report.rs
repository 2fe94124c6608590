use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::path::Path;

const BANNER_WIDTH: usize = 60;

/// What happened to one candidate file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Indexed { sheets: usize },
    Failed { error: String },
}

/// Outcome of one candidate file, rendered as a report detail line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileStatus {
    pub file_name: String,
    pub outcome: FileOutcome,
}

impl FileStatus {
    pub fn indexed(file_name: impl Into<String>, sheets: usize) -> FileStatus {
        FileStatus { file_name: file_name.into(), outcome: FileOutcome::Indexed { sheets } }
    }

    pub fn failed(file_name: impl Into<String>, error: impl Display) -> FileStatus {
        FileStatus { file_name: file_name.into(), outcome: FileOutcome::Failed { error: error.to_string() } }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FileOutcome::Indexed { .. })
    }
}

impl Display for FileStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            FileOutcome::Indexed { sheets } => write!(f, "✅ {}: {} sheets indexed", self.file_name, sheets),
            FileOutcome::Failed { error } => write!(f, "❌ Error reading {}: {}", self.file_name, error),
        }
    }
}

/// Aggregate result of one run.
///
/// `processed + errors` always equals the number of files attempted, and
/// `details` holds one status per attempted file in enumeration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub processed: usize,
    pub errors: usize,
    pub details: Vec<FileStatus>,
    /// Set when the run stopped before every candidate was attempted
    pub cancelled: bool,
}

impl RunReport {
    pub(crate) fn record(&mut self, status: FileStatus) {
        if status.is_success() {
            self.processed += 1;
        } else {
            self.errors += 1;
        }
        self.details.push(status);
    }

    pub fn attempted(&self) -> usize {
        self.processed + self.errors
    }

    pub fn detail_lines(&self) -> Vec<String> {
        self.details.iter().map(ToString::to_string).collect()
    }
}

/// Final text block shown once a run completes
pub struct Summary<'a> {
    pub report: &'a RunReport,
    /// Where the index was written, `None` when nothing was written
    pub output: Option<&'a Path>,
}

impl Display for Summary<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let banner = "=".repeat(BANNER_WIDTH);
        writeln!(f, "{banner}")?;
        writeln!(f, "📊 PROCESS REPORT")?;
        writeln!(f, "{banner}")?;
        writeln!(f, "Total files processed successfully: {}", self.report.processed)?;
        writeln!(f, "Total files with errors: {}", self.report.errors)?;
        if self.report.cancelled {
            writeln!(f, "Run cancelled after {} files", self.report.attempted())?;
        }
        match self.output {
            Some(path) => writeln!(f, "Output file created at: {}", path.display())?,
            None => writeln!(f, "Output file was not written")?,
        }
        writeln!(f)?;
        writeln!(f, "Detailed log:")?;
        for line in self.report.detail_lines() {
            writeln!(f, " - {line}")?;
        }
        write!(f, "{banner}")
    }
}
