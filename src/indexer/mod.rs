//! # Master Index Builder
//!
//! Turns a directory of workbooks into one row per (file, sheet) pair, each with
//! a `HYPERLINK` formula that opens the sheet at cell A1, plus a run report of
//! per-file outcomes.
//!
//! - [`IndexBuilder`] scans the directory and reads sheet names file by file
//! - [`MasterIndex`] holds the rows and writes them as the index workbook
//! - [`RunReport`] and [`Summary`] describe what happened to every file
//! - [`ProgressEvent`] streams the run to a hosting shell
mod builder;
mod link;
mod output;
mod progress;
mod report;
mod scan;

pub use builder::IndexBuilder;
pub use builder::IndexRun;
pub use link::link_formula;
pub use link::sheet_reference;
pub use link::LINK_LABEL;
pub use link::LINK_LOCATION_LIMIT;
pub use output::save_with_fallback;
pub use output::SavedIndex;
pub use progress::ProgressEvent;
pub use report::FileOutcome;
pub use report::FileStatus;
pub use report::RunReport;
pub use report::Summary;

use crate::error::MasterIndexError;
use glob::MatchOptions;
use glob::Pattern;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

/// File name of the generated index, excluded from scanning
pub const OUTPUT_FILE_NAME: &str = "Master_Index.xlsx";

/// Name of the single sheet of the generated index
pub const OUTPUT_SHEET_NAME: &str = "Master Index";

/// Header labels of the generated index
pub const HEADERS: [&str; 3] = ["File Name", "Sheet Name", "Link Formula"];

/// Characters added to the widest value of each column
pub const WIDTH_PADDING: usize = 3;

/// Extension pattern of candidate workbooks
pub const DEFAULT_EXTENSION_PATTERN: &str = "xls*";

static DEFAULT_PATTERN: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new(DEFAULT_EXTENSION_PATTERN).expect("Hardcode glob pattern"));

/// A workbook selected for indexing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateFile {
    pub file_name: String,
    /// Absolute path of the file, with `..` and links in the directory resolved
    pub path: PathBuf,
}

/// One row of the master index
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetEntry {
    pub file_name: String,
    pub sheet_name: String,
    pub link_formula: String,
}

impl SheetEntry {
    pub fn new(candidate: &CandidateFile, sheet_name: &str) -> SheetEntry {
        SheetEntry {
            file_name: candidate.file_name.clone(),
            sheet_name: sheet_name.to_owned(),
            link_formula: link_formula(&candidate.path.to_string_lossy(), sheet_name),
        }
    }

    /// Cell values in header order
    pub fn values(&self) -> [&str; 3] {
        [&self.file_name, &self.sheet_name, &self.link_formula]
    }
}

/// Ordered rows of one run, rebuilt from scratch every time
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MasterIndex {
    pub rows: Vec<SheetEntry>,
}

/// Settings of an index run.
#[derive(Clone, Debug)]
pub struct IndexOptions {
    /// Name of the index file, written into the scanned directory and never indexed
    pub output_file_name: String,
    /// Pattern the file extension must match, compared case-insensitively
    pub extension_pattern: Pattern,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            output_file_name: OUTPUT_FILE_NAME.to_owned(),
            extension_pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl IndexOptions {
    pub fn with_output_file_name(mut self, name: impl Into<String>) -> IndexOptions {
        self.output_file_name = name.into();
        self
    }

    pub fn with_extension_pattern(mut self, pattern: &str) -> Result<IndexOptions, MasterIndexError> {
        self.extension_pattern = Pattern::new(pattern)?;
        Ok(self)
    }

    /// Whether the extension of `path` matches the candidate pattern
    pub fn matches_extension(&self, path: &Path) -> bool {
        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        path.extension()
            .map(|extension| self.extension_pattern.matches_with(&extension.to_string_lossy(), options))
            .unwrap_or(false)
    }
}
