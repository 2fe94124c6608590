//! # Master Index
//!
//! Builds a single navigable catalog of every sheet in a folder of Excel workbooks.
//! Each (file, sheet) pair becomes one row of a `Master_Index.xlsx` workbook written
//! into the folder, with a `HYPERLINK` formula that opens the sheet at cell A1.
//!
//! ## Features
//!
//! - **Sheet enumeration without loading data**: sheet names are read from the
//!   workbook part only, for `.xlsx`/`.xlsm`, `.xlsb` and legacy `.xls` files
//! - **Failure isolation**: a corrupt, encrypted or unsupported file becomes one
//!   failure line in the run report and never aborts the run
//! - **Progress events**: the run can be observed file by file and cancelled
//!   between files
//! - **Safe output**: the index is written atomically and falls back to another
//!   directory when the scanned folder is not writable
//!
//! ```no_run
//! use master_index::{save_with_fallback, IndexBuilder, Summary};
//! use std::path::Path;
//!
//! let directory = Path::new("reports");
//! let builder = IndexBuilder::new();
//! let run = builder.build(directory)?;
//! let file_name = &builder.options().output_file_name;
//! let saved = save_with_fallback(&run.index, directory, &std::env::temp_dir(), file_name)?;
//! println!("{}", Summary { report: &run.report, output: Some(&saved.path) });
//! # Ok::<(), master_index::MasterIndexError>(())
//! ```

mod error;
mod helpers;
pub mod indexer;
pub mod logging;
pub mod spreadsheet;
pub mod workbook;

#[cfg(test)]
mod test_support;

pub use error::MasterIndexError;
pub use indexer::{
    save_with_fallback, CandidateFile, FileOutcome, FileStatus, IndexBuilder, IndexOptions,
    IndexRun, MasterIndex, ProgressEvent, RunReport, SavedIndex, SheetEntry, Summary,
};
pub use spreadsheet::{NativeSheetReader, SheetReader};
