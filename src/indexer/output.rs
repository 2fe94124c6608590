use crate::error::MasterIndexError;
use crate::indexer::MasterIndex;
use crate::indexer::HEADERS;
use crate::indexer::OUTPUT_SHEET_NAME;
use crate::indexer::WIDTH_PADDING;
use crate::workbook::Cell;
use crate::workbook::Workbook;
use crate::workbook::Worksheet;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;
use tracing::warn;

/// Where an index was written
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedIndex {
    pub path: PathBuf,
    /// The scanned directory was not writable and the fallback directory was used
    pub used_fallback: bool,
}

impl MasterIndex {
    pub fn headers() -> [&'static str; 3] {
        HEADERS
    }

    /// Widest value of each column in characters, header included, plus padding
    pub fn column_widths(&self) -> [usize; 3] {
        let mut widths = HEADERS.map(|header| header.chars().count());
        for row in &self.rows {
            for (width, value) in widths.iter_mut().zip(row.values()) {
                *width = (*width).max(value.chars().count());
            }
        }
        widths.map(|width| width + WIDTH_PADDING)
    }

    /// One `Master Index` sheet: bold header row, then one row per entry
    pub fn to_workbook(&self) -> Workbook {
        let mut worksheet = Worksheet::new(OUTPUT_SHEET_NAME);
        worksheet.rows.push(HEADERS.iter().map(|header| Cell::text(*header).bold()).collect());
        for row in &self.rows {
            worksheet.rows.push(vec![
                Cell::text(&row.file_name),
                Cell::text(&row.sheet_name),
                Cell::formula(&row.link_formula),
            ]);
        }
        worksheet.column_widths = self.column_widths().iter().map(|width| *width as f64).collect();

        let mut workbook = Workbook::new();
        workbook.push(worksheet);
        workbook
    }

    /// Writes the index workbook to `path`, replacing any previous file
    pub fn save(&self, path: &Path) -> Result<(), MasterIndexError> {
        self.to_workbook().save(path).map_err(|source| MasterIndexError::OutputWrite {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }
}

/// Saves `index` as `file_name` in `directory`, or in `fallback_directory` when that fails.
///
/// `file_name` should be the output name the index was built with, so that
/// later runs skip the file. When both attempts fail the error of the first
/// attempt is returned.
pub fn save_with_fallback(
    index: &MasterIndex,
    directory: &Path,
    fallback_directory: &Path,
    file_name: &str,
) -> Result<SavedIndex, MasterIndexError> {
    let path = directory.join(file_name);
    let error = match index.save(&path) {
        Ok(()) => {
            info!(path = %path.display(), rows = index.rows.len(), "master index saved");
            return Ok(SavedIndex { path, used_fallback: false });
        }
        Err(error) => error,
    };

    warn!(%error, fallback = %fallback_directory.display(), "retrying in fallback directory");
    let fallback = fallback_directory.join(file_name);
    match index.save(&fallback) {
        Ok(()) => {
            info!(path = %fallback.display(), rows = index.rows.len(), "master index saved");
            Ok(SavedIndex { path: fallback, used_fallback: true })
        }
        Err(fallback_error) => {
            warn!(error = %fallback_error, "fallback save failed");
            Err(error)
        }
    }
}
