//! # Workbook Writer
//!
//! A small SpreadsheetML model covering what the master index needs: text and
//! formula cells, a bold style and custom column widths. Workbooks are written
//! as .xlsx packages, either to any seekable writer or atomically to a path.
mod writer;

use crate::error::MasterIndexError;
use chrono::DateTime;
use chrono::Utc;
use std::collections::HashSet;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Longest sheet name spreadsheet applications accept
pub const SHEET_NAME_LIMIT: usize = 31;

/// Characters spreadsheet applications reject in sheet names
const SHEET_NAME_FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Errors raised when a workbook cannot be represented as a valid package
#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("Invalid sheet name '{0}': {1}")]
    InvalidSheetName(String, &'static str),

    #[error("Duplicate sheet name '{0}'")]
    DuplicateSheetName(String),

    #[error("Workbook has no worksheets")]
    NoWorksheets,
}

/// Content of a written cell
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellValue {
    /// Literal text, stored inline
    Text(String),
    /// Formula with or without its leading `=`, recalculated when the file is opened
    Formula(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub value: CellValue,
    pub bold: bool,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Cell {
        Cell { value: CellValue::Text(text.into()), bold: false }
    }

    pub fn formula(formula: impl Into<String>) -> Cell {
        Cell { value: CellValue::Formula(formula.into()), bold: false }
    }

    pub fn bold(mut self) -> Cell {
        self.bold = true;
        self
    }

    /// Number of characters of the value as written
    pub fn width(&self) -> usize {
        match &self.value {
            CellValue::Text(text) | CellValue::Formula(text) => text.chars().count(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Worksheet {
    pub name: String,
    /// Rows from the first row down, cells from column A rightwards
    pub rows: Vec<Vec<Cell>>,
    /// Column widths in characters, from column A; columns past the end keep the default width
    pub column_widths: Vec<f64>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Worksheet {
        Worksheet { name: name.into(), ..Default::default() }
    }

    /// Range covering every written cell, `A1` when empty
    pub fn dimension(&self) -> String {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        if self.rows.is_empty() || columns == 0 {
            "A1".to_owned()
        } else {
            format!("A1:{}", cell_reference(self.rows.len() - 1, columns - 1))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Workbook {
    pub worksheets: Vec<Worksheet>,
    /// Creation time recorded in the document properties
    pub created: DateTime<Utc>,
}

impl Default for Workbook {
    fn default() -> Self {
        Workbook::new()
    }
}

impl Workbook {
    pub fn new() -> Workbook {
        Workbook { worksheets: Vec::new(), created: Utc::now() }
    }

    pub fn push(&mut self, worksheet: Worksheet) {
        self.worksheets.push(worksheet);
    }

    /// Checks that the workbook has sheets and that their names are valid and unique
    pub fn validate(&self) -> Result<(), WorkbookError> {
        if self.worksheets.is_empty() {
            return Err(WorkbookError::NoWorksheets);
        }
        let mut names = HashSet::new();
        for worksheet in &self.worksheets {
            validate_sheet_name(&worksheet.name)?;
            // Sheet names compare case-insensitively
            if !names.insert(worksheet.name.to_lowercase()) {
                return Err(WorkbookError::DuplicateSheetName(worksheet.name.clone()));
            }
        }
        Ok(())
    }

    /// Writes the workbook to `path`, replacing any existing file.
    ///
    /// The package is written to a temporary file in the destination directory
    /// and renamed over `path` once complete, so a failed save leaves any
    /// previous file untouched.
    pub fn save(&self, path: &Path) -> Result<(), MasterIndexError> {
        self.validate()?;
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".partial")
            .tempfile_in(directory)?;
        let mut writer = self.write_to(BufWriter::new(temp.as_file_mut()))?;
        writer.flush()?;
        drop(writer);
        temp.persist(path).map_err(|error| error.error)?;
        Ok(())
    }
}

/// Checks a sheet name against the rules spreadsheet applications enforce
pub fn validate_sheet_name(name: &str) -> Result<(), WorkbookError> {
    let reason = if name.is_empty() {
        Some("empty")
    } else if name.chars().count() > SHEET_NAME_LIMIT {
        Some("longer than 31 characters")
    } else if name.contains(SHEET_NAME_FORBIDDEN) {
        Some("contains one of []:*?/\\")
    } else if name.starts_with('\'') || name.ends_with('\'') {
        Some("starts or ends with an apostrophe")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(WorkbookError::InvalidSheetName(name.to_owned(), reason)),
        None => Ok(()),
    }
}

/// Converts 0-based row and column indexes to an A1-style reference
pub fn cell_reference(row: usize, column: usize) -> String {
    let mut column = column + 1;
    let mut reference = String::new();
    while column > 0 {
        column -= 1;
        reference.insert(0, char::from(b'A' + (column % 26) as u8));
        column /= 26;
    }
    reference.push_str(&(row + 1).to_string());
    reference
}
