use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the master index builder.
/// Aggregates errors from various sources including standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum MasterIndexError {
    #[error("{0}")]
    WithContextError(String),

    /// The target directory is missing or cannot be listed.
    #[error("Cannot read directory '{}': {source}", path.display())]
    DirectoryAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The master index could not be persisted.
    #[error("Cannot write '{}': {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        source: Box<MasterIndexError>,
    },

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    CfbHelperError(#[from] crate::helpers::cfb::CfbError),

    #[error("{0}")]
    Biff8HelperError(#[from] crate::helpers::biff8::Biff8Error),

    #[error("{0}")]
    Biff12HelperError(#[from] crate::helpers::biff12::Biff12Error),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    XlsError(#[from] crate::spreadsheet::xls::XlsError),

    // Workbook module errors
    #[error("{0}")]
    WorkbookError(#[from] crate::workbook::WorkbookError),
}

pub(crate) trait ResultOptionChain {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self;
}

impl<T, E> ResultOptionChain for Result<Option<T>, E> {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        match self {
            Ok(None) => f(),
            _ => self,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, MasterIndexError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| MasterIndexError::WithContextError(format!("{}: {}", message, e)))
    }
}
