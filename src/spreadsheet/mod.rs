//! # Spreadsheet Sheet Enumeration
//!
//! Lists the sheet names of Excel workbooks without loading any cell data.
//! The container is recognized from the file content rather than its extension:
//!
//! - ZIP packages (.xlsx, .xlsm, .xltx, .xlsb) are resolved through their root
//!   relationships to the XML or BIFF12 workbook part
//! - Compound files (.xls, .xlt) carry a BIFF8 or BIFF5 workbook stream, or an
//!   `EncryptedPackage` stream when an OOXML workbook is password protected
//!
//! [`SheetReader`] is the seam the index builder reads through, so tests and
//! callers can substitute their own reader.
pub(crate) mod excel;
pub(crate) mod xls;
pub(crate) mod xlsb;
pub(crate) mod xlsx;

use crate::error::MasterIndexError;
use crate::helpers::cfb;
use crate::helpers::cfb::Cfb;
use crate::helpers::zip::SIGNATURE as ZIP_SIGNATURE;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

/// Stream holding an encrypted OOXML package inside a compound file
const ENCRYPTED_PACKAGE: &str = "EncryptedPackage";

/// Reasons a file cannot be enumerated that are not plain I/O or parse failures.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// A part the workbook relies on is absent from the package
    #[error("Missing part '{0}'")]
    MissingPartError(String),

    /// Workbook is encrypted with a password
    #[error("Workbook is password protected")]
    SpreadsheetPasswordProtectedError,

    /// Workbook declares no sheets
    #[error("Workbook contains no sheets")]
    SpreadsheetEmptyError,

    /// Content is neither an OOXML package nor a BIFF compound file
    #[error("Not a recognized Excel workbook")]
    UnsupportedFormatError,
}

/// Source of the ordered sheet names of a workbook file.
pub trait SheetReader {
    /// Returns every sheet name of the workbook at `path`, in workbook order
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>, MasterIndexError>;
}

impl<F> SheetReader for F
where
    F: Fn(&Path) -> Result<Vec<String>, MasterIndexError>,
{
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>, MasterIndexError> {
        self(path)
    }
}

/// [`SheetReader`] backed by the built-in xlsx, xlsb and xls parsers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeSheetReader;

impl SheetReader for NativeSheetReader {
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>, MasterIndexError> {
        read_sheet_names(path)
    }
}

/// Container kinds recognized from the leading bytes of a file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Container {
    Package,
    Compound,
}

/// Opens the workbook at `path` read-only and lists its sheet names in workbook order.
///
/// The file handle is released before returning, whether or not reading succeeded.
pub fn read_sheet_names(path: &Path) -> Result<Vec<String>, MasterIndexError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_sheet_names_from(&mut reader)
}

/// Lists the sheet names of a workbook held by any seekable reader
pub fn read_sheet_names_from<RS: Read + Seek>(reader: &mut RS) -> Result<Vec<String>, MasterIndexError> {
    match detect_container(reader)? {
        Some(Container::Package) => {
            let mut zip = ZipArchive::new(reader)?;
            excel::read_sheet_names(&mut zip)
        }
        Some(Container::Compound) => {
            let cfb = Cfb::new(reader)?;
            if cfb.exists(ENCRYPTED_PACKAGE) {
                Err(SpreadsheetError::SpreadsheetPasswordProtectedError)?
            }
            xls::read_sheet_names(&cfb)
        }
        None => Err(SpreadsheetError::UnsupportedFormatError.into()),
    }
}

/// Sniffs the container signature and rewinds the reader
fn detect_container<RS: Read + Seek>(reader: &mut RS) -> Result<Option<Container>, MasterIndexError> {
    let mut magic = Vec::with_capacity(cfb::SIGNATURE.len());
    reader.by_ref().take(cfb::SIGNATURE.len() as u64).read_to_end(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;

    let container = if magic.starts_with(&ZIP_SIGNATURE) {
        Some(Container::Package)
    } else if magic == cfb::SIGNATURE {
        Some(Container::Compound)
    } else {
        None
    };
    Ok(container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encrypted_package_bytes, write_bytes, xls_bytes, xlsb_bytes, xlsx_bytes};
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_detect_container() {
        let mut reader = Cursor::new(xlsx_bytes(&["A"]));
        assert_eq!(detect_container(&mut reader).unwrap(), Some(Container::Package));
        assert_eq!(reader.position(), 0);

        let mut reader = Cursor::new(xls_bytes(&["A"], true));
        assert_eq!(detect_container(&mut reader).unwrap(), Some(Container::Compound));

        let mut reader = Cursor::new(b"PK".to_vec());
        assert_eq!(detect_container(&mut reader).unwrap(), None);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_read_sheet_names_by_content() {
        let dir = TempDir::new().unwrap();
        // Extension does not decide the parser
        let xlsx = write_bytes(dir.path(), "Book1.xls", &xlsx_bytes(&["Sales", "Costs"]));
        let xlsb = write_bytes(dir.path(), "Book2.xlsb", &xlsb_bytes(&["Binary"]));
        let xls = write_bytes(dir.path(), "Book3.xlsx", &xls_bytes(&["Legacy", "Archive"], true));

        assert_eq!(read_sheet_names(&xlsx).unwrap(), vec!["Sales", "Costs"]);
        assert_eq!(NativeSheetReader.sheet_names(&xlsb).unwrap(), vec!["Binary"]);
        assert_eq!(read_sheet_names(&xls).unwrap(), vec!["Legacy", "Archive"]);
    }

    #[test]
    fn test_unreadable_workbooks() {
        let dir = TempDir::new().unwrap();
        let text = write_bytes(dir.path(), "notes.xlsx", b"quarterly notes, not a workbook");
        let empty = write_bytes(dir.path(), "empty.xlsx", b"");
        let encrypted = write_bytes(dir.path(), "secret.xlsx", &encrypted_package_bytes());
        let mut corrupt = xlsx_bytes(&["A"]);
        corrupt.truncate(corrupt.len() / 2);
        let corrupt = write_bytes(dir.path(), "corrupt.xlsx", &corrupt);

        assert!(matches!(
            read_sheet_names(&text),
            Err(MasterIndexError::SpreadsheetError(SpreadsheetError::UnsupportedFormatError))
        ));
        assert!(matches!(
            read_sheet_names(&empty),
            Err(MasterIndexError::SpreadsheetError(SpreadsheetError::UnsupportedFormatError))
        ));
        assert!(matches!(
            read_sheet_names(&encrypted),
            Err(MasterIndexError::SpreadsheetError(SpreadsheetError::SpreadsheetPasswordProtectedError))
        ));
        assert!(read_sheet_names(&corrupt).is_err());
        assert!(matches!(
            read_sheet_names(&dir.path().join("missing.xlsx")),
            Err(MasterIndexError::IoError(_))
        ));
    }

    #[test]
    fn test_closure_reader() {
        let reader = |path: &Path| -> Result<Vec<String>, MasterIndexError> {
            Ok(vec![path.display().to_string()])
        };
        assert_eq!(reader.sheet_names(Path::new("a.xlsx")).unwrap(), vec!["a.xlsx"]);
    }
}
