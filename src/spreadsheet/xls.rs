use crate::error::MasterIndexError;
use crate::error::ResultOptionChain;
use crate::helpers::biff8::Biff8Reader;
use crate::helpers::cfb::Cfb;
use crate::match_biff8_record;
use crate::spreadsheet::SpreadsheetError;
use thiserror::Error;

// BIFF record type identifiers of the workbook globals substream
const EOF: u16 = 10;           // End of file record marking the end of a substream
const FILE_PASS: u16 = 47;     // File password protection record
const CODE_PAGE: u16 = 66;     // Workbook code page
const BOUND_SHEET8: u16 = 133; // Worksheet definition and position
const BOF: u16 = 2057;         // Beginning of file record for substreams

// BOF versions
const BIFF5: u16 = 0x0500;
const BIFF8: u16 = 0x0600;

/// Error types specific to XLS file parsing
#[derive(Error, Debug)]
pub enum XlsError {
    /// Invalid character encoding code page encountered
    #[error("Invalid Code page '{0}'")]
    CodePageError(u16),

    /// Workbook stream does not open with a BOF record
    #[error("Workbook stream does not start with a BOF record")]
    MissingBofError,

    /// BIFF version other than BIFF5 or BIFF8
    #[error("Unsupported BIFF version '{0:#06x}'")]
    VersionError(u16),
}

/// Lists the sheet names of an Excel 95-2003 workbook in workbook order
///
/// # Arguments
/// * `cfb` - Compound file holding the `Workbook` (BIFF8) or `Book` (BIFF5) stream
pub(super) fn read_sheet_names(cfb: &Cfb) -> Result<Vec<String>, MasterIndexError> {
    let mut reader = cfb.read("Workbook")
        .ok_none_else(|| cfb.read("Book"))?
        .map(Biff8Reader::new)
        .ok_or(SpreadsheetError::UnsupportedFormatError)?;
    let sheets = load_sheet_names(&mut reader)?;
    if sheets.is_empty() {
        Err(SpreadsheetError::SpreadsheetEmptyError)?
    }
    Ok(sheets)
}

/// Walks the globals substream up to its EOF record collecting `BoundSheet8` names
fn load_sheet_names(reader: &mut Biff8Reader) -> Result<Vec<String>, MasterIndexError> {
    if reader.next()? != Some(BOF) {
        Err(XlsError::MissingBofError)?
    }
    let version = reader.read_u16()?;
    if version != BIFF5 && version != BIFF8 {
        Err(XlsError::VersionError(version))?
    }

    let mut sheets = Vec::new();
    match_biff8_record!(reader => {
        EOF => break,
        FILE_PASS => Err(SpreadsheetError::SpreadsheetPasswordProtectedError)?,
        // BIFF8 names are Unicode, only BIFF5 byte strings need the code page
        CODE_PAGE if version == BIFF5 => {
            let code_page = reader.read_u16()?;
            reader.encoding = codepage::to_encoding(code_page).ok_or(XlsError::CodePageError(code_page))?;
        }
        BOUND_SHEET8 => {
            // lbPlyPos, hsState and dt precede the name
            reader.skip(6)?;
            let sheet_name = if version == BIFF8 {
                reader.read_short_xl_unicode_string()?
            } else {
                reader.read_short_byte_string()?
            };
            sheets.push(sheet_name);
        }
    });
    Ok(sheets)
}
