//! Microsoft Office Excel package helpers shared by .xlsx, .xlsm and .xlsb
use crate::error::MasterIndexError;
use crate::error::ResultMessage;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::xlsb;
use crate::spreadsheet::xlsx;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

/// XML tag name for relationship elements in Excel files
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Relationship type suffix of the package's main document part
const OFFICE_DOCUMENT: &str = "/officeDocument";

/// Package root relationships
const ROOT_RELATIONSHIPS: &str = "_rels/.rels";

/// Main part used when the package carries no root relationships
const DEFAULT_WORKBOOK: &str = "xl/workbook.xml";

/// Lists the sheet names of an OOXML workbook package in workbook order
///
/// # Arguments
/// * `zip` - Opened package archive
///
/// # Returns
/// Sheet names, or an error when the workbook part is missing, corrupt or lists no sheets
pub(super) fn read_sheet_names<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<String>, MasterIndexError> {
    let workbook = load_workbook_path(zip).with_prefix(ROOT_RELATIONSHIPS)?;
    let sheets = if workbook.to_ascii_lowercase().ends_with(".bin") {
        xlsb::load_sheet_names(zip, &workbook)
    } else {
        xlsx::load_sheet_names(zip, &workbook)
    }
    .with_prefix(&workbook)?;

    if sheets.is_empty() {
        Err(SpreadsheetError::SpreadsheetEmptyError)?
    }
    Ok(sheets)
}

/// Finds the workbook part through the package root relationships
fn load_workbook_path<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<String, MasterIndexError> {
    let Some(mut reader) = zip.xml_reader(ROOT_RELATIONSHIPS)? else {
        return Ok(DEFAULT_WORKBOOK.to_owned());
    };
    let mut workbook = None;
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let kind = event.get_attribute_value("Type")?;
            if kind.map(|it| it.ends_with(OFFICE_DOCUMENT)).unwrap_or(false) {
                workbook = event.get_attribute_value("Target")?.map(to_zip_path);
                break;
            }
        }
    });
    Ok(workbook.unwrap_or_else(|| DEFAULT_WORKBOOK.to_owned()))
}

/// Normalizes a root relationship target into an archive entry name
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    let path = path.trim_start_matches('/');
    path.strip_prefix("./").unwrap_or(path).to_owned()
}
