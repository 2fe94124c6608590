//! Excel 2007+ XML workbook part (.xlsx, .xlsm)
use crate::error::MasterIndexError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use quick_xml::events::Event;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

const TAG_SHEET: &[u8] = b"sheet";
const TAG_SHEETS: &[u8] = b"sheets";

/// Reads the `<sheet name>` entries of the workbook part in declaration order
pub(super) fn load_sheet_names<RS: Read + Seek>(zip: &mut ZipArchive<RS>, workbook: &str) -> Result<Vec<String>, MasterIndexError> {
    let mut reader = zip.required_xml_reader(workbook)?;
    let mut sheets = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_SHEET => {
            if let Some(name) = event.get_attribute_value("name")? {
                sheets.push(name.into_owned());
            }
        }
        Event::End(event) if event.local_name().as_ref() == TAG_SHEETS => break,
    });
    Ok(sheets)
}
