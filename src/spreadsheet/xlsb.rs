//! Excel 2007+ binary workbook part (.xlsb)
use crate::error::MasterIndexError;
use crate::helpers::zip::ZipHelper;
use crate::match_biff12_record;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

// BIFF12 record type constants for the workbook part

/// End of worksheet bundle
const BRT_END_BUNDLE_SHS: u16 = 144;
/// Worksheet bundle
const BRT_BUNDLE_SH: u16 = 156;

/// Reads the `BrtBundleSh` names of the workbook part in declaration order
pub(super) fn load_sheet_names<RS: Read + Seek>(zip: &mut ZipArchive<RS>, workbook: &str) -> Result<Vec<String>, MasterIndexError> {
    let mut reader = zip.required_biff_reader(workbook)?;
    let mut sheets = Vec::new();
    match_biff12_record!(reader => {
        BRT_END_BUNDLE_SHS => break,
        BRT_BUNDLE_SH => {
            // hsState and iTabID precede the relationship id
            let bound = reader.skip_nullable_str(8)?;
            sheets.push(reader.get_str(bound)?.into_owned());
        }
    });
    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{biff12_record, wide_string, zip_archive};
    use std::io::Cursor;

    fn bundle(name: &str, relationship: Option<&str>) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend(0u32.to_le_bytes());
        body.extend(1u32.to_le_bytes());
        match relationship {
            Some(id) => body.extend(wide_string(id)),
            None => body.extend(0xFFFF_FFFFu32.to_le_bytes()),
        }
        body.extend(wide_string(name));
        biff12_record(BRT_BUNDLE_SH, &body)
    }

    fn sheet_names(part: Vec<u8>) -> Result<Vec<String>, MasterIndexError> {
        let bytes = zip_archive(&[("xl/workbook.bin", part.as_slice())]);
        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        load_sheet_names(&mut zip, "xl/workbook.bin")
    }

    #[test]
    fn test_sheet_names_in_order() {
        let mut part = biff12_record(131, &[]);
        part.extend(biff12_record(143, &[]));
        part.extend(bundle("Ventes 2024", Some("rId1")));
        part.extend(bundle("Résumé", None));
        part.extend(biff12_record(BRT_END_BUNDLE_SHS, &[]));
        part.extend(bundle("Ignored", Some("rId9")));
        assert_eq!(sheet_names(part).unwrap(), vec!["Ventes 2024", "Résumé"]);
    }

    #[test]
    fn test_truncated_part() {
        let mut part = bundle("Complete", Some("rId1"));
        part.extend(bundle("Cut", Some("rId2")));
        part.truncate(part.len() - 3);
        assert!(sheet_names(part).is_err());
    }
}
