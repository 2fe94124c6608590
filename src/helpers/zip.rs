//! Part access for OOXML packages (.xlsx, .xlsm, .xlsb)
//!
//! Part names inside a package are compared without regard to ASCII case or
//! separator style, since writers disagree on both.

use crate::error::MasterIndexError;
use crate::helpers::biff12::Biff12Reader;
use crate::helpers::xml::XmlReader;
use crate::spreadsheet::SpreadsheetError;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

/// Leading bytes of a ZIP local file header
pub(crate) const SIGNATURE: [u8; 4] = [b'P', b'K', 0x03, 0x04];

type PartXmlReader<'a, RS> = XmlReader<BufReader<ZipFile<'a, RS>>>;
type PartBiffReader<'a, RS> = Biff12Reader<BufReader<ZipFile<'a, RS>>>;

/// Package part lookup with readers for the two workbook encodings
pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Opens a part if the package has it
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, MasterIndexError>;

    /// XML reader over an optional part such as `_rels/.rels`
    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<PartXmlReader<'_, RS>>, MasterIndexError>;

    /// XML reader over a part the package must contain
    fn required_xml_reader(&'_ mut self, name: &str) -> Result<PartXmlReader<'_, RS>, MasterIndexError>;

    /// BIFF12 record reader over a part the package must contain
    fn required_biff_reader(&'_ mut self, name: &str) -> Result<PartBiffReader<'_, RS>, MasterIndexError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, MasterIndexError> {
        let Some(entry) = entry_name(self.file_names(), name) else {
            return Ok(None);
        };
        match self.by_name(&entry) {
            Ok(file) => Ok(Some(file)),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<PartXmlReader<'_, RS>>, MasterIndexError> {
        Ok(self.part(name)?.map(|file| XmlReader::new(BufReader::new(file))))
    }

    fn required_xml_reader(&'_ mut self, name: &str) -> Result<PartXmlReader<'_, RS>, MasterIndexError> {
        let file = self.part(name)?
            .ok_or_else(|| SpreadsheetError::MissingPartError(name.to_owned()))?;
        Ok(XmlReader::new(BufReader::new(file)))
    }

    fn required_biff_reader(&'_ mut self, name: &str) -> Result<PartBiffReader<'_, RS>, MasterIndexError> {
        let file = self.part(name)?
            .ok_or_else(|| SpreadsheetError::MissingPartError(name.to_owned()))?;
        Ok(Biff12Reader::new(BufReader::new(file)))
    }
}

/// Finds the archive entry that names the same part as `name`
fn entry_name<'a>(entries: impl Iterator<Item = &'a str>, name: &str) -> Option<String> {
    let wanted = normalize(name);
    entries
        .into_iter()
        .find(|entry| normalize(entry).eq_ignore_ascii_case(&wanted))
        .map(str::to_owned)
}

fn normalize(name: &str) -> String {
    name.replace('\\', "/").trim_start_matches('/').to_owned()
}
