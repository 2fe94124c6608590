//! SpreadsheetML package parts
use crate::error::MasterIndexError;
use crate::helpers::xml::XmlWriter;
use crate::workbook::cell_reference;
use crate::workbook::Cell;
use crate::workbook::CellValue;
use crate::workbook::Workbook;
use crate::workbook::Worksheet;
use std::io::Seek;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

const APPLICATION: &str = "master-index";

// Namespaces
const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_CORE_PROPERTIES: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const NS_EXTENDED_PROPERTIES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";

// Relationship types
const REL_OFFICE_DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_WORKSHEET: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_CORE_PROPERTIES: &str = "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_EXTENDED_PROPERTIES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";

// Content types
const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const CT_CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_EXTENDED_PROPERTIES: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";

/// Cell format index of the regular style
const STYLE_REGULAR: &str = "0";
/// Cell format index of the bold style
const STYLE_BOLD: &str = "1";

impl Workbook {
    /// Writes the workbook as a .xlsx package and returns the underlying writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W, MasterIndexError> {
        self.validate()?;
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut parts = vec![
            ("[Content_Types].xml".to_owned(), self.content_types()?),
            ("_rels/.rels".to_owned(), root_relationships()?),
            ("docProps/app.xml".to_owned(), extended_properties()?),
            ("docProps/core.xml".to_owned(), self.core_properties()?),
            ("xl/workbook.xml".to_owned(), self.workbook_part()?),
            ("xl/_rels/workbook.xml.rels".to_owned(), self.workbook_relationships()?),
            ("xl/styles.xml".to_owned(), styles()?),
        ];
        for (index, worksheet) in self.worksheets.iter().enumerate() {
            parts.push((format!("xl/worksheets/sheet{}.xml", index + 1), worksheet_part(worksheet)?));
        }

        for (name, bytes) in parts {
            zip.start_file(name, options)?;
            zip.write_all(&bytes)?;
        }
        Ok(zip.finish()?)
    }

    fn content_types(&self) -> Result<Vec<u8>, MasterIndexError> {
        let mut xml = XmlWriter::new()?;
        xml.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
        xml.empty("Default", &[("Extension", "rels"), ("ContentType", CT_RELATIONSHIPS)])?;
        xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
        xml.empty("Override", &[("PartName", "/xl/workbook.xml"), ("ContentType", CT_WORKBOOK)])?;
        for index in 1..=self.worksheets.len() {
            let part = format!("/xl/worksheets/sheet{index}.xml");
            xml.empty("Override", &[("PartName", part.as_str()), ("ContentType", CT_WORKSHEET)])?;
        }
        xml.empty("Override", &[("PartName", "/xl/styles.xml"), ("ContentType", CT_STYLES)])?;
        xml.empty("Override", &[("PartName", "/docProps/core.xml"), ("ContentType", CT_CORE_PROPERTIES)])?;
        xml.empty("Override", &[("PartName", "/docProps/app.xml"), ("ContentType", CT_EXTENDED_PROPERTIES)])?;
        xml.end("Types")?;
        Ok(xml.into_bytes())
    }

    fn core_properties(&self) -> Result<Vec<u8>, MasterIndexError> {
        let created = self.created.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let mut xml = XmlWriter::new()?;
        xml.start("cp:coreProperties", &[
            ("xmlns:cp", NS_CORE_PROPERTIES),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ])?;
        xml.text_element("dc:creator", &[], APPLICATION)?;
        xml.text_element("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &created)?;
        xml.text_element("dcterms:modified", &[("xsi:type", "dcterms:W3CDTF")], &created)?;
        xml.end("cp:coreProperties")?;
        Ok(xml.into_bytes())
    }

    fn workbook_part(&self) -> Result<Vec<u8>, MasterIndexError> {
        let mut xml = XmlWriter::new()?;
        xml.start("workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_RELATIONSHIPS)])?;
        xml.start("bookViews", &[])?;
        xml.empty("workbookView", &[])?;
        xml.end("bookViews")?;
        xml.start("sheets", &[])?;
        for (index, worksheet) in self.worksheets.iter().enumerate() {
            let sheet_id = (index + 1).to_string();
            let relationship = format!("rId{sheet_id}");
            xml.empty("sheet", &[
                ("name", worksheet.name.as_str()),
                ("sheetId", sheet_id.as_str()),
                ("r:id", relationship.as_str()),
            ])?;
        }
        xml.end("sheets")?;
        // Formula results are not cached, so ask for a full recalculation on open
        xml.empty("calcPr", &[("calcId", "191029"), ("fullCalcOnLoad", "1")])?;
        xml.end("workbook")?;
        Ok(xml.into_bytes())
    }

    fn workbook_relationships(&self) -> Result<Vec<u8>, MasterIndexError> {
        let mut xml = XmlWriter::new()?;
        xml.start("Relationships", &[("xmlns", NS_PACKAGE_RELATIONSHIPS)])?;
        for index in 1..=self.worksheets.len() {
            let id = format!("rId{index}");
            let target = format!("worksheets/sheet{index}.xml");
            xml.empty("Relationship", &[("Id", id.as_str()), ("Type", REL_WORKSHEET), ("Target", target.as_str())])?;
        }
        let id = format!("rId{}", self.worksheets.len() + 1);
        xml.empty("Relationship", &[("Id", id.as_str()), ("Type", REL_STYLES), ("Target", "styles.xml")])?;
        xml.end("Relationships")?;
        Ok(xml.into_bytes())
    }
}

fn root_relationships() -> Result<Vec<u8>, MasterIndexError> {
    let mut xml = XmlWriter::new()?;
    xml.start("Relationships", &[("xmlns", NS_PACKAGE_RELATIONSHIPS)])?;
    xml.empty("Relationship", &[("Id", "rId1"), ("Type", REL_OFFICE_DOCUMENT), ("Target", "xl/workbook.xml")])?;
    xml.empty("Relationship", &[("Id", "rId2"), ("Type", REL_CORE_PROPERTIES), ("Target", "docProps/core.xml")])?;
    xml.empty("Relationship", &[("Id", "rId3"), ("Type", REL_EXTENDED_PROPERTIES), ("Target", "docProps/app.xml")])?;
    xml.end("Relationships")?;
    Ok(xml.into_bytes())
}

fn extended_properties() -> Result<Vec<u8>, MasterIndexError> {
    let mut xml = XmlWriter::new()?;
    xml.start("Properties", &[("xmlns", NS_EXTENDED_PROPERTIES)])?;
    xml.text_element("Application", &[], APPLICATION)?;
    xml.end("Properties")?;
    Ok(xml.into_bytes())
}

/// Default font at index 0, bold font at index 1; cell format 1 applies the bold font
fn styles() -> Result<Vec<u8>, MasterIndexError> {
    let mut xml = XmlWriter::new()?;
    xml.start("styleSheet", &[("xmlns", NS_MAIN)])?;

    xml.start("fonts", &[("count", "2")])?;
    for bold in [false, true] {
        xml.start("font", &[])?;
        if bold {
            xml.empty("b", &[])?;
        }
        xml.empty("sz", &[("val", "11")])?;
        xml.empty("name", &[("val", "Calibri")])?;
        xml.empty("family", &[("val", "2")])?;
        xml.end("font")?;
    }
    xml.end("fonts")?;

    xml.start("fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        xml.start("fill", &[])?;
        xml.empty("patternFill", &[("patternType", pattern)])?;
        xml.end("fill")?;
    }
    xml.end("fills")?;

    xml.start("borders", &[("count", "1")])?;
    xml.start("border", &[])?;
    for side in ["left", "right", "top", "bottom", "diagonal"] {
        xml.empty(side, &[])?;
    }
    xml.end("border")?;
    xml.end("borders")?;

    let regular = [("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")];
    xml.start("cellStyleXfs", &[("count", "1")])?;
    xml.empty("xf", &regular)?;
    xml.end("cellStyleXfs")?;

    xml.start("cellXfs", &[("count", "2")])?;
    xml.empty("xf", &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0"), ("xfId", "0")])?;
    xml.empty("xf", &[("numFmtId", "0"), ("fontId", "1"), ("fillId", "0"), ("borderId", "0"), ("xfId", "0"), ("applyFont", "1")])?;
    xml.end("cellXfs")?;

    xml.start("cellStyles", &[("count", "1")])?;
    xml.empty("cellStyle", &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")])?;
    xml.end("cellStyles")?;

    xml.end("styleSheet")?;
    Ok(xml.into_bytes())
}

fn worksheet_part(worksheet: &Worksheet) -> Result<Vec<u8>, MasterIndexError> {
    let mut xml = XmlWriter::new()?;
    xml.start("worksheet", &[("xmlns", NS_MAIN), ("xmlns:r", NS_RELATIONSHIPS)])?;
    xml.empty("dimension", &[("ref", worksheet.dimension().as_str())])?;

    if !worksheet.column_widths.is_empty() {
        xml.start("cols", &[])?;
        for (index, width) in worksheet.column_widths.iter().enumerate() {
            let column = (index + 1).to_string();
            let width = width.to_string();
            xml.empty("col", &[
                ("min", column.as_str()),
                ("max", column.as_str()),
                ("width", width.as_str()),
                ("customWidth", "1"),
            ])?;
        }
        xml.end("cols")?;
    }

    xml.start("sheetData", &[])?;
    for (row_index, row) in worksheet.rows.iter().enumerate() {
        let row_number = (row_index + 1).to_string();
        xml.start("row", &[("r", row_number.as_str())])?;
        for (column_index, cell) in row.iter().enumerate() {
            write_cell(&mut xml, &cell_reference(row_index, column_index), cell)?;
        }
        xml.end("row")?;
    }
    xml.end("sheetData")?;

    xml.end("worksheet")?;
    Ok(xml.into_bytes())
}

fn write_cell(xml: &mut XmlWriter, reference: &str, cell: &Cell) -> Result<(), MasterIndexError> {
    let style = if cell.bold { STYLE_BOLD } else { STYLE_REGULAR };
    match &cell.value {
        CellValue::Text(text) => {
            xml.start("c", &[("r", reference), ("s", style), ("t", "inlineStr")])?;
            xml.start("is", &[])?;
            if text.trim() == text {
                xml.text_element("t", &[], text)?;
            } else {
                xml.text_element("t", &[("xml:space", "preserve")], text)?;
            }
            xml.end("is")?;
        }
        CellValue::Formula(formula) => {
            xml.start("c", &[("r", reference), ("s", style)])?;
            xml.text_element("f", &[], formula.strip_prefix('=').unwrap_or(formula))?;
        }
    }
    xml.end("c")
}
