//! `HYPERLINK` formulas pointing at a sheet of another workbook

/// Display text of every link
pub const LINK_LABEL: &str = "Open Sheet";

/// Longest link location spreadsheet applications follow from a `HYPERLINK` formula
pub const LINK_LOCATION_LIMIT: usize = 255;

/// Builds `=HYPERLINK("<path>#'<sheet>'!A1", "Open Sheet")`.
///
/// Apostrophes in the sheet name are doubled inside the quoted sheet reference,
/// then double quotes are doubled for the formula string literal.
pub fn link_formula(path: &str, sheet_name: &str) -> String {
    format!(
        "=HYPERLINK(\"{}\", \"{LINK_LABEL}\")",
        string_literal(&link_location(path, sheet_name))
    )
}

/// Quoted reference to cell A1 of `sheet_name`
pub fn sheet_reference(sheet_name: &str) -> String {
    format!("'{}'!A1", sheet_name.replace('\'', "''"))
}

/// Link target before formula escaping
pub(crate) fn link_location(path: &str, sheet_name: &str) -> String {
    format!("{path}#{}", sheet_reference(sheet_name))
}

fn string_literal(value: &str) -> String {
    value.replace('"', "\"\"")
}
