//! Fixture builders shared by unit tests
use crate::helpers::cfb;
use crate::workbook::Cell;
use crate::workbook::Workbook;
use crate::workbook::Worksheet;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const SECTOR_SIZE: usize = 512;
const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
const FREE_SECTOR: u32 = 0xFFFF_FFFF;
const FAT_SECTOR: u32 = 0xFFFF_FFFD;
const MINI_SECTOR_SIZE: usize = 64;
const MINI_STREAM_CUTOFF: usize = 4096;

/// Writes `bytes` to `dir/name` and returns the path
pub(crate) fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Builds a ZIP archive holding the given entries
pub(crate) fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Builds a version 3 compound file with up to three streams.
/// Sector 0 holds the allocation table, sector 1 the directory and sector 2 the
/// mini allocation table. Streams below the mini stream cutoff are packed into
/// the mini stream, which follows the regular stream data.
pub(crate) fn compound_file(streams: &[(&str, &[u8])]) -> Vec<u8> {
    assert!(streams.len() <= 3);
    let mut fat = vec![FAT_SECTOR, END_OF_CHAIN, END_OF_CHAIN];
    let mut mini_fat = Vec::new();
    let mut mini_stream = Vec::new();
    let mut entries = Vec::new();
    let mut data = Vec::new();
    for (name, payload) in streams {
        let start = if payload.is_empty() {
            END_OF_CHAIN
        } else if payload.len() < MINI_STREAM_CUTOFF {
            let start = push_chain(&mut mini_fat, payload.len().div_ceil(MINI_SECTOR_SIZE));
            mini_stream.extend_from_slice(payload);
            mini_stream.resize(mini_fat.len() * MINI_SECTOR_SIZE, 0);
            start
        } else {
            let start = push_chain(&mut fat, payload.len().div_ceil(SECTOR_SIZE));
            data.extend_from_slice(payload);
            data.resize((fat.len() - 3) * SECTOR_SIZE, 0);
            start
        };
        entries.push(directory_entry(name, 2, start, payload.len() as u64));
    }
    let root_start = if mini_stream.is_empty() {
        END_OF_CHAIN
    } else {
        push_chain(&mut fat, mini_stream.len().div_ceil(SECTOR_SIZE))
    };
    entries.insert(0, directory_entry("Root Entry", 5, root_start, mini_stream.len() as u64));
    data.extend_from_slice(&mini_stream);
    data.resize((fat.len() - 3) * SECTOR_SIZE, 0);

    assert!(fat.len() <= SECTOR_SIZE / 4);
    assert!(mini_fat.len() <= SECTOR_SIZE / 4);
    fat.resize(SECTOR_SIZE / 4, FREE_SECTOR);
    mini_fat.resize(SECTOR_SIZE / 4, FREE_SECTOR);
    entries.resize(4, vec![0u8; 128]);

    let mut header = vec![0u8; SECTOR_SIZE];
    header[0..8].copy_from_slice(&cfb::SIGNATURE);
    header[24..26].copy_from_slice(&0x003Eu16.to_le_bytes());
    header[26..28].copy_from_slice(&3u16.to_le_bytes());
    header[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes());
    header[30..32].copy_from_slice(&9u16.to_le_bytes());
    header[32..34].copy_from_slice(&6u16.to_le_bytes());
    header[44..48].copy_from_slice(&1u32.to_le_bytes());
    header[48..52].copy_from_slice(&1u32.to_le_bytes());
    header[56..60].copy_from_slice(&(MINI_STREAM_CUTOFF as u32).to_le_bytes());
    header[60..64].copy_from_slice(&2u32.to_le_bytes());
    header[64..68].copy_from_slice(&1u32.to_le_bytes());
    header[68..72].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
    for slot in header[76..].chunks_exact_mut(4) {
        slot.copy_from_slice(&FREE_SECTOR.to_le_bytes());
    }
    header[76..80].copy_from_slice(&0u32.to_le_bytes());

    let mut bytes = header;
    bytes.extend(fat.iter().flat_map(|sector| sector.to_le_bytes()));
    bytes.extend(entries.concat());
    bytes.extend(mini_fat.iter().flat_map(|sector| sector.to_le_bytes()));
    bytes.extend(data);
    bytes
}

/// Appends a chain of `count` consecutive sectors to `table` and returns its first sector
fn push_chain(table: &mut Vec<u32>, count: usize) -> u32 {
    let start = table.len() as u32;
    for index in 0..count as u32 {
        table.push(if index as usize + 1 == count { END_OF_CHAIN } else { start + index + 1 });
    }
    start
}

fn directory_entry(name: &str, kind: u8, start: u32, size: u64) -> Vec<u8> {
    let mut entry = vec![0u8; 128];
    let units: Vec<u8> = name
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect();
    entry[..units.len()].copy_from_slice(&units);
    entry[64..66].copy_from_slice(&(units.len() as u16).to_le_bytes());
    entry[66] = kind;
    entry[68..80].fill(0xFF);
    entry[116..120].copy_from_slice(&start.to_le_bytes());
    entry[120..128].copy_from_slice(&size.to_le_bytes());
    entry
}

/// Encodes a BIFF8 record
pub(crate) fn biff_record(kind: u16, body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(body.len() + 4);
    bytes.extend(kind.to_le_bytes());
    bytes.extend((body.len() as u16).to_le_bytes());
    bytes.extend(body);
    bytes
}

/// Encodes a BIFF12 record with 7-bit continuation type and size
pub(crate) fn biff12_record(kind: u16, body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(body.len() + 6);
    push_7bit_integer(&mut bytes, kind as usize);
    push_7bit_integer(&mut bytes, body.len());
    bytes.extend(body);
    bytes
}

fn push_7bit_integer(bytes: &mut Vec<u8>, mut value: usize) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            bytes.push(byte);
            return;
        }
        bytes.push(byte | 0x80);
    }
}

/// Encodes an `XLWideString`
pub(crate) fn wide_string(value: &str) -> Vec<u8> {
    let units: Vec<u16> = value.encode_utf16().collect();
    let mut bytes = (units.len() as u32).to_le_bytes().to_vec();
    bytes.extend(units.iter().flat_map(|unit| unit.to_le_bytes()));
    bytes
}

/// A .xlsx workbook with one single-cell sheet per name
pub(crate) fn xlsx_bytes(sheet_names: &[&str]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for name in sheet_names {
        let mut worksheet = Worksheet::new(*name);
        worksheet.rows.push(vec![Cell::text(format!("{name} data"))]);
        workbook.push(worksheet);
    }
    workbook.write_to(Cursor::new(Vec::new())).unwrap().into_inner()
}

/// A .xlsb package whose workbook part bundles the given sheet names
pub(crate) fn xlsb_bytes(sheet_names: &[&str]) -> Vec<u8> {
    let relationships = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.bin"/></Relationships>"#;
    let mut part = biff12_record(131, &[]);
    part.extend(biff12_record(143, &[]));
    for (index, name) in sheet_names.iter().enumerate() {
        let mut body = Vec::new();
        body.extend(0u32.to_le_bytes());
        body.extend((index as u32 + 1).to_le_bytes());
        body.extend(wide_string(&format!("rId{}", index + 1)));
        body.extend(wide_string(name));
        part.extend(biff12_record(156, &body));
    }
    part.extend(biff12_record(144, &[]));
    part.extend(biff12_record(132, &[]));
    zip_archive(&[
        ("_rels/.rels", relationships.as_bytes()),
        ("xl/workbook.bin", part.as_slice()),
    ])
}

/// A .xls compound file, BIFF8 `Workbook` stream or BIFF5 `Book` stream
pub(crate) fn xls_bytes(sheet_names: &[&str], biff8: bool) -> Vec<u8> {
    let version: u16 = if biff8 { 0x0600 } else { 0x0500 };
    let mut bof = version.to_le_bytes().to_vec();
    bof.extend([0x05, 0x00]);
    bof.resize(16, 0);

    let mut stream = biff_record(0x0809, &bof);
    let code_page: u16 = if biff8 { 1200 } else { 1252 };
    stream.extend(biff_record(66, &code_page.to_le_bytes()));
    for name in sheet_names {
        let mut body = vec![0u8; 6];
        if biff8 {
            let units: Vec<u16> = name.encode_utf16().collect();
            body.extend([units.len() as u8, 0x01]);
            body.extend(units.iter().flat_map(|unit| unit.to_le_bytes()));
        } else {
            let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(name);
            body.push(bytes.len() as u8);
            body.extend(bytes.iter());
        }
        stream.extend(biff_record(133, &body));
    }
    stream.extend(biff_record(10, &[]));
    compound_file(&[(if biff8 { "Workbook" } else { "Book" }, &stream)])
}

/// A compound file shaped like a password protected OOXML workbook
pub(crate) fn encrypted_package_bytes() -> Vec<u8> {
    compound_file(&[
        ("EncryptionInfo", [4u8, 0, 4, 0, 0x40, 0, 0, 0].as_slice()),
        ("EncryptedPackage", [0u8; 64].as_slice()),
    ])
}

pub(crate) fn write_xlsx(dir: &Path, name: &str, sheet_names: &[&str]) -> PathBuf {
    write_bytes(dir, name, &xlsx_bytes(sheet_names))
}

pub(crate) fn write_xlsb(dir: &Path, name: &str, sheet_names: &[&str]) -> PathBuf {
    write_bytes(dir, name, &xlsb_bytes(sheet_names))
}

pub(crate) fn write_xls(dir: &Path, name: &str, sheet_names: &[&str]) -> PathBuf {
    write_bytes(dir, name, &xls_bytes(sheet_names, true))
}
