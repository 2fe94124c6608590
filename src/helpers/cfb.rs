//! OLE Compound File Binary (CFB) reader for legacy Excel (.xls) format
//! and for password-protected OOXML packages, which are wrapped in a compound file.

use crate::error::MasterIndexError;
use crate::helpers::bytes::to_u16;
use crate::helpers::bytes::to_u64;
use crate::helpers::bytes::to_usize;
use crate::helpers::bytes::to_usize_iter;
use encoding_rs::UTF_16LE;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::ops::Range;
use thiserror::Error;

/// Leading bytes of every compound file.
pub(crate) const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const MAX_REG_SECT: usize = 0xFFFFFFFB;
const HEADER_SIZE: usize = 512;
const DIRECTORY_ENTRY_SIZE: usize = 128;
const MINI_SECTOR_SIZE: usize = 64;
const MINI_STREAM_CUTOFF: usize = 4096;

/// Errors specific to Compound File Binary format parsing
#[derive(Error, Debug)]
pub enum CfbError {
    #[error("The file is corrupted or has an invalid CFB structure")]
    FileFormatError,

    #[error("Invalid OLE signature (not an office document?)")]
    OleSignatureError,

    #[error("Invalid Sector size '2 ^ {1}' for major version '{0}'")]
    SectorSizeError(u16, u16),

    #[error("The number of double indirect file allocation table error: expect '{0}', actual '{1}'")]
    DoubleIndirectFileAllocationTableError(usize, usize),

    #[error("The number of file allocation table error: expect '{0}', actual '{1}'")]
    FileAllocationTableError(usize, usize),

    #[error("Sector chain starting at '{0}' is broken or cyclic")]
    SectorChainError(usize),

    #[error("Empty Root directory")]
    RootDirectoryError,
}

/// Compound File Binary structure representing the entire OLE file
pub(crate) struct Cfb {
    /// Directory index mapping stream names to directory entries
    directories: HashMap<String, Directory>,
    file_allocation_table: Vec<usize>,
    sectors: Sectors,
    mini_file_allocation_table: Vec<usize>,
    /// Mini stream for small streams (64-byte sectors)
    mini_sectors: Sectors,
}

impl Cfb {
    /// Creates a new CFB structure by reading and parsing the entire file
    pub(crate) fn new<RS: Read + Seek>(reader: &mut RS) -> Result<Cfb, MasterIndexError> {
        let size = reader.seek(SeekFrom::End(0))?;
        if size < HEADER_SIZE as u64 {
            Err(CfbError::FileFormatError)?;
        }
        reader.seek(SeekFrom::Start(0))?;
        let mut data: Vec<u8> = vec![0u8; size as usize];
        reader.read_exact(&mut data)?;

        let header = Header::new(&data[..HEADER_SIZE])?;
        let sectors = Sectors { data, size: header.sector_size()? };
        let file_allocation_table = Self::load_file_allocation_table(&sectors, &header)?;
        let directories = Self::load_directories(&file_allocation_table, &sectors, header.directory_shift)?;
        let mini_file_allocation_table = Self::load_mini_file_allocation_table(&file_allocation_table, &sectors, &header)?;
        let mini_sectors = match directories.get("Root Entry") {
            Some(root) => Self::load_mini_sectors(&file_allocation_table, &sectors, root)?,
            None => Sectors { data: Vec::new(), size: MINI_SECTOR_SIZE },
        };

        Ok(Cfb {
            directories,
            file_allocation_table,
            sectors,
            mini_file_allocation_table,
            mini_sectors,
        })
    }

    /// Checks if a stream exists in the CFB structure
    pub(crate) fn exists(&self, name: &str) -> bool {
        self.directories.contains_key(name)
    }

    /// Reads the contents of a stream from the CFB structure
    pub(crate) fn read(&self, name: &str) -> Result<Option<Vec<u8>>, MasterIndexError> {
        if let Some(directory) = self.directories.get(name) {
            let mut bytes = if directory.count < MINI_STREAM_CUTOFF {
                Self::read_bytes(&self.mini_file_allocation_table, &self.mini_sectors, directory.index)?
            } else {
                Self::read_bytes(&self.file_allocation_table, &self.sectors, directory.index)?
            };
            if bytes.len() < directory.count {
                Err(CfbError::SectorChainError(directory.index))?
            }
            bytes.truncate(directory.count);
            Ok(Some(bytes))
        } else {
            Ok(None)
        }
    }

    /// Loads the file allocation table using the double indirect file allocation table
    fn load_file_allocation_table(sectors: &Sectors, header: &Header) -> Result<Vec<usize>, MasterIndexError> {
        let mut double_indirect_file_allocation_table = Vec::<usize>::new();
        double_indirect_file_allocation_table.extend(to_usize_iter(sectors.slice(76..HEADER_SIZE)));

        let mut count = 0usize;
        let mut index = header.double_indirect_file_allocation_table_shift;
        while index < MAX_REG_SECT {
            if count >= header.double_indirect_file_allocation_table_count {
                Err(CfbError::SectorChainError(header.double_indirect_file_allocation_table_shift))?
            }
            double_indirect_file_allocation_table.extend(to_usize_iter(sectors.get(index)?));
            index = double_indirect_file_allocation_table
                .pop()
                .ok_or(CfbError::FileFormatError)?;
            count += 1;
        }
        if count != header.double_indirect_file_allocation_table_count {
            Err(CfbError::DoubleIndirectFileAllocationTableError(header.double_indirect_file_allocation_table_count, count))?
        }

        let mut file_allocation_table: Vec<usize> = Vec::new();
        let mut count = 0usize;
        for index in double_indirect_file_allocation_table {
            if index < MAX_REG_SECT {
                file_allocation_table.extend(to_usize_iter(sectors.get(index)?));
                count += 1;
            }
        }
        if count != header.file_allocation_table_count {
            Err(CfbError::FileAllocationTableError(header.file_allocation_table_count, count))?
        }

        Ok(file_allocation_table)
    }

    /// Loads directory entries from the specified sector index
    fn load_directories(file_allocation_table: &[usize], sectors: &Sectors, index: usize) -> Result<HashMap<String, Directory>, MasterIndexError> {
        let bytes = Self::read_bytes(file_allocation_table, sectors, index)?;
        let directories: HashMap<String, Directory> = bytes
            .chunks_exact(DIRECTORY_ENTRY_SIZE)
            .map(Directory::new)
            .filter(|(name, _)| !name.is_empty())
            .collect();
        if directories.is_empty() {
            Err(CfbError::RootDirectoryError)?
        }
        Ok(directories)
    }

    /// Loads the mini file allocation table for small streams
    fn load_mini_file_allocation_table(file_allocation_table: &[usize], sectors: &Sectors, header: &Header) -> Result<Vec<usize>, MasterIndexError> {
        Ok(if header.mini_file_allocation_table_sector_count > 0 {
            let mini_file_allocation_table = Self::read_bytes(file_allocation_table, sectors, header.mini_file_allocation_table_sector_shift)?;
            to_usize_iter(&mini_file_allocation_table).collect()
        } else {
            Vec::new()
        })
    }

    /// Loads the mini stream, which is stored as the root entry's data
    fn load_mini_sectors(file_allocation_table: &[usize], sectors: &Sectors, root: &Directory) -> Result<Sectors, MasterIndexError> {
        let mut data = Self::read_bytes(file_allocation_table, sectors, root.index)?;
        data.truncate(root.count);
        // Mini sectors have no header, so shift the data by one sector for `Sectors::get`
        let mut shifted = vec![0u8; MINI_SECTOR_SIZE];
        shifted.extend(data);
        Ok(Sectors { data: shifted, size: MINI_SECTOR_SIZE })
    }

    /// Reads the complete content of a stream by following the allocation table chain
    fn read_bytes(file_allocation_table: &[usize], sectors: &Sectors, index: usize) -> Result<Vec<u8>, MasterIndexError> {
        let start = index;
        let mut content: Vec<u8> = Vec::new();
        let mut index = index;
        let mut steps = 0usize;
        while index < MAX_REG_SECT {
            if steps > file_allocation_table.len() {
                Err(CfbError::SectorChainError(start))?
            }
            content.extend(sectors.get(index)?);
            index = *file_allocation_table
                .get(index)
                .ok_or(CfbError::SectorChainError(start))?;
            steps += 1;
        }
        Ok(content)
    }
}

/// Container for all sectors in the CFB file; sector 0 starts right after the header
#[derive(Debug)]
struct Sectors {
    data: Vec<u8>,
    size: usize,
}

impl Sectors {
    /// Gets the data for the sector at the specified index
    fn get(&self, index: usize) -> Result<&[u8], CfbError> {
        let source = index
            .checked_add(1)
            .and_then(|next| next.checked_mul(self.size))
            .ok_or(CfbError::FileFormatError)?;
        if source >= self.data.len() {
            return Err(CfbError::SectorChainError(index));
        }
        let target = self.data.len().min(source + self.size);
        Ok(&self.data[source..target])
    }

    fn slice(&self, range: Range<usize>) -> &[u8] {
        &self.data[range]
    }
}

/// CFB file header structure
#[derive(Debug)]
struct Header {
    signature: u64,
    major_version: u16,
    sector_shift: u16,
    file_allocation_table_count: usize,
    directory_shift: usize,
    mini_file_allocation_table_sector_shift: usize,
    mini_file_allocation_table_sector_count: usize,
    double_indirect_file_allocation_table_shift: usize,
    double_indirect_file_allocation_table_count: usize,
}

impl Header {
    /// Parses the CFB header from the first 512 bytes of data
    fn new(data: &[u8]) -> Result<Self, MasterIndexError> {
        let header = Header {
            signature: to_u64(&data[0..8]),
            major_version: to_u16(&data[26..28]),
            sector_shift: to_u16(&data[30..32]),
            file_allocation_table_count: to_usize(&data[44..48]),
            directory_shift: to_usize(&data[48..52]),
            mini_file_allocation_table_sector_shift: to_usize(&data[60..64]),
            mini_file_allocation_table_sector_count: to_usize(&data[64..68]),
            double_indirect_file_allocation_table_shift: to_usize(&data[68..72]),
            double_indirect_file_allocation_table_count: to_usize(&data[72..76]),
        };

        if header.signature != u64::from_le_bytes(SIGNATURE) {
            Err(CfbError::OleSignatureError)?;
        }

        Ok(header)
    }

    /// Calculates the sector size based on major version and sector shift
    fn sector_size(&self) -> Result<usize, MasterIndexError> {
        if self.major_version == 3 && self.sector_shift == 0x0009 {
            Ok(512) // 2 ^ 9
        } else if self.major_version == 4 && self.sector_shift == 0x000C {
            // Version 4 pads the 512-byte header with zeroes up to a full sector
            Ok(4096) // 2 ^ 12
        } else {
            Err(CfbError::SectorSizeError(self.major_version, self.sector_shift))?
        }
    }
}

/// Directory entry representing a stream in the CFB structure
#[derive(Debug)]
struct Directory {
    index: usize,
    count: usize,
}

impl Directory {
    /// Creates a directory entry from raw bytes
    fn new(bytes: &[u8]) -> (String, Directory) {
        let size = (to_u16(&bytes[64..66]) as usize).min(64);
        let (name, _, _) = UTF_16LE.decode(&bytes[..size]);
        let name = match name.find('\0') {
            Some(position) => name[..position].to_owned(),
            None => name.to_string(),
        };

        let index = to_usize(&bytes[116..120]);
        let count = to_u64(&bytes[120..128]) as usize;
        (name, Directory { index, count })
    }
}
