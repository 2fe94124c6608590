//! Microsoft Office Binary Interchange File Format (BIFF8 / BIFF5)
//! Reader for the record-based workbook stream of Excel 95-2003 files (.xls)

use crate::error::MasterIndexError;
use crate::helpers::bytes::to_u16;
use encoding_rs::Encoding;
use encoding_rs::UTF_16LE;
use encoding_rs::WINDOWS_1252;
use thiserror::Error;

const CONTINUE: u16 = 60;

/// Errors specific to BIFF8 format parsing
#[derive(Error, Debug)]
pub enum Biff8Error {
    #[error("Fewer than {0} bytes remaining")]
    NoEnoughDataError(usize),

    #[error("Record at offset {0} runs past the end of the stream")]
    TruncatedRecordError(usize),
}

/// Reader for the BIFF record stream.
/// Records are a 2-byte type and a 2-byte size; CONTINUE records are joined to their predecessor.
pub(crate) struct Biff8Reader {
    /// Code page for byte strings (BIFF5 and earlier)
    pub(crate) encoding: &'static Encoding,
    buffer: Vec<u8>,
    pointer: usize, // Next read position in buffer
    chunks: Vec<(usize, usize)>, // Current record chunks (start, end)
    index: usize,  // Current chunk index
    offset: usize, // Offset within current chunk
}

impl Biff8Reader {
    pub(crate) fn new(data: Vec<u8>) -> Biff8Reader {
        Biff8Reader {
            encoding: WINDOWS_1252,
            buffer: data,
            pointer: 0,
            chunks: Vec::new(),
            index: 0,
            offset: 0,
        }
    }

    /// Reads the next record type and prepares for reading record data
    /// Returns None when no more records are available
    pub(crate) fn next(&mut self) -> Result<Option<u16>, MasterIndexError> {
        if self.pointer + 4 > self.buffer.len() {
            return Ok(None);
        }
        self.index = 0;
        self.offset = 0;
        self.chunks.clear();

        let kind = self.get_u16_at(self.pointer)?;
        self.push_chunk()?;
        while self.pointer + 4 <= self.buffer.len() && self.get_u16_at(self.pointer)? == CONTINUE {
            self.push_chunk()?;
        }
        Ok(Some(kind))
    }

    /// Registers the record body at the pointer and moves past it
    fn push_chunk(&mut self) -> Result<(), MasterIndexError> {
        let size = self.get_u16_at(self.pointer + 2)? as usize;
        let lower = self.pointer + 4;
        let upper = lower + size;
        if upper > self.buffer.len() {
            Err(Biff8Error::TruncatedRecordError(self.pointer))?
        }
        self.pointer = upper;
        self.chunks.push((lower, upper));
        Ok(())
    }

    /// Reads exactly `length` bytes, returning an error if insufficient data
    fn read_extract(&mut self, length: usize) -> Result<&[u8], MasterIndexError> {
        let (data, size) = self.read(length);
        if size == length {
            Ok(data)
        } else {
            Err(Biff8Error::NoEnoughDataError(length))?
        }
    }

    /// Reads up to `length` bytes from the current chunk of the record
    /// Returns the data slice and actual number of bytes read
    fn read(&mut self, length: usize) -> (&[u8], usize) {
        if let Some((lower, upper)) = self.chunks.get(self.index) {
            let source = (*upper).min(*lower + self.offset);
            let target = (*upper).min(source + length);
            let size = target - source;
            if source < *upper {
                if target == *upper {
                    self.index += 1;
                    self.offset = 0;
                } else {
                    self.offset += size;
                }
                return (&self.buffer[source..target], size);
            }
        }
        (&[], 0)
    }

    pub(crate) fn skip(&mut self, length: usize) -> Result<&[u8], MasterIndexError> {
        self.read_extract(length)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, MasterIndexError> {
        self.read_extract(1).map(|data| data[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, MasterIndexError> {
        self.read_extract(2).map(to_u16)
    }

    /// Gets a 16-bit unsigned integer from the specified absolute position
    fn get_u16_at(&self, index: usize) -> Result<u16, MasterIndexError> {
        if index + 2 <= self.buffer.len() {
            Ok(to_u16(&self.buffer[index..index + 2]))
        } else {
            Err(Biff8Error::NoEnoughDataError(2))?
        }
    }

    /// Reads a ShortXLUnicodeString (1-byte character count, BIFF8)
    pub(crate) fn read_short_xl_unicode_string(&mut self) -> Result<String, MasterIndexError> {
        let mut string = String::new();
        let mut expected = self.read_u8()? as usize;
        let mut actual = self.read_string_into(expected, &mut string)?;
        // A string split by a CONTINUE record restarts with its own flag byte
        while actual < expected && actual > 0 {
            expected -= actual;
            actual = self.read_string_into(expected, &mut string)?;
        }
        Ok(string)
    }

    /// Reads a byte string with a 1-byte length prefix (BIFF5), decoded with the code page
    pub(crate) fn read_short_byte_string(&mut self) -> Result<String, MasterIndexError> {
        let length = self.read_u8()? as usize;
        let encoding = self.encoding;
        let bytes = self.read_extract(length)?;
        let (string, _, _) = encoding.decode(bytes);
        Ok(string.into_owned())
    }

    /// Reads string characters into `content` and returns how many characters were available
    fn read_string_into(&mut self, chars: usize, content: &mut String) -> Result<usize, MasterIndexError> {
        let flag = self.read_u8()?;
        let is_high_byte = (flag & 0x1) > 0;
        let expected = Self::chars_to_bytes(is_high_byte, chars);
        let (bytes, actual) = self.read(expected);
        if is_high_byte {
            let (string, _, _) = UTF_16LE.decode(bytes);
            content.push_str(&string);
        } else {
            // Compressed strings hold the low byte of each UTF-16 code unit
            content.extend(bytes.iter().map(|byte| char::from(*byte)));
        }
        Ok(Self::bytes_to_chars(is_high_byte, actual))
    }

    #[inline]
    fn chars_to_bytes(is_high_byte: bool, chars: usize) -> usize {
        if is_high_byte { chars << 1 } else { chars }
    }

    #[inline]
    fn bytes_to_chars(is_high_byte: bool, bytes: usize) -> usize {
        if is_high_byte { bytes >> 1 } else { bytes }
    }
}

#[macro_export]
macro_rules! match_biff8_record {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(kind) = $reader.next()? {
            match kind {
                $($arms)*
                _ => (),
            }
        }
    };
}
