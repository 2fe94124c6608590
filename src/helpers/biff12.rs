//! Microsoft Office Binary Interchange File Format (BIFF12)
//! Reader for the record stream of Excel 2007+ binary workbooks (.xlsb)

use crate::error::MasterIndexError;
use crate::helpers::bytes::to_usize;
use encoding_rs::UTF_16LE;
use std::borrow::Cow;
use std::io::BufRead;
use thiserror::Error;

/// Character count marking a null `XLNullableWideString`
const NULL_STRING: usize = 0xFFFF_FFFF;

/// Errors specific to BIFF12 format parsing
#[derive(Error, Debug)]
pub enum Biff12Error {
    #[error("No enough data: expect '{0}' bytes, actual '{1}' bytes")]
    NoEnoughData(usize, usize),
}

/// Reader for BIFF12 (Excel 2007+) binary format
pub(crate) struct Biff12Reader<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    /// Size of the record currently held in `buffer`
    size: usize,
}

impl<R: BufRead> Biff12Reader<R> {
    pub(crate) fn new(reader: R) -> Biff12Reader<R> {
        Biff12Reader {
            reader,
            buffer: vec![0; 1024],
            size: 0,
        }
    }

    /// Reads an `XLWideString` at `at` and returns it with the position right after it
    pub(crate) fn get_str_and_bound(&'_ self, at: usize) -> Result<(Cow<'_, str>, usize), MasterIndexError> {
        let chars = self.get_usize(at)?;
        let lower_bound = at + 4;
        let upper_bound = chars
            .checked_mul(2)
            .and_then(|bytes| bytes.checked_add(lower_bound))
            .ok_or(Biff12Error::NoEnoughData(usize::MAX, self.size))?;
        if upper_bound <= self.size {
            let (value, _, _) = UTF_16LE.decode(&self.buffer[lower_bound..upper_bound]);
            Ok((value, upper_bound))
        } else {
            Err(Biff12Error::NoEnoughData(upper_bound, self.size))?
        }
    }

    /// Reads an `XLWideString` at `at`
    pub(crate) fn get_str(&'_ self, at: usize) -> Result<Cow<'_, str>, MasterIndexError> {
        let (data, _) = self.get_str_and_bound(at)?;
        Ok(data)
    }

    /// Returns the position right after the `XLNullableWideString` at `at`
    pub(crate) fn skip_nullable_str(&self, at: usize) -> Result<usize, MasterIndexError> {
        if self.get_usize(at)? == NULL_STRING {
            Ok(at + 4)
        } else {
            self.get_str_and_bound(at).map(|(_, bound)| bound)
        }
    }

    pub(crate) fn get_usize(&self, at: usize) -> Result<usize, MasterIndexError> {
        if at + 4 <= self.size {
            Ok(to_usize(&self.buffer[at..at + 4]))
        } else {
            Err(Biff12Error::NoEnoughData(at + 4, self.size))?
        }
    }

    /// Reads a 7-bit continuation integer with the specified byte limit
    /// Each byte contributes 7 bits and the high bit marks continuation
    fn read_7bit_continuation_integer(&mut self, limit: usize) -> Result<usize, MasterIndexError> {
        let mut integer = 0usize;
        let mut byte = [0u8; 1];
        for index in 0..limit {
            self.reader.read_exact(&mut byte)?;
            integer += ((byte[0] & 0x7F) as usize) << (7 * index);
            if (byte[0] & 0x80) == 0 {
                break;
            }
        }
        Ok(integer)
    }

    /// Reads the next record into the buffer and returns its type
    pub(crate) fn next(&mut self) -> Result<u16, MasterIndexError> {
        let kind = self.read_7bit_continuation_integer(2)? as u16;
        let size = self.read_7bit_continuation_integer(4)?;
        if size > self.buffer.len() {
            self.buffer = vec![0u8; size];
        }
        self.reader.read_exact(&mut self.buffer[..size])?;
        self.size = size;
        Ok(kind)
    }
}

#[macro_export]
macro_rules! match_biff12_record {
    ($reader:expr => { $($arms:tt)* }) => {
        loop {
            match $reader.next()? {
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{biff12_record, wide_string};
    use std::io::Cursor;

    #[test]
    fn test_records_and_strings() {
        let mut body = Vec::new();
        body.extend(0xFFFF_FFFFu32.to_le_bytes());
        body.extend(wide_string("Q1 Sales"));
        let mut stream = biff12_record(156, &body);
        stream.extend(biff12_record(144, &[]));

        let mut reader = Biff12Reader::new(Cursor::new(stream));
        assert_eq!(reader.next().unwrap(), 156);
        let bound = reader.skip_nullable_str(0).unwrap();
        assert_eq!(bound, 4);
        assert_eq!(reader.get_str(bound).unwrap(), "Q1 Sales");
        assert_eq!(reader.next().unwrap(), 144);
        assert!(reader.next().is_err());
    }

    #[test]
    fn test_string_past_record_end() {
        let mut body = Vec::new();
        body.extend(100u32.to_le_bytes());
        body.extend(wide_string("x"));
        let mut reader = Biff12Reader::new(Cursor::new(biff12_record(156, &body)));
        reader.next().unwrap();
        assert!(reader.get_str(0).is_err());
        assert!(reader.get_usize(body.len()).is_err());
    }
}
