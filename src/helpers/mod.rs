//! Low-level readers and writers shared by the spreadsheet formats.

pub(crate) mod biff12;
pub(crate) mod biff8;
pub(crate) mod bytes;
pub(crate) mod cfb;
pub(crate) mod xml;
pub(crate) mod zip;
