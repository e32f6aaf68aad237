#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// The default capacity of a decoder's read buffer.
const DEFAULT_BUFFER_CAPACITY: usize = 8 * (1 << 10);

/// How a decoder checks the number of fields in each record.
///
/// When loaded through serde, this is written as an integer: `0` means
/// `Inferred`, a positive number `n` means `Exact(n)` and a negative number
/// means `Flexible`. The same mapping is available through `From<i64>`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "i64", into = "i64"))]
pub enum FieldsPerRecord {
    /// Every record must have as many fields as the first record.
    Inferred,
    /// Every record must have exactly this many fields.
    Exact(usize),
    /// Records may have any number of fields.
    Flexible,
}

impl Default for FieldsPerRecord {
    fn default() -> FieldsPerRecord {
        FieldsPerRecord::Inferred
    }
}

impl From<i64> for FieldsPerRecord {
    fn from(n: i64) -> FieldsPerRecord {
        if n == 0 {
            FieldsPerRecord::Inferred
        } else if n < 0 {
            FieldsPerRecord::Flexible
        } else {
            FieldsPerRecord::Exact(n as usize)
        }
    }
}

impl From<FieldsPerRecord> for i64 {
    fn from(fields: FieldsPerRecord) -> i64 {
        match fields {
            FieldsPerRecord::Inferred => 0,
            FieldsPerRecord::Exact(n) => n as i64,
            FieldsPerRecord::Flexible => -1,
        }
    }
}

/// The configuration of a decoder.
///
/// Most callers will want [`DecoderBuilder`](struct.DecoderBuilder.html)
/// instead. This type exists so that a configuration can be stored, or,
/// with the `serde` feature, loaded from a configuration file. Missing keys
/// take their default values.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// The field delimiter. Defaults to `b','`.
    pub delimiter: u8,
    /// The comment byte, if any. Defaults to `None`.
    pub comment: Option<u8>,
    /// Whether to skip leading white space in fields. Defaults to `false`.
    pub trim_leading_space: bool,
    /// Whether to accept quotes in places the strict grammar rejects them.
    /// Defaults to `false`.
    pub lazy_quotes: bool,
    /// How to check the number of fields per record. Defaults to
    /// `FieldsPerRecord::Inferred`.
    pub fields_per_record: FieldsPerRecord,
    /// The initial capacity of the read buffer. Defaults to 8 KiB.
    pub buffer_capacity: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            delimiter: b',',
            comment: None,
            trim_leading_space: false,
            lazy_quotes: false,
            fields_per_record: FieldsPerRecord::Inferred,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl Config {
    /// Check that this configuration can be used to decode CSV.
    ///
    /// The delimiter and comment byte may not be a quote, `\r` or `\n`, and
    /// they may not be equal to each other.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_delimiter(self.delimiter) {
            return Err(invalid("delimiter may not be '\"', '\\r' or '\\n'"));
        }
        if let Some(comment) = self.comment {
            if !is_valid_delimiter(comment) {
                return Err(invalid(
                    "comment may not be '\"', '\\r' or '\\n'",
                ));
            }
            if comment == self.delimiter {
                return Err(invalid("comment and delimiter must differ"));
            }
        }
        Ok(())
    }
}

fn is_valid_delimiter(b: u8) -> bool {
    b != b'"' && b != b'\r' && b != b'\n'
}

fn invalid(msg: &'static str) -> Error {
    Error::new(ErrorKind::InvalidOption(msg))
}
