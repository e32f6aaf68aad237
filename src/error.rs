use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;
use std::sync::Arc;

use csv_stream_core::{ScanError, ScanErrorKind};

use crate::byte_record::ByteRecord;
use crate::decoder::Position;

/// A type alias for `Result<T, csv_stream::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when decoding CSV data.
///
/// Every error is terminal for the decoder that produced it: once a decoder
/// fails, it returns the same error from every later call. For that reason
/// this type is a cheap handle that can be cloned.
#[derive(Clone, Debug)]
pub struct Error(Arc<ErrorKind>);

impl Error {
    /// A crate private constructor for `Error`.
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Arc::new(kind))
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Returns true if this is an I/O error reported by the byte source.
    pub fn is_io_error(&self) -> bool {
        match *self.0 {
            ErrorKind::Io(_) => true,
            _ => false,
        }
    }

    /// The position at which this error occurred, if available.
    pub fn position(&self) -> Option<&Position> {
        match *self.0 {
            ErrorKind::Io(_) | ErrorKind::InvalidOption(_) => None,
            ErrorKind::BareQuote { ref pos }
            | ErrorKind::ExtraneousQuote { ref pos }
            | ErrorKind::UnexpectedEof { ref pos }
            | ErrorKind::UnequalLengths { ref pos, .. }
            | ErrorKind::Utf8 { ref pos, .. } => Some(pos),
        }
    }

    /// Build an error from a scanner error found at `pos`.
    pub(crate) fn scan(err: &ScanError, pos: Position) -> Error {
        Error::new(match err.kind() {
            ScanErrorKind::BareQuote => ErrorKind::BareQuote { pos },
            ScanErrorKind::ExtraneousQuote => {
                ErrorKind::ExtraneousQuote { pos }
            }
            ScanErrorKind::UnexpectedEof => ErrorKind::UnexpectedEof { pos },
        })
    }
}

/// The specific type of an error.
#[derive(Debug)]
pub enum ErrorKind {
    /// An I/O error reported by the byte source. It is never reinterpreted.
    Io(io::Error),
    /// A quote appeared in an unquoted field while lazy quotes are disabled.
    BareQuote {
        /// The position of the quote.
        pos: Position,
    },
    /// A quote closing a quoted field was followed by a byte other than a
    /// delimiter, a record terminator or another quote, while lazy quotes
    /// are disabled.
    ExtraneousQuote {
        /// The position of the byte following the quote.
        pos: Position,
    },
    /// A record had a different number of fields than expected.
    ///
    /// The expected number is either configured explicitly or taken from the
    /// first record. This never occurs when the decoder is flexible.
    UnequalLengths {
        /// The position of the record with the wrong number of fields.
        pos: Position,
        /// The expected number of fields.
        expected_len: u64,
        /// The number of fields in the bad record.
        len: u64,
    },
    /// The input ended inside a quoted field.
    UnexpectedEof {
        /// The position of the end of input.
        pos: Position,
    },
    /// A record could not be converted to a `StringRecord` because it was
    /// not valid UTF-8.
    Utf8 {
        /// The position of the record.
        pos: Position,
        /// The corresponding UTF-8 error.
        err: Utf8Error,
    },
    /// The decoder was configured with an unusable option.
    InvalidOption(&'static str),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err))
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.0 {
            ErrorKind::Io(ref err) => Some(err),
            ErrorKind::Utf8 { ref err, .. } => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::BareQuote { ref pos } => write!(
                f,
                "CSV parse error: record {} (byte {}, line {}): \
                 bare \" in non-quoted field",
                pos.record(),
                pos.byte(),
                pos.line()
            ),
            ErrorKind::ExtraneousQuote { ref pos } => write!(
                f,
                "CSV parse error: record {} (byte {}, line {}): \
                 extraneous or missing \" in quoted field",
                pos.record(),
                pos.byte(),
                pos.line()
            ),
            ErrorKind::UnequalLengths { ref pos, expected_len, len } => {
                write!(
                    f,
                    "CSV error: record {} (byte {}, line {}): \
                     found record with {} fields, but the expected \
                     number of fields is {}",
                    pos.record(),
                    pos.byte(),
                    pos.line(),
                    len,
                    expected_len
                )
            }
            ErrorKind::UnexpectedEof { ref pos } => write!(
                f,
                "CSV parse error: record {} (byte {}, line {}): \
                 unexpected end of input in quoted field",
                pos.record(),
                pos.byte(),
                pos.line()
            ),
            ErrorKind::Utf8 { ref pos, ref err } => write!(
                f,
                "CSV parse error: record {} (byte {}, line {}, field: {}): {}",
                pos.record(),
                pos.byte(),
                pos.line(),
                err.field(),
                err
            ),
            ErrorKind::InvalidOption(msg) => {
                write!(f, "CSV configuration error: {}", msg)
            }
        }
    }
}

/// A UTF-8 validation error that occurs when attempting to convert a
/// `ByteRecord` into a `StringRecord`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FromUtf8Error {
    record: ByteRecord,
    err: Utf8Error,
}

impl FromUtf8Error {
    /// Create a new FromUtf8Error.
    pub(crate) fn new(record: ByteRecord, err: Utf8Error) -> FromUtf8Error {
        FromUtf8Error { record, err }
    }

    /// Access the underlying `ByteRecord` that failed UTF-8 validation.
    pub fn into_byte_record(self) -> ByteRecord {
        self.record
    }

    /// Access the underlying UTF-8 validation error.
    pub fn utf8_error(&self) -> &Utf8Error {
        &self.err
    }
}

impl fmt::Display for FromUtf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl StdError for FromUtf8Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.err)
    }
}

/// A UTF-8 validation error.
///
/// The error includes the index of the field that failed validation, and the
/// last byte at which valid UTF-8 was verified.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Utf8Error {
    /// The field index of a byte record in which UTF-8 validation failed.
    field: usize,
    /// The index into the given field up to which valid UTF-8 was verified.
    valid_up_to: usize,
}

impl Utf8Error {
    /// Create a new UTF-8 error.
    pub(crate) fn new(field: usize, valid_up_to: usize) -> Utf8Error {
        Utf8Error { field, valid_up_to }
    }

    /// The field index of a byte record in which UTF-8 validation failed.
    pub fn field(&self) -> usize {
        self.field
    }

    /// The index into the given field up to which valid UTF-8 was verified.
    pub fn valid_up_to(&self) -> usize {
        self.valid_up_to
    }
}

impl StdError for Utf8Error {}

impl fmt::Display for Utf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid utf-8: invalid UTF-8 in field {} near byte index {}",
            self.field, self.valid_up_to
        )
    }
}
