use std::fmt;
use std::ops;
use std::result;
use std::str;

use crate::byte_record::{self, ByteRecord, ByteRecordIter};
use crate::error::FromUtf8Error;

/// A single CSV record stored as valid UTF-8 bytes.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct StringRecord(ByteRecord);

impl StringRecord {
    /// Create a new empty `StringRecord`.
    pub fn new() -> StringRecord {
        StringRecord(ByteRecord::new())
    }

    /// Create a new `StringRecord` from a `ByteRecord`.
    ///
    /// Note that this does UTF-8 validation. If the given `ByteRecord` does
    /// not contain valid UTF-8, then this returns an error. The error includes
    /// the UTF-8 error and the original `ByteRecord`.
    pub fn from_byte_record(
        record: ByteRecord,
    ) -> result::Result<StringRecord, FromUtf8Error> {
        match byte_record::validate(&record) {
            Ok(()) => Ok(StringRecord(record)),
            Err(err) => Err(FromUtf8Error::new(record, err)),
        }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.0.get(i).map(to_str)
    }

    /// Returns true if and only if this record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of fields in this record.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Clear this record so that it has zero fields.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Add a new field to the end of this record.
    pub fn push_field(&mut self, field: &str) {
        self.0.push_field(field.as_bytes());
    }

    /// Returns an iterator over all fields in this record.
    pub fn iter(&self) -> StringRecordIter {
        StringRecordIter(self.0.iter())
    }

    /// Copy every field into an owned `String`.
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(String::from).collect()
    }

    /// Return a reference to the underlying byte record.
    pub fn as_byte_record(&self) -> &ByteRecord {
        &self.0
    }

    /// Convert this record into a byte record.
    pub fn into_byte_record(self) -> ByteRecord {
        self.0
    }

    /// A mutable reference to the underlying byte record.
    ///
    /// Callers must restore the UTF-8 invariant before handing the record
    /// out.
    pub(crate) fn as_byte_record_mut(&mut self) -> &mut ByteRecord {
        &mut self.0
    }
}

fn to_str(field: &[u8]) -> &str {
    // Every `StringRecord` is validated on construction, and every crate
    // internal mutation re-validates it, so this cannot fail.
    match str::from_utf8(field) {
        Ok(field) => field,
        Err(_) => unreachable!("StringRecord contains invalid UTF-8"),
    }
}

impl fmt::Debug for StringRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields: Vec<&str> = self.iter().collect();
        write!(f, "StringRecord({:?})", fields)
    }
}

impl ops::Index<usize> for StringRecord {
    type Output = str;

    fn index(&self, i: usize) -> &str {
        to_str(&self.0[i])
    }
}

impl<T: AsRef<str>> From<Vec<T>> for StringRecord {
    fn from(fields: Vec<T>) -> StringRecord {
        let mut record = StringRecord::new();
        for field in &fields {
            record.push_field(field.as_ref());
        }
        record
    }
}

impl<T: AsRef<[u8]>> PartialEq<Vec<T>> for StringRecord {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.0 == *other
    }
}

impl<T: AsRef<[u8]>> PartialEq<[T]> for StringRecord {
    fn eq(&self, other: &[T]) -> bool {
        self.0 == *other
    }
}

impl<'a> IntoIterator for &'a StringRecord {
    type IntoIter = StringRecordIter<'a>;
    type Item = &'a str;

    fn into_iter(self) -> StringRecordIter<'a> {
        self.iter()
    }
}

/// An iterator over the fields in a string record.
#[derive(Clone, Debug)]
pub struct StringRecordIter<'a>(ByteRecordIter<'a>);

impl<'a> Iterator for StringRecordIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.0.next().map(to_str)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a> ExactSizeIterator for StringRecordIter<'a> {}
