use std::fmt;
use std::ops::{self, Range};
use std::result;
use std::str;

use bstr::BStr;

use crate::error::Utf8Error;

/// A single CSV record stored as raw bytes.
///
/// All fields are stored contiguously in one buffer, along with the end
/// offset of every field. The first field starts at offset `0` and every
/// other field starts where the previous one ends.
#[derive(Clone, Eq, PartialEq)]
pub struct ByteRecord {
    /// All fields in this record, stored contiguously.
    fields: Vec<u8>,
    /// The ending offset of each field.
    ends: Vec<usize>,
}

impl Default for ByteRecord {
    fn default() -> ByteRecord {
        ByteRecord::new()
    }
}

impl ByteRecord {
    /// Create a new empty `ByteRecord`.
    pub fn new() -> ByteRecord {
        ByteRecord::with_capacity(0, 0)
    }

    /// Create a new empty `ByteRecord` with room for `buffer` bytes of field
    /// data and `fields` fields.
    pub fn with_capacity(buffer: usize, fields: usize) -> ByteRecord {
        ByteRecord {
            fields: Vec::with_capacity(buffer),
            ends: Vec::with_capacity(fields),
        }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    pub fn get(&self, i: usize) -> Option<&[u8]> {
        self.bounds(i).map(|range| &self.fields[range])
    }

    /// Returns true if and only if this record has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fields in this record.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Clear this record so that it has zero fields.
    ///
    /// The allocations are kept, so a cleared record can be handed back to
    /// a decoder for reuse.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.ends.clear();
    }

    /// Returns an iterator over all fields in this record.
    pub fn iter(&self) -> ByteRecordIter {
        ByteRecordIter { r: self, start: 0, i: 0 }
    }

    /// Add a new field to the end of this record.
    pub fn push_field(&mut self, field: &[u8]) {
        self.fields.extend_from_slice(field);
        self.ends.push(self.fields.len());
    }

    /// Return all field data in this record as one contiguous slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.fields
    }

    /// Replace the contents of this record with the fields of `line` that
    /// start at each offset in `starts`.
    ///
    /// `starts` must be non-decreasing and begin with `0`.
    pub(crate) fn set_from_starts(&mut self, line: &[u8], starts: &[usize]) {
        debug_assert_eq!(starts.first(), Some(&0));
        self.clear();
        self.fields.extend_from_slice(line);
        self.ends.extend(starts.iter().skip(1).cloned());
        self.ends.push(line.len());
    }

    fn bounds(&self, i: usize) -> Option<Range<usize>> {
        let end = *self.ends.get(i)?;
        let start = match i.checked_sub(1) {
            None => 0,
            Some(prev) => self.ends[prev],
        };
        Some(start..end)
    }
}

/// Validate the given record as UTF-8.
///
/// If it's not UTF-8, return an error naming the first bad field.
pub(crate) fn validate(record: &ByteRecord) -> result::Result<(), Utf8Error> {
    // If the entire buffer is ASCII, then we have nothing to fear.
    if record.fields.iter().all(|&b| b <= 0x7F) {
        return Ok(());
    }
    // Otherwise, we must check each field individually to ensure that
    // it's valid UTF-8.
    for (i, field) in record.iter().enumerate() {
        if let Err(err) = str::from_utf8(field) {
            return Err(Utf8Error::new(i, err.valid_up_to()));
        }
    }
    Ok(())
}

impl fmt::Debug for ByteRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields: Vec<&BStr> = self.iter().map(<&BStr>::from).collect();
        write!(f, "ByteRecord({:?})", fields)
    }
}

impl ops::Index<usize> for ByteRecord {
    type Output = [u8];

    fn index(&self, i: usize) -> &[u8] {
        match self.get(i) {
            Some(field) => field,
            None => panic!(
                "field index {} out of bounds for record with {} fields",
                i,
                self.len()
            ),
        }
    }
}

impl<T: AsRef<[u8]>> PartialEq<Vec<T>> for ByteRecord {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.len() == other.len()
            && self.iter().zip(other).all(|(a, b)| a == b.as_ref())
    }
}

impl<T: AsRef<[u8]>> PartialEq<[T]> for ByteRecord {
    fn eq(&self, other: &[T]) -> bool {
        self.len() == other.len()
            && self.iter().zip(other).all(|(a, b)| a == b.as_ref())
    }
}

impl<T: AsRef<[u8]>> From<Vec<T>> for ByteRecord {
    fn from(fields: Vec<T>) -> ByteRecord {
        let mut record = ByteRecord::new();
        for field in &fields {
            record.push_field(field.as_ref());
        }
        record
    }
}

impl<'a> IntoIterator for &'a ByteRecord {
    type IntoIter = ByteRecordIter<'a>;
    type Item = &'a [u8];

    fn into_iter(self) -> ByteRecordIter<'a> {
        self.iter()
    }
}

/// An iterator over the fields in a byte record.
#[derive(Clone, Debug)]
pub struct ByteRecordIter<'a> {
    r: &'a ByteRecord,
    start: usize,
    i: usize,
}

impl<'a> Iterator for ByteRecordIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let end = *self.r.ends.get(self.i)?;
        let field = &self.r.fields[self.start..end];
        self.start = end;
        self.i += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.r.len() - self.i;
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for ByteRecordIter<'a> {}
