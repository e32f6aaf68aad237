use std::cmp;
use std::io;

use csv_stream_core::{Class, ScanErrorKind, Scanner, ScannerBuilder};
use log::{debug, trace};
use memchr::{memchr, memchr_iter, memrchr};

use crate::byte_record::{self, ByteRecord};
use crate::config::{Config, FieldsPerRecord};
use crate::error::{Error, ErrorKind, Result};
use crate::source::{IoSource, ReadOutcome, Source};
use crate::string_record::StringRecord;

/// The read buffer grows once its free space drops below this many bytes.
const MIN_READ: usize = 512;

/// Builds a CSV decoder with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, comment handling,
/// quote leniency and more. Once a `Decoder` is built, its configuration
/// cannot be changed.
#[derive(Debug, Default)]
pub struct DecoderBuilder {
    config: Config,
}

impl DecoderBuilder {
    /// Create a new builder with a default configuration.
    pub fn new() -> DecoderBuilder {
        DecoderBuilder::default()
    }

    /// Create a new builder from an existing configuration.
    pub fn from_config(config: Config) -> DecoderBuilder {
        DecoderBuilder { config }
    }

    /// Build a decoder over any `std::io::Read`.
    ///
    /// This returns an error if the configuration is invalid.
    pub fn from_reader<R: io::Read>(
        &self,
        rdr: R,
    ) -> Result<Decoder<IoSource<R>>> {
        self.from_source(IoSource::new(rdr))
    }

    /// Build a decoder over the given byte source.
    ///
    /// This returns an error if the configuration is invalid.
    pub fn from_source<S: Source>(&self, src: S) -> Result<Decoder<S>> {
        self.config.validate()?;
        Ok(Decoder::new(&self.config, src))
    }

    /// The field delimiter to use when decoding CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut DecoderBuilder {
        self.config.delimiter = delimiter;
        self
    }

    /// The comment byte to use when decoding CSV.
    ///
    /// Lines whose first byte other than spaces and tabs is the comment
    /// byte are skipped entirely.
    ///
    /// By default, comments are not recognized.
    pub fn comment(&mut self, comment: Option<u8>) -> &mut DecoderBuilder {
        self.config.comment = comment;
        self
    }

    /// Whether to skip leading white space in each field.
    ///
    /// This is done even if the delimiter is itself white space. Lines that
    /// consist only of white space are skipped when this is enabled.
    ///
    /// This is disabled by default.
    pub fn trim_leading_space(&mut self, yes: bool) -> &mut DecoderBuilder {
        self.config.trim_leading_space = yes;
        self
    }

    /// Whether a quote may appear in an unquoted field, and a quote that is
    /// not doubled may appear in a quoted field.
    ///
    /// This is disabled by default.
    pub fn lazy_quotes(&mut self, yes: bool) -> &mut DecoderBuilder {
        self.config.lazy_quotes = yes;
        self
    }

    /// How to check the number of fields in each record.
    ///
    /// By default, every record must have as many fields as the first one.
    pub fn fields_per_record(
        &mut self,
        fields: FieldsPerRecord,
    ) -> &mut DecoderBuilder {
        self.config.fields_per_record = fields;
        self
    }

    /// Whether records may have a varying number of fields.
    ///
    /// This is a shortcut for `fields_per_record(FieldsPerRecord::Flexible)`
    /// when `yes` is true, and for `FieldsPerRecord::Inferred` otherwise.
    pub fn flexible(&mut self, yes: bool) -> &mut DecoderBuilder {
        self.config.fields_per_record = if yes {
            FieldsPerRecord::Flexible
        } else {
            FieldsPerRecord::Inferred
        };
        self
    }

    /// The initial capacity of the read buffer.
    ///
    /// The buffer grows as needed to hold the longest record. The default is
    /// 8 KiB.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut DecoderBuilder {
        self.config.buffer_capacity = capacity;
        self
    }
}

/// A position in CSV data.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Position {
    byte: u64,
    line: u64,
    column: u64,
    record: u64,
}

impl Default for Position {
    fn default() -> Position {
        Position::new()
    }
}

impl Position {
    /// Returns a new position initialized to the start of the data.
    pub fn new() -> Position {
        Position { byte: 0, line: 1, column: 1, record: 0 }
    }

    /// The byte offset, starting at `0`.
    pub fn byte(&self) -> u64 {
        self.byte
    }

    /// The line number, starting at `1`.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The column within the line, in bytes, starting at `1`.
    pub fn column(&self) -> u64 {
        self.column
    }

    /// The record index, starting at `0`.
    pub fn record(&self) -> u64 {
        self.record
    }

    fn advance_byte(&mut self, b: u8) {
        self.byte += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn advance(&mut self, bytes: &[u8]) {
        self.byte += bytes.len() as u64;
        self.line += memchr_iter(b'\n', bytes).count() as u64;
        self.column = match memrchr(b'\n', bytes) {
            Some(i) => (bytes.len() - i) as u64,
            None => self.column + bytes.len() as u64,
        };
    }
}

/// A streaming CSV decoder.
///
/// A decoder pulls bytes from a [`Source`](trait.Source.html) on demand and
/// yields one record per call to `decode`. It never holds more than one
/// refill beyond the record being decoded, so memory use is bounded by the
/// longest record rather than by the length of the stream.
///
/// The usual loop is:
///
/// ```
/// let data = "city,pop\nBoston,4628910\n";
/// let mut dec = csv_stream::Decoder::from_reader(data.as_bytes());
/// while dec.has_more() {
///     let record = dec.decode()?.expect("has_more promised a record");
///     println!("{:?}", record);
/// }
/// # Ok::<(), csv_stream::Error>(())
/// ```
///
/// # Errors
///
/// Every error is terminal. Once a call fails, every later call to
/// `decode` (or any other read method) returns the same error, since the
/// partially consumed input cannot be resynchronized safely. To continue
/// past bad data, build a new decoder.
///
/// A decoder mutates its buffers in place on every call and must not be
/// shared between threads without external synchronization.
#[derive(Debug)]
pub struct Decoder<S> {
    scanner: Scanner,
    src: S,
    /// The read buffer. `buf[start..end]` holds bytes read from the source
    /// that have not been consumed yet.
    buf: Vec<u8>,
    start: usize,
    end: usize,
    /// Unescaped field data of the record being assembled.
    line: Vec<u8>,
    /// The offset into `line` at which each field starts. The first entry is
    /// always `0`.
    starts: Vec<usize>,
    fields_per_record: FieldsPerRecord,
    /// The number of fields every record must have, once known.
    expected_len: Option<usize>,
    state: DecoderState,
}

#[derive(Debug)]
struct DecoderState {
    /// The position of the next byte to consume.
    cur_pos: Position,
    /// The position at which the record being decoded started.
    record_pos: Position,
    /// Set once the source reports the end of input.
    eof: bool,
    /// A source failure, held back until the bytes returned with it have
    /// been consumed.
    read_err: Option<io::Error>,
    /// The error that put this decoder into its failed state.
    err: Option<Error>,
    /// Whether `err` has been returned to the caller at least once.
    err_reported: bool,
    /// Set once the end of the stream has been observed between records.
    done: bool,
}

impl<R: io::Read> Decoder<IoSource<R>> {
    /// Create a new decoder with a default configuration over any
    /// `std::io::Read`.
    ///
    /// The decoder does its own buffering, so there is no need to wrap the
    /// reader in a `BufReader`.
    pub fn from_reader(rdr: R) -> Decoder<IoSource<R>> {
        Decoder::new(&Config::default(), IoSource::new(rdr))
    }
}

impl<S: Source> Decoder<S> {
    /// Create a new decoder with a default configuration over the given
    /// byte source.
    pub fn from_source(src: S) -> Decoder<S> {
        Decoder::new(&Config::default(), src)
    }

    fn new(config: &Config, src: S) -> Decoder<S> {
        let scanner = ScannerBuilder::new()
            .delimiter(config.delimiter)
            .comment(config.comment)
            .trim_leading_space(config.trim_leading_space)
            .lazy_quotes(config.lazy_quotes)
            .build();
        let expected_len = match config.fields_per_record {
            FieldsPerRecord::Exact(n) => Some(n),
            FieldsPerRecord::Inferred | FieldsPerRecord::Flexible => None,
        };
        Decoder {
            scanner,
            src,
            buf: vec![0; config.buffer_capacity],
            start: 0,
            end: 0,
            line: vec![],
            starts: vec![],
            fields_per_record: config.fields_per_record,
            expected_len,
            state: DecoderState {
                cur_pos: Position::new(),
                record_pos: Position::new(),
                eof: false,
                read_err: None,
                err: None,
                err_reported: false,
                done: false,
            },
        }
    }

    /// Reports whether another record can be decoded.
    ///
    /// This reads from the source only as much as it needs to answer. It
    /// skips blank lines and comment lines, but never consumes bytes that
    /// belong to a record. Once this returns `false`, it keeps returning
    /// `false`.
    ///
    /// If the source fails while looking ahead, the failure becomes this
    /// decoder's error and this returns `true`, so that the next call to
    /// `decode` reports it. After the error has been reported, this returns
    /// `false`.
    pub fn has_more(&mut self) -> bool {
        if self.state.err.is_some() {
            return !self.state.err_reported;
        }
        if self.state.done {
            return false;
        }
        match self.skip_insignificant() {
            Ok(true) => true,
            Ok(false) => {
                self.state.done = true;
                false
            }
            Err(err) => {
                self.fail(err);
                true
            }
        }
    }

    /// Decode the next record as a `StringRecord`.
    ///
    /// This returns `Ok(None)` once the stream has ended cleanly.
    pub fn decode(&mut self) -> Result<Option<StringRecord>> {
        let mut record = StringRecord::new();
        if self.read_record(&mut record)? {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    /// Decode the next record as a `ByteRecord`, without any UTF-8
    /// validation.
    ///
    /// This returns `Ok(None)` once the stream has ended cleanly.
    pub fn decode_byte_record(&mut self) -> Result<Option<ByteRecord>> {
        let mut record = ByteRecord::new();
        if self.read_byte_record(&mut record)? {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    /// Read the next record into the given `StringRecord`, reusing its
    /// allocation.
    ///
    /// This returns `false` once the stream has ended cleanly, in which case
    /// `record` is left empty.
    pub fn read_record(&mut self, record: &mut StringRecord) -> Result<bool> {
        let read_res = self.read_byte_record(record.as_byte_record_mut());
        let utf8_res = byte_record::validate(record.as_byte_record());
        if utf8_res.is_err() {
            // Never let invalid UTF-8 escape into a `StringRecord`.
            record.clear();
        }
        match (read_res, utf8_res) {
            (Err(err), _) => Err(err),
            (Ok(_), Err(err)) => {
                let pos = self.state.record_pos.clone();
                let err = Error::new(ErrorKind::Utf8 { pos, err });
                self.fail(err.clone());
                self.state.err_reported = true;
                Err(err)
            }
            (Ok(more), Ok(())) => Ok(more),
        }
    }

    /// Read the next record into the given `ByteRecord`, reusing its
    /// allocation.
    ///
    /// This returns `false` once the stream has ended cleanly, in which case
    /// `record` is left empty.
    ///
    /// When a record has the wrong number of fields, `record` holds the
    /// fields that were found alongside the `UnequalLengths` error.
    pub fn read_byte_record(
        &mut self,
        record: &mut ByteRecord,
    ) -> Result<bool> {
        if let Some(ref err) = self.state.err {
            self.state.err_reported = true;
            record.clear();
            return Err(err.clone());
        }
        match self.decode_record() {
            Ok(true) => {
                record.set_from_starts(&self.line, &self.starts);
                Ok(true)
            }
            Ok(false) => {
                record.clear();
                Ok(false)
            }
            Err(err) => {
                match *err.kind() {
                    ErrorKind::UnequalLengths { .. } => {
                        record.set_from_starts(&self.line, &self.starts);
                    }
                    _ => record.clear(),
                }
                self.fail(err.clone());
                self.state.err_reported = true;
                Err(err)
            }
        }
    }

    /// Returns a borrowed iterator over all records as `StringRecord`s.
    ///
    /// The iterator stops after yielding the first error.
    pub fn records(&mut self) -> StringRecordsIter<S> {
        StringRecordsIter { dec: self, done: false }
    }

    /// Returns a borrowed iterator over all records as `ByteRecord`s.
    ///
    /// The iterator stops after yielding the first error.
    pub fn byte_records(&mut self) -> ByteRecordsIter<S> {
        ByteRecordsIter { dec: self, done: false }
    }

    /// The position of the next byte this decoder will consume.
    ///
    /// The record index is the number of records decoded so far.
    pub fn position(&self) -> &Position {
        &self.state.cur_pos
    }

    /// Returns true once the end of the stream has been observed between
    /// records.
    pub fn is_done(&self) -> bool {
        self.state.done
    }

    /// Returns a reference to the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.src
    }

    /// Returns a mutable reference to the underlying source.
    ///
    /// Reading from the source directly will very likely corrupt the
    /// stream of records.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.src
    }

    /// Unwraps this decoder, returning the underlying source.
    ///
    /// Any buffered data that has not been decoded is lost.
    pub fn into_inner(self) -> S {
        self.src
    }

    /// Assemble the next record into `line` and `starts`.
    ///
    /// Returns `false` if the stream ended before any record started.
    fn decode_record(&mut self) -> Result<bool> {
        self.line.clear();
        self.starts.clear();
        self.starts.push(0);
        if self.state.done || !self.skip_insignificant()? {
            self.state.done = true;
            return Ok(false);
        }
        self.scanner.reset();
        self.state.record_pos = self.state.cur_pos.clone();
        loop {
            while self.start < self.end {
                let b = self.buf[self.start];
                self.start += 1;
                self.state.cur_pos.advance_byte(b);

                let class = self.scanner.step(b);
                self.retract();
                match class {
                    Class::Continue
                    | Class::BeginField
                    | Class::CarriageReturn
                    | Class::BareQuote => self.line.push(b),
                    Class::Skip => {}
                    Class::FieldDelimiter => self.starts.push(self.line.len()),
                    Class::EndRecord => return self.end_record(),
                    Class::End => return Ok(false),
                    Class::Error => return Err(self.scan_error()),
                }
            }
            // Only consult the outcome of the last read once every byte it
            // returned has been scanned.
            if let Some(err) = self.state.read_err.take() {
                return Err(Error::from(err));
            }
            if self.state.eof {
                let class = self.scanner.finish();
                self.retract();
                return match class {
                    Class::EndRecord => self.end_record(),
                    Class::Error => Err(self.scan_error()),
                    _ => Ok(false),
                };
            }
            self.refill();
        }
    }

    /// Take back the tentative bytes the scanner has reclassified.
    fn retract(&mut self) {
        let n = self.scanner.take_retract();
        let len = self.line.len().saturating_sub(n);
        self.line.truncate(len);
    }

    fn end_record(&mut self) -> Result<bool> {
        let len = self.starts.len();
        match self.expected_len {
            Some(expected_len) if expected_len != len => {
                return Err(Error::new(ErrorKind::UnequalLengths {
                    pos: self.state.record_pos.clone(),
                    expected_len: expected_len as u64,
                    len: len as u64,
                }));
            }
            Some(_) => {}
            None => {
                if self.fields_per_record == FieldsPerRecord::Inferred {
                    self.expected_len = Some(len);
                }
            }
        }
        self.state.cur_pos.record += 1;
        Ok(true)
    }

    fn scan_error(&self) -> Error {
        let mut pos = self.state.cur_pos.clone();
        let err = match self.scanner.error() {
            Some(err) => err,
            None => unreachable!("scanner reported an error without one"),
        };
        if err.kind() != ScanErrorKind::UnexpectedEof {
            // The offending byte has already been consumed.
            pos.byte -= 1;
            pos.column -= 1;
        }
        Error::scan(err, pos)
    }

    fn fail(&mut self, err: Error) {
        debug!("CSV decoder failed: {}", err);
        self.state.err = Some(err);
    }

    /// Consume blank lines and comment lines at the start of a record.
    ///
    /// Returns `true` if bytes remain that start a record, and `false` if
    /// the input ended first. Bytes that belong to a record are never
    /// consumed.
    fn skip_insignificant(&mut self) -> Result<bool> {
        let trim = self.scanner.trim_leading_space();
        let comment = self.scanner.comment();
        // How many leading blanks of the current line have been examined.
        let mut blanks = 0;
        let mut in_comment = false;
        loop {
            if in_comment {
                let rest = &self.buf[self.start..self.end];
                match memchr(b'\n', rest) {
                    Some(i) => {
                        in_comment = false;
                        self.consume(i + 1);
                        continue;
                    }
                    None => {
                        let n = rest.len();
                        self.consume(n);
                    }
                }
            } else {
                let rest = &self.buf[self.start..self.end];
                while blanks < rest.len() && self.is_blank(rest[blanks]) {
                    blanks += 1;
                }
                if let Some(&b) = rest.get(blanks) {
                    if Some(b) == comment {
                        in_comment = true;
                        self.consume(blanks + 1);
                        blanks = 0;
                        continue;
                    }
                    if (b == b'\n' || b == b'\r') && (blanks == 0 || trim) {
                        self.consume(blanks + 1);
                        blanks = 0;
                        continue;
                    }
                    return Ok(true);
                }
            }
            // Everything buffered has been examined without finding the
            // start of a record.
            if let Some(err) = self.state.read_err.take() {
                return Err(Error::from(err));
            }
            if self.state.eof {
                if blanks > 0 && !trim {
                    // A final line of spaces is a record of one field.
                    return Ok(true);
                }
                let n = self.end - self.start;
                self.consume(n);
                return Ok(false);
            }
            self.refill();
        }
    }

    /// Whether `b` may precede a comment byte or a blank line terminator.
    fn is_blank(&self, b: u8) -> bool {
        let space = b == b' ' || b == b'\t' || b == b'\x0B' || b == b'\x0C';
        space
            && (self.scanner.trim_leading_space()
                || b != self.scanner.delimiter())
    }

    fn consume(&mut self, n: usize) {
        let (start, end) = (self.start, self.start + n);
        self.state.cur_pos.advance(&self.buf[start..end]);
        self.start = end;
    }

    /// Read more data from the source.
    ///
    /// Consumed bytes are discarded first, and the buffer is grown if there
    /// is too little room left. Exactly one read is made, and its outcome is
    /// stored rather than acted on.
    fn refill(&mut self) {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        if self.buf.len() - self.end < MIN_READ {
            let new_len = 2 * self.buf.len() + MIN_READ;
            debug!(
                "growing CSV read buffer from {} to {} bytes",
                self.buf.len(),
                new_len
            );
            self.buf.resize(new_len, 0);
        }
        let avail = self.buf.len() - self.end;
        let (n, outcome) = self.src.read(&mut self.buf[self.end..]);
        let n = cmp::min(n, avail);
        trace!("read {} bytes from CSV source: {:?}", n, outcome);
        self.end += n;
        match outcome {
            ReadOutcome::Ready => {}
            ReadOutcome::End => self.state.eof = true,
            ReadOutcome::Failed(err) => self.state.read_err = Some(err),
        }
    }
}

/// A borrowed iterator over `StringRecord`s.
///
/// The lifetime parameter `'d` refers to the lifetime of the decoder.
pub struct StringRecordsIter<'d, S: 'd> {
    dec: &'d mut Decoder<S>,
    done: bool,
}

impl<'d, S: Source> Iterator for StringRecordsIter<'d, S> {
    type Item = Result<StringRecord>;

    fn next(&mut self) -> Option<Result<StringRecord>> {
        if self.done {
            return None;
        }
        match self.dec.decode() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// A borrowed iterator over `ByteRecord`s.
///
/// The lifetime parameter `'d` refers to the lifetime of the decoder.
pub struct ByteRecordsIter<'d, S: 'd> {
    dec: &'d mut Decoder<S>,
    done: bool,
}

impl<'d, S: Source> Iterator for ByteRecordsIter<'d, S> {
    type Item = Result<ByteRecord>;

    fn next(&mut self) -> Option<Result<ByteRecord>> {
        if self.done {
            return None;
        }
        match self.dec.decode_byte_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
