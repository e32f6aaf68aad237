use core::fmt;

/// The classification of a single byte fed to a [`Scanner`].
///
/// This is the whole contract between the scanner and whatever assembles
/// records on top of it. A caller must react to each class the same way
/// regardless of which state produced it:
///
/// * `Continue`, `BeginField`, `CarriageReturn` and `BareQuote` append the
///   byte to the current field. The last two are tentative: the scanner may
///   later ask for them back through [`Scanner::take_retract`].
/// * `Skip` discards the byte.
/// * `FieldDelimiter` ends the current field and starts the next one.
/// * `EndRecord` ends the current field and the record.
/// * `End` means no record was in progress when the input ended.
/// * `Error` means the input is malformed. See [`Scanner::error`].
///
/// [`Scanner`]: struct.Scanner.html
/// [`Scanner::take_retract`]: struct.Scanner.html#method.take_retract
/// [`Scanner::error`]: struct.Scanner.html#method.error
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Class {
    /// An ordinary content byte.
    Continue,
    /// The first content byte of an unquoted field.
    BeginField,
    /// A field delimiter.
    FieldDelimiter,
    /// A byte with no content, such as an opening quote, a trimmed space or
    /// a byte of a comment line.
    Skip,
    /// A record terminator.
    EndRecord,
    /// A `\r` that may be the first half of a CRLF pair.
    CarriageReturn,
    /// A quote inside a quoted field that may close the field.
    BareQuote,
    /// The input ended between records. Only returned by `finish`.
    End,
    /// The input is malformed.
    Error,
}

/// The state a `CarriageReturn` lookahead resumes into when the byte after
/// the `\r` turns out not to be a `\n`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resume {
    /// The `\r` appeared in (or started) an unquoted field.
    Unquoted,
    /// The `\r` appeared inside a quoted field.
    Quoted,
    /// The `\r` directly followed a quote that may close a quoted field.
    AfterQuote,
}

impl Resume {
    /// The number of tentative bytes that become structural if this
    /// lookahead turns out to be a record terminator.
    fn pending(&self) -> usize {
        match *self {
            Resume::Unquoted | Resume::Quoted => 1,
            Resume::AfterQuote => 2,
        }
    }
}

/// The states of the scanner.
///
/// Exactly one state is active at a time, and every byte moves the scanner
/// from one state to another.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// The start of a record, before its first field.
    ///
    /// Blank lines and comment lines are skipped here, as are leading
    /// spaces when trimming is enabled.
    StartRecord,
    /// The start of any field after the first one in a record.
    BeginValue,
    /// Inside a field that did not start with a quote.
    InUnquotedField,
    /// Inside a field that started with a quote.
    InQuotedField,
    /// A quote was seen inside a quoted field. The next byte decides whether
    /// it closed the field or was the first half of an escaped quote.
    BareQuote,
    /// A `\r` was seen. The next byte decides whether it was part of a CRLF
    /// pair.
    CarriageReturn(Resume),
    /// Inside a comment line.
    Comment,
    /// The input was malformed. This state is only left by `reset`.
    Error,
}

/// The kind of a scanning error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScanErrorKind {
    /// A quote appeared in an unquoted field and lazy quotes are disabled.
    BareQuote,
    /// A quote closing a quoted field was followed by something other than
    /// a delimiter, a record terminator or another quote.
    ExtraneousQuote,
    /// The input ended inside a quoted field.
    UnexpectedEof,
}

/// An error found while scanning malformed CSV data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScanError {
    kind: ScanErrorKind,
    offset: u64,
}

impl ScanError {
    /// The kind of this error.
    pub fn kind(&self) -> ScanErrorKind {
        self.kind
    }

    /// The zero based offset of the byte at which the error was found,
    /// counted over every byte fed to the scanner. For `UnexpectedEof`, this
    /// is the total number of bytes fed to the scanner.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ScanErrorKind::BareQuote => {
                write!(f, "bare \" in non-quoted field (byte {})", self.offset)
            }
            ScanErrorKind::ExtraneousQuote => {
                write!(f, "extraneous \" in field (byte {})", self.offset)
            }
            ScanErrorKind::UnexpectedEof => write!(
                f,
                "unexpected end of CSV input in quoted field (byte {})",
                self.offset
            ),
        }
    }
}

/// A byte at a time CSV scanner.
///
/// The scanner is a finite state transducer. Each call to `step` consumes a
/// single byte and returns its [`Class`](enum.Class.html). It performs no
/// I/O and holds no buffers, so it can be driven over input that arrives in
/// arbitrary pieces.
///
/// The scanner follows the field splitting rules of conventional batch CSV
/// parsers:
///
/// * Fields are separated by a single byte delimiter (`,` by default).
/// * Records end with `\n` or `\r\n`. Blank lines are ignored.
/// * A field starting with `"` is quoted. Inside it, `""` is a literal
///   quote, and delimiters and line terminators are content. A `\r\n` inside
///   a quoted field is read as `\n`.
/// * A quote anywhere else is an error unless lazy quotes are enabled.
/// * If a comment byte is set, lines starting with it are ignored.
///
/// `reset` must be called before reusing a scanner whose last record ended
/// in an error, and is cheap enough to call before every record.
#[derive(Clone, Debug)]
pub struct Scanner {
    state: State,
    delimiter: u8,
    comment: Option<u8>,
    trim_leading_space: bool,
    lazy_quotes: bool,
    /// The number of tentative bytes the caller must take back after the
    /// most recent call to `step` or `finish`.
    retract: usize,
    err: Option<ScanError>,
    bytes: u64,
}

impl Default for Scanner {
    fn default() -> Scanner {
        Scanner {
            state: State::StartRecord,
            delimiter: b',',
            comment: None,
            trim_leading_space: false,
            lazy_quotes: false,
            retract: 0,
            err: None,
            bytes: 0,
        }
    }
}

/// Builds a CSV scanner with various configuration knobs.
///
/// Once a `Scanner` is built, its configuration cannot be changed.
#[derive(Debug, Default)]
pub struct ScannerBuilder {
    scanner: Scanner,
}

impl ScannerBuilder {
    /// Create a new builder.
    pub fn new() -> ScannerBuilder {
        ScannerBuilder::default()
    }

    /// Build a scanner from this configuration.
    pub fn build(&self) -> Scanner {
        let mut scanner = self.scanner.clone();
        scanner.reset();
        scanner
    }

    /// The field delimiter to use when scanning CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ScannerBuilder {
        self.scanner.delimiter = delimiter;
        self
    }

    /// The comment byte to use when scanning CSV.
    ///
    /// A record that starts with this byte is skipped up to and including
    /// the next `\n`. When leading spaces are trimmed, the comment byte may
    /// also follow leading spaces.
    ///
    /// By default, comments are not recognized.
    pub fn comment(&mut self, comment: Option<u8>) -> &mut ScannerBuilder {
        self.scanner.comment = comment;
        self
    }

    /// Whether to skip leading white space (space, tab, vertical tab and
    /// form feed) in each field.
    ///
    /// This is disabled by default.
    pub fn trim_leading_space(&mut self, yes: bool) -> &mut ScannerBuilder {
        self.scanner.trim_leading_space = yes;
        self
    }

    /// Whether to accept quotes where the strict grammar rejects them.
    ///
    /// When enabled, a quote in an unquoted field is content, and a quote in
    /// a quoted field that is not followed by a delimiter, terminator or
    /// second quote is content too. An unterminated quoted field is closed
    /// at the end of input.
    ///
    /// This is disabled by default.
    pub fn lazy_quotes(&mut self, yes: bool) -> &mut ScannerBuilder {
        self.scanner.lazy_quotes = yes;
        self
    }
}

impl Scanner {
    /// Create a new scanner with a default configuration.
    pub fn new() -> Scanner {
        ScannerBuilder::new().build()
    }

    /// Return the scanner to its initial state, the start of a record.
    ///
    /// This clears any stored error. The count of bytes fed to the scanner
    /// is kept.
    pub fn reset(&mut self) {
        self.state = State::StartRecord;
        self.retract = 0;
        self.err = None;
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The error that moved the scanner into the `Error` state, if any.
    pub fn error(&self) -> Option<&ScanError> {
        self.err.as_ref()
    }

    /// The total number of bytes fed to `step`.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// The configured field delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// The configured comment byte.
    pub fn comment(&self) -> Option<u8> {
        self.comment
    }

    /// Whether leading white space in fields is skipped.
    pub fn trim_leading_space(&self) -> bool {
        self.trim_leading_space
    }

    /// Whether lazy quotes are enabled.
    pub fn lazy_quotes(&self) -> bool {
        self.lazy_quotes
    }

    /// Return the number of tentative bytes the caller must remove from the
    /// end of its output, and clear it.
    ///
    /// Tentative bytes are those classified as `CarriageReturn` or
    /// `BareQuote`. This should be consulted after every call to `step` or
    /// `finish`, and applied *before* acting on the returned class. It is
    /// never more than `2`.
    pub fn take_retract(&mut self) -> usize {
        let n = self.retract;
        self.retract = 0;
        n
    }

    /// Classify the next byte of input.
    ///
    /// This never panics. Once an error is returned, every later call
    /// returns `Class::Error` until `reset` is called.
    #[inline]
    pub fn step(&mut self, b: u8) -> Class {
        self.bytes += 1;
        self.retract = 0;
        self.transition(b)
    }

    /// Tell the scanner that there is no more input.
    ///
    /// This returns `End` if no record was in progress, `EndRecord` if the
    /// input ended inside a record, and `Error` if the input ended inside a
    /// quoted field while lazy quotes are disabled. After `EndRecord`, the
    /// scanner is at the start of a record again, so calling `finish` a
    /// second time returns `End`.
    pub fn finish(&mut self) -> Class {
        use self::State::*;

        self.retract = 0;
        match self.state {
            StartRecord | Comment => {
                self.state = StartRecord;
                Class::End
            }
            BeginValue | InUnquotedField => self.end_record(0),
            InQuotedField => {
                if self.lazy_quotes {
                    self.end_record(0)
                } else {
                    self.error_at(ScanErrorKind::UnexpectedEof, self.bytes)
                }
            }
            BareQuote => self.end_record(1),
            CarriageReturn(Resume::Quoted) if !self.lazy_quotes => {
                self.error_at(ScanErrorKind::UnexpectedEof, self.bytes)
            }
            CarriageReturn(resume) => self.end_record(resume.pending()),
            Error => Class::Error,
        }
    }

    /// Check that `data` is complete, well formed CSV under this scanner's
    /// configuration.
    ///
    /// The scanner is reset first. On failure, the error is also available
    /// through `error`.
    pub fn validate(&mut self, data: &[u8]) -> Result<(), ScanError> {
        self.reset();
        for &b in data {
            if self.step(b) == Class::Error {
                break;
            }
        }
        self.finish();
        match self.err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn transition(&mut self, b: u8) -> Class {
        use self::State::*;

        match self.state {
            StartRecord => {
                if self.comment == Some(b) {
                    self.state = Comment;
                    Class::Skip
                } else if self.trim_leading_space && is_space(b) {
                    Class::Skip
                } else if b == b'\n' || b == b'\r' {
                    Class::Skip
                } else {
                    self.begin_value(b)
                }
            }
            BeginValue => {
                if self.trim_leading_space && is_space(b) {
                    Class::Skip
                } else {
                    self.begin_value(b)
                }
            }
            InUnquotedField => {
                if b == self.delimiter {
                    self.state = BeginValue;
                    Class::FieldDelimiter
                } else if b == b'\n' {
                    self.end_record(0)
                } else if b == b'\r' {
                    self.state = CarriageReturn(Resume::Unquoted);
                    Class::CarriageReturn
                } else if b == b'"' && !self.lazy_quotes {
                    self.fail(ScanErrorKind::BareQuote)
                } else {
                    Class::Continue
                }
            }
            InQuotedField => {
                if b == b'"' {
                    self.state = BareQuote;
                    Class::BareQuote
                } else if b == b'\r' {
                    self.state = CarriageReturn(Resume::Quoted);
                    Class::CarriageReturn
                } else {
                    Class::Continue
                }
            }
            BareQuote => {
                if b == b'"' {
                    // The tentative quote stays as the literal one.
                    self.state = InQuotedField;
                    Class::Skip
                } else if b == self.delimiter {
                    self.retract = 1;
                    self.state = BeginValue;
                    Class::FieldDelimiter
                } else if b == b'\n' {
                    self.end_record(1)
                } else if b == b'\r' {
                    self.state = CarriageReturn(Resume::AfterQuote);
                    Class::CarriageReturn
                } else if self.lazy_quotes {
                    self.redo(InQuotedField, b)
                } else {
                    self.fail(ScanErrorKind::ExtraneousQuote)
                }
            }
            // Only `\n` is absorbed after a `\r`. Another `\r` or white space
            // is content, even when leading space is trimmed.
            CarriageReturn(resume) => {
                if b == b'\n' {
                    match resume {
                        Resume::Quoted => {
                            self.retract = 1;
                            self.state = InQuotedField;
                            Class::Continue
                        }
                        Resume::Unquoted | Resume::AfterQuote => {
                            self.end_record(resume.pending())
                        }
                    }
                } else {
                    match resume {
                        Resume::Unquoted => self.redo(InUnquotedField, b),
                        Resume::Quoted => self.redo(InQuotedField, b),
                        Resume::AfterQuote if self.lazy_quotes => {
                            self.redo(InQuotedField, b)
                        }
                        Resume::AfterQuote => {
                            self.fail(ScanErrorKind::ExtraneousQuote)
                        }
                    }
                }
            }
            Comment => {
                if b == b'\n' {
                    self.state = StartRecord;
                }
                Class::Skip
            }
            Error => Class::Error,
        }
    }

    /// Handle the first byte of a field that is not trimmed space.
    fn begin_value(&mut self, b: u8) -> Class {
        if b == self.delimiter {
            self.state = State::BeginValue;
            Class::FieldDelimiter
        } else if b == b'"' {
            self.state = State::InQuotedField;
            Class::Skip
        } else if b == b'\n' {
            self.end_record(0)
        } else if b == b'\r' {
            self.state = State::CarriageReturn(Resume::Unquoted);
            Class::CarriageReturn
        } else {
            self.state = State::InUnquotedField;
            Class::BeginField
        }
    }

    /// Reprocess `b` in `state`. The byte that was pending before `b` is
    /// confirmed as content.
    fn redo(&mut self, state: State, b: u8) -> Class {
        self.state = state;
        self.transition(b)
    }

    fn end_record(&mut self, retract: usize) -> Class {
        self.retract = retract;
        self.state = State::StartRecord;
        Class::EndRecord
    }

    fn fail(&mut self, kind: ScanErrorKind) -> Class {
        let offset = self.bytes.saturating_sub(1);
        self.error_at(kind, offset)
    }

    fn error_at(&mut self, kind: ScanErrorKind, offset: u64) -> Class {
        self.state = State::Error;
        self.err = Some(ScanError { kind, offset });
        Class::Error
    }
}

/// Returns true if `data` is complete, well formed CSV with the default
/// dialect.
///
/// An unterminated quoted field makes the data invalid.
pub fn is_valid(data: &[u8]) -> bool {
    Scanner::new().validate(data).is_ok()
}

fn is_space(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\x0B' || b == b'\x0C'
}

#[cfg(test)]
mod tests {
    use core::str;

    use arrayvec::{ArrayString, ArrayVec};

    use super::{
        is_valid, Class, Resume, ScanErrorKind, Scanner, ScannerBuilder,
        State,
    };

    type Csv = ArrayVec<Row, 10>;
    type Row = ArrayVec<Field, 10>;
    type Field = ArrayString<16>;

    macro_rules! csv {
        ($([$($field:expr),*]),*) => {{
            #[allow(unused_mut)]
            fn x() -> Csv {
                let mut csv = Csv::new();
                $(
                    let mut row = Row::new();
                    $(
                        row.push(Field::from($field).unwrap());
                    )*
                    csv.push(row);
                )*
                csv
            }
            x()
        }}
    }

    macro_rules! scans_to {
        ($name:ident, $data:expr, $expected:expr) => {
            scans_to!($name, $data, $expected, |builder| builder);
        };
        ($name:ident, $data:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = ScannerBuilder::new();
                $config(&mut builder);
                let mut scanner = builder.build();
                let got = scan(&mut scanner, $data);
                assert_eq!(Ok($expected), got);
            }
        };
    }

    macro_rules! scan_fails {
        ($name:ident, $data:expr, $kind:expr) => {
            scan_fails!($name, $data, $kind, |builder| builder);
        };
        ($name:ident, $data:expr, $kind:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = ScannerBuilder::new();
                $config(&mut builder);
                let mut scanner = builder.build();
                let got = scan(&mut scanner, $data);
                assert_eq!(Err($kind), got);
            }
        };
    }

    /// Assemble records the way a decoder does, from classes alone.
    fn scan(scanner: &mut Scanner, data: &str) -> Result<Csv, ScanErrorKind> {
        let mut csv = Csv::new();
        let mut row = Row::new();
        let mut field = ArrayVec::<u8, 16>::new();

        let mut input = data.as_bytes().iter();
        loop {
            let (class, b) = match input.next() {
                Some(&b) => (scanner.step(b), b),
                None => (scanner.finish(), 0),
            };
            for _ in 0..scanner.take_retract() {
                field.pop();
            }
            match class {
                Class::Continue
                | Class::BeginField
                | Class::CarriageReturn
                | Class::BareQuote => field.push(b),
                Class::Skip => {}
                Class::FieldDelimiter => {
                    row.push(to_field(&field));
                    field.clear();
                }
                Class::EndRecord => {
                    row.push(to_field(&field));
                    field.clear();
                    csv.push(row);
                    row = Row::new();
                }
                Class::End => return Ok(csv),
                Class::Error => {
                    return Err(scanner.error().unwrap().kind());
                }
            }
        }
    }

    fn to_field(bytes: &[u8]) -> Field {
        Field::from(str::from_utf8(bytes).unwrap()).unwrap()
    }

    fn classes(scanner: &mut Scanner, data: &[u8]) -> ArrayVec<Class, 32> {
        data.iter().map(|&b| scanner.step(b)).collect()
    }

    scans_to!(one_row_one_field, "a", csv![["a"]]);
    scans_to!(one_row_many_fields, "a,b,c", csv![["a", "b", "c"]]);
    scans_to!(one_row_trailing_comma, "a,b,", csv![["a", "b", ""]]);
    scans_to!(one_row_one_field_lf, "a\n", csv![["a"]]);
    scans_to!(one_row_many_fields_lf, "a,b,c\n", csv![["a", "b", "c"]]);
    scans_to!(one_row_trailing_comma_lf, "a,b,\n", csv![["a", "b", ""]]);
    scans_to!(one_row_one_field_crlf, "a\r\n", csv![["a"]]);
    scans_to!(one_row_many_fields_crlf, "a,b,c\r\n", csv![["a", "b", "c"]]);
    scans_to!(one_row_trailing_comma_crlf, "a,b,\r\n", csv![["a", "b", ""]]);
    scans_to!(one_row_trailing_cr, "a,b\r", csv![["a", "b"]]);

    scans_to!(many_rows_one_field, "a\nb", csv![["a"], ["b"]]);
    scans_to!(
        many_rows_many_fields,
        "a,b,c\nx,y,z",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );
    scans_to!(
        many_rows_many_fields_crlf,
        "a,b,c\r\nx,y,z\r\n",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );
    scans_to!(
        many_rows_mixed_terminators,
        "a,b\r\nx,y\nm,n\r\n",
        csv![["a", "b"], ["x", "y"], ["m", "n"]]
    );

    scans_to!(empty, "", csv![]);
    scans_to!(empty_lines, "\n\n\n\n", csv![]);
    scans_to!(empty_lines_crlf, "\r\n\r\n\r\n", csv![]);
    scans_to!(
        empty_lines_interspersed,
        "\n\na,b\n\n\nx,y\n\n\nm,n\n",
        csv![["a", "b"], ["x", "y"], ["m", "n"]]
    );

    scans_to!(lone_cr_is_content, "a\rb,c\n", csv![["a\rb", "c"]]);
    scans_to!(double_cr_then_lf, "a\r\r\n", csv![["a\r"]]);
    scans_to!(cr_starts_field, "a,\rb\n", csv![["a", "\rb"]]);
    scans_to!(cr_empty_field, "a,\r\n", csv![["a", ""]]);
    scans_to!(repeated_cr_is_content, "a\r\rb\n", csv![["a\r\rb"]]);
    scans_to!(
        cr_then_space_when_trimming,
        "a,\r b\n",
        csv![["a", "\r b"]],
        |b: &mut ScannerBuilder| {
            b.trim_leading_space(true);
        }
    );
    scans_to!(
        quoted_cr_then_space_when_trimming,
        "\"a\r \"\n",
        csv![["a\r "]],
        |b: &mut ScannerBuilder| {
            b.trim_leading_space(true);
        }
    );

    scans_to!(quote_empty, "\"\"", csv![[""]]);
    scans_to!(quote_lf, "\"\"\n", csv![[""]]);
    scans_to!(quote_crlf, "\"a\"\r\n", csv![["a"]]);
    scans_to!(quote_space, "\" \"", csv![[" "]]);
    scans_to!(quote_inner_space, "\" a \"", csv![[" a "]]);
    scans_to!(quote_delimiter, "\"a,b\",c", csv![["a,b", "c"]]);
    scans_to!(quote_newline, "\"a\nb\",c", csv![["a\nb", "c"]]);
    scans_to!(quote_crlf_inside, "\"a\r\nb\"", csv![["a\nb"]]);
    scans_to!(quote_cr_inside, "\"a\rb\"", csv![["a\rb"]]);
    scans_to!(quote_cr_before_close, "\"a\r\"", csv![["a\r"]]);
    scans_to!(quote_doubled, "\"a\"\"b\",c", csv![["a\"b", "c"]]);
    scans_to!(quote_only_doubled, "\"\"\"\"", csv![["\""]]);
    scans_to!(
        quote_trailing_field_empty,
        "\"a\",\n",
        csv![["a", ""]]
    );

    scan_fails!(bare_quote, "a\"b,c", ScanErrorKind::BareQuote);
    scan_fails!(bare_quote_after_space, " \"a\"", ScanErrorKind::BareQuote);
    scan_fails!(
        extraneous_quote,
        "\"a\"b,c",
        ScanErrorKind::ExtraneousQuote
    );
    scan_fails!(
        extraneous_quote_space,
        "\"a\" ,c",
        ScanErrorKind::ExtraneousQuote
    );
    scan_fails!(
        extraneous_quote_lone_cr,
        "\"a\"\rb",
        ScanErrorKind::ExtraneousQuote
    );
    scan_fails!(unterminated_quote, "a,\"bc", ScanErrorKind::UnexpectedEof);
    scan_fails!(
        unterminated_quote_cr,
        "\"bc\r",
        ScanErrorKind::UnexpectedEof
    );

    scans_to!(
        lazy_bare_quote,
        "a\"b,c",
        csv![["a\"b", "c"]],
        |b: &mut ScannerBuilder| {
            b.lazy_quotes(true);
        }
    );
    scans_to!(
        lazy_extraneous_quote,
        "\"a\"b\",c",
        csv![["a\"b", "c"]],
        |b: &mut ScannerBuilder| {
            b.lazy_quotes(true);
        }
    );
    scans_to!(
        lazy_quote_stays_quoted,
        "\"a\" ,b",
        csv![["a\" ,b"]],
        |b: &mut ScannerBuilder| {
            b.lazy_quotes(true);
        }
    );
    scans_to!(
        lazy_quote_lone_cr,
        "\"a\"\rb\"",
        csv![["a\"\rb"]],
        |b: &mut ScannerBuilder| {
            b.lazy_quotes(true);
        }
    );
    scans_to!(
        lazy_unterminated,
        "a,\"bc",
        csv![["a", "bc"]],
        |b: &mut ScannerBuilder| {
            b.lazy_quotes(true);
        }
    );

    scans_to!(
        delimiter_tabs,
        "a\tb",
        csv![["a", "b"]],
        |b: &mut ScannerBuilder| {
            b.delimiter(b'\t');
        }
    );
    scans_to!(
        delimiter_weird,
        "azb",
        csv![["a", "b"]],
        |b: &mut ScannerBuilder| {
            b.delimiter(b'z');
        }
    );

    scans_to!(
        trim_leading,
        "  a,\t b,c  \n",
        csv![["a", "b", "c  "]],
        |b: &mut ScannerBuilder| {
            b.trim_leading_space(true);
        }
    );
    scans_to!(
        trim_before_quote,
        "a, \"b,c\"",
        csv![["a", "b,c"]],
        |b: &mut ScannerBuilder| {
            b.trim_leading_space(true);
        }
    );
    scans_to!(
        trim_whitespace_delimiter,
        "a\t\tb",
        csv![["a", "b"]],
        |b: &mut ScannerBuilder| {
            b.delimiter(b'\t').trim_leading_space(true);
        }
    );
    scans_to!(no_trim_keeps_space, " a, b", csv![[" a", " b"]]);

    scans_to!(
        comment_line,
        "#a,b\nc,d\n#e\n",
        csv![["c", "d"]],
        |b: &mut ScannerBuilder| {
            b.comment(Some(b'#'));
        }
    );
    scans_to!(
        comment_no_newline,
        "c,d\n#e",
        csv![["c", "d"]],
        |b: &mut ScannerBuilder| {
            b.comment(Some(b'#'));
        }
    );
    scans_to!(
        comment_mid_record_is_content,
        "a,#b\n",
        csv![["a", "#b"]],
        |b: &mut ScannerBuilder| {
            b.comment(Some(b'#'));
        }
    );
    scans_to!(
        comment_after_trimmed_space,
        "  #a,b\nc\n",
        csv![["c"]],
        |b: &mut ScannerBuilder| {
            b.comment(Some(b'#')).trim_leading_space(true);
        }
    );
    scans_to!(
        comment_quote_ignored,
        "#\"oops\nc\n",
        csv![["c"]],
        |b: &mut ScannerBuilder| {
            b.comment(Some(b'#'));
        }
    );

    #[test]
    fn classes_unquoted() {
        let mut scanner = Scanner::new();
        let got = classes(&mut scanner, b"ab,c\n");
        assert_eq!(
            &got[..],
            &[
                Class::BeginField,
                Class::Continue,
                Class::FieldDelimiter,
                Class::BeginField,
                Class::EndRecord,
            ]
        );
    }

    #[test]
    fn classes_quoted() {
        let mut scanner = Scanner::new();
        let got = classes(&mut scanner, b"\"a\"\"\",");
        assert_eq!(
            &got[..],
            &[
                Class::Skip,
                Class::Continue,
                Class::BareQuote,
                Class::Skip,
                Class::BareQuote,
                Class::FieldDelimiter,
            ]
        );
    }

    #[test]
    fn retract_closing_quote() {
        let mut scanner = Scanner::new();
        classes(&mut scanner, b"\"a\"");
        assert_eq!(scanner.state(), State::BareQuote);
        assert_eq!(scanner.step(b','), Class::FieldDelimiter);
        assert_eq!(scanner.take_retract(), 1);
        assert_eq!(scanner.take_retract(), 0);
    }

    #[test]
    fn retract_crlf_after_quote() {
        let mut scanner = Scanner::new();
        classes(&mut scanner, b"\"a\"\r");
        assert_eq!(
            scanner.state(),
            State::CarriageReturn(Resume::AfterQuote)
        );
        assert_eq!(scanner.step(b'\n'), Class::EndRecord);
        assert_eq!(scanner.take_retract(), 2);
        assert_eq!(scanner.state(), State::StartRecord);
    }

    #[test]
    fn redo_after_cr() {
        let mut scanner = Scanner::new();
        assert_eq!(scanner.step(b'a'), Class::BeginField);
        assert_eq!(scanner.step(b'\r'), Class::CarriageReturn);
        // The byte after a lone `\r` is processed in the unquoted field,
        // so a delimiter still ends the field.
        assert_eq!(scanner.step(b','), Class::FieldDelimiter);
        assert_eq!(scanner.take_retract(), 0);
        assert_eq!(scanner.state(), State::BeginValue);
    }

    #[test]
    fn error_is_sticky() {
        let mut scanner = Scanner::new();
        assert_eq!(scanner.step(b'a'), Class::BeginField);
        assert_eq!(scanner.step(b'"'), Class::Error);
        assert_eq!(scanner.step(b','), Class::Error);
        assert_eq!(scanner.step(b'\n'), Class::Error);
        assert_eq!(scanner.finish(), Class::Error);

        let err = scanner.error().unwrap();
        assert_eq!(err.kind(), ScanErrorKind::BareQuote);
        assert_eq!(err.offset(), 1);
    }

    #[test]
    fn extraneous_quote_offset() {
        let mut scanner = Scanner::new();
        assert_eq!(classes(&mut scanner, b"\"ab\"").len(), 4);
        assert_eq!(scanner.step(b'x'), Class::Error);
        let err = scanner.error().unwrap();
        assert_eq!(err.kind(), ScanErrorKind::ExtraneousQuote);
        assert_eq!(err.offset(), 4);
        assert_eq!(scanner.state(), State::Error);
    }

    #[test]
    fn valid_data() {
        assert!(is_valid(b""));
        assert!(is_valid(b"a,b\r\n\"c\nd\",e"));
        assert!(is_valid(b"\n\n\"\"\"\"\n"));
        assert!(!is_valid(b"a,b\"c"));
        assert!(!is_valid(b"\"a\"b"));
        assert!(!is_valid(b"a,\"b"));
    }

    #[test]
    fn validate_uses_configuration() {
        let mut scanner = ScannerBuilder::new().lazy_quotes(true).build();
        assert_eq!(scanner.validate(b"a\"b,\"c"), Ok(()));

        let mut scanner = Scanner::new();
        let err = scanner.validate(b"x\n\"abc").unwrap_err();
        assert_eq!(err.kind(), ScanErrorKind::UnexpectedEof);
        assert_eq!(err.offset(), 6);
        assert_eq!(scanner.error(), Some(&err));

        // Validation starts over from a clean state.
        assert_eq!(scanner.validate(b"a,b\n"), Ok(()));
        assert!(scanner.error().is_none());
    }

    #[test]
    fn reset_works() {
        let mut scanner = Scanner::new();
        classes(&mut scanner, b"\"a\"x");
        assert_eq!(scanner.state(), State::Error);
        assert!(scanner.error().is_some());

        scanner.reset();
        assert_eq!(scanner.state(), State::StartRecord);
        assert!(scanner.error().is_none());
        assert_eq!(scanner.bytes(), 4);
        assert_eq!(scanner.step(b'b'), Class::BeginField);
    }

    #[test]
    fn finish_twice() {
        let mut scanner = Scanner::new();
        classes(&mut scanner, b"a,b");
        assert_eq!(scanner.finish(), Class::EndRecord);
        assert_eq!(scanner.finish(), Class::End);
    }

    #[test]
    fn unexpected_eof_offset() {
        let mut scanner = Scanner::new();
        classes(&mut scanner, b"\"abc");
        assert_eq!(scanner.finish(), Class::Error);
        let err = scanner.error().unwrap();
        assert_eq!(err.kind(), ScanErrorKind::UnexpectedEof);
        assert_eq!(err.offset(), 4);
    }
}
