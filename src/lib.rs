/*!
The `csv-stream` crate decodes CSV incrementally from a byte source.

Records are produced one at a time, so memory use is bounded by the longest
record rather than by the size of the input. The dialect accepted follows
RFC 4180 with a few common relaxations: `\n` or `\r\n` record terminators,
a configurable delimiter, optional comment lines, optional trimming of
leading white space and an optional lenient treatment of quotes.

# Example

```
use csv_stream::DecoderBuilder;

# fn main() -> Result<(), csv_stream::Error> {
let data = "\
#cities
city,country,pop
Boston,United States,4628910
\"Concord, MA\",United States,42695
";
let mut dec = DecoderBuilder::new()
    .comment(Some(b'#'))
    .from_reader(data.as_bytes())?;
let mut count = 0;
while dec.has_more() {
    let record = match dec.decode()? {
        Some(record) => record,
        None => break,
    };
    assert_eq!(record.len(), 3);
    count += 1;
}
assert_eq!(count, 3);
# Ok(())
# }
```

# Sources

A decoder reads from anything implementing [`Source`](trait.Source.html).
Any `std::io::Read` can be used through `Decoder::from_reader`. A custom
source may report the end of input (or a failure) together with its last
bytes. Those bytes are always decoded before the outcome takes effect.

# Errors

Decoding errors carry the [`Position`](struct.Position.html) of the problem.
Every error is terminal for the decoder that produced it: subsequent calls
report the same error again. I/O errors from the source are passed through
unchanged as [`ErrorKind::Io`](enum.ErrorKind.html#variant.Io).

The byte-level state machine lives in the `csv-stream-core` crate, which can
be used directly where a `no_std` scanner is needed.
*/

#![deny(missing_docs)]

pub use csv_stream_core::{Scanner, ScannerBuilder};

pub use crate::byte_record::{ByteRecord, ByteRecordIter};
pub use crate::config::{Config, FieldsPerRecord};
pub use crate::decoder::{
    ByteRecordsIter, Decoder, DecoderBuilder, Position, StringRecordsIter,
};
pub use crate::error::{Error, ErrorKind, FromUtf8Error, Result, Utf8Error};
pub use crate::source::{IoSource, ReadOutcome, Source};
pub use crate::string_record::{StringRecord, StringRecordIter};

mod byte_record;
mod config;
mod decoder;
mod error;
mod source;
mod string_record;
