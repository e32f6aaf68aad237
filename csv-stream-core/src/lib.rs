/*!
`csv-stream-core` provides the byte level state machine that classifies CSV
data one byte at a time.

The [`Scanner`](struct.Scanner.html) never performs I/O and never
allocates. A caller feeds it bytes with `step`, and each call returns a
[`Class`](enum.Class.html) telling the caller what to do with that byte:
append it to the current field, skip it, start a new field or end the
record. Bytes whose role depends on the byte that follows them (a `\r` that
may start a CRLF pair, a quote that may close a quoted field) are reported
as tentative content, and the scanner later tells the caller how many of
them to take back via `take_retract`.

# Example

```
use csv_stream_core::{Class, Scanner};

let mut scanner = Scanner::new();
let mut field = vec![];
let mut fields = vec![];
for &b in b"a,\"b\"\"c\"\n" {
    let class = scanner.step(b);
    let retract = scanner.take_retract();
    field.truncate(field.len() - retract);
    match class {
        Class::Continue
        | Class::BeginField
        | Class::CarriageReturn
        | Class::BareQuote => field.push(b),
        Class::FieldDelimiter | Class::EndRecord => {
            fields.push(String::from_utf8(field.split_off(0)).unwrap());
        }
        _ => {}
    }
}
assert_eq!(fields, vec!["a", "b\"c"]);
```
*/

#![deny(missing_docs)]
#![cfg_attr(not(test), no_std)]

pub use crate::scanner::{
    is_valid, Class, Resume, ScanError, ScanErrorKind, Scanner,
    ScannerBuilder, State,
};

mod scanner;
