use std::cmp;

use csv_stream::{ByteRecord, Decoder, DecoderBuilder, ReadOutcome, Source};
use quickcheck::quickcheck;

/// Hands out the data `chunk` bytes at a time.
struct Chunked<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl<'a> Source for Chunked<'a> {
    fn read(&mut self, buf: &mut [u8]) -> (usize, ReadOutcome) {
        let n = cmp::min(cmp::min(self.chunk, buf.len()), self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        if self.data.is_empty() {
            (n, ReadOutcome::End)
        } else {
            (n, ReadOutcome::Ready)
        }
    }
}

/// Decode everything, stopping at the first error. Errors are rendered as
/// strings so that their positions take part in comparisons.
fn decode_all<S: Source>(
    mut dec: Decoder<S>,
) -> Vec<Result<ByteRecord, String>> {
    dec.byte_records().map(|r| r.map_err(|e| e.to_string())).collect()
}

fn decoder(data: &[u8], chunk: usize) -> Decoder<Chunked> {
    DecoderBuilder::new()
        .flexible(true)
        .buffer_capacity(0)
        .from_source(Chunked { data, chunk })
        .unwrap()
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace("\"", "\"\""))
}

#[test]
fn chunking_does_not_matter() {
    fn prop(data: Vec<u8>, chunk: usize) -> bool {
        let chunk = chunk % 17 + 1;
        let whole = decode_all(decoder(&data, usize::MAX));
        let chunked = decode_all(decoder(&data, chunk));
        whole == chunked
    }
    quickcheck(prop as fn(Vec<u8>, usize) -> bool);
}

#[test]
fn quoted_fields_round_trip() {
    fn prop(records: Vec<Vec<String>>) -> bool {
        let mut data = String::new();
        for record in &records {
            let fields: Vec<String> =
                record.iter().map(|f| quote(f)).collect();
            data.push_str(&fields.join(","));
            data.push_str("\r\n");
        }
        // A record without fields is written as a blank line.
        let expected: Vec<Vec<String>> = records
            .into_iter()
            .filter(|r| !r.is_empty())
            .map(|r| r.iter().map(|f| f.replace("\r\n", "\n")).collect())
            .collect();

        let mut dec = decoder(data.as_bytes(), 5);
        let mut got = vec![];
        while dec.has_more() {
            match dec.decode() {
                Ok(Some(record)) => got.push(record.to_vec()),
                Ok(None) => break,
                Err(_) => return false,
            }
        }
        got == expected
    }
    quickcheck(prop as fn(Vec<Vec<String>>) -> bool);
}

/// Strip the bytes that would make a field need quoting.
fn unquotable(field: &str) -> String {
    field
        .chars()
        .filter(|&c| c != '"' && c != ',' && c != '\r' && c != '\n')
        .collect()
}

#[test]
fn unquoted_fields_split() {
    fn prop(records: Vec<Vec<String>>) -> bool {
        let records: Vec<Vec<String>> = records
            .iter()
            .map(|r| r.iter().map(|f| unquotable(f)).collect())
            .collect();
        let mut data = String::new();
        for record in &records {
            data.push_str(&record.join(","));
            data.push('\n');
        }
        // Records that render as empty lines are skipped.
        let expected: Vec<&Vec<String>> = records
            .iter()
            .filter(|r| !(r.is_empty() || (r.len() == 1 && r[0].is_empty())))
            .collect();

        let got = decode_all(decoder(data.as_bytes(), 3));
        got.len() == expected.len()
            && got.iter().zip(expected).all(|(rec, want)| match *rec {
                Ok(ref rec) => rec == want,
                Err(_) => false,
            })
    }
    quickcheck(prop as fn(Vec<Vec<String>>) -> bool);
}

#[test]
fn unquoted_fields_split_fixed() {
    let records = vec![
        vec!["  lead", "trail  ", "#not a comment"],
        vec!["", "", ""],
        vec!["\u{3b1}\u{3b2}", "tab\there", "x"],
    ];
    let mut data = String::new();
    for record in &records {
        data.push_str(&record.join(","));
        data.push('\n');
    }
    let got = decode_all(decoder(data.as_bytes(), 2));
    assert_eq!(got.len(), 3);
    for (rec, want) in got.iter().zip(&records) {
        assert_eq!(rec.as_ref().unwrap(), want);
    }
}

#[test]
fn has_more_agrees_with_decode() {
    fn prop(data: Vec<u8>, chunk: usize) -> bool {
        let mut dec = decoder(&data, chunk % 7 + 1);
        loop {
            let more = dec.has_more();
            match dec.decode_byte_record() {
                Ok(Some(_)) if more => {}
                Ok(None) if !more => return true,
                Err(_) if more => return !dec.has_more(),
                _ => return false,
            }
        }
    }
    quickcheck(prop as fn(Vec<u8>, usize) -> bool);
}

#[test]
fn from_reader_matches_source() {
    let data = "a,\"b\r\nc\"\r\n\n#x,y\n  d,e\n";
    let mut dec = Decoder::from_reader(data.as_bytes());
    let from_reader = dec.records().map(|r| r.unwrap().to_vec());
    let mut dec = decoder(data.as_bytes(), 1);
    let from_source = dec.records().map(|r| r.unwrap().to_vec());
    let expected = vec![
        vec!["a".to_string(), "b\nc".to_string()],
        vec!["#x".to_string(), "y".to_string()],
        vec!["  d".to_string(), "e".to_string()],
    ];
    assert_eq!(from_reader.collect::<Vec<_>>(), expected);
    assert_eq!(from_source.collect::<Vec<_>>(), expected);
}
