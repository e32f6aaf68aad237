use std::io;

/// The outcome of a single read from a [`Source`](trait.Source.html).
#[derive(Debug)]
pub enum ReadOutcome {
    /// The source may have more data.
    Ready,
    /// The source is exhausted. No further reads will be made.
    End,
    /// The source failed.
    Failed(io::Error),
}

/// A source of bytes for a decoder.
///
/// A source has a single operation: fill some prefix of `buf` and report
/// how many bytes were written along with an outcome. Unlike
/// `std::io::Read`, a source may return data *and* report that it has ended
/// (or failed) in the same call. A decoder always scans the returned bytes
/// before it acts on the outcome, so a record terminated in the final read
/// is still produced before the end of input is observed.
///
/// Any `std::io::Read` implementation can be used as a source through
/// [`IoSource`](struct.IoSource.html).
pub trait Source {
    /// Read bytes into `buf`, returning the number of bytes written and the
    /// outcome of the read.
    ///
    /// `buf` is never empty. Returning `0` bytes with `ReadOutcome::Ready`
    /// is permitted; the decoder will simply read again.
    fn read(&mut self, buf: &mut [u8]) -> (usize, ReadOutcome);
}

impl<'a, S: Source + ?Sized> Source for &'a mut S {
    fn read(&mut self, buf: &mut [u8]) -> (usize, ReadOutcome) {
        (**self).read(buf)
    }
}

/// Adapts a `std::io::Read` into a [`Source`](trait.Source.html).
///
/// A read of zero bytes into a non-empty buffer means the end of input.
/// Interrupted reads are retried. Every other error is reported as
/// `ReadOutcome::Failed`.
#[derive(Debug)]
pub struct IoSource<R> {
    rdr: R,
}

impl<R: io::Read> IoSource<R> {
    /// Wrap the given reader.
    pub fn new(rdr: R) -> IoSource<R> {
        IoSource { rdr }
    }
}

impl<R> IoSource<R> {
    /// Gets a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.rdr
    }

    /// Gets a mutable reference to the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.rdr
    }

    /// Unwraps this source, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.rdr
    }
}

impl<R: io::Read> Source for IoSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> (usize, ReadOutcome) {
        loop {
            return match self.rdr.read(buf) {
                Ok(0) => (0, ReadOutcome::End),
                Ok(n) => (n, ReadOutcome::Ready),
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {
                    continue;
                }
                Err(err) => (0, ReadOutcome::Failed(err)),
            };
        }
    }
}
