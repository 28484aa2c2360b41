//! Byte-level boundary traits.
//!
//! The framing layer depends on exactly these operations and nothing richer:
//! a source that may return fewer bytes than asked for (including zero when
//! nothing is ready right now), a skip operation for discarding padding, and
//! a sink with short writes and an explicit flush. Adapters bridge std I/O.

use std::io::{self, ErrorKind, Read, Write};

const SKIP_CHUNK: usize = 64;

/// Incremental byte producer.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes. Returns 0 when no bytes are ready right
    /// now — this is not necessarily end-of-stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Discard up to `n` bytes; returns how many were actually skipped.
    fn skip(&mut self, n: usize) -> io::Result<usize>;

    /// True once the underlying stream has definitively ended.
    fn is_eof(&self) -> bool;
}

/// Incremental byte consumer.
pub trait ByteSink {
    /// Write a portion of `buf`; returns the number of bytes accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Push buffered bytes through to the destination.
    fn flush(&mut self) -> io::Result<()>;
}

/// [`ByteSource`] over any [`std::io::Read`].
///
/// `WouldBlock` maps to "0 bytes ready"; `Interrupted` reads are retried.
pub struct IoSource<R> {
    inner: R,
    eof: bool,
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, eof: false }
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consume the adapter and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for IoSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.eof || buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.inner.read(buf) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(0);
                }
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(err) => return Err(err),
            }
        }
    }

    fn skip(&mut self, n: usize) -> io::Result<usize> {
        let mut scratch = [0u8; SKIP_CHUNK];
        let mut skipped = 0;
        while skipped < n {
            let want = (n - skipped).min(SKIP_CHUNK);
            let got = self.read(&mut scratch[..want])?;
            if got == 0 {
                break;
            }
            skipped += got;
        }
        Ok(skipped)
    }

    fn is_eof(&self) -> bool {
        self.eof
    }
}

/// [`ByteSink`] over any [`std::io::Write`].
///
/// `Interrupted` and `WouldBlock` writes are retried — the framing layer
/// treats a sink as always willing to make progress eventually.
pub struct IoSink<W> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consume the adapter and return the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            match self.inner.write(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl ByteSink for Vec<u8> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
