//! Buffered writer over a blocking output stream.

use std::io::{self, Write};

use tracing::{debug, trace};

use crate::charset::Charset;
use crate::config::BufferConfig;
use crate::endian;
use crate::error::{Error, Result};
use crate::pool::SegmentPool;
use crate::queue::SegmentQueue;
use crate::stream;

/// A buffered writer that drains to `W` in segment-sized chunks.
///
/// After every write, all buffered bytes except those in a not-yet-full
/// tail segment are written out, so at most about two segments stay in
/// memory regardless of how much is written. [`flush`](ByteSink::flush)
/// writes out the remainder.
///
/// Dropping a sink does not flush it; call [`flush`](ByteSink::flush),
/// [`close`](ByteSink::close) or [`into_inner`](ByteSink::into_inner).
///
/// # Example
///
/// ```
/// use segio_buffer::ByteSink;
///
/// let mut sink = ByteSink::new(Vec::new());
/// sink.write_short(42)
///     .unwrap()
///     .write_int_le(7)
///     .unwrap()
///     .write_utf8("done\n")
///     .unwrap();
///
/// let out = sink.into_inner().unwrap();
/// assert_eq!(out, b"\x00\x2a\x07\x00\x00\x00done\n");
/// ```
#[derive(Debug)]
pub struct ByteSink<W: Write> {
    writer: W,
    queue: SegmentQueue,
}

impl<W: Write> ByteSink<W> {
    /// Wraps `writer` with the default configuration.
    pub fn new(writer: W) -> Self {
        ByteSink {
            writer,
            queue: SegmentQueue::new(SegmentPool::new()),
        }
    }

    /// Wraps `writer` with a custom configuration.
    ///
    /// Fails if the configuration does not validate.
    pub fn with_config(writer: W, config: &BufferConfig) -> Result<Self> {
        Ok(ByteSink {
            writer,
            queue: SegmentQueue::new(SegmentPool::with_config(config)?),
        })
    }

    /// Number of bytes buffered and not yet written out.
    pub fn buffered_len(&self) -> usize {
        self.queue.len()
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Returns a mutable reference to the underlying writer.
    ///
    /// Writing to it directly may interleave with buffered bytes.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Writes out everything buffered, flushes, and unwraps the writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }

    /// Writes one byte.
    pub fn write_byte(&mut self, b: u8) -> Result<&mut Self> {
        self.queue.push_byte(b)?;
        self.commit()?;
        Ok(self)
    }

    /// Writes a 16-bit value, big-endian.
    pub fn write_short(&mut self, v: i16) -> Result<&mut Self> {
        self.append(&endian::short_to_bytes(v))
    }

    /// Writes a 16-bit value, little-endian.
    pub fn write_short_le(&mut self, v: i16) -> Result<&mut Self> {
        self.write_short(endian::reverse_short(v))
    }

    /// Writes a 32-bit value, big-endian.
    pub fn write_int(&mut self, v: i32) -> Result<&mut Self> {
        self.append(&endian::int_to_bytes(v))
    }

    /// Writes a 32-bit value, little-endian.
    pub fn write_int_le(&mut self, v: i32) -> Result<&mut Self> {
        self.write_int(endian::reverse_int(v))
    }

    /// Writes a 64-bit value, big-endian.
    pub fn write_long(&mut self, v: i64) -> Result<&mut Self> {
        self.append(&endian::long_to_bytes(v))
    }

    /// Writes a 64-bit value, little-endian.
    pub fn write_long_le(&mut self, v: i64) -> Result<&mut Self> {
        self.write_long(endian::reverse_long(v))
    }

    /// Writes `length` bytes of `data` starting at `offset`.
    ///
    /// A zero length is a no-op.
    pub fn write_bytes(&mut self, data: &[u8], offset: usize, length: usize) -> Result<&mut Self> {
        let end = offset
            .checked_add(length)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                Error::invalid(format!(
                    "range {}+{} outside slice of length {}",
                    offset,
                    length,
                    data.len()
                ))
            })?;
        if length == 0 {
            return Ok(self);
        }
        self.append(&data[offset..end])
    }

    /// Writes all of `data`.
    pub fn write_all_bytes(&mut self, data: &[u8]) -> Result<&mut Self> {
        self.write_bytes(data, 0, data.len())
    }

    /// Encodes `text` with `charset` and writes it.
    pub fn write_string(&mut self, text: &str, charset: Charset) -> Result<&mut Self> {
        let bytes = charset.encode(text)?;
        self.write_all_bytes(&bytes)
    }

    /// Writes `text` as UTF-8.
    pub fn write_utf8(&mut self, text: &str) -> Result<&mut Self> {
        self.write_all_bytes(text.as_bytes())
    }

    /// Writes out every buffered byte and flushes the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        let size = self.queue.len();
        self.queue.write_to(&mut self.writer, size)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes what it can and releases the writer, ignoring failures.
    pub fn close(mut self) {
        if let Err(e) = self.flush() {
            debug!("byte sink: close dropped {} bytes: {}", self.queue.len(), e);
        }
        stream::close_quietly(self.writer);
    }

    /// Like [`close`](ByteSink::close) but reports the first failure.
    pub fn close_strict(mut self) -> Result<()> {
        let flushed = self.flush();
        let closed = stream::close_strict(self.writer);
        flushed.and(closed)
    }

    fn append(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        let (_, result) = self.push_committing(bytes);
        result?;
        Ok(self)
    }

    /// Buffers `bytes` one tail segment at a time, writing each segment out
    /// as soon as it fills. Returns how many bytes were buffered together
    /// with the first failure.
    fn push_committing(&mut self, bytes: &[u8]) -> (usize, Result<()>) {
        let mut taken = 0;
        while taken < bytes.len() {
            match self.queue.push_some(&bytes[taken..]) {
                Ok(n) => taken += n,
                Err(e) => return (taken, Err(e)),
            }
            if let Err(e) = self.commit() {
                return (taken, Err(e));
            }
        }
        (taken, Ok(()))
    }

    /// Writes out all bytes except those in a tail segment that still has room.
    fn commit(&mut self) -> Result<()> {
        let ready = self.queue.len() - self.queue.open_tail_len();
        if ready > 0 {
            trace!("byte sink: committing {} bytes", ready);
            self.queue.write_to(&mut self.writer, ready)?;
        }
        Ok(())
    }
}

impl<W: Write> Write for ByteSink<W> {
    /// Returns the number of bytes buffered. A failure is reported only
    /// when nothing from `buf` was taken; otherwise it resurfaces on the
    /// next write or flush.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        // full segments left by an earlier failure go out first
        self.commit()?;
        match self.push_committing(buf) {
            (0, Err(e)) => Err(e.into()),
            (n, Err(e)) => {
                debug!("byte sink: buffered {} bytes, deferring error: {}", n, e);
                Ok(n)
            }
            (n, Ok(())) => Ok(n),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        ByteSink::flush(self).map_err(io::Error::from)
    }
}
