//! Buffered reader over a blocking input stream.

use std::io::{self, Read};

use tracing::trace;

use crate::charset::Charset;
use crate::config::BufferConfig;
use crate::endian;
use crate::error::{Error, Result};
use crate::pool::SegmentPool;
use crate::queue::SegmentQueue;
use crate::segment::SEGMENT_SIZE;

/// Largest count accepted by [`ByteSource::read_bytes`] and friends.
pub const MAX_READ_COUNT: usize = i32::MAX as usize;

/// A buffered reader that pulls from `R` one segment at a time.
///
/// Typed reads block until enough bytes are buffered and fail with
/// [`Error::EndOfStream`] if the input ends first. Multi-byte values are
/// big-endian unless the method name ends in `_le`.
///
/// # Example
///
/// ```
/// use segio_buffer::ByteSource;
///
/// let input: &[u8] = b"\x00\x2a\x2a\x00first\r\nsecond";
/// let mut src = ByteSource::new(input);
///
/// assert_eq!(src.read_short().unwrap(), 42);
/// assert_eq!(src.read_short_le().unwrap(), 42);
/// assert_eq!(src.read_utf8_line().unwrap().as_deref(), Some("first"));
/// assert_eq!(src.read_utf8_line().unwrap().as_deref(), Some("second"));
/// assert_eq!(src.read_utf8_line().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct ByteSource<R> {
    reader: R,
    queue: SegmentQueue,
}

impl<R: Read> ByteSource<R> {
    /// Wraps `reader` with the default configuration.
    pub fn new(reader: R) -> Self {
        ByteSource {
            reader,
            queue: SegmentQueue::new(SegmentPool::new()),
        }
    }

    /// Wraps `reader` with a custom configuration.
    ///
    /// Fails if the configuration does not validate.
    pub fn with_config(reader: R, config: &BufferConfig) -> Result<Self> {
        Ok(ByteSource {
            reader,
            queue: SegmentQueue::new(SegmentPool::with_config(config)?),
        })
    }

    /// Number of bytes buffered and not yet consumed.
    pub fn buffered_len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if nothing is buffered and the input is at its end.
    ///
    /// Pulls once from the input when the buffer is empty.
    pub fn is_exhausted(&mut self) -> Result<bool> {
        if self.queue.is_empty() {
            self.fill()?;
        }
        Ok(self.queue.is_empty())
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Returns a mutable reference to the underlying reader.
    ///
    /// Reading from it directly skips whatever is already buffered.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwraps the reader, discarding buffered bytes.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Releases the underlying reader.
    pub fn close(self) {
        trace!("byte source: closing with {} unread bytes", self.queue.len());
        drop(self.reader);
    }

    /// Reads one byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        self.require(1)?;
        Ok(self.queue.pop_byte())
    }

    /// Reads a big-endian 16-bit value.
    pub fn read_short(&mut self) -> Result<i16> {
        self.read_array().map(endian::short_from_bytes)
    }

    /// Reads a little-endian 16-bit value.
    pub fn read_short_le(&mut self) -> Result<i16> {
        self.read_short().map(endian::reverse_short)
    }

    /// Reads a big-endian 32-bit value.
    pub fn read_int(&mut self) -> Result<i32> {
        self.read_array().map(endian::int_from_bytes)
    }

    /// Reads a little-endian 32-bit value.
    pub fn read_int_le(&mut self) -> Result<i32> {
        self.read_int().map(endian::reverse_int)
    }

    /// Reads a big-endian 64-bit value.
    pub fn read_long(&mut self) -> Result<i64> {
        self.read_array().map(endian::long_from_bytes)
    }

    /// Reads a little-endian 64-bit value.
    pub fn read_long_le(&mut self) -> Result<i64> {
        self.read_long().map(endian::reverse_long)
    }

    /// Reads exactly `count` bytes. `count` must be positive.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        if count == 0 {
            return Err(Error::invalid("read count must be positive: 0"));
        }
        check_count(count)?;
        self.require(count)?;
        let mut out = vec![0u8; count];
        self.queue.copy_to(&mut out);
        Ok(out)
    }

    /// Reads `count` bytes and decodes them with `charset`.
    ///
    /// A zero count yields an empty string without touching the input.
    /// The bytes are consumed only if they decode, so a
    /// [`Error::Decode`] leaves them buffered.
    pub fn read_string(&mut self, count: usize, charset: Charset) -> Result<String> {
        check_count(count)?;
        if count == 0 {
            return Ok(String::new());
        }
        self.require(count)?;

        let head = self.queue.head_chunk();
        let text = if head.len() >= count {
            charset.decode(&head[..count])?
        } else {
            charset.decode(&self.queue.peek_prefix(count))?
        };
        self.queue.discard(count);
        Ok(text)
    }

    /// Reads `count` bytes as UTF-8, replacing invalid sequences with U+FFFD.
    pub fn read_utf8(&mut self, count: usize) -> Result<String> {
        self.read_string(count, Charset::Utf8Lossy)
    }

    /// Reads everything up to the end of input and decodes it with `charset`.
    pub fn read_all(&mut self, charset: Charset) -> Result<String> {
        while self.fill()? > 0 {}
        let size = self.queue.len();
        self.read_string(size, charset)
    }

    /// Reads everything up to the end of input as lossy UTF-8.
    pub fn read_all_utf8(&mut self) -> Result<String> {
        self.read_all(Charset::Utf8Lossy)
    }

    /// Reads the next line.
    ///
    /// A line ends at `\n` or `\r\n`; the terminator is consumed but not
    /// returned. A lone `\r` is ordinary data. Text after the last
    /// terminator is returned as a final line. Returns `None` once the
    /// input is exhausted. If the line does not decode, nothing is consumed.
    pub fn read_line(&mut self, charset: Charset) -> Result<Option<String>> {
        let Some(newline) = self.index_of(b'\n')? else {
            let size = self.queue.len();
            if size == 0 {
                return Ok(None);
            }
            return self.read_string(size, charset).map(Some);
        };

        if newline > 0 && self.value_of(newline - 1)? == b'\r' {
            let line = self.read_string(newline - 1, charset)?;
            self.skip(2)?;
            Ok(Some(line))
        } else {
            let line = self.read_string(newline, charset)?;
            self.skip(1)?;
            Ok(Some(line))
        }
    }

    /// Reads the next line as lossy UTF-8. See [`read_line`](Self::read_line).
    pub fn read_utf8_line(&mut self) -> Result<Option<String>> {
        self.read_line(Charset::Utf8Lossy)
    }

    /// Iterates over the remaining lines as lossy UTF-8.
    pub fn lines(&mut self) -> Lines<'_, R> {
        Lines { source: self }
    }

    /// Discards `count` bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.require(count)?;
        self.queue.discard(count);
        Ok(())
    }

    /// Returns the buffered byte at logical offset `index` without
    /// consuming it. Never reads from the input.
    pub fn value_of(&self, index: usize) -> Result<u8> {
        let size = self.queue.len();
        if index >= size {
            return Err(Error::OutOfRange { index, size });
        }
        self.queue
            .peek(index)
            .ok_or(Error::OutOfRange { index, size })
    }

    /// Finds the first `byte`, pulling more input as needed.
    pub fn index_of(&mut self, byte: u8) -> Result<Option<usize>> {
        self.index_of_from(byte, 0)
    }

    /// Finds the first `byte` at or after logical offset `start`.
    ///
    /// When the buffered data holds no match, one more segment of input is
    /// pulled and the search continues where it stopped. Returns `None`
    /// once the input is exhausted without a match.
    pub fn index_of_from(&mut self, byte: u8, start: usize) -> Result<Option<usize>> {
        let mut from = start;
        loop {
            if let Some(index) = self.queue.find(byte, from) {
                return Ok(Some(index));
            }
            from = from.max(self.queue.len());
            if self.fill()? == 0 {
                return Ok(None);
            }
        }
    }

    /// Buffers at least `count` bytes or fails with end of stream.
    fn require(&mut self, count: usize) -> Result<()> {
        while self.queue.len() < count {
            if self.fill()? == 0 {
                return Err(Error::EndOfStream);
            }
        }
        Ok(())
    }

    fn fill(&mut self) -> Result<usize> {
        self.queue.fill_from(&mut self.reader, SEGMENT_SIZE)
    }

    /// Reads `N` bytes for a fixed-width value, straight from the head
    /// segment when they are contiguous, else one byte at a time.
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.require(N)?;
        let mut out = [0u8; N];
        let head = self.queue.head_chunk();
        if head.len() >= N {
            out.copy_from_slice(&head[..N]);
            self.queue.advance_head(N);
        } else {
            for b in out.iter_mut() {
                *b = self.queue.pop_byte();
            }
        }
        Ok(out)
    }
}

fn check_count(count: usize) -> Result<()> {
    if count > MAX_READ_COUNT {
        return Err(Error::invalid(format!(
            "read count exceeds {}: {}",
            MAX_READ_COUNT, count
        )));
    }
    Ok(())
}

impl<R: Read> Read for ByteSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.queue.is_empty() && self.fill()? == 0 {
            return Ok(0);
        }
        let n = buf.len().min(self.queue.len());
        self.queue.copy_to(&mut buf[..n]);
        Ok(n)
    }
}

/// Iterator over the lines of a [`ByteSource`], see [`ByteSource::lines`].
pub struct Lines<'a, R> {
    source: &'a mut ByteSource<R>,
}

impl<R: Read> Iterator for Lines<'_, R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.read_utf8_line().transpose()
    }
}
