//! Segment queue shared by sources and sinks.
//!
//! Bytes flow in at the tail segment and out at the head segment. Drained
//! segments are unlinked and handed back to the queue's private pool as
//! soon as `pos == limit`.

use std::io::{self, Read, Write};

use tracing::trace;

use crate::error::{Error, Result};
use crate::pool::SegmentPool;
use crate::segment::{SegmentId, SegmentRing, SEGMENT_SIZE};

#[derive(Debug)]
pub(crate) struct SegmentQueue {
    ring: SegmentRing,
    pool: SegmentPool,
    head: Option<SegmentId>,
    // sum of `limit - pos` over the ring; zero iff `head` is None
    size: usize,
}

impl SegmentQueue {
    pub(crate) fn new(pool: SegmentPool) -> Self {
        SegmentQueue {
            ring: SegmentRing::new(),
            pool,
            head: None,
            size: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.size
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[cfg(test)]
    pub(crate) fn segment_count(&self) -> usize {
        self.ring.len()
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SegmentPool {
        &self.pool
    }

    fn tail(&self) -> Option<SegmentId> {
        self.head.and_then(|head| self.ring[head].prev())
    }

    /// Returns the tail segment, appending a new one from the pool when the
    /// current tail has fewer than `min_capacity` free bytes.
    fn writable_tail(&mut self, min_capacity: usize) -> Result<SegmentId> {
        if min_capacity < 1 || min_capacity > SEGMENT_SIZE {
            return Err(Error::invalid(format!(
                "capacity must be in 1..={}: {}",
                SEGMENT_SIZE, min_capacity
            )));
        }
        let Some(tail) = self.tail() else {
            let id = self.ring.insert_lone(self.pool.take());
            self.head = Some(id);
            return Ok(id);
        };
        if self.ring[tail].writable() < min_capacity {
            return Ok(self.ring.push(tail, self.pool.take()));
        }
        Ok(tail)
    }

    /// Unlinks `id` if drained and returns it to the pool.
    fn recycle_if_drained(&mut self, id: SegmentId) {
        if !self.ring[id].is_empty() {
            return;
        }
        let (segment, rest) = self.ring.pop(id);
        if self.head == Some(id) {
            self.head = rest;
        }
        // popped segments carry no links, so recycling cannot be refused
        let _ = self.pool.recycle(segment);
    }

    /// Pulls at most `max` bytes from `reader` into the tail segment with a
    /// single successful read call. Returns 0 at end of input.
    pub(crate) fn fill_from<R: Read>(&mut self, reader: &mut R, max: usize) -> Result<usize> {
        let tail = self.writable_tail(1)?;
        let want = max.min(self.ring[tail].writable());
        let n = loop {
            let result = reader.read(&mut self.ring[tail].spare_mut()[..want]);
            match result {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.recycle_if_drained(tail);
                    return Err(e.into());
                }
            }
        };
        self.ring[tail].commit(n);
        self.size += n;
        if n == 0 {
            self.recycle_if_drained(tail);
        } else {
            trace!("segment queue: pulled {} bytes, buffered {}", n, self.size);
        }
        Ok(n)
    }

    /// Appends `data` at the tail, spilling into new segments as needed.
    pub(crate) fn push_slice(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            let n = self.push_some(data)?;
            data = &data[n..];
        }
        Ok(())
    }

    /// Appends as much of `data` as fits in one tail segment and returns
    /// the number of bytes taken. A full tail gets a fresh successor first.
    pub(crate) fn push_some(&mut self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let tail = self.writable_tail(1)?;
        let segment = &mut self.ring[tail];
        let n = data.len().min(segment.writable());
        segment.spare_mut()[..n].copy_from_slice(&data[..n]);
        segment.commit(n);
        self.size += n;
        Ok(n)
    }

    /// Appends one byte at the tail.
    pub(crate) fn push_byte(&mut self, b: u8) -> Result<()> {
        let tail = self.writable_tail(1)?;
        self.ring[tail].push_byte(b);
        self.size += 1;
        Ok(())
    }

    /// Readable bytes of the head segment.
    pub(crate) fn head_chunk(&self) -> &[u8] {
        match self.head {
            Some(head) => self.ring[head].readable(),
            None => &[],
        }
    }

    /// Consumes `n` bytes that all lie in the head segment.
    pub(crate) fn advance_head(&mut self, n: usize) {
        let Some(head) = self.head else { return };
        self.ring[head].consume(n);
        self.size -= n;
        self.recycle_if_drained(head);
    }

    /// Consumes one byte. The caller guarantees `len() >= 1`.
    pub(crate) fn pop_byte(&mut self) -> u8 {
        let head = self.head.expect("pop_byte on an empty queue");
        let b = self.ring[head].pop_byte();
        self.size -= 1;
        self.recycle_if_drained(head);
        b
    }

    /// Moves `dst.len()` bytes into `dst`. The caller guarantees enough are buffered.
    pub(crate) fn copy_to(&mut self, dst: &mut [u8]) {
        let mut offset = 0;
        while offset < dst.len() {
            let chunk = self.head_chunk();
            let n = chunk.len().min(dst.len() - offset);
            if n == 0 {
                break;
            }
            dst[offset..offset + n].copy_from_slice(&chunk[..n]);
            offset += n;
            self.advance_head(n);
        }
    }

    /// Discards `count` bytes without copying. The caller guarantees enough are buffered.
    pub(crate) fn discard(&mut self, mut count: usize) {
        while count > 0 {
            let n = self.head_chunk().len().min(count);
            if n == 0 {
                break;
            }
            self.advance_head(n);
            count -= n;
        }
    }

    /// Copies the first `n` buffered bytes without consuming them.
    pub(crate) fn peek_prefix(&self, n: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(n.min(self.size));
        let Some(head) = self.head else { return out };
        for (_, segment) in self.ring.iter_from(head) {
            if out.len() >= n {
                break;
            }
            let chunk = segment.readable();
            let take = chunk.len().min(n - out.len());
            out.extend_from_slice(&chunk[..take]);
        }
        out
    }

    /// Byte at logical offset `index`, without consuming anything.
    pub(crate) fn peek(&self, mut index: usize) -> Option<u8> {
        let head = self.head?;
        for (_, segment) in self.ring.iter_from(head) {
            let chunk = segment.readable();
            if index < chunk.len() {
                return Some(chunk[index]);
            }
            index -= chunk.len();
        }
        None
    }

    /// Logical offset of the first `byte` at or after `start` in buffered data.
    pub(crate) fn find(&self, byte: u8, start: usize) -> Option<usize> {
        let head = self.head?;
        let mut offset = 0;
        for (_, segment) in self.ring.iter_from(head) {
            let chunk = segment.readable();
            if start < offset + chunk.len() {
                let from = start.saturating_sub(offset);
                if let Some(i) = chunk[from..].iter().position(|&b| b == byte) {
                    return Some(offset + from + i);
                }
            }
            offset += chunk.len();
        }
        None
    }

    /// Bytes sitting in a tail segment that still has room to grow.
    pub(crate) fn open_tail_len(&self) -> usize {
        match self.tail() {
            Some(tail) if !self.ring[tail].is_full() => self.ring[tail].len(),
            _ => 0,
        }
    }

    /// Writes the first `count` buffered bytes to `writer`, recycling each
    /// segment once it is fully written.
    ///
    /// Only bytes the writer accepted are consumed, so after a failure the
    /// queue starts exactly at the first unwritten byte.
    pub(crate) fn write_to<W: Write>(&mut self, writer: &mut W, mut count: usize) -> Result<()> {
        let count_total = count;
        while count > 0 {
            let chunk = self.head_chunk();
            let want = chunk.len().min(count);
            if want == 0 {
                break;
            }
            let n = match writer.write(&chunk[..want]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "writer accepted no bytes",
                    )
                    .into());
                }
                Ok(n) => n.min(want),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.advance_head(n);
            count -= n;
        }
        if count_total > 0 {
            trace!("segment queue: wrote {} bytes, buffered {}", count_total, self.size);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn queue() -> SegmentQueue {
        SegmentQueue::new(SegmentPool::new())
    }

    #[test]
    fn test_push_spills_across_segments() {
        let mut q = queue();
        let data: Vec<u8> = (0..5000u32).map(|i| i as u8).collect();
        q.push_slice(&data).unwrap();
        assert_eq!(q.len(), 5000);
        assert_eq!(q.segment_count(), 3);
        assert_eq!(q.head_chunk().len(), SEGMENT_SIZE);
        assert_eq!(q.open_tail_len(), 5000 - 2 * SEGMENT_SIZE);

        let mut out = vec![0u8; 5000];
        q.copy_to(&mut out);
        assert_eq!(out, data);
        assert!(q.is_empty());
        assert_eq!(q.segment_count(), 0);
        assert_eq!(q.pool().len(), 3);
    }

    #[test]
    fn test_writable_tail_rejects_bad_capacity() {
        let mut q = queue();
        assert!(matches!(q.writable_tail(0), Err(Error::InvalidArgument(_))));
        assert!(q.writable_tail(SEGMENT_SIZE + 1).is_err());
        assert!(q.writable_tail(SEGMENT_SIZE).is_ok());
    }

    #[test]
    fn test_fill_from_eof_leaves_no_empty_segment() {
        let mut q = queue();
        let mut reader = Cursor::new(Vec::<u8>::new());
        assert_eq!(q.fill_from(&mut reader, SEGMENT_SIZE).unwrap(), 0);
        assert_eq!(q.segment_count(), 0);
        assert!(q.head_chunk().is_empty());
    }

    #[test]
    fn test_find_and_peek_across_segments() {
        let mut q = queue();
        let mut data = vec![b'a'; SEGMENT_SIZE + 10];
        data[SEGMENT_SIZE + 3] = b'x';
        data[5] = b'x';
        q.push_slice(&data).unwrap();

        assert_eq!(q.find(b'x', 0), Some(5));
        assert_eq!(q.find(b'x', 6), Some(SEGMENT_SIZE + 3));
        assert_eq!(q.find(b'x', SEGMENT_SIZE + 4), None);
        assert_eq!(q.find(b'z', 0), None);
        assert_eq!(q.peek(SEGMENT_SIZE + 3), Some(b'x'));
        assert_eq!(q.peek(SEGMENT_SIZE + 10), None);
    }

    #[test]
    fn test_peek_prefix_does_not_consume() {
        let mut q = queue();
        let data: Vec<u8> = (0..SEGMENT_SIZE + 3).map(|i| i as u8).collect();
        q.push_slice(&data).unwrap();
        assert_eq!(q.peek_prefix(SEGMENT_SIZE + 1), &data[..SEGMENT_SIZE + 1]);
        assert_eq!(q.peek_prefix(10_000), data);
        assert_eq!(q.len(), data.len());
    }

    #[test]
    fn test_discard_and_pop_byte() {
        let mut q = queue();
        q.push_slice(&[1, 2, 3, 4]).unwrap();
        q.discard(2);
        assert_eq!(q.pop_byte(), 3);
        assert_eq!(q.len(), 1);
    }

    /// Accepts at most `step` bytes per call and fails once `budget` runs out.
    struct Choppy {
        out: Vec<u8>,
        step: usize,
        budget: usize,
        interrupted: bool,
    }

    impl Write for Choppy {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
            }
            let n = buf.len().min(self.step).min(self.budget);
            self.out.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_to_partial_failure_resumes_without_duplicates() {
        let mut q = queue();
        q.push_slice(b"hello world").unwrap();
        let mut w = Choppy {
            out: Vec::new(),
            step: 3,
            budget: 5,
            interrupted: false,
        };

        let err = q.write_to(&mut w, 11).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert_eq!(w.out, b"hello");
        assert_eq!(q.len(), 6);
        assert_eq!(q.head_chunk(), b" world");

        w.budget = usize::MAX;
        q.write_to(&mut w, 6).unwrap();
        assert_eq!(w.out, b"hello world");
        assert!(q.is_empty());
    }

    #[test]
    fn test_write_to_rejects_zero_length_write() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let mut q = queue();
        q.push_slice(b"abc").unwrap();
        let err = q.write_to(&mut Full, 3).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::WriteZero));
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_write_to_keeps_remaining() {
        let mut q = queue();
        q.push_slice(b"hello world").unwrap();
        let mut out = Vec::new();
        q.write_to(&mut out, 5).unwrap();
        assert_eq!(out, b"hello");
        assert_eq!(q.len(), 6);
        assert_eq!(q.head_chunk(), b" world");
    }
}
