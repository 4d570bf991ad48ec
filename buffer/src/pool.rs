//! Bounded free list of reusable segments.

use tracing::trace;

use crate::config::BufferConfig;
use crate::error::{Error, Result};
use crate::segment::{Segment, SEGMENT_SIZE};

/// Default cap on idle bytes kept by a pool (32 segments).
pub const POOL_MAX_BYTES: usize = 64 * 1024;

/// A bounded free list that recycles [`Segment`]s.
///
/// Every [`ByteSource`](crate::ByteSource) and [`ByteSink`](crate::ByteSink)
/// owns its own pool and only touches it through `&mut self`, so the free
/// list carries no lock.
///
/// Segments handed out by [`take`](SegmentPool::take) are always detached.
/// [`recycle`](SegmentPool::recycle) drops segments once the idle byte count
/// would exceed the cap.
#[derive(Debug)]
pub struct SegmentPool {
    free: Vec<Segment>,
    byte_count: usize,
    max_bytes: usize,
}

impl Default for SegmentPool {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentPool {
    /// Creates a pool with the default cap.
    pub fn new() -> Self {
        Self::capped(POOL_MAX_BYTES)
    }

    /// Creates a pool capped at `config.max_pool_bytes`.
    ///
    /// Fails if the cap is not a whole number of segments.
    pub fn with_config(config: &BufferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::capped(config.max_pool_bytes))
    }

    fn capped(max_bytes: usize) -> Self {
        SegmentPool {
            free: Vec::new(),
            byte_count: 0,
            max_bytes,
        }
    }

    /// Bytes currently held by idle segments.
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// The configured residency cap.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Number of idle segments.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Returns true if no idle segment is available.
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Returns a recycled segment, or a fresh zero-filled one.
    pub fn take(&mut self) -> Segment {
        match self.free.pop() {
            Some(segment) => {
                self.byte_count -= SEGMENT_SIZE;
                segment
            }
            None => {
                trace!("segment pool: allocating new segment");
                Segment::new()
            }
        }
    }

    /// Returns `segment` to the free list.
    ///
    /// Fails if the segment is still linked into a ring. A segment that
    /// would push the idle byte count over the cap is dropped silently.
    pub fn recycle(&mut self, mut segment: Segment) -> Result<()> {
        if segment.is_linked() {
            return Err(Error::invalid("cannot recycle a segment still linked into a ring"));
        }
        if self.byte_count + SEGMENT_SIZE > self.max_bytes {
            return Ok(());
        }
        segment.reset();
        self.byte_count += SEGMENT_SIZE;
        self.free.push(segment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentRing;
    use proptest::prelude::*;

    #[test]
    fn test_take_allocates_when_empty() {
        let mut pool = SegmentPool::new();
        assert!(pool.is_empty());
        let seg = pool.take();
        assert!(!seg.is_linked());
        assert_eq!(pool.byte_count(), 0);
    }

    #[test]
    fn test_recycle_resets_and_reuses() {
        let mut pool = SegmentPool::new();
        let mut seg = pool.take();
        seg.push_byte(7);
        seg.push_byte(8);
        seg.pop_byte();

        pool.recycle(seg).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.byte_count(), SEGMENT_SIZE);

        let reused = pool.take();
        assert_eq!((reused.pos(), reused.limit()), (0, 0));
        assert_eq!(pool.byte_count(), 0);
    }

    #[test]
    fn test_recycle_linked_segment_fails() {
        let mut pool = SegmentPool::new();
        let mut ring = SegmentRing::new();
        let id = ring.insert_lone(Segment::new());
        let mut seg = Segment::new();
        seg.set_links(Some(id), Some(id));

        let err = pool.recycle(seg).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_recycle_drops_over_cap() {
        let cfg = BufferConfig::default().with_max_pool_segments(2);
        let mut pool = SegmentPool::with_config(&cfg).unwrap();
        for _ in 0..5 {
            pool.recycle(Segment::new()).unwrap();
        }
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.byte_count(), pool.max_bytes());
    }

    #[test]
    fn test_zero_cap_never_keeps_segments() {
        let cfg = BufferConfig::default().with_max_pool_bytes(0);
        let mut pool = SegmentPool::with_config(&cfg).unwrap();
        pool.recycle(Segment::new()).unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_with_config_rejects_partial_segment() {
        let cfg = BufferConfig::default().with_max_pool_bytes(SEGMENT_SIZE + 1);
        let err = SegmentPool::with_config(&cfg).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(SegmentPool::new().max_bytes(), POOL_MAX_BYTES);
    }

    proptest! {
        #[test]
        fn prop_byte_count_never_exceeds_cap(ops in proptest::collection::vec(any::<bool>(), 1..200)) {
            let mut pool = SegmentPool::new();
            let mut out: Vec<Segment> = Vec::new();
            for take in ops {
                if take {
                    out.push(pool.take());
                } else {
                    pool.recycle(out.pop().unwrap_or_default()).unwrap();
                }
                prop_assert!(pool.byte_count() <= POOL_MAX_BYTES);
                prop_assert_eq!(pool.byte_count(), pool.len() * SEGMENT_SIZE);
            }
        }
    }
}
