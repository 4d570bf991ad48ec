//! Fixed-capacity segments and the ring that links them.
//!
//! A [`SegmentRing`] is a circular doubly linked list stored in an arena.
//! Links are [`SegmentId`] indices instead of references, so segments can be
//! moved in and out of the ring without aliasing.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Capacity of a single segment in bytes.
pub const SEGMENT_SIZE: usize = 2048;

/// Handle to a segment slot inside a [`SegmentRing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(usize);

/// A fixed-capacity byte container with a read cursor and a write limit.
///
/// Bytes in `pos..limit` are readable; bytes in `limit..SEGMENT_SIZE` are
/// free for writing. A segment outside any ring has no links.
pub struct Segment {
    data: Box<[u8]>,
    pos: usize,
    limit: usize,
    prev: Option<SegmentId>,
    next: Option<SegmentId>,
}

impl Default for Segment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("pos", &self.pos)
            .field("limit", &self.limit)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish()
    }
}

impl Segment {
    /// Creates a zero-filled, detached segment.
    pub fn new() -> Self {
        Segment {
            data: vec![0u8; SEGMENT_SIZE].into_boxed_slice(),
            pos: 0,
            limit: 0,
            prev: None,
            next: None,
        }
    }

    /// Index of the next byte to read.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Index one past the last written byte.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of readable bytes.
    pub fn len(&self) -> usize {
        self.limit - self.pos
    }

    /// Returns true if every written byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos == self.limit
    }

    /// Free space left after `limit`.
    pub fn writable(&self) -> usize {
        SEGMENT_SIZE - self.limit
    }

    /// Returns true if no more bytes can be appended.
    pub fn is_full(&self) -> bool {
        self.limit == SEGMENT_SIZE
    }

    /// The readable bytes, `pos..limit`.
    pub fn readable(&self) -> &[u8] {
        &self.data[self.pos..self.limit]
    }

    /// The previous segment in the ring, if linked.
    pub fn prev(&self) -> Option<SegmentId> {
        self.prev
    }

    /// The next segment in the ring, if linked.
    pub fn next(&self) -> Option<SegmentId> {
        self.next
    }

    /// Returns true if the segment still belongs to a ring.
    pub fn is_linked(&self) -> bool {
        self.prev.is_some() || self.next.is_some()
    }

    /// The free tail, `limit..SEGMENT_SIZE`.
    pub(crate) fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.limit..]
    }

    /// Marks `n` bytes of the free tail as written.
    pub(crate) fn commit(&mut self, n: usize) {
        debug_assert!(self.limit + n <= SEGMENT_SIZE);
        self.limit += n;
    }

    /// Marks `n` readable bytes as consumed.
    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.limit);
        self.pos += n;
    }

    pub(crate) fn push_byte(&mut self, b: u8) {
        self.data[self.limit] = b;
        self.limit += 1;
    }

    pub(crate) fn pop_byte(&mut self) -> u8 {
        let b = self.data[self.pos];
        self.pos += 1;
        b
    }

    pub(crate) fn reset(&mut self) {
        self.pos = 0;
        self.limit = 0;
    }

    pub(crate) fn set_links(&mut self, prev: Option<SegmentId>, next: Option<SegmentId>) {
        self.prev = prev;
        self.next = next;
    }
}

/// Arena-backed circular doubly linked list of segments.
///
/// Slots freed by [`pop`](SegmentRing::pop) are reused by later inserts, so
/// a [`SegmentId`] is only meaningful while its segment is in the ring.
#[derive(Debug, Default)]
pub struct SegmentRing {
    slots: Vec<Option<Segment>>,
    vacant: Vec<usize>,
    len: usize,
}

impl SegmentRing {
    /// Creates an empty ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of linked segments.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no segment is linked.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the segment for `id`, if it is in the ring.
    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Returns the segment for `id` mutably, if it is in the ring.
    pub fn get_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Starts a new ring of one segment that links to itself.
    pub fn insert_lone(&mut self, segment: Segment) -> SegmentId {
        let id = self.alloc(segment);
        self[id].set_links(Some(id), Some(id));
        id
    }

    /// Inserts `segment` immediately after `after` and returns its id.
    ///
    /// When `after` is the tail, the inserted segment becomes the new tail.
    ///
    /// # Panics
    ///
    /// Panics if `after` is not in the ring.
    pub fn push(&mut self, after: SegmentId, segment: Segment) -> SegmentId {
        let next = self[after].next.unwrap_or(after);
        let id = self.alloc(segment);
        self[id].set_links(Some(after), Some(next));
        self[next].prev = Some(id);
        self[after].next = Some(id);
        id
    }

    /// Removes `id` from the ring and relinks its neighbours.
    ///
    /// Returns the detached segment and the remaining ring's entry point
    /// (the removed segment's successor), or `None` if the ring is now empty.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not in the ring.
    pub fn pop(&mut self, id: SegmentId) -> (Segment, Option<SegmentId>) {
        let mut segment = self.slots[id.0]
            .take()
            .unwrap_or_else(|| panic!("segment {:?} is not in the ring", id));
        self.vacant.push(id.0);
        self.len -= 1;

        let prev = segment.prev.unwrap_or(id);
        let next = segment.next.unwrap_or(id);
        segment.set_links(None, None);

        if next == id {
            return (segment, None);
        }
        self[prev].next = Some(next);
        self[next].prev = Some(prev);
        (segment, Some(next))
    }

    /// Iterates the ring starting at `start`, following `next` links once around.
    pub fn iter_from(&self, start: SegmentId) -> Iter<'_> {
        Iter {
            ring: self,
            start,
            current: self.get(start).map(|_| start),
        }
    }

    fn alloc(&mut self, segment: Segment) -> SegmentId {
        self.len += 1;
        match self.vacant.pop() {
            Some(index) => {
                self.slots[index] = Some(segment);
                SegmentId(index)
            }
            None => {
                self.slots.push(Some(segment));
                SegmentId(self.slots.len() - 1)
            }
        }
    }
}

impl Index<SegmentId> for SegmentRing {
    type Output = Segment;

    fn index(&self, id: SegmentId) -> &Segment {
        self.get(id)
            .unwrap_or_else(|| panic!("segment {:?} is not in the ring", id))
    }
}

impl IndexMut<SegmentId> for SegmentRing {
    fn index_mut(&mut self, id: SegmentId) -> &mut Segment {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("segment {:?} is not in the ring", id))
    }
}

/// Iterator over a ring, see [`SegmentRing::iter_from`].
pub struct Iter<'a> {
    ring: &'a SegmentRing,
    start: SegmentId,
    current: Option<SegmentId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (SegmentId, &'a Segment);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let segment = &self.ring[id];
        self.current = segment.next.filter(|&next| next != self.start);
        Some((id, segment))
    }
}
