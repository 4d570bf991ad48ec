//! Pooled, segmented buffered I/O over blocking byte streams.
//!
//! This crate wraps a [`std::io::Read`] or [`std::io::Write`] with a buffer
//! built from fixed-size segments. Two stream types are provided:
//!
//! - [`ByteSource<R>`]: typed reads (integers, strings, lines) with peeking
//!   and searching over the buffered bytes
//! - [`ByteSink<W>`]: typed writes that drain to the writer one full segment
//!   at a time
//!
//! # Segments and Pooling
//!
//! Buffered bytes live in a ring of [`Segment`]s, each holding
//! [`SEGMENT_SIZE`] bytes. Drained segments go back to a [`SegmentPool`]
//! owned by the stream and are reused by later reads and writes. The pool
//! keeps at most [`POOL_MAX_BYTES`] of idle segments by default; see
//! [`BufferConfig`] to change that.
//!
//! # Reading
//!
//! ```
//! use segio_buffer::{ByteSource, Charset};
//!
//! let data = b"\x00\x01\x00\x00\x00\x02first\r\nsecond";
//! let mut src = ByteSource::new(&data[..]);
//!
//! assert_eq!(src.read_short().unwrap(), 1);
//! assert_eq!(src.read_int().unwrap(), 2);
//! assert_eq!(src.read_line(Charset::Utf8).unwrap().as_deref(), Some("first"));
//! assert_eq!(src.read_line(Charset::Utf8).unwrap().as_deref(), Some("second"));
//! assert_eq!(src.read_line(Charset::Utf8).unwrap(), None);
//! ```
//!
//! # Writing
//!
//! ```
//! use segio_buffer::ByteSink;
//!
//! let mut sink = ByteSink::new(Vec::new());
//! sink.write_long_le(1).unwrap().write_utf8("ok").unwrap();
//! assert_eq!(sink.into_inner().unwrap(), b"\x01\0\0\0\0\0\0\0ok");
//! ```
//!
//! # Byte Order
//!
//! Multi-byte values are big-endian unless the method name ends in `_le`.
//! The [`endian`] module exposes the raw conversions.
//!
//! # Files
//!
//! [`ByteSource::open`] and [`ByteSink::create`] wrap files directly.
//! [`close_quietly`] and [`close_strict`] release any writer with or
//! without surfacing flush failures.

mod charset;
mod config;
pub mod endian;
mod error;
mod pool;
mod queue;
mod segment;
mod sink;
mod source;
mod stream;

pub use charset::Charset;
pub use config::BufferConfig;
pub use error::{Error, Result};
pub use pool::{SegmentPool, POOL_MAX_BYTES};
pub use segment::{Iter as SegmentIter, Segment, SegmentId, SegmentRing, SEGMENT_SIZE};
pub use sink::ByteSink;
pub use source::{ByteSource, Lines, MAX_READ_COUNT};
pub use stream::{close_quietly, close_strict};
