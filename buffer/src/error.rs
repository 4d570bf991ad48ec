//! Error types for buffered stream operations.

use std::io;

/// Result type alias for segio-buffer.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for source, sink and pool operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying input ended before the requested bytes arrived.
    #[error("end of stream")]
    EndOfStream,

    /// A structurally impossible request (bad count, capacity or segment state).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A non-consuming peek past the currently buffered data.
    #[error("index out of range: index={index} size={size}")]
    OutOfRange { index: usize, size: usize },

    /// Bytes could not be decoded with the requested charset.
    #[error("decode error: {0}")]
    Decode(String),

    /// Text could not be represented in the requested charset.
    #[error("encode error: {0}")]
    Encode(String),

    /// Failure reported by the underlying reader or writer.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns true if this error means the input ran dry.
    pub fn is_end_of_stream(&self) -> bool {
        match self {
            Error::EndOfStream => true,
            Error::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(inner) => inner,
            Error::EndOfStream => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            Error::InvalidArgument(_) | Error::OutOfRange { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
            Error::Decode(_) | Error::Encode(_) => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}
