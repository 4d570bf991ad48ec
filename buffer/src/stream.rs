//! File-backed constructors and close helpers.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::sink::ByteSink;
use crate::source::ByteSource;

impl ByteSource<File> {
    /// Opens `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!("byte source: opened {}", path.display());
        Ok(ByteSource::new(file))
    }
}

impl ByteSink<File> {
    /// Opens `path` for writing, creating it if needed.
    ///
    /// With `append` set, writes go to the end of an existing file;
    /// otherwise the file is truncated.
    pub fn create(path: impl AsRef<Path>, append: bool) -> Result<Self> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(path)?;
        debug!("byte sink: opened {} (append={})", path.display(), append);
        Ok(ByteSink::new(file))
    }
}

/// Flushes and drops `writer`, logging any failure instead of returning it.
pub fn close_quietly<W: Write>(mut writer: W) {
    if let Err(e) = writer.flush() {
        debug!("close: ignoring flush error: {}", e);
    }
}

/// Flushes and drops `writer`, returning the flush failure if any.
pub fn close_strict<W: Write>(mut writer: W) -> Result<()> {
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingFlush;

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("disk gone"))
        }
    }

    #[test]
    fn test_close_helpers() {
        close_quietly(FailingFlush);
        assert!(close_strict(FailingFlush).is_err());
        assert!(close_strict(Vec::new()).is_ok());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ByteSource::open(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }
}
