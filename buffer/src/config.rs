//! Buffer configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pool::POOL_MAX_BYTES;
use crate::segment::SEGMENT_SIZE;

/// Tunables shared by [`ByteSource`](crate::ByteSource) and
/// [`ByteSink`](crate::ByteSink).
///
/// These only affect memory use, never the bytes read or written.
///
/// ```
/// use segio_buffer::BufferConfig;
///
/// let cfg = BufferConfig::default().with_max_pool_segments(4);
/// assert_eq!(cfg.max_pool_bytes, 4 * 2048);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Maximum bytes of idle segments the pool keeps for reuse.
    /// Zero disables recycling.
    pub max_pool_bytes: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_pool_bytes: POOL_MAX_BYTES,
        }
    }
}

impl BufferConfig {
    /// Set the pool residency cap in bytes.
    pub fn with_max_pool_bytes(mut self, bytes: usize) -> Self {
        self.max_pool_bytes = bytes;
        self
    }

    /// Set the pool residency cap as a number of segments.
    pub fn with_max_pool_segments(mut self, segments: usize) -> Self {
        self.max_pool_bytes = segments.saturating_mul(SEGMENT_SIZE);
        self
    }

    /// Checks that the cap is a whole number of segments.
    ///
    /// Every `with_config` constructor runs this first.
    pub fn validate(&self) -> Result<()> {
        if self.max_pool_bytes % SEGMENT_SIZE != 0 {
            return Err(Error::invalid(format!(
                "max_pool_bytes must be a multiple of {}: {}",
                SEGMENT_SIZE, self.max_pool_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = BufferConfig::default();
        assert_eq!(cfg.max_pool_bytes, 65536);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_partial_segment() {
        let cfg = BufferConfig::default().with_max_pool_bytes(3000);
        assert!(matches!(cfg.validate(), Err(Error::InvalidArgument(_))));
        assert!(BufferConfig::default().with_max_pool_bytes(0).validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let cfg: BufferConfig = serde_yaml::from_str("max_pool_bytes: 8192\n").unwrap();
        assert_eq!(cfg, BufferConfig::default().with_max_pool_segments(4));

        let empty: BufferConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(empty, BufferConfig::default());

        let text = serde_yaml::to_string(&cfg).unwrap();
        assert!(text.contains("max_pool_bytes: 8192"));
    }
}
