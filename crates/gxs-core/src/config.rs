//! Session configuration, loadable from TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bulk::BulkConfig;
use crate::error::{GxsError, Result};
use crate::frame::{FrameGeometry, SampleOrder};
use crate::protocol::constants::*;
use crate::state::PollConfig;

/// Configuration for a capture session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Timeout for every control transfer.
    pub control_timeout_ms: u64,
    /// Give up waiting for an exposure after this long. Unset waits forever.
    pub trigger_timeout_ms: Option<u64>,
    /// Sleep between state polls.
    pub poll_interval_ms: u64,
    /// Timeout of each bulk event pump call.
    pub pump_interval_ms: u64,
    /// Longest gap between bulk completions.
    pub transfer_timeout_ms: u64,
    /// Bulk IN endpoint carrying frame data.
    pub bulk_endpoint: u8,
    /// Bytes requested by each bulk transfer.
    pub chunk_size: usize,
    /// Integration time programmed during bring-up.
    pub integration_time_bringup: u16,
    /// Integration time restored around every capture.
    pub integration_time_default: u16,
    /// Fixed exposure timestamp written after each capture instead of the
    /// current local time. Must be 23 bytes.
    pub exposure_timestamp: Option<String>,
    /// Byte order of raw samples when decoding.
    pub sample_order: SampleOrder,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            control_timeout_ms: DEFAULT_CONTROL_TIMEOUT_MS,
            trigger_timeout_ms: None,
            poll_interval_ms: 0,
            pump_interval_ms: DEFAULT_PUMP_INTERVAL_MS,
            transfer_timeout_ms: DEFAULT_TRANSFER_TIMEOUT_MS,
            bulk_endpoint: BULK_IN_ENDPOINT,
            chunk_size: BULK_CHUNK_SIZE,
            integration_time_bringup: INTEGRATION_TIME_BRINGUP,
            integration_time_default: INTEGRATION_TIME_DEFAULT,
            exposure_timestamp: None,
            sample_order: SampleOrder::BigEndian,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| GxsError::Config(format!("{}: {}", path.display(), e)))?;
        let config: SessionConfig =
            toml::from_str(&content).map_err(|e| GxsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).map_err(|e| GxsError::Config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| GxsError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > BULK_CHUNK_SIZE {
            return Err(GxsError::Config(format!(
                "chunk_size must be 1..=0x{:X}, got 0x{:X}",
                BULK_CHUNK_SIZE, self.chunk_size
            )));
        }
        if self.bulk_endpoint & 0x80 == 0 {
            return Err(GxsError::Config(format!(
                "bulk_endpoint 0x{:02X} is not an IN endpoint",
                self.bulk_endpoint
            )));
        }
        if let Some(ts) = &self.exposure_timestamp {
            if ts.len() != EEPROM_TIMESTAMP_LEN {
                return Err(GxsError::InvalidTimestamp {
                    expected: EEPROM_TIMESTAMP_LEN,
                    actual: ts.len(),
                });
            }
        }
        Ok(())
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::GXS700.with_sample_order(self.sample_order)
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            deadline: self.trigger_timeout_ms.map(Duration::from_millis),
            ..PollConfig::default()
        }
    }

    pub fn bulk_config(&self) -> BulkConfig {
        BulkConfig {
            endpoint: self.bulk_endpoint,
            chunk_size: self.chunk_size,
            frame_size: self.geometry().frame_size(),
            pump_interval: Duration::from_millis(self.pump_interval_ms),
            transfer_timeout: Duration::from_millis(self.transfer_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        config.validate().unwrap();
        assert_eq!(config.bulk_config().transfer_count(), 304);
        assert_eq!(config.poll_config().deadline, None);
        assert_eq!(config.geometry(), FrameGeometry::GXS700);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gxs700.toml");

        let config = SessionConfig {
            trigger_timeout_ms: Some(30_000),
            exposure_timestamp: Some("2015/03/19-21:44:43:087".into()),
            sample_order: SampleOrder::LittleEndian,
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("sample_order = \"little-endian\""));

        let loaded = SessionConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "poll_interval_ms = 2\n").unwrap();

        let loaded = SessionConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.poll_interval_ms, 2);
        assert_eq!(loaded.chunk_size, BULK_CHUNK_SIZE);
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "exposure_timestamp = \"2015/03/19\"\n").unwrap();

        assert!(matches!(
            SessionConfig::load_from_file(&path),
            Err(GxsError::InvalidTimestamp { actual: 10, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SessionConfig::load_from_file("/nonexistent/gxs700.toml"),
            Err(GxsError::Config(_))
        ));
    }
}
