//! Fixed-layout records returned by diagnostic control reads.

use std::fmt;
use std::io::Cursor;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use super::constants::{TRIGGER_PARAM_LEN, VERSIONS_LEN};
use crate::error::{GxsError, Result};

/// One `major.minor.patch` triple from the versions block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u16,
}

impl fmt::Display for ComponentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Versions reply (opcode 0x51).
///
/// The device answers a 0x1C byte request with 12 meaningful bytes:
/// three `u8, u8, u16be` triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Versions {
    pub mcu: ComponentVersion,
    pub fpga: ComponentVersion,
    pub fpga_watchguard: ComponentVersion,
}

impl Versions {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < VERSIONS_LEN {
            return Err(short("versions", VERSIONS_LEN, data.len()));
        }
        let mut cursor = Cursor::new(data);
        let io = |_| short("versions", VERSIONS_LEN, data.len());
        Ok(Self {
            mcu: read_triple(&mut cursor).map_err(io)?,
            fpga: read_triple(&mut cursor).map_err(io)?,
            fpga_watchguard: read_triple(&mut cursor).map_err(io)?,
        })
    }
}

fn read_triple(cursor: &mut Cursor<&[u8]>) -> std::io::Result<ComponentVersion> {
    Ok(ComponentVersion {
        major: cursor.read_u8()?,
        minor: cursor.read_u8()?,
        patch: cursor.read_u16::<BigEndian>()?,
    })
}

fn short(what: &'static str, minimum: usize, actual: usize) -> GxsError {
    GxsError::ShortResponse {
        what,
        minimum,
        actual,
    }
}

impl fmt::Display for Versions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MCU {}, FPGA {}, FPGA WG {}",
            self.mcu, self.fpga, self.fpga_watchguard
        )
    }
}

/// Exposure counters carried in the image counter block (opcode 0x40).
///
/// Both counters are 24-bit little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExposureCounters {
    /// Exposures since manufacture
    pub since_manufacture: u32,
    /// Exposure count at the last calibration
    pub last_calibration: u32,
}

impl ExposureCounters {
    pub const MIN_LEN: usize = 7;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let io = |_| short("image counter", Self::MIN_LEN, data.len());
        let mut cursor = Cursor::new(data);
        let since_manufacture = cursor.read_u24::<LittleEndian>().map_err(io)?;
        cursor.set_position(4);
        let last_calibration = cursor.read_u24::<LittleEndian>().map_err(io)?;
        Ok(Self {
            since_manufacture,
            last_calibration,
        })
    }
}

/// Capture mode register (opcode 0x21, mode carried in wIndex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    #[default]
    Normal,
    /// Mode 5, seen in vendor traces but not otherwise understood
    Mode5,
}

impl CaptureMode {
    pub const fn as_u16(&self) -> u16 {
        match self {
            CaptureMode::Normal => 0,
            CaptureMode::Mode5 => 5,
        }
    }
}

impl TryFrom<u16> for CaptureMode {
    type Error = GxsError;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(CaptureMode::Normal),
            5 => Ok(CaptureMode::Mode5),
            other => Err(GxsError::InvalidCaptureMode(other)),
        }
    }
}

/// Hardware trigger thresholds (opcodes 0x24 / 0x25).
///
/// Wire layout is six bytes: binary threshold (u16be), then the pixel
/// cluster counter threshold as low half (u16be) followed by high half
/// (u16be).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerParams {
    pub binary_threshold: u16,
    pub pixel_cluster_threshold: u32,
}

impl TriggerParams {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(TRIGGER_PARAM_LEN);
        buf.extend_from_slice(&self.binary_threshold.to_be_bytes());
        buf.extend_from_slice(&(self.pixel_cluster_threshold as u16).to_be_bytes());
        buf.extend_from_slice(&((self.pixel_cluster_threshold >> 16) as u16).to_be_bytes());
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let io = |_| short("trigger parameters", TRIGGER_PARAM_LEN, data.len());
        let mut cursor = Cursor::new(data);
        let binary_threshold = cursor.read_u16::<BigEndian>().map_err(io)?;
        let low = cursor.read_u16::<BigEndian>().map_err(io)?;
        let high = cursor.read_u16::<BigEndian>().map_err(io)?;
        Ok(Self {
            binary_threshold,
            pixel_cluster_threshold: (high as u32) << 16 | low as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_parse() {
        // Reply captured from a GXS700 (12 of 28 requested bytes)
        let reply = [
            0x00, 0x05, 0x00, 0x0A, 0x00, 0x03, 0x00, 0x06, 0x00, 0x04, 0x00, 0x05,
        ];
        let v = Versions::from_bytes(&reply).unwrap();
        assert_eq!(v.mcu.to_string(), "0.5.10");
        assert_eq!(v.fpga.to_string(), "0.3.6");
        assert_eq!(v.fpga_watchguard.to_string(), "0.4.5");
    }

    #[test]
    fn test_versions_too_short() {
        let err = Versions::from_bytes(&[0u8; 8]).unwrap_err();
        assert!(matches!(
            err,
            GxsError::ShortResponse {
                minimum: 12,
                actual: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_exposure_counters() {
        let reply = [0x8E, 0x00, 0x00, 0x00, 0x58, 0x00, 0x00, 0x00];
        let c = ExposureCounters::from_bytes(&reply).unwrap();
        assert_eq!(c.since_manufacture, 0x8E);
        assert_eq!(c.last_calibration, 0x58);
    }

    #[test]
    fn test_capture_mode_values() {
        assert_eq!(CaptureMode::try_from(0).unwrap(), CaptureMode::Normal);
        assert_eq!(CaptureMode::try_from(5).unwrap().as_u16(), 5);
        assert!(matches!(
            CaptureMode::try_from(3),
            Err(GxsError::InvalidCaptureMode(3))
        ));
    }

    #[test]
    fn test_trigger_params_layout() {
        let p = TriggerParams {
            binary_threshold: 0x0102,
            pixel_cluster_threshold: 0x0A0B_0C0D,
        };
        let bytes = p.to_bytes();
        assert_eq!(bytes, vec![0x01, 0x02, 0x0C, 0x0D, 0x0A, 0x0B]);
        assert_eq!(TriggerParams::from_bytes(&bytes).unwrap(), p);
    }
}
