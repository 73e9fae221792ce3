//! Device state and error register decoding.
//!
//! Both registers are a single byte. The state register takes one of four
//! observed values; anything else is kept verbatim as `Unknown` so callers
//! can report it.

use std::fmt;

/// Decoded value of the device state register (opcode 0x20).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    /// No activity
    Idle,
    /// Short lived state seen while the sensor reacts to exposure
    Transient1,
    /// Longer lived than `Transient1`
    Transient2,
    /// Frame latched, bulk data is ready to be read
    CaptureReady,
    /// Any value outside the observed set
    Unknown(u8),
}

impl DeviceState {
    pub const IDLE: u8 = 0x01;
    pub const TRANSIENT1: u8 = 0x02;
    pub const TRANSIENT2: u8 = 0x04;
    pub const CAPTURE_READY: u8 = 0x08;

    pub const fn from_byte(b: u8) -> Self {
        match b {
            Self::IDLE => DeviceState::Idle,
            Self::TRANSIENT1 => DeviceState::Transient1,
            Self::TRANSIENT2 => DeviceState::Transient2,
            Self::CAPTURE_READY => DeviceState::CaptureReady,
            other => DeviceState::Unknown(other),
        }
    }

    pub const fn as_byte(&self) -> u8 {
        match self {
            DeviceState::Idle => Self::IDLE,
            DeviceState::Transient1 => Self::TRANSIENT1,
            DeviceState::Transient2 => Self::TRANSIENT2,
            DeviceState::CaptureReady => Self::CAPTURE_READY,
            DeviceState::Unknown(b) => *b,
        }
    }

    /// Transient states are expected between arming and capture.
    pub fn is_transient(&self) -> bool {
        matches!(self, DeviceState::Transient1 | DeviceState::Transient2)
    }
}

impl fmt::Debug for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceState({} 0x{:02X})", self, self.as_byte())
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::Idle => write!(f, "IDLE"),
            DeviceState::Transient1 => write!(f, "TRANSIENT1"),
            DeviceState::Transient2 => write!(f, "TRANSIENT2"),
            DeviceState::CaptureReady => write!(f, "CAPTURE_READY"),
            DeviceState::Unknown(b) => write!(f, "UNKNOWN(0x{:02X})", b),
        }
    }
}

/// Value of the error register (opcode 0x80). Zero means no error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorCode(pub u8);

impl ErrorCode {
    pub const NONE: ErrorCode = ErrorCode(0);

    pub fn is_error(&self) -> bool {
        self.0 != 0
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_states() {
        assert_eq!(DeviceState::from_byte(0x01), DeviceState::Idle);
        assert_eq!(DeviceState::from_byte(0x02), DeviceState::Transient1);
        assert_eq!(DeviceState::from_byte(0x04), DeviceState::Transient2);
        assert_eq!(DeviceState::from_byte(0x08), DeviceState::CaptureReady);
        assert!(DeviceState::from_byte(0x04).is_transient());
        assert!(!DeviceState::Idle.is_transient());
    }

    #[test]
    fn test_unknown_state_is_preserved() {
        let state = DeviceState::from_byte(0x10);
        assert_eq!(state, DeviceState::Unknown(0x10));
        assert_eq!(state.as_byte(), 0x10);
        assert_eq!(state.to_string(), "UNKNOWN(0x10)");
    }

    #[test]
    fn test_zero_is_not_idle() {
        assert_eq!(DeviceState::from_byte(0x00), DeviceState::Unknown(0));
    }

    #[test]
    fn test_error_code() {
        assert!(!ErrorCode::NONE.is_error());
        assert!(ErrorCode(1).is_error());
        assert_eq!(ErrorCode(0x1F).to_string(), "0x1F");
    }
}
