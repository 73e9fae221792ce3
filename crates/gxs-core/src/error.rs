//! Error taxonomy for the capture stack.
//!
//! Every variant is fatal to the operation in progress. Nothing in the core
//! retries or downgrades a fault to a warning.

use thiserror::Error;

use crate::protocol::{DeviceState, RegisterSpace};
use crate::transport::TransportError;

/// Result type for GXS700 operations
pub type Result<T> = std::result::Result<T, GxsError>;

#[derive(Error, Debug)]
pub enum GxsError {
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Short read from {space}: wanted 0x{expected:04X} bytes but got 0x{actual:04X}")]
    ShortRead {
        space: RegisterSpace,
        expected: usize,
        actual: usize,
    },

    #[error("Short write to {space}: wanted 0x{expected:04X} bytes but wrote 0x{actual:04X}")]
    ShortWrite {
        space: RegisterSpace,
        expected: usize,
        actual: usize,
    },

    #[error("Short {what} response: need {minimum} bytes, got {actual}")]
    ShortResponse {
        what: &'static str,
        minimum: usize,
        actual: usize,
    },

    #[error("Unexpected device state: got {got}, want {want}")]
    UnexpectedState { got: DeviceState, want: DeviceState },

    #[error("Device reported error code 0x{code:02X}")]
    DeviceError { code: u8 },

    #[error("Invalid FPGA signature: expected 0x{expected:04X}, got 0x{got:04X}")]
    Signature { expected: u16, got: u16 },

    #[error("Truncated frame: got {got} of {expected} bytes")]
    TruncatedFrame { got: usize, expected: usize },

    #[error("Oversized frame: got {got} bytes, expected {expected}")]
    OversizedFrame { got: usize, expected: usize },

    #[error("Bulk transfer {transfer} timed out after {timeout_ms}ms")]
    TransferTimeout { transfer: usize, timeout_ms: u64 },

    #[error("No capture trigger after {timeout_ms}ms ({polls} polls)")]
    TriggerTimeout { timeout_ms: u64, polls: u64 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Geometry mismatch: read back {got:?}, expected {want:?}")]
    GeometryMismatch { got: (u16, u16), want: (u16, u16) },

    #[error("FPGA register 0x{addr:04X} read back 0x{got:04X}, expected 0x{want:04X}")]
    RegisterMismatch { addr: u16, got: u16, want: u16 },

    #[error("Device not idle at startup (state {state}), refusing to set up")]
    NotIdle { state: DeviceState },

    #[error("Raw frame is {actual} bytes, geometry needs {expected}")]
    FrameSize { expected: usize, actual: usize },

    #[error("Invalid exposure timestamp: need {expected} bytes, got {actual}")]
    InvalidTimestamp { expected: usize, actual: usize },

    #[error("Invalid capture mode {0} (only 0 and 5 are known)")]
    InvalidCaptureMode(u16),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GxsError {
    /// True for faults raised by the device itself rather than the host side.
    pub fn is_device_fault(&self) -> bool {
        matches!(
            self,
            GxsError::UnexpectedState { .. }
                | GxsError::DeviceError { .. }
                | GxsError::Signature { .. }
                | GxsError::NotIdle { .. }
                | GxsError::GeometryMismatch { .. }
                | GxsError::RegisterMismatch { .. }
        )
    }
}
