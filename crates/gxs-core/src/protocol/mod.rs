//! Protocol module - GXS700 wire definitions.

pub mod constants;
pub mod records;
pub mod space;
pub mod status;
pub mod tables;

pub use constants::*;
pub use records::{CaptureMode, ComponentVersion, ExposureCounters, TriggerParams, Versions};
pub use space::RegisterSpace;
pub use status::{DeviceState, ErrorCode};
pub use tables::{FpgaTables, RegisterBlock};
