//! Device state machine module.

pub mod machine;

pub use machine::{CancelToken, DeviceStateMachine, PollConfig};
