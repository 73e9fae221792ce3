//! GXS-Core: Gendex/Dexis GXS700 x-ray sensor driver in Rust.
//!
//! This crate configures the sensor's FPGA over USB vendor control
//! transfers, waits for an exposure trigger, reassembles the raw frame from
//! chunked bulk transfers and decodes it to 8-bit grayscale.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! - **Protocol**: Opcodes, register spaces, status registers, FPGA tables
//! - **Transport**: USB communication abstraction (nusb, mock)
//! - **Registers**: Chunked register access and typed device commands
//! - **State**: Trigger state machine (arm, poll, error check)
//! - **Bulk**: Frame reassembly from outstanding bulk transfers
//! - **Init**: One-time FPGA bring-up
//! - **Session**: High-level capture orchestrator
//! - **Decode**: Raw frame to grayscale image
//! - **Events**: Observer pattern for UI decoupling
//!
//! # Example
//!
//! ```no_run
//! use gxs_core::{CaptureSession, SessionConfig};
//!
//! let mut session = CaptureSession::open(SessionConfig::default())?;
//! session.initialize()?;
//! let image = session.capture_one()?;
//! println!("{}x{}", image.width(), image.height());
//! # Ok::<(), gxs_core::GxsError>(())
//! ```

pub mod bulk;
pub mod config;
pub mod decode;
pub mod error;
pub mod events;
pub mod frame;
pub mod init;
pub mod protocol;
pub mod registers;
pub mod session;
pub mod state;
pub mod transport;

// Re-exports for convenience
pub use bulk::{BulkConfig, BulkFrameReader, BulkTransferDescriptor, FrameAssembly};
pub use config::SessionConfig;
pub use decode::decode;
pub use error::{GxsError, Result};
pub use events::{CaptureEvent, CaptureObserver, CapturePhase, NullObserver, TracingObserver};
pub use frame::{DecodedImage, FrameGeometry, RawFrame, SampleOrder};
pub use init::{DeviceInitializer, InitReport};
pub use protocol::{
    CaptureMode, DeviceState, ErrorCode, ExposureCounters, FpgaTables, RegisterSpace,
    TriggerParams, Versions,
};
pub use registers::RegisterAccess;
pub use session::{CaptureSession, WaitHook};
pub use state::{CancelToken, DeviceStateMachine, PollConfig};
pub use transport::{MockTransport, NusbTransport, TransportError, UsbTransport};
