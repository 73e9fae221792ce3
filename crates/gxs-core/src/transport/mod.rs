//! Transport layer module.

pub mod mock;
pub mod nusb;
pub mod traits;

pub use mock::{ControlDirection, ControlRecord, MockBulk, MockTransport};
pub use nusb::NusbTransport;
pub use traits::{
    BulkCompletion, BulkHandler, BulkStatus, Disposition, TransferId, TransportError, UsbTransport,
};
