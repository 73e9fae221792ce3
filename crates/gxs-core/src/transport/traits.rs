//! USB Transport layer abstraction.
//!
//! Defines the `UsbTransport` trait for USB communication,
//! allowing different implementations (nusb, mock, etc.).
//!
//! Control transfers are synchronous request/response calls. Bulk IN
//! transfers are asynchronous: the caller submits any number of transfers
//! and then pumps `handle_events`, which delivers each completion to a
//! [`BulkHandler`] on the calling thread.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: VID={vid:04X}")]
    DeviceNotFound { vid: u16 },

    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    #[error("Failed to claim interface {interface}: {message}")]
    ClaimInterfaceFailed { interface: u8, message: String },

    #[error("Control transfer failed (wValue=0x{value:04X}, wIndex=0x{index:04X}): {message}")]
    ControlFailed {
        value: u16,
        index: u16,
        message: String,
    },

    #[error("Bulk transfer on endpoint 0x{endpoint:02X} failed: {message}")]
    BulkFailed { endpoint: u8, message: String },

    #[error("Device disconnected")]
    Disconnected,

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Identifies one bulk transfer for the lifetime of a drain.
///
/// Ids are assigned by the submitter (submission index) and travel back
/// unchanged with every completion of that transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(pub usize);

/// Outcome of one bulk transfer as reported by the event pump.
#[derive(Debug)]
pub enum BulkStatus<'a> {
    /// Transfer finished; payload may be shorter than requested.
    Completed(&'a [u8]),
    /// The transport gave up waiting for this transfer.
    TimedOut,
    /// Cancelled by `cancel_bulk`.
    Cancelled,
    /// Any other failure (stall, disconnect, fault).
    Failed(String),
}

/// One completion delivered by `handle_events`.
#[derive(Debug)]
pub struct BulkCompletion<'a> {
    pub id: TransferId,
    pub requested: usize,
    pub status: BulkStatus<'a>,
}

/// What the transport should do with a transfer after its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Submit the same transfer again with the same requested length.
    Resubmit,
    /// Do not resubmit; the transfer is finished.
    Retire,
}

/// Receives bulk completions from the event pump.
///
/// Called on the pumping thread. Implementations must not block.
pub trait BulkHandler {
    fn on_complete(&mut self, completion: BulkCompletion<'_>) -> Disposition;
}

/// Abstract USB transport interface.
///
/// This trait enables:
/// - Production implementation using nusb
/// - Mock implementation for unit testing
pub trait UsbTransport: Send {
    /// Vendor control IN transfer. Returns the bytes the device answered with,
    /// which may be fewer than `length`.
    fn control_read(
        &self,
        request: u8,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Vec<u8>, TransportError>;

    /// Vendor control OUT transfer. Returns the number of bytes written.
    fn control_write(
        &self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize, TransportError>;

    /// Queue a bulk IN transfer of `length` bytes on `endpoint`.
    fn submit_bulk(
        &mut self,
        endpoint: u8,
        id: TransferId,
        length: usize,
    ) -> Result<(), TransportError>;

    /// Wait up to `timeout` for bulk completions and hand each to `handler`.
    ///
    /// A transfer the handler asks to resubmit is requeued before the next
    /// completion is delivered. Returns the number of completions handled.
    fn handle_events(
        &mut self,
        timeout: Duration,
        handler: &mut dyn BulkHandler,
    ) -> Result<usize, TransportError>;

    /// Cancel every outstanding transfer on `endpoint` and reap them.
    ///
    /// Returns how many transfers were cancelled. Cancelled transfers are not
    /// delivered to any handler.
    fn cancel_bulk(&mut self, endpoint: u8) -> Result<usize, TransportError>;

    /// Number of bulk transfers submitted and not yet completed.
    fn pending_bulk(&self) -> usize;

    /// Get the current VID.
    fn vendor_id(&self) -> u16;

    /// Get the current PID.
    fn product_id(&self) -> u16;
}
