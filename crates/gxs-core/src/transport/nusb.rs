//! nusb-based USB transport implementation.

use std::collections::VecDeque;
use std::time::Duration;

use nusb::transfer::{
    Buffer, Bulk, ControlIn, ControlOut, ControlType, In, Recipient, TransferError,
};
use nusb::{Endpoint, Interface, MaybeFuture, list_devices};
use tracing::{debug, info, instrument, trace};

use super::traits::{
    BulkCompletion, BulkHandler, BulkStatus, Disposition, TransferId, TransportError, UsbTransport,
};
use crate::protocol::constants::{DEFAULT_CONTROL_TIMEOUT_MS, GXS_VENDOR_ID, SUPPORTED_PIDS};

/// nusb-based USB transport.
pub struct NusbTransport {
    interface: Interface,
    /// Bulk IN endpoint and its address, opened on first submission.
    bulk_in: Option<(u8, Endpoint<Bulk, In>)>,
    /// Outstanding transfers in submission order. nusb completes transfers on
    /// one endpoint in the order they were submitted.
    in_flight: VecDeque<(TransferId, usize)>,
    control_timeout: Duration,
    vid: u16,
    pid: u16,
}

impl NusbTransport {
    /// Open the first connected GXS700 (tries all supported PIDs).
    #[instrument(level = "info")]
    pub fn open() -> Result<Self, TransportError> {
        let devices = list_devices()
            .wait()
            .map_err(|e| TransportError::OpenFailed(e.to_string()))?;

        for device_info in devices {
            if device_info.vendor_id() == GXS_VENDOR_ID
                && SUPPORTED_PIDS.contains(&device_info.product_id())
            {
                return Self::open_device_info(device_info);
            }
        }

        Err(TransportError::DeviceNotFound { vid: GXS_VENDOR_ID })
    }

    /// Open a device with specific VID/PID.
    #[instrument(level = "info", fields(vid = format!("{:04X}", vid), pid = format!("{:04X}", pid)))]
    pub fn open_with_ids(vid: u16, pid: u16) -> Result<Self, TransportError> {
        let device_info = list_devices()
            .wait()
            .map_err(|e| TransportError::OpenFailed(e.to_string()))?
            .find(|d| d.vendor_id() == vid && d.product_id() == pid)
            .ok_or(TransportError::DeviceNotFound { vid })?;

        Self::open_device_info(device_info)
    }

    /// Override the timeout applied to every control transfer.
    pub fn with_control_timeout(mut self, timeout: Duration) -> Self {
        self.control_timeout = timeout;
        self
    }

    fn open_device_info(device_info: nusb::DeviceInfo) -> Result<Self, TransportError> {
        let vid = device_info.vendor_id();
        let pid = device_info.product_id();

        info!(
            vendor_id = %format!("{:04X}", vid),
            product_id = %format!("{:04X}", pid),
            "Found device"
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| TransportError::OpenFailed(e.to_string()))?;

        let interface =
            device
                .claim_interface(0)
                .wait()
                .map_err(|e| TransportError::ClaimInterfaceFailed {
                    interface: 0,
                    message: e.to_string(),
                })?;

        info!("Device opened successfully");

        Ok(Self {
            interface,
            bulk_in: None,
            in_flight: VecDeque::new(),
            control_timeout: Duration::from_millis(DEFAULT_CONTROL_TIMEOUT_MS),
            vid,
            pid,
        })
    }

    fn endpoint(&mut self, endpoint: u8) -> Result<&mut Endpoint<Bulk, In>, TransportError> {
        let reopen = match &self.bulk_in {
            Some((addr, _)) => *addr != endpoint,
            None => true,
        };
        if reopen {
            if !self.in_flight.is_empty() {
                return Err(TransportError::BulkFailed {
                    endpoint,
                    message: "another endpoint has transfers in flight".into(),
                });
            }
            let ep = self
                .interface
                .endpoint::<Bulk, In>(endpoint)
                .map_err(|e| TransportError::BulkFailed {
                    endpoint,
                    message: e.to_string(),
                })?;
            self.bulk_in = Some((endpoint, ep));
        }
        self.bulk_in
            .as_mut()
            .map(|(_, ep)| ep)
            .ok_or_else(|| TransportError::BulkFailed {
                endpoint,
                message: "endpoint not open".into(),
            })
    }
}

fn control_error(value: u16, index: u16, e: TransferError) -> TransportError {
    match e {
        TransferError::Disconnected => TransportError::Disconnected,
        other => TransportError::ControlFailed {
            value,
            index,
            message: other.to_string(),
        },
    }
}

impl UsbTransport for NusbTransport {
    #[instrument(level = "trace", skip(self), fields(value = format!("0x{:04X}", value), index = format!("0x{:04X}", index)))]
    fn control_read(
        &self,
        request: u8,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Vec<u8>, TransportError> {
        let data = self
            .interface
            .control_in(
                ControlIn {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request,
                    value,
                    index,
                    length: length.min(u16::MAX as usize) as u16,
                },
                self.control_timeout,
            )
            .wait()
            .map_err(|e| control_error(value, index, e))?;

        trace!(bytes_read = data.len(), "Control read complete");
        Ok(data)
    }

    #[instrument(level = "trace", skip(self, data), fields(value = format!("0x{:04X}", value), index = format!("0x{:04X}", index), len = data.len()))]
    fn control_write(
        &self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize, TransportError> {
        self.interface
            .control_out(
                ControlOut {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request,
                    value,
                    index,
                    data,
                },
                self.control_timeout,
            )
            .wait()
            .map_err(|e| control_error(value, index, e))?;

        trace!(bytes_written = data.len(), "Control write complete");
        Ok(data.len())
    }

    fn submit_bulk(
        &mut self,
        endpoint: u8,
        id: TransferId,
        length: usize,
    ) -> Result<(), TransportError> {
        let ep = self.endpoint(endpoint)?;
        let mut buf = Buffer::new(length);
        buf.set_requested_len(length);
        ep.submit(buf);
        self.in_flight.push_back((id, length));
        Ok(())
    }

    fn handle_events(
        &mut self,
        timeout: Duration,
        handler: &mut dyn BulkHandler,
    ) -> Result<usize, TransportError> {
        let Self {
            bulk_in, in_flight, ..
        } = self;
        let Some((_, ep)) = bulk_in.as_mut() else {
            return Ok(0);
        };

        let mut handled = 0;
        let mut wait = timeout;
        while !in_flight.is_empty() {
            let Some(completion) = ep.wait_next_complete(wait) else {
                break;
            };
            // Only the first completion waits; the rest are reaped if ready.
            wait = Duration::ZERO;

            let Some((id, requested)) = in_flight.pop_front() else {
                break;
            };
            let status = match &completion.status {
                Ok(()) => BulkStatus::Completed(&completion.buffer[..]),
                Err(TransferError::Cancelled) => BulkStatus::Cancelled,
                Err(e) => BulkStatus::Failed(e.to_string()),
            };
            let disposition = handler.on_complete(BulkCompletion {
                id,
                requested,
                status,
            });
            handled += 1;

            if disposition == Disposition::Resubmit {
                let mut buf = completion.buffer;
                buf.clear();
                buf.set_requested_len(requested);
                ep.submit(buf);
                in_flight.push_back((id, requested));
            }
        }

        Ok(handled)
    }

    fn cancel_bulk(&mut self, endpoint: u8) -> Result<usize, TransportError> {
        let Some((addr, ep)) = self.bulk_in.as_mut() else {
            return Ok(0);
        };
        if *addr != endpoint {
            return Ok(0);
        }

        let cancelled = ep.pending();
        ep.cancel_all();
        while ep.pending() > 0 {
            if ep.wait_next_complete(Duration::from_secs(1)).is_none() {
                return Err(TransportError::Timeout { timeout_ms: 1000 });
            }
        }
        self.in_flight.clear();

        debug!(cancelled, endpoint = %format!("0x{:02X}", endpoint), "Bulk transfers cancelled");
        Ok(cancelled)
    }

    fn pending_bulk(&self) -> usize {
        self.in_flight.len()
    }

    fn vendor_id(&self) -> u16 {
        self.vid
    }

    fn product_id(&self) -> u16 {
        self.pid
    }
}
