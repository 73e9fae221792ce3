//! Frame reassembly from chunked bulk IN transfers.
//!
//! A frame is read by submitting every transfer up front and pumping the
//! transport until none remain outstanding. Each completion appends its
//! payload in delivery order; a full-size completion is resubmitted while
//! the frame is still short. A short or empty completion marks the end of
//! the device's stream.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, trace, warn};

use crate::error::{GxsError, Result};
use crate::frame::RawFrame;
use crate::protocol::constants::{
    BULK_CHUNK_SIZE, BULK_IN_ENDPOINT, DEFAULT_PUMP_INTERVAL_MS, DEFAULT_TRANSFER_TIMEOUT_MS,
    FRAME_SZ,
};
use crate::transport::{
    BulkCompletion, BulkHandler, BulkStatus, Disposition, TransferId, TransportError, UsbTransport,
};

/// Bookkeeping for one outstanding bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkTransferDescriptor {
    pub id: TransferId,
    pub requested: usize,
    /// Payload bytes delivered over all completions of this transfer
    pub received: usize,
    pub completions: usize,
    pub retired: bool,
}

impl BulkTransferDescriptor {
    pub fn new(id: TransferId, requested: usize) -> Self {
        Self {
            id,
            requested,
            received: 0,
            completions: 0,
            retired: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fault {
    TimedOut(TransferId),
    Failed(TransferId, String),
}

/// Reassembly state for one frame, handed to the transport event pump.
#[derive(Debug)]
pub struct FrameAssembly {
    expected: usize,
    buffer: Vec<u8>,
    transfers: Vec<BulkTransferDescriptor>,
    outstanding: usize,
    /// Device ended the stream or the frame is complete
    ended: bool,
    fault: Option<Fault>,
}

impl FrameAssembly {
    /// State for `count` transfers of `chunk_size` bytes collecting
    /// `expected` bytes.
    pub fn new(expected: usize, chunk_size: usize, count: usize) -> Self {
        Self {
            expected,
            buffer: Vec::with_capacity(expected),
            transfers: (0..count)
                .map(|i| BulkTransferDescriptor::new(TransferId(i), chunk_size))
                .collect(),
            outstanding: 0,
            ended: false,
            fault: None,
        }
    }

    /// Record that the transfer with `id` was handed to the transport.
    pub fn mark_submitted(&mut self, id: TransferId) {
        if self.transfers.get(id.0).is_some() {
            self.outstanding += 1;
        }
    }

    pub fn received(&self) -> usize {
        self.buffer.len()
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn transfers(&self) -> &[BulkTransferDescriptor] {
        &self.transfers
    }

    /// True once no more completions are wanted.
    pub fn is_finished(&self) -> bool {
        self.outstanding == 0 || self.ended || self.fault.is_some()
    }

    /// Lowest numbered transfer still waiting for a completion.
    pub fn first_outstanding(&self) -> Option<TransferId> {
        self.transfers.iter().find(|t| !t.retired).map(|t| t.id)
    }

    /// Retire every transfer the transport just cancelled.
    pub fn retire_all(&mut self) {
        for t in self.transfers.iter_mut().filter(|t| !t.retired) {
            t.retired = true;
        }
        self.outstanding = 0;
    }

    fn retire(&mut self, idx: usize) -> Disposition {
        if let Some(t) = self.transfers.get_mut(idx) {
            if !t.retired {
                t.retired = true;
                self.outstanding = self.outstanding.saturating_sub(1);
            }
        }
        Disposition::Retire
    }

    /// Check the assembled size and hand back the frame.
    pub fn finish(self) -> Result<RawFrame> {
        let got = self.buffer.len();
        if got < self.expected {
            return Err(GxsError::TruncatedFrame {
                got,
                expected: self.expected,
            });
        }
        if got > self.expected {
            return Err(GxsError::OversizedFrame {
                got,
                expected: self.expected,
            });
        }
        Ok(RawFrame::from_vec(self.buffer))
    }
}

impl BulkHandler for FrameAssembly {
    fn on_complete(&mut self, completion: BulkCompletion<'_>) -> Disposition {
        let idx = completion.id.0;
        let Some(desc) = self.transfers.get_mut(idx) else {
            warn!(id = idx, "Completion for unknown transfer");
            return Disposition::Retire;
        };
        desc.completions += 1;

        match completion.status {
            // Leftovers after the end of stream carry nothing the frame needs.
            _ if self.ended => {
                debug!(id = idx, "Dropping completion after end of stream");
                self.retire(idx)
            }
            BulkStatus::Completed(data) => {
                desc.received += data.len();
                self.buffer.extend_from_slice(data);
                trace!(id = idx, len = data.len(), total = self.buffer.len(), "Bulk chunk");

                let full = data.len() == completion.requested;
                if !full {
                    self.ended = true;
                }
                if self.buffer.len() >= self.expected {
                    self.ended = true;
                }
                if full && !self.ended && self.fault.is_none() {
                    Disposition::Resubmit
                } else {
                    self.retire(idx)
                }
            }
            BulkStatus::TimedOut => {
                self.fault.get_or_insert(Fault::TimedOut(completion.id));
                self.retire(idx)
            }
            BulkStatus::Cancelled => self.retire(idx),
            BulkStatus::Failed(message) => {
                self.fault
                    .get_or_insert(Fault::Failed(completion.id, message));
                self.retire(idx)
            }
        }
    }
}

/// Parameters of one frame drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkConfig {
    pub endpoint: u8,
    pub chunk_size: usize,
    pub frame_size: usize,
    /// Timeout handed to each `handle_events` call
    pub pump_interval: Duration,
    /// Longest gap between completions before the drain is abandoned
    pub transfer_timeout: Duration,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            endpoint: BULK_IN_ENDPOINT,
            chunk_size: BULK_CHUNK_SIZE,
            frame_size: FRAME_SZ,
            pump_interval: Duration::from_millis(DEFAULT_PUMP_INTERVAL_MS),
            transfer_timeout: Duration::from_millis(DEFAULT_TRANSFER_TIMEOUT_MS),
        }
    }
}

impl BulkConfig {
    /// Number of transfers submitted at drain start.
    pub fn transfer_count(&self) -> usize {
        self.frame_size.div_ceil(self.chunk_size.max(1))
    }
}

/// Reads one frame from the bulk endpoint.
#[derive(Debug, Clone, Default)]
pub struct BulkFrameReader {
    config: BulkConfig,
}

impl BulkFrameReader {
    pub fn new(config: BulkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BulkConfig {
        &self.config
    }

    /// Drain exactly one frame.
    ///
    /// Transfers still outstanding when the frame completes, the stream
    /// ends, or a fault occurs are cancelled before returning.
    #[instrument(level = "debug", skip_all, fields(frame_size = self.config.frame_size))]
    pub fn drain<T: UsbTransport>(&self, transport: &mut T) -> Result<RawFrame> {
        let cfg = &self.config;
        let count = cfg.transfer_count();
        let mut assembly = FrameAssembly::new(cfg.frame_size, cfg.chunk_size, count);
        let start = Instant::now();

        for i in 0..count {
            let id = TransferId(i);
            if let Err(e) = transport.submit_bulk(cfg.endpoint, id, cfg.chunk_size) {
                self.cancel(transport, &mut assembly);
                return Err(e.into());
            }
            assembly.mark_submitted(id);
        }
        debug!(count, chunk = cfg.chunk_size, "Bulk transfers submitted");

        let mut last_progress = Instant::now();
        while !assembly.is_finished() {
            let handled = match transport.handle_events(cfg.pump_interval, &mut assembly) {
                Ok(n) => n,
                Err(e) => {
                    self.cancel(transport, &mut assembly);
                    return Err(e.into());
                }
            };
            if handled > 0 {
                last_progress = Instant::now();
            } else if last_progress.elapsed() >= cfg.transfer_timeout {
                let transfer = assembly.first_outstanding().map_or(0, |id| id.0);
                self.cancel(transport, &mut assembly);
                return Err(GxsError::TransferTimeout {
                    transfer,
                    timeout_ms: cfg.transfer_timeout.as_millis() as u64,
                });
            }
        }

        if transport.pending_bulk() > 0 {
            self.cancel(transport, &mut assembly);
        }

        match assembly.fault.take() {
            Some(Fault::TimedOut(id)) => {
                return Err(GxsError::TransferTimeout {
                    transfer: id.0,
                    timeout_ms: cfg.transfer_timeout.as_millis() as u64,
                });
            }
            Some(Fault::Failed(_, message)) => {
                return Err(TransportError::BulkFailed {
                    endpoint: cfg.endpoint,
                    message,
                }
                .into());
            }
            None => {}
        }

        let received = assembly.received();
        let frame = assembly.finish()?;
        info!(
            bytes = received,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Frame drained"
        );
        Ok(frame)
    }

    fn cancel<T: UsbTransport>(&self, transport: &mut T, assembly: &mut FrameAssembly) {
        match transport.cancel_bulk(self.config.endpoint) {
            Ok(n) if n > 0 => debug!(cancelled = n, "Cancelled outstanding transfers"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to cancel bulk transfers"),
        }
        assembly.retire_all();
    }
}
