//! Capture session - high-level orchestrator for the capture sequence.
//!
//! One attempt runs `PreCheck → Armed → Polling → Draining → PostCheck →
//! Done`; any fault moves it to `Failed` and propagates. A drained frame is
//! handed out before cleanup, cleanup only runs after a successful drain, and
//! a partial frame never reaches the caller.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::bulk::BulkFrameReader;
use crate::config::SessionConfig;
use crate::decode::decode;
use crate::error::{GxsError, Result};
use crate::events::{CaptureEvent, CaptureObserver, CapturePhase, TracingObserver};
use crate::frame::{DecodedImage, FrameGeometry, RawFrame};
use crate::init::{DeviceInitializer, InitReport};
use crate::protocol::constants::IMAGE_COUNTER_REQUEST;
use crate::protocol::{CaptureMode, DeviceState, ErrorCode, FpgaTables, Versions};
use crate::registers::RegisterAccess;
use crate::state::{CancelToken, DeviceStateMachine};
use crate::transport::{NusbTransport, UsbTransport};

/// Called once before each trigger wait, on the capturing thread.
pub type WaitHook = Box<dyn FnMut() + Send>;

/// Capture session - owns the device and runs captures against it.
pub struct CaptureSession<T: UsbTransport, O: CaptureObserver = TracingObserver> {
    regs: RegisterAccess<T>,
    machine: DeviceStateMachine,
    reader: BulkFrameReader,
    geometry: FrameGeometry,
    config: SessionConfig,
    tables: FpgaTables,
    observer: Arc<O>,
    cancel: CancelToken,
    on_wait: Option<WaitHook>,
    phase: CapturePhase,
    attempts: usize,
}

impl CaptureSession<NusbTransport, TracingObserver> {
    /// Open the first connected GXS700.
    pub fn open(config: SessionConfig) -> Result<Self> {
        let transport = NusbTransport::open()?.with_control_timeout(config.control_timeout());
        Self::new(transport, config)
    }
}

impl<T: UsbTransport> CaptureSession<T, TracingObserver> {
    /// Create a new session with default tracing observer.
    pub fn new(transport: T, config: SessionConfig) -> Result<Self> {
        Self::with_observer(transport, config, Arc::new(TracingObserver))
    }
}

impl<T: UsbTransport, O: CaptureObserver> CaptureSession<T, O> {
    /// Create a new session with a custom observer.
    pub fn with_observer(transport: T, config: SessionConfig, observer: Arc<O>) -> Result<Self> {
        config.validate()?;
        observer.on_event(&CaptureEvent::DeviceConnected {
            vid: transport.vendor_id(),
            pid: transport.product_id(),
        });
        Ok(Self {
            regs: RegisterAccess::new(transport),
            machine: DeviceStateMachine::new(config.poll_config()),
            reader: BulkFrameReader::new(config.bulk_config()),
            geometry: config.geometry(),
            tables: FpgaTables::builtin(),
            observer,
            cancel: CancelToken::new(),
            on_wait: None,
            phase: CapturePhase::Idle,
            attempts: 0,
            config,
        })
    }

    /// Replace the FPGA tables used by `initialize`.
    pub fn with_tables(mut self, tables: FpgaTables) -> Self {
        self.tables = tables;
        self
    }

    /// Install a hook run once before every trigger wait.
    pub fn set_on_wait(&mut self, hook: Option<WaitHook>) {
        self.on_wait = hook;
    }

    /// Token that aborts a trigger wait from another thread.
    ///
    /// The token stays set once cancelled: every later capture fails with
    /// `Cancelled` until `CancelToken::reset` is called.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Register access for diagnostics.
    pub fn registers(&self) -> &RegisterAccess<T> {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut RegisterAccess<T> {
        &mut self.regs
    }

    pub fn into_transport(self) -> T {
        self.regs.into_inner()
    }

    fn set_phase(&mut self, attempt: usize, to: CapturePhase) {
        let from = self.phase;
        self.phase = to;
        self.observer
            .on_event(&CaptureEvent::PhaseChanged { attempt, from, to });
    }

    /// Bring up the FPGA. Run once after opening the device.
    #[instrument(skip(self))]
    pub fn initialize(&mut self) -> Result<InitReport> {
        self.set_phase(0, CapturePhase::Initializing);
        let init = DeviceInitializer::new(self.tables)
            .with_geometry(self.geometry)
            .with_integration_times(
                self.config.integration_time_bringup,
                self.config.integration_time_default,
            );
        let result = init.run(&mut self.regs, &mut self.machine, &self.reader);
        match &result {
            Ok(_) => self.set_phase(0, CapturePhase::Idle),
            Err(e) => {
                self.set_phase(0, CapturePhase::Failed);
                self.observer.on_event(&CaptureEvent::Error {
                    message: e.to_string(),
                });
            }
        }
        result
    }

    pub fn arm_trigger(&self) -> Result<()> {
        self.machine.arm_trigger(&self.regs)
    }

    pub fn disarm_trigger(&self) -> Result<()> {
        self.machine.disarm_trigger(&self.regs)
    }

    pub fn read_state(&mut self) -> Result<DeviceState> {
        self.machine.poll_state(&self.regs)
    }

    pub fn read_error(&self) -> Result<ErrorCode> {
        self.regs.read_error()
    }

    pub fn read_versions(&self) -> Result<Versions> {
        self.regs.versions()
    }

    /// Exposure timestamp stored by the last capture.
    pub fn exposure_timestamp(&self) -> Result<String> {
        self.regs.exposure_timestamp()
    }

    /// Capture one raw frame and disarm the trigger.
    ///
    /// A cleanup fault after the drain discards the frame; use `capture_n`
    /// to receive the frame before cleanup runs.
    pub fn capture_raw(&mut self) -> Result<RawFrame> {
        let outcome = self
            .attempt()
            .and_then(|(attempt, frame)| self.complete(attempt).map(|()| frame));
        self.finish_batch(outcome)
    }

    /// Capture one frame and decode it.
    pub fn capture_one(&mut self) -> Result<DecodedImage> {
        let raw = self.capture_raw()?;
        decode(raw.as_bytes(), &self.geometry)
    }

    /// Capture `n` frames back to back, handing each to `per_frame`.
    ///
    /// Each frame is handed over as soon as it is drained, before the device
    /// is cleaned up for the next exposure. Stops at the first fault or
    /// callback error. The trigger is disarmed once after the loop either
    /// way; if that fails after an earlier error, the earlier error is
    /// returned.
    #[instrument(skip(self, per_frame))]
    pub fn capture_n<F, E>(&mut self, n: usize, mut per_frame: F) -> std::result::Result<(), E>
    where
        F: FnMut(RawFrame) -> std::result::Result<(), E>,
        E: From<GxsError> + std::fmt::Display,
    {
        let mut outcome = Ok(());
        for i in 0..n {
            let (attempt, frame) = match self.attempt() {
                Ok(drained) => drained,
                Err(e) => {
                    outcome = Err(E::from(e));
                    break;
                }
            };
            if let Err(e) = per_frame(frame) {
                self.fail(attempt, &e);
                outcome = Err(e);
                break;
            }
            if let Err(e) = self.complete(attempt) {
                outcome = Err(E::from(e));
                break;
            }
            self.observer.on_event(&CaptureEvent::Progress {
                current: (i + 1) as u64,
                total: n as u64,
            });
        }

        self.finish_batch(outcome)?;
        self.observer.on_event(&CaptureEvent::Complete { frames: n });
        Ok(())
    }

    fn finish_batch<R, E>(
        &mut self,
        outcome: std::result::Result<R, E>,
    ) -> std::result::Result<R, E>
    where
        E: From<GxsError> + std::fmt::Display,
    {
        let disarm = self.machine.disarm_trigger(&self.regs);
        match (outcome, disarm) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(E::from(e)),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(disarm_err)) => {
                warn!(error = %disarm_err, original = %e, "Disarm failed after capture error");
                Err(e)
            }
        }
    }

    /// Run one attempt up to and including the drain.
    fn attempt(&mut self) -> Result<(usize, RawFrame)> {
        self.attempts += 1;
        let attempt = self.attempts;

        match self.run_attempt(attempt) {
            Ok(frame) => {
                self.observer.on_event(&CaptureEvent::FrameCaptured {
                    attempt,
                    bytes: frame.len(),
                });
                Ok((attempt, frame))
            }
            Err(e) => {
                self.fail(attempt, &e);
                Err(e)
            }
        }
    }

    /// Clean up after a drained attempt.
    fn complete(&mut self, attempt: usize) -> Result<()> {
        self.set_phase(attempt, CapturePhase::PostCheck);
        match self.cleanup() {
            Ok(()) => {
                self.set_phase(attempt, CapturePhase::Done);
                info!(attempt, polls = self.machine.last_polls(), "Capture complete");
                Ok(())
            }
            Err(e) => {
                self.fail(attempt, &e);
                Err(e)
            }
        }
    }

    fn fail(&mut self, attempt: usize, error: &dyn std::fmt::Display) {
        self.set_phase(attempt, CapturePhase::Failed);
        self.observer.on_event(&CaptureEvent::Error {
            message: error.to_string(),
        });
    }

    fn run_attempt(&mut self, attempt: usize) -> Result<RawFrame> {
        let (width, height) = (self.geometry.width, self.geometry.height);

        self.set_phase(attempt, CapturePhase::PreCheck);
        self.machine.assert_state(&self.regs, DeviceState::Idle)?;
        self.machine.assert_no_error(&self.regs)?;
        self.regs.affirm_geometry(width, height)?;
        let versions = self.regs.versions()?;
        debug!(%versions, "Device versions");

        self.set_phase(attempt, CapturePhase::Armed);
        self.machine.arm_trigger(&self.regs)?;

        self.set_phase(attempt, CapturePhase::Polling);
        let on_wait = self.on_wait.as_deref_mut().map(|f| f as &mut dyn FnMut());
        self.machine.wait_for_capture(&self.regs, &self.cancel, on_wait)?;
        for _ in 0..2 {
            self.regs.image_counter(IMAGE_COUNTER_REQUEST)?;
        }
        self.machine.assert_no_error(&self.regs)?;
        self.regs.check_signature()?;

        self.set_phase(attempt, CapturePhase::Draining);
        self.reader.drain(self.regs.transport_mut())
    }

    /// Return the device to the armed idle configuration after a drain.
    fn cleanup(&mut self) -> Result<()> {
        let (width, height) = (self.geometry.width, self.geometry.height);

        self.machine.assert_state(&self.regs, DeviceState::Idle)?;
        self.machine.assert_no_error(&self.regs)?;

        let timestamp = self.exposure_stamp();
        self.regs.write_exposure_timestamp(timestamp.as_bytes())?;
        debug!(timestamp = %timestamp, "Exposure timestamp stored");

        self.regs.set_integration_time(self.config.integration_time_default)?;
        self.regs.set_capture_mode(CaptureMode::Normal)?;
        self.machine.arm_trigger(&self.regs)?;

        self.machine.assert_state(&self.regs, DeviceState::Idle)?;
        self.machine.assert_no_error(&self.regs)?;
        self.regs.affirm_geometry(width, height)?;

        self.machine.assert_state(&self.regs, DeviceState::Idle)?;
        self.machine.assert_no_error(&self.regs)
    }

    fn exposure_stamp(&self) -> String {
        match &self.config.exposure_timestamp {
            Some(fixed) => fixed.clone(),
            None => chrono::Local::now()
                .format("%Y/%m/%d-%H:%M:%S:%3f")
                .to_string(),
        }
    }
}
