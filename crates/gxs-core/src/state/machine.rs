//! Capture state machine for the GXS700 trigger sequence.
//!
//! The device state register is read fresh on every poll; nothing here
//! caches what the device last said.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, trace};

use crate::error::{GxsError, Result};
use crate::protocol::DeviceState;
use crate::registers::RegisterAccess;
use crate::transport::UsbTransport;

/// Thread-safe flag that stops a trigger wait.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation so the token can be reused.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Polling behaviour of `wait_for_capture`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep between polls. Zero polls back to back.
    pub interval: Duration,
    /// Give up after this long without a capture. `None` waits forever.
    pub deadline: Option<Duration>,
    /// Log a progress line every this many polls.
    pub progress_every: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::ZERO,
            deadline: None,
            progress_every: 1000,
        }
    }
}

/// Drives arm → wait-for-ready → error-check against the device registers.
#[derive(Debug, Default)]
pub struct DeviceStateMachine {
    config: PollConfig,
    /// State polls issued by the last `wait_for_capture`.
    last_polls: u64,
    /// State polls issued over the lifetime of this machine.
    total_polls: u64,
}

impl DeviceStateMachine {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            last_polls: 0,
            total_polls: 0,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn last_polls(&self) -> u64 {
        self.last_polls
    }

    pub fn total_polls(&self) -> u64 {
        self.total_polls
    }

    /// Read the state register once.
    pub fn poll_state<T: UsbTransport>(&mut self, regs: &RegisterAccess<T>) -> Result<DeviceState> {
        let state = regs.read_state()?;
        self.total_polls += 1;
        Ok(state)
    }

    pub fn arm_trigger<T: UsbTransport>(&self, regs: &RegisterAccess<T>) -> Result<()> {
        regs.arm_trigger()
    }

    pub fn disarm_trigger<T: UsbTransport>(&self, regs: &RegisterAccess<T>) -> Result<()> {
        regs.disarm_trigger()
    }

    /// Fail with `UnexpectedState` unless the device is in `expected`.
    pub fn assert_state<T: UsbTransport>(
        &mut self,
        regs: &RegisterAccess<T>,
        expected: DeviceState,
    ) -> Result<()> {
        let got = self.poll_state(regs)?;
        if got != expected {
            return Err(GxsError::UnexpectedState {
                got,
                want: expected,
            });
        }
        Ok(())
    }

    /// Fail with `DeviceError` if the error register is non-zero.
    pub fn assert_no_error<T: UsbTransport>(&self, regs: &RegisterAccess<T>) -> Result<()> {
        let code = regs.read_error()?;
        if code.is_error() {
            return Err(GxsError::DeviceError { code: code.value() });
        }
        Ok(())
    }

    /// Block until the device reports a latched frame.
    ///
    /// `on_wait` runs once on the calling thread before the first poll.
    /// Every iteration reads the state and then the error register; a
    /// non-zero error ends the wait even if the state says ready.
    #[instrument(level = "debug", skip_all)]
    pub fn wait_for_capture<T: UsbTransport>(
        &mut self,
        regs: &RegisterAccess<T>,
        cancel: &CancelToken,
        on_wait: Option<&mut dyn FnMut()>,
    ) -> Result<()> {
        if let Some(cb) = on_wait {
            cb();
        }

        let start = Instant::now();
        self.last_polls = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(polls = self.last_polls, "Trigger wait cancelled");
                return Err(GxsError::Cancelled);
            }
            if let Some(deadline) = self.config.deadline {
                if start.elapsed() >= deadline {
                    return Err(GxsError::TriggerTimeout {
                        timeout_ms: deadline.as_millis() as u64,
                        polls: self.last_polls,
                    });
                }
            }

            if self.config.progress_every > 0 && self.last_polls % self.config.progress_every == 0 {
                info!(polls = self.last_polls, "Waiting for trigger");
            }

            let state = self.poll_state(regs)?;
            self.last_polls += 1;

            let code = regs.read_error()?;
            if code.is_error() {
                return Err(GxsError::DeviceError { code: code.value() });
            }

            match state {
                DeviceState::CaptureReady => {
                    info!(polls = self.last_polls, "Capture ready");
                    return Ok(());
                }
                _ if state == DeviceState::Idle || state.is_transient() => {
                    trace!(state = %state, "Waiting");
                }
                _ => {
                    return Err(GxsError::UnexpectedState {
                        got: state,
                        want: DeviceState::CaptureReady,
                    });
                }
            }

            if !self.config.interval.is_zero() {
                thread::sleep(self.config.interval);
            }
        }
    }
}
