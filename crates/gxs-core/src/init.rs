//! One-time FPGA bring-up.
//!
//! Safe to run on a device that was already brought up: every step is a
//! write followed by its own verification, and the only state check that
//! fails the sequence is the one after the pipeline is enabled.

use tracing::{debug, info, instrument, warn};

use crate::bulk::BulkFrameReader;
use crate::error::{GxsError, Result};
use crate::frame::FrameGeometry;
use crate::protocol::constants::{
    FPGA_REG_PIPELINE, INTEGRATION_TIME_BRINGUP, INTEGRATION_TIME_DEFAULT,
};
use crate::protocol::{CaptureMode, DeviceState, FpgaTables};
use crate::registers::RegisterAccess;
use crate::state::DeviceStateMachine;
use crate::transport::UsbTransport;

/// What bring-up found on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    /// State read before anything was written
    pub initial_state: DeviceState,
    /// A frame left over from an earlier capture was read and discarded
    pub flushed_stale_frame: bool,
    /// The acquisition pipeline was already enabled
    pub was_running: bool,
}

/// Brings a freshly opened device to the capture-ready configuration.
#[derive(Debug, Clone)]
pub struct DeviceInitializer {
    tables: FpgaTables,
    geometry: FrameGeometry,
    integration_bringup: u16,
    integration_default: u16,
}

impl Default for DeviceInitializer {
    fn default() -> Self {
        Self::new(FpgaTables::builtin())
    }
}

impl DeviceInitializer {
    pub fn new(tables: FpgaTables) -> Self {
        Self {
            tables,
            geometry: FrameGeometry::GXS700,
            integration_bringup: INTEGRATION_TIME_BRINGUP,
            integration_default: INTEGRATION_TIME_DEFAULT,
        }
    }

    pub fn with_geometry(mut self, geometry: FrameGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_integration_times(mut self, bringup: u16, default: u16) -> Self {
        self.integration_bringup = bringup;
        self.integration_default = default;
        self
    }

    #[instrument(level = "info", skip_all)]
    pub fn run<T: UsbTransport>(
        &self,
        regs: &mut RegisterAccess<T>,
        machine: &mut DeviceStateMachine,
        reader: &BulkFrameReader,
    ) -> Result<InitReport> {
        let initial_state = machine.poll_state(regs)?;
        info!(state = %initial_state, "Initial device state");

        let flushed_stale_frame = match initial_state {
            DeviceState::Idle => false,
            DeviceState::CaptureReady => {
                warn!("Flushing stale capture");
                let stale = reader.drain(regs.transport_mut())?;
                debug!(bytes = stale.len(), "Stale frame discarded");
                true
            }
            state => return Err(GxsError::NotIdle { state }),
        };

        let (width, height) = (self.geometry.width, self.geometry.height);
        regs.affirm_geometry(width, height)?;

        let was_running = regs.timing_analysis_running()?;
        if was_running {
            info!("Pipeline already enabled, reloading tables");
        }

        regs.check_signature()?;
        regs.load_table(self.tables.sequencer)?;
        regs.check_signature()?;
        regs.load_table(self.tables.readout)?;

        regs.write_register(FPGA_REG_PIPELINE, 0x0001)?;
        let got = regs.read_register(FPGA_REG_PIPELINE)?;
        if got != 0x0001 {
            return Err(GxsError::RegisterMismatch {
                addr: FPGA_REG_PIPELINE,
                got,
                want: 0x0001,
            });
        }

        regs.set_integration_time(self.integration_bringup)?;
        regs.affirm_geometry(width, height)?;
        machine.assert_state(regs, DeviceState::Idle)?;

        regs.set_integration_time(self.integration_default)?;
        regs.set_capture_mode(CaptureMode::Normal)?;

        info!(
            rows = self.tables.row_count(),
            flushed_stale_frame, was_running, "Device initialized"
        );
        Ok(InitReport {
            initial_state,
            flushed_stale_frame,
            was_running,
        })
    }
}
