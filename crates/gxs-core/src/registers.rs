//! Register access over vendor control transfers.
//!
//! Every request uses bRequest 0xB0 with the opcode in wValue and the
//! address in wIndex. Memory-like spaces are read and written in chunks no
//! larger than the space allows; any chunk that moves fewer bytes than
//! requested is a hard error.

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, instrument, trace};

use crate::error::{GxsError, Result};
use crate::protocol::constants::*;
use crate::protocol::{
    CaptureMode, DeviceState, ErrorCode, ExposureCounters, RegisterBlock, RegisterSpace,
    TriggerParams, Versions,
};
use crate::transport::UsbTransport;

/// Chunked register access plus the typed device commands.
pub struct RegisterAccess<T: UsbTransport> {
    transport: T,
}

impl<T: UsbTransport> RegisterAccess<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn control_in(&self, value: u16, index: u16, length: usize) -> Result<Vec<u8>> {
        Ok(self
            .transport
            .control_read(VENDOR_REQUEST, value, index, length)?)
    }

    fn control_out(&self, value: u16, index: u16, data: &[u8]) -> Result<usize> {
        Ok(self
            .transport
            .control_write(VENDOR_REQUEST, value, index, data)?)
    }

    /// Control read that must return exactly `length` bytes.
    fn read_exact(
        &self,
        what: &'static str,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Vec<u8>> {
        let data = self.control_in(value, index, length)?;
        if data.len() != length {
            return Err(GxsError::ShortResponse {
                what,
                minimum: length,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    // ========================================================================
    // Chunked access
    // ========================================================================

    /// Read `length` bytes from `space` starting at `addr`.
    #[instrument(level = "debug", skip(self), fields(addr = format!("0x{:04X}", addr)))]
    pub fn read(&self, space: RegisterSpace, addr: u16, length: usize) -> Result<Vec<u8>> {
        let max = space.max_chunk();
        let mut out = Vec::with_capacity(length);
        let mut index = addr;

        while out.len() < length {
            let want = (length - out.len()).min(max);
            let chunk = self.control_in(space.read_opcode(), index, want)?;
            trace!(index = %format!("0x{:04X}", index), want, got = chunk.len(), "Read chunk");
            if chunk.len() != want {
                return Err(GxsError::ShortRead {
                    space,
                    expected: want,
                    actual: chunk.len(),
                });
            }
            out.extend_from_slice(&chunk);
            index = index.wrapping_add(space.address_step(want));
        }

        Ok(out)
    }

    /// Write `data` to `space` starting at `addr`.
    #[instrument(level = "debug", skip(self, data), fields(addr = format!("0x{:04X}", addr), len = data.len()))]
    pub fn write(&self, space: RegisterSpace, addr: u16, data: &[u8]) -> Result<()> {
        let mut index = addr;
        for chunk in data.chunks(space.max_chunk()) {
            let written = self.control_out(space.write_opcode(), index, chunk)?;
            trace!(index = %format!("0x{:04X}", index), len = chunk.len(), written, "Wrote chunk");
            if written != chunk.len() {
                return Err(GxsError::ShortWrite {
                    space,
                    expected: chunk.len(),
                    actual: written,
                });
            }
            index = index.wrapping_add(space.address_step(chunk.len()));
        }
        Ok(())
    }

    pub fn eeprom_read(&self, addr: u16, length: usize) -> Result<Vec<u8>> {
        self.read(RegisterSpace::Eeprom, addr, length)
    }

    pub fn eeprom_write(&self, addr: u16, data: &[u8]) -> Result<()> {
        self.write(RegisterSpace::Eeprom, addr, data)
    }

    pub fn flash_read(&self, addr: u16, length: usize) -> Result<Vec<u8>> {
        self.read(RegisterSpace::Flash, addr, length)
    }

    pub fn flash_write(&self, addr: u16, data: &[u8]) -> Result<()> {
        self.write(RegisterSpace::Flash, addr, data)
    }

    pub fn i2c_read(&self, addr: u16, length: usize) -> Result<Vec<u8>> {
        self.read(RegisterSpace::I2c, addr, length)
    }

    pub fn i2c_write(&self, addr: u16, data: &[u8]) -> Result<()> {
        self.write(RegisterSpace::I2c, addr, data)
    }

    // ========================================================================
    // FPGA registers
    // ========================================================================

    /// Read `count` consecutive 16-bit FPGA registers.
    pub fn read_registers(&self, addr: u16, count: usize) -> Result<Vec<u16>> {
        let raw = self.read(RegisterSpace::FpgaRegister, addr, count * 2)?;
        let mut values = vec![0u16; count];
        BigEndian::read_u16_into(&raw, &mut values);
        Ok(values)
    }

    /// Write consecutive 16-bit FPGA registers starting at `addr`.
    pub fn write_registers(&self, addr: u16, values: &[u16]) -> Result<()> {
        let mut raw = vec![0u8; values.len() * 2];
        BigEndian::write_u16_into(values, &mut raw);
        self.write(RegisterSpace::FpgaRegister, addr, &raw)
    }

    pub fn read_register(&self, addr: u16) -> Result<u16> {
        let values = self.read_registers(addr, 1)?;
        Ok(values[0])
    }

    pub fn write_register(&self, addr: u16, value: u16) -> Result<()> {
        self.write_registers(addr, &[value])
    }

    /// Write one opaque table row as-is.
    pub fn write_register_block(&self, block: &RegisterBlock) -> Result<()> {
        self.write(RegisterSpace::FpgaRegister, block.addr, block.data)
    }

    /// Write every row of a register table in order.
    pub fn load_table(&self, rows: &[RegisterBlock]) -> Result<()> {
        for row in rows {
            self.write_register_block(row)?;
        }
        debug!(rows = rows.len(), "Register table loaded");
        Ok(())
    }

    /// Raw FPGA signature register (opcode 0x04).
    pub fn fpga_signature(&self) -> Result<u16> {
        let data = self.read_exact("FPGA signature", OP_FPGA_SIGNATURE, 0, 2)?;
        Ok(BigEndian::read_u16(&data))
    }

    /// Fail with `Signature` unless the FPGA answers 0x1234.
    pub fn check_signature(&self) -> Result<()> {
        let got = self.fpga_signature()?;
        if got != FPGA_SIGNATURE {
            return Err(GxsError::Signature {
                expected: FPGA_SIGNATURE,
                got,
            });
        }
        trace!("FPGA signature OK");
        Ok(())
    }

    /// Whether the acquisition pipeline (timing analysis) is running.
    pub fn timing_analysis_running(&self) -> Result<bool> {
        Ok(self.read_register(FPGA_REG_PIPELINE)? != 0)
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub fn read_state(&self) -> Result<DeviceState> {
        let data = self.read_exact("state", OP_STATE, 0, 1)?;
        Ok(DeviceState::from_byte(data[0]))
    }

    pub fn read_error(&self) -> Result<ErrorCode> {
        let data = self.read_exact("error", OP_ERROR, 0, 1)?;
        Ok(ErrorCode(data[0]))
    }

    // ========================================================================
    // Image setup
    // ========================================================================

    /// Set image `(width, height)` (opcode 0x22).
    pub fn set_geometry(&self, width: u16, height: u16) -> Result<()> {
        let mut data = [0u8; 4];
        BigEndian::write_u16(&mut data[..2], width);
        BigEndian::write_u16(&mut data[2..], height);
        self.control_out(OP_GEOMETRY_WRITE, 0, &data)?;
        Ok(())
    }

    /// Image `(width, height)` as the device reports it (opcode 0x23).
    pub fn geometry(&self) -> Result<(u16, u16)> {
        let data = self.read_exact("geometry", OP_GEOMETRY_READ, 0, 4)?;
        Ok((BigEndian::read_u16(&data[..2]), BigEndian::read_u16(&data[2..])))
    }

    /// Write the geometry, activate flash sector 0 and verify the read-back.
    #[instrument(level = "debug", skip(self))]
    pub fn affirm_geometry(&self, width: u16, height: u16) -> Result<()> {
        self.set_geometry(width, height)?;
        self.flash_sector(0)?;
        let got = self.geometry()?;
        if got != (width, height) {
            return Err(GxsError::GeometryMismatch {
                got,
                want: (width, height),
            });
        }
        Ok(())
    }

    pub fn set_integration_time(&self, time: u16) -> Result<()> {
        self.control_out(OP_INTEGRATION_WRITE, 0, &time.to_be_bytes())?;
        debug!(time = %format!("0x{:04X}", time), "Integration time set");
        Ok(())
    }

    pub fn integration_time(&self) -> Result<u16> {
        let data = self.control_in(OP_INTEGRATION_READ, 0, 4)?;
        if data.len() < 2 {
            return Err(GxsError::ShortResponse {
                what: "integration time",
                minimum: 2,
                actual: data.len(),
            });
        }
        Ok(BigEndian::read_u16(&data))
    }

    pub fn set_capture_mode(&self, mode: CaptureMode) -> Result<()> {
        self.control_out(OP_CAPTURE_MODE, mode.as_u16(), &[0x00])?;
        Ok(())
    }

    /// Set the capture mode from a raw value; only 0 and 5 are accepted.
    pub fn set_capture_mode_raw(&self, mode: u16) -> Result<()> {
        self.set_capture_mode(CaptureMode::try_from(mode)?)
    }

    pub fn flash_sector(&self, sector: u16) -> Result<()> {
        self.control_out(OP_FLASH_SECTOR_ACTIVATE, sector, &[])?;
        Ok(())
    }

    /// Erase one flash page.
    pub fn flash_erase(&self, addr: u16) -> Result<()> {
        self.control_out(OP_FLASH_ERASE, addr, &[addr as u8])?;
        Ok(())
    }

    pub fn trigger_params(&self) -> Result<TriggerParams> {
        let data = self.read_exact(
            "trigger parameters",
            OP_TRIGGER_PARAM_READ,
            0,
            TRIGGER_PARAM_LEN,
        )?;
        TriggerParams::from_bytes(&data)
    }

    pub fn set_trigger_params(&self, params: &TriggerParams) -> Result<()> {
        self.control_out(OP_TRIGGER_PARAM_WRITE, 0, &params.to_bytes())?;
        Ok(())
    }

    // ========================================================================
    // Trigger
    // ========================================================================

    /// Allow an exposure to start a capture.
    pub fn arm_trigger(&self) -> Result<()> {
        self.control_out(OP_TRIGGER_ARM, 0, &[0x00])?;
        debug!("Trigger armed");
        Ok(())
    }

    pub fn disarm_trigger(&self) -> Result<()> {
        self.control_out(OP_TRIGGER_DISARM, 0, &[0x00])?;
        debug!("Trigger disarmed");
        Ok(())
    }

    /// Force a capture without x-rays. Takes a few seconds on the device.
    pub fn software_trigger(&self) -> Result<()> {
        self.control_out(OP_SOFTWARE_TRIGGER, 0, &[0x00])?;
        Ok(())
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Image counter block. The device answers with fewer bytes than
    /// requested, so the length is not checked.
    pub fn image_counter(&self, length: usize) -> Result<Vec<u8>> {
        let data = self.control_in(OP_IMAGE_COUNTER_READ, 0, length)?;
        trace!(data = %hex(&data), "Image counter");
        Ok(data)
    }

    pub fn reset_image_counter(&self) -> Result<()> {
        self.control_out(OP_IMAGE_COUNTER_RESET, 0, &[0x00])?;
        Ok(())
    }

    pub fn exposure_counters(&self) -> Result<ExposureCounters> {
        let data = self.image_counter(EXPOSURE_COUNTER_REQUEST)?;
        ExposureCounters::from_bytes(&data)
    }

    pub fn versions(&self) -> Result<Versions> {
        let data = self.control_in(OP_VERSIONS, 0, VERSIONS_REQUEST)?;
        Versions::from_bytes(&data)
    }

    /// Last exposure timestamp stored in EEPROM.
    pub fn exposure_timestamp(&self) -> Result<String> {
        let data = self.eeprom_read(EEPROM_TIMESTAMP_ADDR, EEPROM_TIMESTAMP_LEN)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Store an exposure timestamp; it must be exactly 23 bytes.
    pub fn write_exposure_timestamp(&self, timestamp: &[u8]) -> Result<()> {
        if timestamp.len() != EEPROM_TIMESTAMP_LEN {
            return Err(GxsError::InvalidTimestamp {
                expected: EEPROM_TIMESTAMP_LEN,
                actual: timestamp.len(),
            });
        }
        self.eeprom_write(EEPROM_TIMESTAMP_ADDR, timestamp)
    }

    // ========================================================================
    // Power and reset
    // ========================================================================

    /// Cut FPGA power through the I2C power controller.
    pub fn fpga_off(&self) -> Result<()> {
        self.i2c_write(0x82, &[0x03, 0x00])?;
        self.i2c_write(0x82, &[0x01, 0x0E])
    }

    /// Write FX2 registers. The register address travels in wValue.
    pub fn mcu_write(&self, addr: u16, values: &[u8]) -> Result<()> {
        let space = RegisterSpace::Mcu;
        let mut reg = addr;
        for chunk in values.chunks(space.max_chunk()) {
            let written = self.control_out(reg, 0, chunk)?;
            if written != chunk.len() {
                return Err(GxsError::ShortWrite {
                    space,
                    expected: chunk.len(),
                    actual: written,
                });
            }
            reg = reg.wrapping_add(chunk.len() as u16);
        }
        Ok(())
    }

    /// Hold or release the FX2 in reset (CPUCS).
    pub fn set_mcu_reset(&self, hold: bool) -> Result<()> {
        self.mcu_write(OP_MCU_CPUCS, &[hold as u8])
    }

    /// Reset the MCU: hold in reset, then let it run.
    pub fn mcu_reset(&self) -> Result<()> {
        self.set_mcu_reset(true)?;
        self.set_mcu_reset(false)
    }
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ControlDirection, MockTransport};
    use proptest::prelude::*;

    fn access() -> (RegisterAccess<MockTransport>, MockTransport) {
        let mock = MockTransport::new();
        (RegisterAccess::new(mock.clone()), mock)
    }

    #[test]
    fn test_eeprom_read_is_chunked() {
        let (regs, mock) = access();
        mock.load_memory(RegisterSpace::Eeprom, 0x100, &[0xAA; 0x100]);

        let data = regs.eeprom_read(0x100, 0x100).unwrap();
        assert_eq!(data, vec![0xAA; 0x100]);

        let reads = mock.transfers_with(OP_EEPROM_READ);
        assert_eq!(reads.len(), 2);
        assert_eq!((reads[0].index, reads[0].length), (0x100, 0x80));
        assert_eq!((reads[1].index, reads[1].length), (0x180, 0x80));
    }

    #[test]
    fn test_short_read_is_error() {
        let (regs, mock) = access();
        mock.queue_read(OP_FLASH_READ, &[0u8; 0x100]);
        mock.queue_read(OP_FLASH_READ, &[0u8; 0x10]);

        let err = regs.flash_read(0, 0x200).unwrap_err();
        assert!(matches!(
            err,
            GxsError::ShortRead {
                space: RegisterSpace::Flash,
                expected: 0x100,
                actual: 0x10
            }
        ));
    }

    #[test]
    fn test_short_write_is_error() {
        let (regs, mock) = access();
        mock.inject_short_write(OP_EEPROM_WRITE, 4);
        let err = regs.eeprom_write(0, &[0u8; 8]).unwrap_err();
        assert!(matches!(
            err,
            GxsError::ShortWrite {
                expected: 8,
                actual: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_fpga_registers_big_endian() {
        let (regs, mock) = access();
        regs.write_registers(0x1000, &[0x0102, 0xA0B0]).unwrap();

        let writes = mock.transfers_with(OP_FPGA_WRITE);
        assert_eq!(writes[0].data, vec![0x01, 0x02, 0xA0, 0xB0]);
        assert_eq!(regs.read_registers(0x1000, 2).unwrap(), vec![0x0102, 0xA0B0]);
        assert_eq!(regs.read_register(0x1001).unwrap(), 0xA0B0);
    }

    #[test]
    fn test_fpga_chunks_advance_in_words() {
        let (regs, mock) = access();
        mock.set_fpga_register(0x17FF, 0x1111);
        mock.set_fpga_register(0x1800, 0xBEEF);

        let values = regs.read_registers(0x1000, 0x900).unwrap();
        assert_eq!(values.len(), 0x900);
        assert_eq!(values[0x7FF], 0x1111);
        assert_eq!(values[0x800], 0xBEEF);

        let reads = mock.transfers_with(OP_FPGA_READ);
        assert_eq!(reads.len(), 2);
        assert_eq!((reads[0].index, reads[0].length), (0x1000, 0x1000));
        assert_eq!((reads[1].index, reads[1].length), (0x1800, 0x200));
    }

    #[test]
    fn test_fpga_write_crosses_chunk_limit() {
        let (regs, mock) = access();
        let values: Vec<u16> = (0..0x900).collect();
        regs.write_registers(0x1000, &values).unwrap();

        let writes = mock.transfers_with(OP_FPGA_WRITE);
        assert_eq!(writes.len(), 2);
        assert_eq!((writes[0].index, writes[0].length), (0x1000, 0x1000));
        assert_eq!((writes[1].index, writes[1].length), (0x1800, 0x200));
        assert_eq!(mock.fpga_register(0x1800), Some(0x800));
        assert_eq!(mock.fpga_register(0x18FF), Some(0x8FF));
    }

    #[test]
    fn test_register_read_validates_length() {
        let (regs, mock) = access();
        mock.queue_read(OP_FPGA_READ, &[0x00, 0x01, 0x02]);
        assert!(matches!(
            regs.read_registers(0x2000, 2),
            Err(GxsError::ShortRead { actual: 3, .. })
        ));
    }

    #[test]
    fn test_signature_check() {
        let (regs, mock) = access();
        regs.check_signature().unwrap();

        mock.set_signature(0xDEAD);
        assert!(matches!(
            regs.check_signature(),
            Err(GxsError::Signature {
                expected: 0x1234,
                got: 0xDEAD
            })
        ));
    }

    #[test]
    fn test_geometry_round_trip() {
        let (regs, mock) = access();
        regs.affirm_geometry(FRAME_WIDTH, FRAME_HEIGHT).unwrap();
        assert_eq!(mock.geometry(), (1344, 1850));

        let writes = mock.transfers_with(OP_GEOMETRY_WRITE);
        assert_eq!(writes[0].data, vec![0x05, 0x40, 0x07, 0x3A]);
        assert_eq!(mock.transfers_with(OP_FLASH_SECTOR_ACTIVATE)[0].index, 0);
    }

    #[test]
    fn test_geometry_mismatch() {
        let (regs, mock) = access();
        mock.queue_read(OP_GEOMETRY_READ, &[0x05, 0x40, 0x00, 0x10]);
        assert!(matches!(
            regs.affirm_geometry(FRAME_WIDTH, FRAME_HEIGHT),
            Err(GxsError::GeometryMismatch {
                got: (1344, 16),
                want: (1344, 1850)
            })
        ));
    }

    #[test]
    fn test_capture_mode_in_index() {
        let (regs, mock) = access();
        regs.set_capture_mode(CaptureMode::Mode5).unwrap();
        assert_eq!(mock.capture_mode(), 5);
        assert!(matches!(
            regs.set_capture_mode_raw(2),
            Err(GxsError::InvalidCaptureMode(2))
        ));
        assert_eq!(mock.count(OP_CAPTURE_MODE), 1);
    }

    #[test]
    fn test_integration_time() {
        let (regs, _mock) = access();
        regs.set_integration_time(INTEGRATION_TIME_DEFAULT).unwrap();
        assert_eq!(regs.integration_time().unwrap(), 0x02BC);
    }

    #[test]
    fn test_diagnostic_reads_accept_short_replies() {
        let (regs, mock) = access();
        let ctr = regs.image_counter(IMAGE_COUNTER_REQUEST).unwrap();
        assert_eq!(ctr.len(), 8);
        assert_eq!(regs.versions().unwrap().fpga.to_string(), "0.3.6");

        mock.set_versions(&[0x00; 6]);
        assert!(matches!(
            regs.versions(),
            Err(GxsError::ShortResponse { minimum: 12, .. })
        ));
    }

    #[test]
    fn test_exposure_counters() {
        let (regs, mock) = access();
        mock.set_image_counter(&[0x10, 0x27, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00]);
        let c = regs.exposure_counters().unwrap();
        assert_eq!(c.since_manufacture, 10_000);
        assert_eq!(c.last_calibration, 5);
    }

    #[test]
    fn test_timestamp_round_trip() {
        let (regs, mock) = access();
        let ts = b"2015/03/19-21:44:43:087";
        regs.write_exposure_timestamp(ts).unwrap();
        assert_eq!(mock.memory(RegisterSpace::Eeprom, 0x20, 0x17), ts.to_vec());
        assert_eq!(regs.exposure_timestamp().unwrap(), "2015/03/19-21:44:43:087");

        assert!(matches!(
            regs.write_exposure_timestamp(b"2015/03/19"),
            Err(GxsError::InvalidTimestamp {
                expected: 23,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_trigger_commands_write_one_byte() {
        let (regs, mock) = access();
        regs.arm_trigger().unwrap();
        regs.disarm_trigger().unwrap();
        let log = mock.control_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].value, OP_TRIGGER_ARM);
        assert_eq!(log[1].value, OP_TRIGGER_DISARM);
        assert!(log.iter().all(|r| r.direction == ControlDirection::Out && r.data == [0]));
    }

    #[test]
    fn test_mcu_reset_sequence() {
        let (regs, mock) = access();
        regs.mcu_reset().unwrap();
        let writes = mock.transfers_with(OP_MCU_CPUCS);
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].data, vec![1]);
        assert_eq!(writes[1].data, vec![0]);
    }

    #[test]
    fn test_fpga_off() {
        let (regs, mock) = access();
        regs.fpga_off().unwrap();
        let writes = mock.transfers_with(OP_I2C);
        assert_eq!(writes[0].index, 0x82);
        assert_eq!(writes[0].data, vec![0x03, 0x00]);
        assert_eq!(writes[1].data, vec![0x01, 0x0E]);
    }

    fn byte_space() -> impl Strategy<Value = RegisterSpace> {
        prop_oneof![
            Just(RegisterSpace::Eeprom),
            Just(RegisterSpace::Flash),
            Just(RegisterSpace::I2c),
        ]
    }

    proptest! {
        /// Property: chunks never exceed the space limit and cover the request exactly
        #[test]
        fn prop_read_chunking(
            space in byte_space(),
            addr in 0u16..0x4000,
            length in 0usize..0x600,
        ) {
            let (regs, mock) = access();
            let data = regs.read(space, addr, length).unwrap();
            prop_assert_eq!(data.len(), length);

            let chunks = mock.transfers_with(space.read_opcode());
            prop_assert!(chunks.iter().all(|c| c.length <= space.max_chunk() && c.length > 0));
            prop_assert_eq!(chunks.iter().map(|c| c.length).sum::<usize>(), length);

            let mut next = addr;
            for c in &chunks {
                prop_assert_eq!(c.index, next);
                next = next.wrapping_add(c.length as u16);
            }
        }

        /// Property: written data lands at the requested addresses
        #[test]
        fn prop_write_then_read(
            space in byte_space(),
            addr in 0u16..0x4000,
            data in proptest::collection::vec(any::<u8>(), 0..0x300),
        ) {
            let (regs, mock) = access();
            regs.write(space, addr, &data).unwrap();

            let chunks = mock.transfers_with(space.write_opcode());
            prop_assert!(chunks.iter().all(|c| c.length <= space.max_chunk()));
            prop_assert_eq!(chunks.iter().map(|c| c.length).sum::<usize>(), data.len());
            prop_assert_eq!(regs.read(space, addr, data.len()).unwrap(), data);
        }
    }
}
