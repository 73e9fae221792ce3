//! Protocol constants for the GXS700 sensor family.
//!
//! Derived from USB captures of the vendor capture software.

// ============================================================================
// Device Identification
// ============================================================================

/// Gendex / Dexis vendor ID
pub const GXS_VENDOR_ID: u16 = 0x5328;

/// Dexis Platinum
pub const DEXIS_PLATINUM_PID: u16 = 0x2010;
/// Gendex GXS700, size 1
pub const GENDEX_SMALL_PID: u16 = 0x2020;
/// Gendex GXS700, size 2
pub const GENDEX_LARGE_PID: u16 = 0x2030;

/// All supported PIDs for device discovery
pub const SUPPORTED_PIDS: &[u16] = &[DEXIS_PLATINUM_PID, GENDEX_SMALL_PID, GENDEX_LARGE_PID];

// ============================================================================
// Control Transfers
// ============================================================================

/// Every register access uses this bRequest; the opcode travels in wValue.
pub const VENDOR_REQUEST: u8 = 0xB0;

// Memory spaces (read/write pairs)
pub const OP_EEPROM_READ: u16 = 0x0B;
pub const OP_EEPROM_WRITE: u16 = 0x0C;
pub const OP_FLASH_READ: u16 = 0x10;
pub const OP_FLASH_WRITE: u16 = 0x0F;
pub const OP_FPGA_READ: u16 = 0x03;
pub const OP_FPGA_WRITE: u16 = 0x02;
pub const OP_I2C: u16 = 0x0A;
/// MCU (FX2) CPUCS register, written directly by address
pub const OP_MCU_CPUCS: u16 = 0xE600;

// Single commands
pub const OP_FPGA_SIGNATURE: u16 = 0x04;
pub const OP_FLASH_SECTOR_ACTIVATE: u16 = 0x0E;
pub const OP_FLASH_ERASE: u16 = 0x11;
pub const OP_STATE: u16 = 0x20;
pub const OP_CAPTURE_MODE: u16 = 0x21;
pub const OP_GEOMETRY_WRITE: u16 = 0x22;
pub const OP_GEOMETRY_READ: u16 = 0x23;
pub const OP_TRIGGER_PARAM_WRITE: u16 = 0x24;
pub const OP_TRIGGER_PARAM_READ: u16 = 0x25;
pub const OP_SOFTWARE_TRIGGER: u16 = 0x2B;
pub const OP_INTEGRATION_WRITE: u16 = 0x2C;
pub const OP_INTEGRATION_READ: u16 = 0x2D;
pub const OP_TRIGGER_ARM: u16 = 0x2E;
pub const OP_TRIGGER_DISARM: u16 = 0x2F;
pub const OP_IMAGE_COUNTER_READ: u16 = 0x40;
pub const OP_IMAGE_COUNTER_RESET: u16 = 0x41;
pub const OP_VERSIONS: u16 = 0x51;
pub const OP_ERROR: u16 = 0x80;

// ============================================================================
// Register Space Limits
// ============================================================================

pub const EEPROM_MAX_CHUNK: usize = 0x80;
pub const FLASH_MAX_CHUNK: usize = 0x100;
/// FPGA registers have no cap of their own; one control transfer is the limit.
pub const FPGA_MAX_CHUNK: usize = 0x1000;
pub const I2C_MAX_CHUNK: usize = 0x40;
pub const MCU_MAX_CHUNK: usize = 0x40;

// ============================================================================
// FPGA
// ============================================================================

/// Expected value of the FPGA signature register
pub const FPGA_SIGNATURE: u16 = 0x1234;

/// Acquisition pipeline enable / timing analysis running
pub const FPGA_REG_PIPELINE: u16 = 0x2002;

// ============================================================================
// Frame Geometry
// ============================================================================

pub const FRAME_WIDTH: u16 = 1344;
pub const FRAME_HEIGHT: u16 = 1850;
pub const FRAME_BYTES_PER_PIXEL: usize = 2;

/// Raw frame size in bytes (1344 * 1850 * 2)
pub const FRAME_SZ: usize = FRAME_WIDTH as usize * FRAME_HEIGHT as usize * FRAME_BYTES_PER_PIXEL;

// ============================================================================
// Bulk Transfers
// ============================================================================

/// Frame data IN endpoint
pub const BULK_IN_ENDPOINT: u8 = 0x82;

/// Every bulk request asks for this many bytes; the device ends the stream.
pub const BULK_CHUNK_SIZE: usize = 0x4000;

pub const DEFAULT_TRANSFER_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_PUMP_INTERVAL_MS: u64 = 100;
pub const DEFAULT_CONTROL_TIMEOUT_MS: u64 = 5000;

// ============================================================================
// EEPROM Layout
// ============================================================================

/// Exposure timestamp, "YYYY/MM/DD-HH:MM:SS:mmm"
pub const EEPROM_TIMESTAMP_ADDR: u16 = 0x20;
pub const EEPROM_TIMESTAMP_LEN: usize = 0x17;

// ============================================================================
// Diagnostics
// ============================================================================

/// Requested size of an image counter read; the device answers with 8 bytes.
pub const IMAGE_COUNTER_REQUEST: usize = 0x80;
/// Image counter block holding the exposure counters
pub const EXPOSURE_COUNTER_REQUEST: usize = 0x100;
/// Requested size of a versions read; only the first 12 bytes are meaningful.
pub const VERSIONS_REQUEST: usize = 0x1C;
pub const VERSIONS_LEN: usize = 12;
pub const TRIGGER_PARAM_LEN: usize = 6;

// ============================================================================
// Integration Time
// ============================================================================

/// Integration time programmed during pipeline bring-up
pub const INTEGRATION_TIME_BRINGUP: u16 = 0x0064;
/// Integration time restored before and after every capture
pub const INTEGRATION_TIME_DEFAULT: u16 = 0x02BC;
