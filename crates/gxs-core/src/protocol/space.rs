//! Register spaces reachable through vendor control transfers.

use std::fmt;

use super::constants::*;

/// An addressable memory behind the vendor request.
///
/// Each space has its own read/write opcode pair and a maximum number of
/// bytes a single control transfer may move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterSpace {
    /// Configuration EEPROM
    Eeprom,
    /// FPGA configuration flash
    Flash,
    /// 16-bit FPGA registers
    FpgaRegister,
    /// Raw I2C passthrough
    I2c,
    /// FX2 MCU registers
    Mcu,
}

impl RegisterSpace {
    pub const ALL: [RegisterSpace; 5] = [
        RegisterSpace::Eeprom,
        RegisterSpace::Flash,
        RegisterSpace::FpgaRegister,
        RegisterSpace::I2c,
        RegisterSpace::Mcu,
    ];

    /// Opcode (wValue) used to read from this space.
    pub const fn read_opcode(&self) -> u16 {
        match self {
            RegisterSpace::Eeprom => OP_EEPROM_READ,
            RegisterSpace::Flash => OP_FLASH_READ,
            RegisterSpace::FpgaRegister => OP_FPGA_READ,
            RegisterSpace::I2c => OP_I2C,
            RegisterSpace::Mcu => OP_MCU_CPUCS,
        }
    }

    /// Opcode (wValue) used to write to this space.
    pub const fn write_opcode(&self) -> u16 {
        match self {
            RegisterSpace::Eeprom => OP_EEPROM_WRITE,
            RegisterSpace::Flash => OP_FLASH_WRITE,
            RegisterSpace::FpgaRegister => OP_FPGA_WRITE,
            RegisterSpace::I2c => OP_I2C,
            RegisterSpace::Mcu => OP_MCU_CPUCS,
        }
    }

    /// Largest chunk one control transfer may carry.
    pub const fn max_chunk(&self) -> usize {
        match self {
            RegisterSpace::Eeprom => EEPROM_MAX_CHUNK,
            RegisterSpace::Flash => FLASH_MAX_CHUNK,
            RegisterSpace::FpgaRegister => FPGA_MAX_CHUNK,
            RegisterSpace::I2c => I2C_MAX_CHUNK,
            RegisterSpace::Mcu => MCU_MAX_CHUNK,
        }
    }

    /// Address increment covering `bytes` bytes. FPGA registers are
    /// addressed in 16-bit words, everything else in bytes.
    pub const fn address_step(&self, bytes: usize) -> u16 {
        match self {
            RegisterSpace::FpgaRegister => (bytes / 2) as u16,
            _ => bytes as u16,
        }
    }

    /// Look up the space whose write opcode is `op`.
    pub fn from_write_opcode(op: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.write_opcode() == op)
    }

    /// Look up the space whose read opcode is `op`.
    pub fn from_read_opcode(op: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.read_opcode() == op)
    }
}

impl fmt::Display for RegisterSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterSpace::Eeprom => write!(f, "EEPROM"),
            RegisterSpace::Flash => write!(f, "flash"),
            RegisterSpace::FpgaRegister => write!(f, "FPGA registers"),
            RegisterSpace::I2c => write!(f, "I2C"),
            RegisterSpace::Mcu => write!(f, "MCU"),
        }
    }
}
