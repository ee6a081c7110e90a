//! KERNAL trap definitions.
//!
//! This module names the guest routines the virtual disk intercepts and the
//! memory map the transfer engine classifies addresses against.

pub mod symbols;

pub use symbols::RomSymbols;

/// KERNAL routines intercepted by the virtual disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernalTrap {
    /// Open a logical file
    Open,
    /// Close a logical file
    Close,
    /// Set input channel
    Chkin,
    /// Set output channel
    Chkout,
    /// Restore default channels
    Clrchn,
    /// Read a byte from the input channel
    Chrin,
    /// Write a byte to the output channel
    Chrout,
    /// Load a file into memory
    Load,
    /// Save memory to a file
    Save,
    /// BASIC `DOS` command channel
    Dos,
}

/// Default unit number of the virtual disk.
pub const DEFAULT_DEVICE: u8 = 8;

/// Longest filename taken from guest memory.
pub const FILENAME_MAX: usize = 40;

/// Number of logical file slots.
pub const IO_MAX_FILES: usize = 16;

/// Commander X16 memory map.
pub mod addr {
    /// End of fixed RAM (exclusive)
    pub const FIXED_RAM_END: u16 = 0x9F00;
    /// Start of the I/O hole
    pub const IO_START: u16 = 0x9F00;
    /// Start of the banked RAM window
    pub const BANKED_RAM_START: u16 = 0xA000;
    /// End of the banked RAM window (exclusive)
    pub const BANKED_RAM_END: u16 = 0xC000;
    /// Start of ROM
    pub const ROM_START: u16 = 0xC000;
    /// Size of one RAM bank
    pub const BANK_SIZE: usize = 0x2000;
}

/// Processor status bits written by the virtual disk.
pub mod flag {
    /// Carry: set on error
    pub const CARRY: u8 = 0x01;
    /// Zero
    pub const ZERO: u8 = 0x02;
}

/// Video port registers used for VRAM loads.
pub mod vera {
    /// Address bits 0-7
    pub const ADDR_L: u8 = 0;
    /// Address bits 8-15
    pub const ADDR_M: u8 = 1;
    /// Address bank and increment
    pub const ADDR_H: u8 = 2;
    /// Data port
    pub const DATA0: u8 = 3;
    /// Increment-by-one selector in `ADDR_H`
    pub const INCREMENT_1: u8 = 0x10;
}
