//! Headless machine - a self-contained `X16Bus` for tests and tooling.
//!
//! Models the parts of a Commander X16 the virtual disk touches: fixed RAM,
//! banked RAM with a bank register, a read-only ROM window and the video
//! controller's address/data ports backed by video RAM.

use crate::bus::X16Bus;
use crate::kernal::{addr, RomSymbols};

/// Size of video RAM.
pub const VRAM_SIZE: usize = 0x20000;

/// Default number of RAM banks (512KB).
pub const DEFAULT_RAM_BANKS: usize = 64;

/// Address increments selected by the high nibble of `ADDR_H`.
const VERA_INCREMENTS: [u32; 16] = [
    0, 1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 40, 80, 160, 320, 640,
];

/// Video controller address/data ports.
#[derive(Clone)]
pub struct VeraPorts {
    addr_l: u8,
    addr_m: u8,
    addr_h: u8,
    vram: Vec<u8>,
}

impl Default for VeraPorts {
    fn default() -> Self {
        Self {
            addr_l: 0,
            addr_m: 0,
            addr_h: 0,
            vram: vec![0; VRAM_SIZE],
        }
    }
}

impl VeraPorts {
    /// Current 17-bit VRAM address.
    pub fn address(&self) -> u32 {
        (((self.addr_h & 0x01) as u32) << 16) | ((self.addr_m as u32) << 8) | self.addr_l as u32
    }

    fn set_address(&mut self, address: u32) {
        self.addr_l = address as u8;
        self.addr_m = (address >> 8) as u8;
        self.addr_h = (self.addr_h & 0xFE) | ((address >> 16) as u8 & 0x01);
    }

    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x03 {
            0 => self.addr_l = value,
            1 => self.addr_m = value,
            2 => self.addr_h = value,
            _ => {
                let address = self.address();
                self.vram[address as usize % VRAM_SIZE] = value;
                let step = VERA_INCREMENTS[(self.addr_h >> 4) as usize];
                self.set_address((address + step) % VRAM_SIZE as u32);
            }
        }
    }

    pub fn vram(&self) -> &[u8] {
        &self.vram
    }
}

/// Registers the virtual disk reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub status: u8,
}

/// Stand-alone Commander X16 memory and register model.
#[derive(Clone)]
pub struct HeadlessMachine {
    pub regs: Registers,
    /// `$0000-$9FFF`; the I/O hole is kept but never written.
    low: Vec<u8>,
    banks: Vec<u8>,
    bank_count: usize,
    ram_bank: u8,
    rom: Vec<u8>,
    vera: VeraPorts,
}

impl Default for HeadlessMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessMachine {
    pub fn new() -> Self {
        Self::with_ram_banks(DEFAULT_RAM_BANKS)
    }

    /// Create with `count` RAM banks (rounded up to a power of two, at most 256).
    pub fn with_ram_banks(count: usize) -> Self {
        let bank_count = count.clamp(1, 256).next_power_of_two();
        Self {
            regs: Registers::default(),
            low: vec![0; addr::BANKED_RAM_START as usize],
            banks: vec![0; bank_count * addr::BANK_SIZE],
            bank_count,
            ram_bank: 0,
            rom: vec![0xFF; 0x10000 - addr::ROM_START as usize],
            vera: VeraPorts::default(),
        }
    }

    pub fn bank_count(&self) -> usize {
        self.bank_count
    }

    /// Contents of one RAM bank.
    pub fn bank(&self, bank: u8) -> &[u8] {
        let start = (bank as usize % self.bank_count) * addr::BANK_SIZE;
        &self.banks[start..start + addr::BANK_SIZE]
    }

    pub fn vera(&self) -> &VeraPorts {
        &self.vera
    }

    /// Store bytes starting at `addr` (convenience for setting up guest state).
    pub fn poke(&mut self, addr: u16, data: &[u8]) {
        self.write_block(addr, data);
    }

    /// Read `len` bytes starting at `addr`.
    pub fn peek(&self, addr: u16, len: usize) -> Vec<u8> {
        self.read_block(addr, len)
    }

    /// Equivalent of KERNAL SETNAM: store `name` at `buffer` and point FNADR/FNLEN at it.
    pub fn setnam(&mut self, symbols: &RomSymbols, buffer: u16, name: &[u8]) {
        let len = name.len().min(u8::MAX as usize);
        self.write_block(buffer, &name[..len]);
        self.write(symbols.fnlen, len as u8);
        self.write_block(symbols.fnadr, &buffer.to_le_bytes());
    }

    /// Equivalent of KERNAL SETLFS.
    pub fn setlfs(&mut self, symbols: &RomSymbols, logical: u8, device: u8, secondary: u8) {
        self.write(symbols.la, logical);
        self.write(symbols.fa, device);
        self.write(symbols.sa, secondary);
    }
}

impl X16Bus for HeadlessMachine {
    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn a(&self) -> u8 {
        self.regs.a
    }

    fn set_a(&mut self, value: u8) {
        self.regs.a = value;
    }

    fn x(&self) -> u8 {
        self.regs.x
    }

    fn set_x(&mut self, value: u8) {
        self.regs.x = value;
    }

    fn y(&self) -> u8 {
        self.regs.y
    }

    fn set_y(&mut self, value: u8) {
        self.regs.y = value;
    }

    fn status(&self) -> u8 {
        self.regs.status
    }

    fn set_status(&mut self, value: u8) {
        self.regs.status = value;
    }

    fn read(&self, address: u16) -> u8 {
        match address {
            0..=0x9FFF => self.low[address as usize],
            0xA000..=0xBFFF => {
                let offset = address as usize - addr::BANKED_RAM_START as usize;
                self.banks[self.ram_bank as usize * addr::BANK_SIZE + offset]
            }
            _ => self.rom[address as usize - addr::ROM_START as usize],
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            _ if address < addr::IO_START => self.low[address as usize] = value,
            0xA000..=0xBFFF => {
                let offset = address as usize - addr::BANKED_RAM_START as usize;
                self.banks[self.ram_bank as usize * addr::BANK_SIZE + offset] = value;
            }
            // I/O and ROM
            _ => {}
        }
    }

    fn ram_bank(&self) -> u8 {
        self.ram_bank
    }

    fn set_ram_bank(&mut self, bank: u8) {
        self.ram_bank = (bank as usize & (self.bank_count - 1)) as u8;
    }

    fn video_write(&mut self, reg: u8, value: u8) {
        self.vera.write(reg, value);
    }
}
