//! Machine interface - the CPU core's registers, memory and video port.
//!
//! The CPU core owns all of this state. The virtual disk only sees it through
//! `X16Bus` for the duration of one trap.

use crate::kernal::flag;

/// Access to the emulated machine during a KERNAL trap.
pub trait X16Bus {
    /// Program counter (the trapped address).
    fn pc(&self) -> u16;

    fn a(&self) -> u8;
    fn set_a(&mut self, value: u8);
    fn x(&self) -> u8;
    fn set_x(&mut self, value: u8);
    fn y(&self) -> u8;
    fn set_y(&mut self, value: u8);

    /// Processor status register.
    fn status(&self) -> u8;
    fn set_status(&mut self, value: u8);

    /// Read a byte from the CPU's 64KB view (banked window uses the current bank).
    fn read(&self, addr: u16) -> u8;

    /// Write a byte to the CPU's 64KB view.
    fn write(&mut self, addr: u16, value: u8);

    /// Current RAM bank mapped at `$A000-$BFFF`.
    fn ram_bank(&self) -> u8;

    /// Select the RAM bank. The core may mask the value to its bank count.
    fn set_ram_bank(&mut self, bank: u8);

    /// Write a video controller register.
    fn video_write(&mut self, reg: u8, value: u8);

    /// Little-endian word at `addr`.
    fn read_u16(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    fn write_block(&mut self, addr: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.write(addr.wrapping_add(i as u16), byte);
        }
    }

    fn read_block(&self, addr: u16, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.read(addr.wrapping_add(i as u16)))
            .collect()
    }

    /// `x`/`y` as a little-endian address.
    fn xy(&self) -> u16 {
        u16::from_le_bytes([self.x(), self.y()])
    }

    fn set_xy(&mut self, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.set_x(lo);
        self.set_y(hi);
    }

    fn set_carry(&mut self, on: bool) {
        let status = self.status();
        if on {
            self.set_status(status | flag::CARRY);
        } else {
            self.set_status(status & !flag::CARRY);
        }
    }

    fn carry(&self) -> bool {
        self.status() & flag::CARRY != 0
    }
}
