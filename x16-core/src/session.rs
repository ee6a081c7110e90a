//! Virtual disk session - dispatches trapped KERNAL calls.
//!
//! The host core calls `DosSession::handle_trap` whenever the program counter
//! hits a trapped address. The session either services the call (registers
//! and memory already hold the result when it returns) or declines it so the
//! ROM routine runs normally.

use std::io::Read;

use crate::bus::X16Bus;
use crate::config::DosConfig;
use crate::dos::transfer::{self, LoadRequest, SaveRequest};
use crate::dos::{DosCommand, DosStatus, FileTable};
use crate::error::{DosError, DosResult};
use crate::fs::{swap_case, HostDirFS, VolumeFS};
use crate::kernal::{flag, KernalTrap, FILENAME_MAX};

/// Whether a trapped call was serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapResult {
    /// Serviced; skip the ROM routine
    Handled,
    /// Not ours; run the ROM routine
    Declined,
}

impl TrapResult {
    pub fn handled(self) -> bool {
        self == TrapResult::Handled
    }
}

/// Virtual disk state for one emulator core.
pub struct DosSession<V: VolumeFS> {
    config: DosConfig,
    volume: V,
    files: FileTable,
    active_input: Option<u8>,
    active_output: Option<u8>,
    last_status: DosStatus,
}

impl DosSession<HostDirFS> {
    /// Session serving the configured host directory.
    pub fn from_config(config: DosConfig) -> DosResult<Self> {
        config.validate()?;
        let volume = HostDirFS::new(config.sdcard_dir.clone());
        Ok(Self::new(config, volume))
    }
}

impl<V: VolumeFS> DosSession<V> {
    pub fn new(config: DosConfig, volume: V) -> Self {
        Self {
            config,
            volume,
            files: FileTable::new(),
            active_input: None,
            active_output: None,
            last_status: DosStatus::ok(),
        }
    }

    /// Return to power-on state: all channels closed, no active channels.
    pub fn reset(&mut self) {
        self.files.close_all();
        self.active_input = None;
        self.active_output = None;
        self.last_status = DosStatus::ok();
    }

    pub fn config(&self) -> &DosConfig {
        &self.config
    }

    pub fn volume(&self) -> &V {
        &self.volume
    }

    pub fn volume_mut(&mut self) -> &mut V {
        &mut self.volume
    }

    pub fn files(&self) -> &FileTable {
        &self.files
    }

    pub fn active_input(&self) -> Option<u8> {
        self.active_input
    }

    pub fn active_output(&self) -> Option<u8> {
        self.active_output
    }

    /// Status of the last disk operation.
    pub fn last_status(&self) -> &DosStatus {
        &self.last_status
    }

    /// Service the KERNAL call at the bus's program counter, if it is one of ours.
    pub fn handle_trap<B: X16Bus + ?Sized>(&mut self, bus: &mut B) -> TrapResult {
        let pc = bus.pc();
        let Some(trap) = self.config.symbols.lookup(pc) else {
            return TrapResult::Declined;
        };

        log::trace!(
            "[KERNAL] {:?} at ${:04X} (A={:#04X}, X={:#04X}, Y={:#04X})",
            trap,
            pc,
            bus.a(),
            bus.x(),
            bus.y()
        );

        self.dispatch(trap, bus)
    }

    fn dispatch<B: X16Bus + ?Sized>(&mut self, trap: KernalTrap, bus: &mut B) -> TrapResult {
        use KernalTrap::*;

        match trap {
            Dos => return self.handle_dos(bus),

            Close => {
                let la = bus.a();
                log::trace!("CLOSE({})", la);
                self.files.close(la);
                if self.active_input == Some(la) {
                    self.active_input = None;
                }
                if self.active_output == Some(la) {
                    self.active_output = None;
                }
            }

            Chkin => {
                let la = bus.x();
                log::trace!("CHKIN({})", la);
                if self.files.get(la).is_open() {
                    self.active_input = Some(la);
                }
            }

            Chkout => {
                let la = bus.x();
                log::trace!("CHKOUT({})", la);
                if self.files.get(la).is_open() {
                    self.active_output = Some(la);
                }
            }

            Chrin => log::trace!("CHRIN()"),

            Chrout => log::trace!("CHROUT()"),

            Clrchn => {
                self.active_input = None;
                self.active_output = None;
            }

            Open => {
                if self.is_our_device(bus) {
                    self.kernal_open(bus);
                    return TrapResult::Handled;
                }
            }

            Load => {
                if self.is_our_device(bus) {
                    self.kernal_load(bus);
                    return TrapResult::Handled;
                }
            }

            Save => {
                if self.is_our_device(bus) {
                    self.kernal_save(bus);
                    return TrapResult::Handled;
                }
            }
        }

        TrapResult::Declined
    }

    fn is_our_device<B: X16Bus + ?Sized>(&self, bus: &B) -> bool {
        bus.read(self.config.symbols.fa) == self.config.device
    }

    // ==================== Guest parameters ====================

    /// Filename set by SETNAM, at most `max` bytes, exactly as the guest stored it.
    fn read_filename<B: X16Bus + ?Sized>(&self, bus: &B, max: usize) -> Vec<u8> {
        let symbols = &self.config.symbols;
        let len = (bus.read(symbols.fnlen) as usize).min(max);
        let ptr = bus.read_u16(symbols.fnadr);
        let name = bus.read_block(ptr, len);
        if self.config.swap_case {
            swap_case(&name)
        } else {
            name
        }
    }

    // ==================== Result reporting ====================

    fn report_success<B: X16Bus + ?Sized>(&mut self, bus: &mut B) {
        bus.set_carry(false);
        bus.write(self.config.symbols.status, 0);
        bus.set_a(0);
        self.last_status = DosStatus::ok();
    }

    fn report_error<B: X16Bus + ?Sized>(&mut self, bus: &mut B, err: &DosError) {
        match err {
            DosError::Io(e) => log::warn!("host I/O failed: {}", e),
            _ => log::debug!("{}", err),
        }
        bus.set_carry(true);
        match err.kernal_code() {
            Some(code) => {
                bus.set_a(code);
                bus.write(self.config.symbols.status, code);
                self.last_status = DosStatus::file_not_found();
            }
            None => bus.set_a(0),
        }
    }

    // ==================== KERNAL calls ====================

    fn kernal_open<B: X16Bus + ?Sized>(&mut self, bus: &mut B) {
        let symbols = &self.config.symbols;
        let la = bus.read(symbols.la);
        let fa = bus.read(symbols.fa);
        let sa = bus.read(symbols.sa);
        let name = self.read_filename(bus, u8::MAX as usize);
        log::trace!("OPEN({}, {}, {}, {})", la, fa, sa, name.escape_ascii());

        match sa {
            15 => self.files.open_command(la),
            1 => self.files.open_write(la),
            _ => match self.read_whole(&name) {
                Ok(data) => self.files.open_read(la, data),
                Err(e) => {
                    self.report_error(bus, &e);
                    return;
                }
            },
        }
        bus.set_carry(false);
    }

    fn read_whole(&self, name: &[u8]) -> DosResult<Vec<u8>> {
        let mut data = Vec::new();
        self.volume.open_read(name)?.read_to_end(&mut data)?;
        Ok(data)
    }

    fn kernal_load<B: X16Bus + ?Sized>(&mut self, bus: &mut B) {
        let req = LoadRequest {
            filename: self.read_filename(bus, FILENAME_MAX),
            override_start: bus.xy(),
            secondary_address: bus.read(self.config.symbols.sa),
            mode: bus.a(),
        };

        match transfer::load(bus, &self.volume, &req, self.config.swap_case) {
            Ok(outcome) => {
                bus.set_xy(outcome.end);
                self.report_success(bus);
            }
            Err(e) => self.report_error(bus, &e),
        }
    }

    fn kernal_save<B: X16Bus + ?Sized>(&mut self, bus: &mut B) {
        // `a` holds the zero page address of the start pointer
        let req = SaveRequest {
            filename: self.read_filename(bus, FILENAME_MAX),
            start: bus.read_u16(bus.a() as u16),
            end: bus.xy(),
        };

        match transfer::save(bus, &mut self.volume, &req) {
            Ok(()) => self.report_success(bus),
            Err(e) => self.report_error(bus, &e),
        }
    }

    fn handle_dos<B: X16Bus + ?Sized>(&mut self, bus: &mut B) -> TrapResult {
        if bus.status() & flag::ZERO != 0 || bus.a() == 0 {
            log::info!("DOS status: {}", self.last_status);
            return TrapResult::Handled;
        }

        let ptr = bus.read_u16(self.config.symbols.index1);
        let raw = bus.read_block(ptr, bus.a() as usize);
        match DosCommand::parse(&raw) {
            DosCommand::ChangeDevice(unit) => {
                log::debug!("DOS device change to {}", unit);
                TrapResult::Declined
            }
            DosCommand::Status => TrapResult::Handled,
            DosCommand::Other(command) => {
                log::info!("DOS({})", command);
                TrapResult::Handled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dos::FileMode;
    use crate::fs::MemoryVolumeFS;
    use crate::headless::HeadlessMachine;
    use crate::kernal::RomSymbols;

    const NAME_BUF: u16 = 0x0400;

    fn session(files: &[(&str, Vec<u8>)]) -> DosSession<MemoryVolumeFS> {
        let config = DosConfig {
            symbols: RomSymbols {
                dos: Some(0xC100),
                ..RomSymbols::default()
            },
            ..DosConfig::default()
        };
        let volume = MemoryVolumeFS::with_files("TEST", files.iter().cloned());
        DosSession::new(config, volume)
    }

    fn call(
        m: &mut HeadlessMachine,
        s: &RomSymbols,
        pc: u16,
        name: impl AsRef<[u8]>,
        la: u8,
        fa: u8,
        sa: u8,
    ) {
        m.setnam(s, NAME_BUF, name.as_ref());
        m.setlfs(s, la, fa, sa);
        m.regs.pc = pc;
    }

    #[test]
    fn test_unknown_pc_declined() {
        let mut s = session(&[]);
        let mut m = HeadlessMachine::new();
        m.regs.pc = 0x0801;
        assert_eq!(s.handle_trap(&mut m), TrapResult::Declined);
    }

    #[test]
    fn test_load_other_device_declined() {
        let mut s = session(&[("A", vec![1, 8, 0xEA])]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        call(&mut m, &sym, sym.load, "A", 1, 9, 1);

        assert_eq!(s.handle_trap(&mut m), TrapResult::Declined);
        assert_eq!(m.read(0x0801), 0);
    }

    #[test]
    fn test_load_success_registers() {
        let mut s = session(&[("A", vec![1, 8, 0xEA, 0xEA])]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        call(&mut m, &sym, sym.load, "A", 1, 8, 1);
        m.regs.status = flag::CARRY;
        m.write(sym.status, 0x40);

        assert!(s.handle_trap(&mut m).handled());
        assert_eq!(m.xy(), 0x0803);
        assert_eq!(m.regs.a, 0);
        assert!(!m.carry());
        assert_eq!(m.read(sym.status), 0);
        assert_eq!(m.peek(0x0801, 2), vec![0xEA, 0xEA]);
    }

    #[test]
    fn test_load_not_found() {
        let mut s = session(&[]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        call(&mut m, &sym, sym.load, "MISSING", 1, 8, 0);
        m.set_xy(0x0801);

        assert!(s.handle_trap(&mut m).handled());
        assert_eq!(m.regs.a, 4);
        assert_eq!(m.read(sym.status), 4);
        assert!(m.carry());
        assert_eq!(m.xy(), 0x0801);
        assert_eq!(s.last_status(), &DosStatus::file_not_found());
    }

    #[test]
    fn test_load_directory() {
        let mut s = session(&[("GAME", vec![0u8; 513])]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        call(&mut m, &sym, sym.load, "$", 1, 8, 0);
        m.set_xy(0x0801);

        assert!(s.handle_trap(&mut m).handled());
        assert!(!m.carry());
        let len = (m.xy() - 0x0801) as usize;
        let lines = crate::dos::parse_listing(&m.peek(0x0801, len));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].number, 3);
        assert_eq!(s.volume().open_count(), 0);
    }

    #[test]
    fn test_load_directory_overflow_sets_carry() {
        let mut s = session(&[("GAME", vec![1])]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        call(&mut m, &sym, sym.load, "$", 1, 8, 0);
        m.set_xy(0x9EFF);

        assert!(s.handle_trap(&mut m).handled());
        assert!(m.carry());
        assert_eq!(m.regs.a, 0);
    }

    #[test]
    fn test_load_filename_truncated_to_40() {
        let long = "X".repeat(50);
        let mut s = session(&[("X".repeat(40).as_str(), vec![1, 8, 7])]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        call(&mut m, &sym, sym.load, &long, 1, 8, 1);

        assert!(s.handle_trap(&mut m).handled());
        assert!(!m.carry());
        assert_eq!(m.read(0x0801), 7);
    }

    #[test]
    fn test_load_swap_case() {
        let mut s = session(&[("hello", vec![1, 8, 9])]);
        s.config.swap_case = true;
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        call(&mut m, &sym, sym.load, "HELLO", 1, 8, 1);

        assert!(s.handle_trap(&mut m).handled());
        assert!(!m.carry());
        assert_eq!(m.read(0x0801), 9);
    }

    #[test]
    fn test_filename_bytes_reach_volume_unchanged() {
        let mut s = session(&[]);
        s.volume_mut().add_file(b"GAME\xC1", vec![0x01, 0x08, 0x2A]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();

        // Shifted-PETSCII bytes match through a wildcard
        call(&mut m, &sym, sym.load, "GAME*", 1, 8, 1);
        assert!(s.handle_trap(&mut m).handled());
        assert!(!m.carry());
        assert_eq!(m.read(0x0801), 0x2A);

        // and are stored as given
        m.poke(0xFB, &[0x01, 0x08]);
        call(&mut m, &sym, sym.save, b"A\xC1", 1, 8, 0);
        m.regs.a = 0xFB;
        m.set_xy(0x0802);
        assert!(s.handle_trap(&mut m).handled());
        assert!(!m.carry());
        assert_eq!(s.volume().file(b"A\xC1"), Some(&[0x01, 0x08, 0x2A][..]));
    }

    #[test]
    fn test_save_success() {
        let mut s = session(&[]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        m.poke(0x1000, &[1, 2, 3, 4]);
        m.poke(0xFB, &[0x00, 0x10]);
        call(&mut m, &sym, sym.save, "OUT", 1, 8, 0);
        m.regs.a = 0xFB;
        m.set_xy(0x1004);

        assert!(s.handle_trap(&mut m).handled());
        assert!(!m.carry());
        assert_eq!(m.regs.a, 0);
        assert_eq!(s.volume().file("OUT"), Some(&[0x00, 0x10, 1, 2, 3, 4][..]));
    }

    #[test]
    fn test_save_inverted_range_only_sets_carry() {
        // Observed behavior: a is zeroed and STATUS is left alone
        let mut s = session(&[]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        m.poke(0xFB, &[0x00, 0x10]);
        m.write(sym.status, 0x40);
        call(&mut m, &sym, sym.save, "OUT", 1, 8, 0);
        m.regs.a = 0xFB;
        m.set_xy(0x0FFF);

        assert!(s.handle_trap(&mut m).handled());
        assert!(m.carry());
        assert_eq!(m.regs.a, 0);
        assert_eq!(m.read(sym.status), 0x40);
        assert!(!s.volume().exists("OUT"));
    }

    #[test]
    fn test_save_write_protected() {
        let mut s = session(&[]);
        s.volume_mut().set_read_only(true);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        call(&mut m, &sym, sym.save, "OUT", 1, 8, 0);
        m.regs.a = 0xFB;

        assert!(s.handle_trap(&mut m).handled());
        assert_eq!(m.regs.a, 4);
        assert_eq!(m.read(sym.status), 4);
        assert!(m.carry());
    }

    #[test]
    fn test_clrchn_resets_and_declines() {
        let mut s = session(&[("DATA", vec![1, 2])]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();

        call(&mut m, &sym, sym.open, "DATA", 2, 8, 2);
        assert!(s.handle_trap(&mut m).handled());
        call(&mut m, &sym, sym.open, "OUT", 3, 8, 1);
        assert!(s.handle_trap(&mut m).handled());

        m.regs.pc = sym.chkin;
        m.regs.x = 2;
        assert_eq!(s.handle_trap(&mut m), TrapResult::Declined);
        m.regs.pc = sym.chkout;
        m.regs.x = 3;
        assert_eq!(s.handle_trap(&mut m), TrapResult::Declined);
        assert_eq!((s.active_input(), s.active_output()), (Some(2), Some(3)));

        m.regs.pc = sym.clrchn;
        assert_eq!(s.handle_trap(&mut m), TrapResult::Declined);
        assert_eq!((s.active_input(), s.active_output()), (None, None));
    }

    #[test]
    fn test_open_and_close_lifecycle() {
        let mut s = session(&[("DATA", vec![1, 2, 3])]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();

        call(&mut m, &sym, sym.open, "DATA", 2, 8, 0);
        assert!(s.handle_trap(&mut m).handled());
        assert_eq!(s.files().get(2).mode(), FileMode::Read);
        assert_eq!(s.files().get(2).data(), Some(&[1u8, 2, 3][..]));

        call(&mut m, &sym, sym.open, "", 15, 8, 15);
        assert!(s.handle_trap(&mut m).handled());
        assert_eq!(s.files().get(15).mode(), FileMode::Command);

        m.regs.pc = sym.close;
        m.regs.a = 2;
        assert_eq!(s.handle_trap(&mut m), TrapResult::Declined);
        assert_eq!(s.files().get(2).mode(), FileMode::Closed);
        assert!(s.files().get(2).data().is_none());

        s.reset();
        assert_eq!(s.files().open_count(), 0);
    }

    #[test]
    fn test_open_missing_file() {
        let mut s = session(&[]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        call(&mut m, &sym, sym.open, "NOPE", 2, 8, 0);

        assert!(s.handle_trap(&mut m).handled());
        assert!(m.carry());
        assert_eq!(m.regs.a, 4);
        assert_eq!(s.files().get(2).mode(), FileMode::Closed);
    }

    #[test]
    fn test_open_other_device_declined() {
        let mut s = session(&[]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        call(&mut m, &sym, sym.open, "X", 4, 4, 0);
        assert_eq!(s.handle_trap(&mut m), TrapResult::Declined);
        assert_eq!(s.files().open_count(), 0);
    }

    #[test]
    fn test_dos_commands() {
        let mut s = session(&[]);
        let sym = s.config().symbols.clone();
        let mut m = HeadlessMachine::new();
        m.regs.pc = 0xC100;

        // Status query
        m.regs.a = 0;
        assert_eq!(s.handle_trap(&mut m), TrapResult::Handled);
        m.regs.a = 3;
        m.regs.status = flag::ZERO;
        assert_eq!(s.handle_trap(&mut m), TrapResult::Handled);
        m.regs.status = 0;

        // Device change
        m.poke(0x0500, b"9");
        m.poke(sym.index1, &[0x00, 0x05]);
        m.regs.a = 1;
        assert_eq!(s.handle_trap(&mut m), TrapResult::Declined);

        // Anything else is passed through
        m.poke(0x0500, b"CD:GAMES");
        m.regs.a = 8;
        assert_eq!(s.handle_trap(&mut m), TrapResult::Handled);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = DosConfig {
            device: 2,
            ..DosConfig::default()
        };
        assert!(DosSession::from_config(config).is_err());
    }
}
