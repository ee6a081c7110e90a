//! ROM symbol table.
//!
//! Trap entry points and KERNAL variable locations differ between ROM
//! releases, so they are data rather than constants. The defaults use the
//! KERNAL jump table and the C64-compatible zero page layout.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::KernalTrap;
use crate::error::{DosError, DosResult};

/// Trap addresses and KERNAL variable locations for one ROM build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RomSymbols {
    pub open: u16,
    pub close: u16,
    pub chkin: u16,
    pub chkout: u16,
    pub clrchn: u16,
    pub chrin: u16,
    pub chrout: u16,
    pub load: u16,
    pub save: u16,
    /// BASIC `DOS` handler. No fixed vector exists, so it is off unless set.
    pub dos: Option<u16>,

    /// I/O status byte
    pub status: u16,
    /// Filename length
    pub fnlen: u16,
    /// Logical file number
    pub la: u16,
    /// Secondary address
    pub sa: u16,
    /// Device number
    pub fa: u16,
    /// Filename pointer (2 bytes)
    pub fnadr: u16,
    /// BASIC string pointer used by `DOS` (2 bytes)
    pub index1: u16,
}

impl Default for RomSymbols {
    fn default() -> Self {
        Self {
            open: 0xFFC0,
            close: 0xFFC3,
            chkin: 0xFFC6,
            chkout: 0xFFC9,
            clrchn: 0xFFCC,
            chrin: 0xFFCF,
            chrout: 0xFFD2,
            load: 0xFFD5,
            save: 0xFFD8,
            dos: None,
            status: 0x90,
            fnlen: 0xB7,
            la: 0xB8,
            sa: 0xB9,
            fa: 0xBA,
            fnadr: 0xBB,
            index1: 0x22,
        }
    }
}

impl RomSymbols {
    /// All trap entry points, paired with the routine they stand for.
    pub fn traps(&self) -> impl Iterator<Item = (u16, KernalTrap)> {
        [
            (Some(self.open), KernalTrap::Open),
            (Some(self.close), KernalTrap::Close),
            (Some(self.chkin), KernalTrap::Chkin),
            (Some(self.chkout), KernalTrap::Chkout),
            (Some(self.clrchn), KernalTrap::Clrchn),
            (Some(self.chrin), KernalTrap::Chrin),
            (Some(self.chrout), KernalTrap::Chrout),
            (Some(self.load), KernalTrap::Load),
            (Some(self.save), KernalTrap::Save),
            (self.dos, KernalTrap::Dos),
        ]
        .into_iter()
        .filter_map(|(pc, trap)| pc.map(|pc| (pc, trap)))
    }

    /// Map a program counter value to the routine trapped there.
    pub fn lookup(&self, pc: u16) -> Option<KernalTrap> {
        self.traps()
            .find(|&(addr, _)| addr == pc)
            .map(|(_, trap)| trap)
    }

    /// Reject tables where two routines share an entry point.
    pub fn validate(&self) -> DosResult<()> {
        let mut seen = HashSet::new();
        for (pc, trap) in self.traps() {
            if !seen.insert(pc) {
                return Err(DosError::InvalidConfig(format!(
                    "trap address ${:04X} for {:?} is already in use",
                    pc, trap
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lookup() {
        let symbols = RomSymbols::default();
        assert_eq!(symbols.lookup(0xFFD5), Some(KernalTrap::Load));
        assert_eq!(symbols.lookup(0xFFD8), Some(KernalTrap::Save));
        assert_eq!(symbols.lookup(0xFFCC), Some(KernalTrap::Clrchn));
        assert_eq!(symbols.lookup(0x0801), None);
    }

    #[test]
    fn test_dos_trap_disabled_by_default() {
        let symbols = RomSymbols::default();
        assert!(symbols.traps().all(|(_, t)| t != KernalTrap::Dos));

        let symbols = RomSymbols {
            dos: Some(0xC000),
            ..RomSymbols::default()
        };
        assert_eq!(symbols.lookup(0xC000), Some(KernalTrap::Dos));
    }

    #[test]
    fn test_validate_duplicates() {
        assert!(RomSymbols::default().validate().is_ok());

        let symbols = RomSymbols {
            save: 0xFFD5,
            ..RomSymbols::default()
        };
        assert!(matches!(symbols.validate(), Err(DosError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json() {
        let symbols: RomSymbols = serde_json::from_str(r#"{"load": 49152, "fa": 700}"#).unwrap();
        assert_eq!(symbols.load, 0xC000);
        assert_eq!(symbols.fa, 700);
        assert_eq!(symbols.save, 0xFFD8);
    }
}
