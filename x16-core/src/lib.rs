//! Commander X16 Virtual Disk Core
//!
//! This crate lets an X16 emulator serve KERNAL LOAD and SAVE calls from a
//! host directory acting as the SD card:
//! - LOAD of program files into fixed RAM, banked RAM or video RAM
//! - SAVE of a memory range as a program file
//! - `LOAD"$"` directory listings encoded as BASIC program lines
//! - Wildcard filename resolution
//!
//! # Architecture
//!
//! - `X16Bus` trait: registers, memory and video ports of the host core
//! - `VolumeFS` trait: the SD card volume (`HostDirFS`, `MemoryVolumeFS`)
//! - `DosSession`: dispatches trapped KERNAL calls against a volume
//! - `HeadlessMachine`: stand-alone `X16Bus` for tooling and tests

pub mod bus;
pub mod config;
pub mod dos;
pub mod error;
pub mod fs;
pub mod headless;
pub mod kernal;
pub mod session;

pub use bus::X16Bus;
pub use config::DosConfig;
pub use dos::{
    encode_listing, parse_listing, DosCommand, DosStatus, ListingLine, LoadOutcome, LoadRequest,
    LoadTarget, SaveRequest,
};
pub use error::{DosError, DosResult};
pub use fs::{swap_case, DirEntry, HostDirFS, MemoryVolumeFS, VolumeFS};
pub use headless::HeadlessMachine;
pub use kernal::{KernalTrap, RomSymbols};
pub use session::{DosSession, TrapResult};
