//! Storage behind the virtual disk.
//!
//! - `VolumeFS`: volume interface (listing, resolve, open, create)
//! - `HostDirFS`: a directory on the host
//! - `MemoryVolumeFS`: in-memory implementation
//! - `pattern`: wildcard resolution and case conversion

mod host_dir;
mod memory_volume;
pub mod pattern;
mod volume;

pub use host_dir::HostDirFS;
pub use memory_volume::MemoryVolumeFS;
pub use pattern::swap_case;
pub use volume::{DirEntry, VolumeFS};
