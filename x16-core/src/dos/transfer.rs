//! LOAD and SAVE between a volume and guest memory.
//!
//! Files use the PRG layout: a 2-byte little-endian load address followed by
//! the payload. Where a LOAD lands is decided by the destination address:
//!
//! - `$0000-$9EFF`: fixed RAM, copied up to the I/O hole
//! - `$9F00-$9FFF`: I/O, nothing stored
//! - `$A000-$BFFF`: banked RAM, continuing into the next bank at `$A000`
//!   until the file runs out
//! - `$C000-$FFFF`: ROM, nothing stored
//!
//! A LOAD with `a > 1` streams into video RAM through the data port instead.

use std::io::{self, Read, Write};

use super::listing::encode_listing;
use super::writer::BoundedWriter;
use crate::bus::X16Bus;
use crate::error::{DosError, DosResult};
use crate::fs::VolumeFS;
use crate::kernal::{addr, vera};

/// Chunk size for video RAM streaming.
const VRAM_CHUNK: usize = 2048;

/// Filename that selects the directory listing.
pub const DIRECTORY_NAME: &[u8] = b"$";

/// One LOAD call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Raw guest filename bytes
    pub filename: Vec<u8>,
    /// Destination used when the secondary address is 0 (from `x`/`y`)
    pub override_start: u16,
    /// 0 = load at `override_start`, otherwise at the file's own address
    pub secondary_address: u8,
    /// `a` on entry: 0 = load, 1 = verify, 2+ = video RAM bank `(a - 2) & 0xF`
    pub mode: u8,
}

/// One SAVE call, covering `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub filename: Vec<u8>,
    pub start: u16,
    pub end: u16,
}

/// Where a LOAD stores its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    /// Directory listing written to fixed RAM
    Directory,
    FixedRam,
    IoHole,
    BankedRam,
    Rom,
    VideoRam { bank: u8 },
}

impl LoadTarget {
    /// Classify a file LOAD by destination address and the `a` register.
    pub fn classify(start: u16, mode: u8) -> Self {
        if mode > 1 {
            return LoadTarget::VideoRam {
                bank: (mode - 2) & 0x0F,
            };
        }
        match start {
            s if s < addr::FIXED_RAM_END => LoadTarget::FixedRam,
            s if (addr::IO_START..addr::BANKED_RAM_START).contains(&s) => LoadTarget::IoHole,
            s if s < addr::BANKED_RAM_END => LoadTarget::BankedRam,
            _ => LoadTarget::Rom,
        }
    }
}

/// Result of a successful LOAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub target: LoadTarget,
    /// Destination of the first byte
    pub start: u16,
    /// Address after the last byte (in the final bank for banked loads)
    pub end: u16,
    /// RAM bank selected when the load finished
    pub bank: u8,
}

/// Read up to `len` bytes. Fewer means the file ended.
fn read_chunk<R: Read + ?Sized>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut chunk = Vec::with_capacity(len);
    reader.take(len as u64).read_to_end(&mut chunk)?;
    Ok(chunk)
}

/// Perform a LOAD. `swap_case` applies to the directory listing.
pub fn load<B, V>(bus: &mut B, vol: &V, req: &LoadRequest, swap_case: bool) -> DosResult<LoadOutcome>
where
    B: X16Bus + ?Sized,
    V: VolumeFS + ?Sized,
{
    if req.filename == DIRECTORY_NAME {
        return load_directory(bus, vol, req.override_start, swap_case);
    }

    let mut file = vol.open_read(&req.filename)?;

    // A file shorter than its header reads the missing bytes as zero
    let mut header = [0u8; 2];
    let got = read_chunk(&mut file, 2)?;
    header[..got.len()].copy_from_slice(&got);
    let embedded = u16::from_le_bytes(header);

    let start = if req.secondary_address == 0 {
        req.override_start
    } else {
        embedded
    };
    let target = LoadTarget::classify(start, req.mode);

    let (segment_start, transferred) = match target {
        LoadTarget::VideoRam { bank } => {
            let [lo, hi] = start.to_le_bytes();
            bus.video_write(vera::ADDR_L, lo);
            bus.video_write(vera::ADDR_M, hi);
            bus.video_write(vera::ADDR_H, bank | vera::INCREMENT_1);
            let mut total = 0usize;
            loop {
                let chunk = read_chunk(&mut file, VRAM_CHUNK)?;
                if chunk.is_empty() {
                    break;
                }
                for &byte in &chunk {
                    bus.video_write(vera::DATA0, byte);
                }
                total += chunk.len();
            }
            (start, total)
        }
        LoadTarget::FixedRam => {
            let chunk = read_chunk(&mut file, (addr::FIXED_RAM_END - start) as usize)?;
            bus.write_block(start, &chunk);
            (start, chunk.len())
        }
        LoadTarget::BankedRam => {
            let mut segment = start;
            loop {
                let want = (addr::BANKED_RAM_END - segment) as usize;
                let chunk = read_chunk(&mut file, want)?;
                bus.write_block(segment, &chunk);
                if chunk.len() < want {
                    break (segment, chunk.len());
                }
                segment = addr::BANKED_RAM_START;
                let next = bus.ram_bank().wrapping_add(1);
                bus.set_ram_bank(next);
            }
        }
        LoadTarget::IoHole | LoadTarget::Rom | LoadTarget::Directory => (start, 0),
    };

    let end = segment_start.wrapping_add(transferred as u16);
    log::debug!(
        "LOAD \"{}\" -> {:?} ${:04X}-${:04X}",
        req.filename.escape_ascii(),
        target,
        start,
        end
    );
    Ok(LoadOutcome {
        target,
        start,
        end,
        bank: bus.ram_bank(),
    })
}

/// LOAD"$": encode the directory into fixed RAM at `start`.
///
/// The listing must fit below the I/O hole; nothing is written otherwise.
fn load_directory<B, V>(bus: &mut B, vol: &V, start: u16, swap_case: bool) -> DosResult<LoadOutcome>
where
    B: X16Bus + ?Sized,
    V: VolumeFS + ?Sized,
{
    let capacity = (addr::FIXED_RAM_END as usize).saturating_sub(start as usize);
    let mut scratch = vec![0u8; capacity];
    let mut out = BoundedWriter::new(&mut scratch);
    let len = encode_listing(vol, swap_case, &mut out)?;
    bus.write_block(start, out.written());

    let end = start.wrapping_add(len as u16);
    log::debug!("LOAD \"$\" -> ${:04X}-${:04X}", start, end);
    Ok(LoadOutcome {
        target: LoadTarget::Directory,
        start,
        end,
        bank: bus.ram_bank(),
    })
}

/// Perform a SAVE.
///
/// An empty range (`end == start`) writes just the header. `end < start`
/// fails before the file is created.
pub fn save<B, V>(bus: &B, vol: &mut V, req: &SaveRequest) -> DosResult<()>
where
    B: X16Bus + ?Sized,
    V: VolumeFS + ?Sized,
{
    if req.end < req.start {
        return Err(DosError::InvalidRange {
            start: req.start,
            end: req.end,
        });
    }

    let data = bus.read_block(req.start, (req.end - req.start) as usize);
    let mut file = vol.create(&req.filename)?;
    file.write_all(&req.start.to_le_bytes())?;
    file.write_all(&data)?;
    file.flush()?;

    log::debug!(
        "SAVE \"{}\" ${:04X}-${:04X}",
        req.filename.escape_ascii(),
        req.start,
        req.end
    );
    Ok(())
}
