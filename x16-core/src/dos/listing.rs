//! Directory listing encoder.
//!
//! LOAD"$" returns the disk directory as a tokenless BASIC program so the
//! guest can `LIST` it. The bytes are injected straight into RAM, so there is
//! no load address in front.
//!
//! Layout:
//! - Header line: link `01 01`, line 0, reverse-on, `"<disk name>" 00 PC`
//! - One line per entry: line number = size in 256-byte blocks, the name in
//!   quotes padded to 16 columns, then `PRG`
//! - Trailer: line 65535 `BLOCKS FREE.` followed by the end-of-program link

use super::writer::BoundedWriter;
use crate::error::DosResult;
use crate::fs::{swap_case, VolumeFS};

/// Width of the name field.
pub const NAME_WIDTH: usize = 16;

/// Placeholder line link; BASIC relinks after loading.
const LINK: u16 = 0x0101;

const REVERSE_ON: u8 = 0x12;
const QUOTE: u8 = b'"';

/// Size in 256-byte blocks, clamped to 65535.
pub fn block_count(size: u64) -> u16 {
    size.div_ceil(256).min(0xFFFF) as u16
}

/// Encode the directory of `vol` into `out`, returning the number of bytes.
///
/// A volume that cannot be enumerated produces an empty listing.
pub fn encode_listing<V: VolumeFS + ?Sized>(
    vol: &V,
    swap: bool,
    out: &mut BoundedWriter<'_>,
) -> DosResult<usize> {
    let entries = match vol.entries() {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("directory listing failed: {}", e);
            return Ok(0);
        }
    };
    let convert = |name: Vec<u8>| if swap { swap_case(&name) } else { name };
    let start = out.position();

    // Header
    out.put_u16(LINK)?;
    out.put_u16(0)?;
    out.put(REVERSE_ON)?;
    out.put(QUOTE)?;
    let mut disk_name = [b' '; NAME_WIDTH];
    let volume = convert(vol.volume_name());
    for (dst, &src) in disk_name.iter_mut().zip(&volume) {
        *dst = src;
    }
    out.put_slice(&disk_name)?;
    out.put(QUOTE)?;
    out.put_slice(b" 00 PC")?;
    out.put(0)?;

    for entry in entries {
        let blocks = block_count(entry.size);
        out.put_u16(LINK)?;
        out.put_u16(blocks)?;
        if blocks < 1000 {
            out.put(b' ')?;
            if blocks < 100 {
                out.put(b' ')?;
                if blocks < 10 {
                    out.put(b' ')?;
                }
            }
        }
        let name = convert(entry.name);
        let name = &name[..name.len().min(NAME_WIDTH)];
        out.put(QUOTE)?;
        out.put_slice(name)?;
        out.put(QUOTE)?;
        out.fill(b' ', NAME_WIDTH - name.len())?;
        out.put_slice(b" PRG")?;
        out.put(0)?;
    }

    // Trailer
    out.put_u16(LINK)?;
    out.put_u16(0xFFFF)?;
    out.put_slice(b"BLOCKS FREE.")?;
    out.put(0)?;
    out.put_u16(0)?;

    Ok(out.position() - start)
}

/// One line of an encoded listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine {
    /// Line number (block count)
    pub number: u16,
    /// Line text, without the terminating zero
    pub text: Vec<u8>,
}

/// Split an encoded listing back into lines. Stops at the zero link.
pub fn parse_listing(data: &[u8]) -> Vec<ListingLine> {
    let mut lines = Vec::new();
    let mut pos = 0;
    while pos + 4 <= data.len() {
        let link = u16::from_le_bytes([data[pos], data[pos + 1]]);
        if link == 0 {
            break;
        }
        let number = u16::from_le_bytes([data[pos + 2], data[pos + 3]]);
        pos += 4;
        let len = data[pos..].iter().position(|&b| b == 0).unwrap_or(data.len() - pos);
        lines.push(ListingLine {
            number,
            text: data[pos..pos + len].to_vec(),
        });
        pos += len + 1;
    }
    lines
}
