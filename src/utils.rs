//! Helpers shared by the decoders: checked little-endian field extraction,
//! sector address arithmetic and a hex dump for raw sectors.

use std::fmt::Write;

use thiserror::Error;

use crate::constants::SECTOR_SIZE;

/// Errors raised while extracting fields from a raw buffer.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The field does not fit inside the buffer.
    #[error("Field of {width} byte(s) at offset {offset} is out of range for a {len}-byte buffer")]
    OutOfRangeOffset {
        offset: usize,
        width: usize,
        len: usize,
    },
    /// A fixed-layout record could not be read.
    #[error("Malformed record: {0}")]
    Record(String),
}

impl From<binread::Error> for DecodeError {
    fn from(err: binread::Error) -> Self {
        DecodeError::Record(err.to_string())
    }
}

/// Returns the `N` bytes starting at `offset`, or an error if they do not fit in `buffer`.
fn field<const N: usize>(buffer: &[u8], offset: usize) -> Result<[u8; N], DecodeError> {
    let out_of_range = || DecodeError::OutOfRangeOffset {
        offset,
        width: N,
        len: buffer.len(),
    };

    let end = offset.checked_add(N).ok_or_else(out_of_range)?;
    buffer
        .get(offset..end)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(out_of_range)
}

/// Extracts a 8-bit unsigned integer from a buffer at a given offset.
///
/// # Errors
///
/// Returns `DecodeError::OutOfRangeOffset` if `offset` lies outside the buffer.
pub fn u8_at(buffer: &[u8], offset: usize) -> Result<u8, DecodeError> {
    field::<1>(buffer, offset).map(u8::from_le_bytes)
}

/// Extracts a little-endian 16-bit unsigned integer from a buffer at a given offset.
///
/// # Errors
///
/// Returns `DecodeError::OutOfRangeOffset` if the two bytes do not fit in the buffer.
pub fn u16_at(buffer: &[u8], offset: usize) -> Result<u16, DecodeError> {
    field::<2>(buffer, offset).map(u16::from_le_bytes)
}

/// Extracts a little-endian 32-bit unsigned integer from a buffer at a given offset.
///
/// # Errors
///
/// Returns `DecodeError::OutOfRangeOffset` if the four bytes do not fit in the buffer.
pub fn u32_at(buffer: &[u8], offset: usize) -> Result<u32, DecodeError> {
    field::<4>(buffer, offset).map(u32::from_le_bytes)
}

/// Extracts a little-endian 64-bit unsigned integer from a buffer at a given offset.
///
/// # Errors
///
/// Returns `DecodeError::OutOfRangeOffset` if the eight bytes do not fit in the buffer.
pub fn u64_at(buffer: &[u8], offset: usize) -> Result<u64, DecodeError> {
    field::<8>(buffer, offset).map(u64::from_le_bytes)
}

/// Copies `N` raw bytes out of a buffer at a given offset.
pub fn bytes_at<const N: usize>(buffer: &[u8], offset: usize) -> Result<[u8; N], DecodeError> {
    field::<N>(buffer, offset)
}

/// Converts a sector number into an absolute byte offset, `None` on overflow.
pub fn lba_to_offset(lba: u64) -> Option<u64> {
    lba.checked_mul(SECTOR_SIZE as u64)
}

/// Renders a buffer as rows of 16 hex bytes prefixed by their absolute offset.
///
/// # Parameters
/// - `buffer`: The bytes to render
/// - `base`: The absolute byte offset of `buffer[0]`
pub fn hex_dump(buffer: &[u8], base: u64) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    for (i, chunk) in buffer.chunks(16).enumerate() {
        write!(out, "0x{:08X}  ", base + (i * 16) as u64)?;
        for byte in chunk {
            write!(out, "{byte:02X} ")?;
        }
        write!(out, "{:width$} ", "", width = (16 - chunk.len()) * 3)?;
        for byte in chunk {
            let c = if byte.is_ascii_graphic() { *byte as char } else { '.' };
            out.push(c);
        }
        writeln!(out)?;
    }

    Ok(out)
}
