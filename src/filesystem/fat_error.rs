//! Error types for FAT boot sector decoding and address computation.

use thiserror::Error;

use crate::utils::DecodeError;

/// Errors that can occur while decoding a FAT volume's geometry.
#[derive(Error, Debug)]
pub enum FATError {
    /// The boot sector could not be decoded.
    #[error("Boot sector decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// The first data cluster lies beyond the range of a 64-bit LBA.
    #[error(
        "LBA of the first data cluster overflows: start {start_lba} + reserved {reserved} + {fat_count} FAT(s) of {sectors_per_fat} sectors"
    )]
    ArithmeticOverflow {
        start_lba: u64,
        reserved: u16,
        fat_count: u8,
        sectors_per_fat: u16,
    },
}
