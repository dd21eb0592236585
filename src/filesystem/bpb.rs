//! FAT Bpb structure.
//!
//! Only the legacy BPB fields locating the FAT region are decoded. The layout is
//! assumed unconditionally: there is no FAT12/16/32 detection, and FAT32's 32-bit
//! FAT size field is not read.
//!
//! Field offsets are relative to the BPB at boot-sector byte 11: reserved sector
//! count at +0, FAT count at +2, sectors per FAT at +9.

use std::fmt;

use getset::Getters;
use log::trace;

use crate::constants::BPB_OFFSET;
use crate::utils::{self, DecodeError};

/// Offsets of the decoded fields, relative to the start of the BPB.
const RSVD_SEC_CNT: usize = 0;
const NUM_FAT: usize = 2;
const FAT_SZ_16: usize = 9;

/// BIOS Parameter Block fields needed to locate the data region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct Bpb {
    /// Number of reserved sectors from start of volume
    #[get = "pub"]
    reserved_sector_count: u16,
    /// Number of FAT copies
    #[get = "pub"]
    fat_count: u8,
    /// Sectors per FAT, legacy 16-bit field
    #[get = "pub"]
    sectors_per_fat: u16,
}

impl Bpb {
    /// Builds a Bpb from already known values.
    pub fn new(reserved_sector_count: u16, fat_count: u8, sectors_per_fat: u16) -> Self {
        Bpb {
            reserved_sector_count,
            fat_count,
            sectors_per_fat,
        }
    }

    /// Decodes the Bpb from the raw bytes of a boot sector.
    ///
    /// # Errors
    /// Returns `DecodeError::OutOfRangeOffset` if the buffer is too small to hold the fields.
    pub fn from_bytes(boot_sector: &[u8]) -> Result<Self, DecodeError> {
        let bpb = Bpb {
            reserved_sector_count: utils::u16_at(boot_sector, BPB_OFFSET + RSVD_SEC_CNT)?,
            fat_count: utils::u8_at(boot_sector, BPB_OFFSET + NUM_FAT)?,
            sectors_per_fat: utils::u16_at(boot_sector, BPB_OFFSET + FAT_SZ_16)?,
        };

        trace!("Decoded {bpb}");
        Ok(bpb)
    }

    /// Returns the number of sectors taken by all FAT copies.
    pub fn fat_region_size(&self) -> u64 {
        u64::from(self.fat_count) * u64::from(self.sectors_per_fat)
    }
}

impl fmt::Display for Bpb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BPB: rsvd_sec_cnt={} num_fat={} fat_sz_16={}",
            self.reserved_sector_count, self.fat_count, self.sectors_per_fat
        )
    }
}
