//! FAT volume geometry.
//!
//! This module computes the LBA of the first data cluster of a FAT volume and
//! displays the volume layout: reserved region, FAT copies, data region.

use std::fmt::Write;

use getset::Getters;
use log::debug;

use super::bpb::Bpb;
use super::fat_error::FATError;
use crate::traits::LayoutDisplay;

/// Computes the LBA of the first data cluster of a volume starting at `partition_start_lba`.
///
/// The result is `start + reserved sectors + FAT count * sectors per FAT`, i.e. the first
/// sector after the reserved region and every FAT copy. On FAT12/16 this is where the
/// root directory starts.
///
/// # Errors
/// Returns `FATError::ArithmeticOverflow` if the sum does not fit in 64 bits.
pub fn first_data_cluster_lba(partition_start_lba: u64, bpb: &Bpb) -> Result<u64, FATError> {
    partition_start_lba
        .checked_add(u64::from(*bpb.reserved_sector_count()))
        .and_then(|lba| lba.checked_add(bpb.fat_region_size()))
        .ok_or(FATError::ArithmeticOverflow {
            start_lba: partition_start_lba,
            reserved: *bpb.reserved_sector_count(),
            fat_count: *bpb.fat_count(),
            sectors_per_fat: *bpb.sectors_per_fat(),
        })
}

/// Structure for a FAT volume.
///
/// Essentially, it is the Bpb anchored at the partition's first sector.
#[derive(Debug, Clone, Getters)]
pub struct FatVolume {
    /// LBA of the boot sector
    #[get = "pub"]
    start_lba: u64,
    #[get = "pub"]
    bpb: Bpb,
    /// LBA of the first data cluster
    #[get = "pub"]
    first_data_cluster_lba: u64,
}

impl FatVolume {
    /// Anchors a decoded Bpb at `start_lba` and computes the first data cluster.
    pub fn new(start_lba: u64, bpb: Bpb) -> Result<Self, FATError> {
        let first_data_cluster_lba = first_data_cluster_lba(start_lba, &bpb)?;
        debug!("First data cluster of the volume at LBA {start_lba}: {first_data_cluster_lba}");

        Ok(FatVolume {
            start_lba,
            bpb,
            first_data_cluster_lba,
        })
    }

    /// Decodes the Bpb of the boot sector found at `start_lba` and anchors it there.
    ///
    /// # Errors
    /// - `FATError::Decode` if the boot sector is too short to hold the Bpb fields
    /// - `FATError::ArithmeticOverflow` if the first data cluster is not addressable
    pub fn from_boot_sector(start_lba: u64, boot_sector: &[u8]) -> Result<Self, FATError> {
        let bpb = Bpb::from_bytes(boot_sector)?;
        FatVolume::new(start_lba, bpb)
    }

    fn fat_start(&self) -> u64 {
        self.start_lba + u64::from(*self.bpb.reserved_sector_count())
    }
}

impl LayoutDisplay for FatVolume {
    fn display_layout(&self, indent: u8) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        let indent = " ".repeat(indent.into());

        writeln!(out, "{}┌{:─^55}┐", indent, " FAT Volume Layout ")?;
        writeln!(
            out,
            "{}├{:<45}{:>10}┤",
            indent,
            "Reserved sectors",
            self.bpb.reserved_sector_count()
        )?;
        writeln!(out, "{}├{:<45}{:>10}┤", indent, "FAT count", self.bpb.fat_count())?;
        writeln!(
            out,
            "{}├{:<45}{:>10}┤",
            indent,
            "Sectors per FAT",
            self.bpb.sectors_per_fat()
        )?;
        writeln!(out, "{}├{:─^55}┤", indent, "")?;
        writeln!(
            out,
            "{}├{:^12}┬{:^12}┬{:^12}┬{:^16}┤",
            indent, "Region", "Start", "End", "Description"
        )?;
        writeln!(
            out,
            "{}├{:─<12}┼{:─<12}┼{:─<12}┼{:─<16}┤",
            indent, "", "", "", ""
        )?;
        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent,
            "Reserved",
            self.start_lba,
            self.fat_start(),
            "Boot + Reserved"
        )?;
        let fat_sz = u64::from(*self.bpb.sectors_per_fat());
        for i in 0..u64::from(*self.bpb.fat_count()) {
            let fat_i_start = self.fat_start() + i * fat_sz;
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent,
                format!("FAT #{i}"),
                fat_i_start,
                fat_i_start + fat_sz,
                "FAT Tables"
            )?;
        }
        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent, "Data", self.first_data_cluster_lba, "", "First Cluster"
        )?;
        writeln!(
            out,
            "{}└{:─<12}┴{:─<12}┴{:─<12}┴{:─<16}┘",
            indent, "", "", "", ""
        )?;

        Ok(out)
    }
}
