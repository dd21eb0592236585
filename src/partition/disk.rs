//! Disk inspection pipeline.
//!
//! Opening a disk reads the GPT header at LBA 1, then the partition entry array.
//! A partition can then be analysed as a FAT volume: its boot sector is read, the
//! Bpb decoded and the first data cluster located. Every step fails fast; nothing
//! is retried and no partial result is kept.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use getset::Getters;
use log::{debug, info, warn};

use super::disk_error::DiskError;
use super::entry::{PartitionEntry, PartitionTable};
use super::gpt::GptHeader;
use crate::constants::{
    GPT_HEADER_LBA, MAX_PART_ARRAY_SIZE, PART_ENTRY_SIZE, PART_TABLE_LBA, SECTOR_SIZE,
};
use crate::device::{self, DeviceError};
use crate::filesystem::fat::FatVolume;
use crate::traits::LayoutDisplay;
use crate::utils::lba_to_offset;

/// How much of the partition entry array is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableScope {
    /// Only LBA 2, decoded as four 128-byte entries.
    SingleSector,
    /// The array described by the header's LBA, entry count and entry size.
    /// Falls back to `SingleSector` when those fields are unusable.
    #[default]
    Header,
}

/// Represents a GPT disk with its header and partition table.
#[derive(Debug, Getters)]
pub struct Disk {
    /// Path of the device or disk image.
    #[get = "pub"]
    path: PathBuf,
    /// The primary GPT header.
    #[get = "pub"]
    header: GptHeader,
    /// The partition entries, unused slots included.
    #[get = "pub"]
    part_table: PartitionTable,
}

impl Disk {
    /// Opens a disk and decodes its GPT header and the whole partition entry array.
    pub fn open(path: &Path) -> Result<Self, DiskError> {
        Self::open_with(path, TableScope::default())
    }

    /// Opens a disk and decodes its GPT header and partition table.
    ///
    /// # Parameters
    /// - `path`: Path to the block device or disk image
    /// - `scope`: How much of the partition entry array to decode
    ///
    /// # Errors
    /// - `DiskError::Device` if a sector cannot be read
    /// - `DiskError::Decode` if a structure does not fit in the bytes read
    pub fn open_with(path: &Path, scope: TableScope) -> Result<Self, DiskError> {
        let sector = device::read_sector(path, GPT_HEADER_LBA)?;
        let header = GptHeader::from_bytes(&sector)?;
        if !header.has_efi_signature() {
            warn!(
                "{}: no EFI PART signature at LBA {GPT_HEADER_LBA}, decoding anyway",
                path.display()
            );
        }

        let part_table = match (scope, entry_array_geometry(&header)) {
            (TableScope::Header, Some((lba, entry_size, entry_count))) => {
                read_entry_array(path, lba, entry_size, entry_count)?
            }
            (TableScope::Header, None) => {
                warn!(
                    "Unusable entry array geometry ({} entries of {} bytes), reading LBA {PART_TABLE_LBA} only",
                    header.entry_count(),
                    header.entry_size()
                );
                read_single_sector_table(path)?
            }
            (TableScope::SingleSector, _) => read_single_sector_table(path)?,
        };

        info!(
            "{}: {} partition(s) in use out of {}",
            path.display(),
            part_table.used_entries().len(),
            part_table.entries().len()
        );

        Ok(Disk {
            path: path.to_path_buf(),
            header,
            part_table,
        })
    }

    /// Returns the partition entry at `index`, 0-based.
    ///
    /// # Errors
    /// - `DiskError::InvalidPartition` if `index` is past the end of the table
    /// - `DiskError::UnusedPartition` if the slot is unused
    pub fn partition(&self, index: usize) -> Result<&PartitionEntry, DiskError> {
        let entries = self.part_table.entries();
        let entry = entries.get(index).ok_or(DiskError::InvalidPartition {
            index,
            count: entries.len(),
        })?;

        if entry.is_unused() {
            return Err(DiskError::UnusedPartition(index));
        }

        Ok(entry)
    }

    /// Analyses the partition at `index`, 0-based, as a FAT volume.
    ///
    /// The boot sector at the partition's first LBA is read and its Bpb decoded to
    /// locate the first data cluster.
    pub fn volume(&self, index: usize) -> Result<FatVolume, DiskError> {
        let start_lba = *self.partition(index)?.start_lba();
        debug!("Reading boot sector of partition #{index} at LBA {start_lba}");

        let boot_sector = device::read_sector(&self.path, start_lba)?;
        Ok(FatVolume::from_boot_sector(start_lba, &boot_sector)?)
    }

    /// Reads the raw sector `lba` of the disk.
    pub fn read_sector(&self, lba: u64) -> Result<Vec<u8>, DiskError> {
        Ok(device::read_sector(&self.path, lba)?)
    }
}

/// Returns the LBA, entry size and entry count of the entry array when the header
/// describes one that can be read, `None` otherwise.
fn entry_array_geometry(header: &GptHeader) -> Option<(u64, usize, usize)> {
    let entry_size = *header.entry_size() as usize;
    let entry_count = *header.entry_count() as usize;
    let array_size = u64::from(*header.entry_size()) * u64::from(*header.entry_count());

    let usable = entry_count > 0
        && entry_size >= PART_ENTRY_SIZE
        && entry_size % PART_ENTRY_SIZE == 0
        && array_size <= MAX_PART_ARRAY_SIZE
        && *header.partition_table_lba() > GPT_HEADER_LBA;

    usable.then_some((*header.partition_table_lba(), entry_size, entry_count))
}

fn read_entry_array(
    path: &Path,
    lba: u64,
    entry_size: usize,
    entry_count: usize,
) -> Result<PartitionTable, DiskError> {
    let offset = lba_to_offset(lba).ok_or(DeviceError::OffsetOverflow(lba))?;
    let sector_cnt = (entry_size * entry_count).div_ceil(SECTOR_SIZE);
    debug!("Reading {entry_count} entries of {entry_size} bytes over {sector_cnt} sector(s) at LBA {lba}");

    let buffer = device::read_at(path, offset, (sector_cnt * SECTOR_SIZE) as u32)?;
    Ok(PartitionTable::from_bytes(&buffer, entry_size, entry_count)?)
}

fn read_single_sector_table(path: &Path) -> Result<PartitionTable, DiskError> {
    let buffer = device::read_sector(path, PART_TABLE_LBA)?;
    Ok(PartitionTable::from_sector(&buffer)?)
}

/// Displays the GPT header followed by the partition table.
impl LayoutDisplay for Disk {
    fn display_layout(&self, indent: u8) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "Disk path: {}", self.path.display())?;
        write!(out, "{}", self.header.display_layout(indent)?)?;
        write!(out, "{}", self.part_table.display_layout(indent)?)?;
        Ok(out)
    }
}
