//! GPT partition entries and the partition entry array.
//!
//! Each record is 128 bytes in the standard layout. Larger entry sizes announced by
//! the header only append vendor data after those 128 bytes, which is skipped.

use std::fmt::Write;
use std::io;

use binread::{BinRead, BinReaderExt};
use getset::Getters;
use log::trace;

use super::guid::Guid;
use crate::constants::{GIB, PART_ENTRY_SIZE, SECTOR_PART_CNT, SECTOR_SIZE};
use crate::traits::LayoutDisplay;
use crate::utils::DecodeError;

/// Number of UTF-16 code units in a partition name.
const NAME_LEN: usize = 36;

/// A single GPT partition entry.
#[derive(BinRead, Debug, Clone, Getters)]
#[br(little)]
pub struct PartitionEntry {
    /// Partition type, all zero for an unused slot
    #[br(map = |bytes: [u8; 16]| Guid(bytes))]
    #[get = "pub"]
    type_guid: Guid,
    /// Identifier of this partition
    #[br(map = |bytes: [u8; 16]| Guid(bytes))]
    #[get = "pub"]
    unique_guid: Guid,
    /// First LBA of the partition
    #[get = "pub"]
    start_lba: u64,
    /// Last LBA of the partition, inclusive
    #[get = "pub"]
    end_lba: u64,
    /// Attribute flags
    #[get = "pub"]
    attributes: u64,
    /// Partition name in UTF-16LE
    #[br(count = NAME_LEN)]
    raw_name: Vec<u16>,
}

impl PartitionEntry {
    /// Decodes one partition entry from the first 128 bytes of `buffer`.
    ///
    /// # Errors
    /// Returns `DecodeError::OutOfRangeOffset` if `buffer` holds less than 128 bytes.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, DecodeError> {
        let record = buffer
            .get(..PART_ENTRY_SIZE)
            .ok_or(DecodeError::OutOfRangeOffset {
                offset: 0,
                width: PART_ENTRY_SIZE,
                len: buffer.len(),
            })?;

        let mut reader = io::Cursor::new(record);
        Ok(reader.read_le()?)
    }

    /// Returns whether the slot is unused, i.e. the entry is entirely zero.
    pub fn is_unused(&self) -> bool {
        self.type_guid.is_zero()
            && self.unique_guid.is_zero()
            && self.start_lba == 0
            && self.end_lba == 0
            && self.attributes == 0
            && self.raw_name.iter().all(|c| *c == 0)
    }

    /// Returns `end_lba - start_lba`, or 0 if the end lies before the start.
    ///
    /// The last LBA is inclusive so the partition really spans one more sector,
    /// see [`PartitionEntry::len_sectors`].
    pub fn sector_count(&self) -> u64 {
        self.end_lba.saturating_sub(self.start_lba)
    }

    /// Returns the number of sectors covered by the partition, both bounds included.
    pub fn len_sectors(&self) -> u64 {
        match self.end_lba.checked_sub(self.start_lba) {
            Some(diff) => diff.saturating_add(1),
            None => 0,
        }
    }

    /// Returns the size in binary gigabytes derived from [`PartitionEntry::sector_count`].
    pub fn size_in_gb(&self) -> f64 {
        self.sector_count() as f64 * SECTOR_SIZE as f64 / GIB
    }

    /// Returns the partition name, up to the first NUL.
    pub fn name(&self) -> String {
        let len = self
            .raw_name
            .iter()
            .position(|c| *c == 0)
            .unwrap_or(self.raw_name.len());
        String::from_utf16_lossy(&self.raw_name[..len])
    }
}

/// The partition entry array, in on-disk order.
///
/// Unused slots are kept so that indexes match the on-disk positions.
#[derive(Debug, Clone, Getters)]
pub struct PartitionTable {
    #[get = "pub"]
    entries: Vec<PartitionEntry>,
}

impl PartitionTable {
    /// Decodes the four 128-byte entries held by a single 512-byte sector.
    pub fn from_sector(buffer: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes(buffer, PART_ENTRY_SIZE, SECTOR_PART_CNT)
    }

    /// Decodes `entry_count` entries laid out every `entry_size` bytes.
    ///
    /// # Parameters
    /// - `buffer`: Raw bytes of the entry array
    /// - `entry_size`: Stride between two records, at least 128
    /// - `entry_count`: Number of records to decode
    ///
    /// # Errors
    /// - `DecodeError::Record` if `entry_size` is smaller than 128
    /// - `DecodeError::OutOfRangeOffset` if the records do not all fit in `buffer`.
    ///   Nothing is decoded nor allocated in that case.
    pub fn from_bytes(
        buffer: &[u8],
        entry_size: usize,
        entry_count: usize,
    ) -> Result<Self, DecodeError> {
        if entry_size < PART_ENTRY_SIZE {
            return Err(DecodeError::Record(format!(
                "Partition entries of {entry_size} bytes are smaller than {PART_ENTRY_SIZE} bytes"
            )));
        }

        // The last record only needs its first 128 bytes.
        let needed = entry_count
            .checked_sub(1)
            .map(|last| {
                last.checked_mul(entry_size)
                    .and_then(|offset| offset.checked_add(PART_ENTRY_SIZE))
            })
            .unwrap_or(Some(0));
        match needed {
            Some(needed) if needed <= buffer.len() => {}
            _ => {
                return Err(DecodeError::OutOfRangeOffset {
                    offset: buffer.len(),
                    width: PART_ENTRY_SIZE,
                    len: buffer.len(),
                });
            }
        }

        let entries = buffer
            .chunks(entry_size)
            .take(entry_count)
            .map(PartitionEntry::from_bytes)
            .collect::<Result<Vec<_>, _>>()?;

        trace!("Decoded {} partition entries", entries.len());
        Ok(PartitionTable { entries })
    }

    /// Returns the entries in use along with their index in the array.
    pub fn used_entries(&self) -> Vec<(usize, &PartitionEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_unused())
            .collect()
    }
}

impl LayoutDisplay for PartitionTable {
    fn display_layout(&self, indent: u8) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        let indent = " ".repeat(indent.into());

        writeln!(out, "{}┌{:─^88}┐", indent, " Partition Table ")?;
        writeln!(
            out,
            "{}├{:^7}┬{:^14}┬{:^14}┬{:^14}┬{:^11}┬{:^23}┤",
            indent, "Part", "LBA Start", "LBA End", "Sector Count", "Size (GB)", "Type / Name"
        )?;
        writeln!(
            out,
            "{}├{:─<7}┼{:─<14}┼{:─<14}┼{:─<14}┼{:─<11}┼{:─<23}┤",
            indent, "", "", "", "", "", ""
        )?;

        for (i, entry) in self.used_entries() {
            let kind = match entry.type_guid().type_name() {
                Some(name) => name.to_string(),
                None => entry.type_guid().to_string()[..8].to_string(),
            };
            let mut label = format!("{kind} {}", entry.name());
            if label.chars().count() > 23 {
                label = label.chars().take(22).collect::<String>() + "…";
            }

            writeln!(
                out,
                "{}│{:^7}│{:>14}│{:>14}│{:>14}│{:>11.3}│{:<23}│",
                indent,
                format!("#{}", i + 1),
                entry.start_lba(),
                entry.end_lba(),
                entry.sector_count(),
                entry.size_in_gb(),
                label
            )?;
        }

        writeln!(
            out,
            "{}└{:─<7}┴{:─<14}┴{:─<14}┴{:─<14}┴{:─<11}┴{:─<23}┘",
            indent, "", "", "", "", "", ""
        )?;

        Ok(out)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::utils::tests::XorShift;

    const BASIC_DATA: [u8; 16] = [
        0xA2, 0xA0, 0xD0, 0xEB, 0xE5, 0xB9, 0x33, 0x44, 0x87, 0xC0, 0x68, 0xB6, 0xB7, 0x26, 0x99,
        0xC7,
    ];

    /// Builds a 128-byte partition record.
    pub(crate) fn record(start: u64, end: u64, name: &str) -> [u8; PART_ENTRY_SIZE] {
        let mut rec = [0u8; PART_ENTRY_SIZE];
        rec[..16].copy_from_slice(&BASIC_DATA);
        rec[16] = 0x01;
        rec[32..40].copy_from_slice(&start.to_le_bytes());
        rec[40..48].copy_from_slice(&end.to_le_bytes());
        for (i, unit) in name.encode_utf16().take(NAME_LEN).enumerate() {
            rec[56 + i * 2..58 + i * 2].copy_from_slice(&unit.to_le_bytes());
        }
        rec
    }

    #[test]
    fn decodes_entry_geometry() {
        let entry = PartitionEntry::from_bytes(&record(2048, 204800, "EFI")).unwrap();

        assert_eq!(*entry.start_lba(), 2048);
        assert_eq!(*entry.end_lba(), 204800);
        assert_eq!(entry.sector_count(), 202752);
        assert_eq!(entry.len_sectors(), 202753);
        assert!((entry.size_in_gb() - 202752.0 * 512.0 / 1073741824.0).abs() < 1e-12);
        assert!((entry.size_in_gb() - 0.0966).abs() < 1e-4);
        assert_eq!(entry.name(), "EFI");
        assert_eq!(entry.type_guid().type_name(), Some("Basic Data"));
        assert!(!entry.is_unused());
    }

    #[test]
    fn sector_count_boundaries() {
        let single = PartitionEntry::from_bytes(&record(4096, 4096, "")).unwrap();
        assert_eq!(single.sector_count(), 0);
        assert_eq!(single.len_sectors(), 1);

        let inverted = PartitionEntry::from_bytes(&record(10, 5, "")).unwrap();
        assert_eq!(inverted.sector_count(), 0);
        assert_eq!(inverted.len_sectors(), 0);
    }

    #[test]
    fn zero_record_is_unused() {
        let entry = PartitionEntry::from_bytes(&[0u8; PART_ENTRY_SIZE]).unwrap();
        assert!(entry.is_unused());
        assert_eq!(entry.name(), "");
    }

    #[test]
    fn sector_holds_four_entries_in_order() {
        let mut sector = [0u8; SECTOR_SIZE];
        sector[..128].copy_from_slice(&record(34, 2047, "first"));
        sector[256..384].copy_from_slice(&record(4096, 8191, "third"));

        let table = PartitionTable::from_sector(&sector).unwrap();
        assert_eq!(table.entries().len(), 4);
        assert_eq!(table.entries()[0].name(), "first");
        assert!(table.entries()[1].is_unused());
        assert_eq!(*table.entries()[2].start_lba(), 4096);
        assert!(table.entries()[3].is_unused());

        let used: Vec<usize> = table.used_entries().iter().map(|(i, _)| *i).collect();
        assert_eq!(used, vec![0, 2]);

        let layout = table.display_layout(0).unwrap();
        assert!(layout.contains("#1"));
        assert!(layout.contains("#3"));
        assert!(!layout.contains("#2"));
    }

    #[test]
    fn wider_entries_follow_their_stride() {
        let mut buf = vec![0xEEu8; 3 * 256];
        for (i, start) in [100u64, 200, 300].iter().enumerate() {
            buf[i * 256..i * 256 + 128].copy_from_slice(&record(*start, start + 9, "x"));
        }

        let table = PartitionTable::from_bytes(&buf, 256, 3).unwrap();
        let starts: Vec<u64> = table.entries().iter().map(|e| *e.start_lba()).collect();
        assert_eq!(starts, vec![100, 200, 300]);
    }

    #[test]
    fn truncated_array_is_out_of_range() {
        assert!(matches!(
            PartitionTable::from_bytes(&[0u8; 300], 128, 4),
            Err(DecodeError::OutOfRangeOffset { offset: 300, len: 300, .. })
        ));
        assert!(PartitionTable::from_bytes(&[0u8; 384], 128, 3).is_ok());
        assert!(matches!(
            PartitionTable::from_bytes(&[0u8; 512], 64, 4),
            Err(DecodeError::Record(_))
        ));
    }

    #[test]
    fn huge_counts_are_rejected_before_allocating() {
        for (entry_size, entry_count) in [
            (128, usize::MAX / 64),
            (128, usize::MAX),
            (usize::MAX, 2),
            (256, 3),
        ] {
            assert!(
                matches!(
                    PartitionTable::from_bytes(&[0u8; 512], entry_size, entry_count),
                    Err(DecodeError::OutOfRangeOffset { .. })
                ),
                "{entry_size} x {entry_count}"
            );
        }
        assert!(PartitionTable::from_bytes(&[0u8; 512], 128, 0)
            .unwrap()
            .entries()
            .is_empty());
    }

    #[test]
    fn geometry_ignores_bytes_outside_its_range() {
        let mut rng = XorShift(0xDEAD_BEEF_CAFE_F00D);
        let clean = record(2048, 204800, "");

        for _ in 0..32 {
            let mut noisy = [0u8; PART_ENTRY_SIZE];
            rng.fill(&mut noisy);
            noisy[32..48].copy_from_slice(&clean[32..48]);

            let entry = PartitionEntry::from_bytes(&noisy).unwrap();
            assert_eq!(*entry.start_lba(), 2048);
            assert_eq!(*entry.end_lba(), 204800);
        }
    }
}
