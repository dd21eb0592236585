//! GUID Partition Table header.
//!
//! The header sits at LBA 1, right after the protective MBR. It is decoded as-is:
//! neither the `EFI PART` signature nor the CRC32 fields are checked, so callers that
//! need a trustworthy header must verify it themselves.

use std::fmt::Write;

use getset::Getters;
use log::trace;

use super::guid::Guid;
use crate::traits::LayoutDisplay;
use crate::utils::{self, DecodeError};

/// Signature found at the start of a well-formed GPT header.
pub const EFI_SIGNATURE: [u8; 8] = *b"EFI PART";

/// Byte offsets of the header fields.
mod offset {
    pub const SIGNATURE: usize = 0;
    pub const REVISION: usize = 8;
    pub const HEADER_SIZE: usize = 12;
    pub const HEADER_CRC32: usize = 16;
    pub const CURRENT_LBA: usize = 24;
    pub const BACKUP_LBA: usize = 32;
    pub const FIRST_USABLE_LBA: usize = 40;
    pub const LAST_USABLE_LBA: usize = 48;
    pub const DISK_GUID: usize = 56;
    pub const PART_TABLE_LBA: usize = 72;
    pub const ENTRY_COUNT: usize = 80;
    pub const ENTRY_SIZE: usize = 84;
    pub const ENTRY_ARRAY_CRC32: usize = 88;
}

/// The decoded GPT header.
#[derive(Debug, Clone, Getters)]
pub struct GptHeader {
    /// Header signature, `EFI PART` on a well-formed disk
    #[get = "pub"]
    signature: [u8; 8],
    /// Header format revision
    #[get = "pub"]
    revision: u32,
    /// Size in bytes of the header
    #[get = "pub"]
    header_size: u32,
    /// CRC32 of the header, not verified
    #[get = "pub"]
    header_crc32: u32,
    /// LBA of this header
    #[get = "pub"]
    current_lba: u64,
    /// LBA of the backup header
    #[get = "pub"]
    backup_lba: u64,
    /// First LBA usable by partitions
    #[get = "pub"]
    data_start_lba: u64,
    /// Last LBA usable by partitions
    #[get = "pub"]
    data_end_lba: u64,
    /// Disk identifier
    #[get = "pub"]
    disk_guid: Guid,
    /// LBA of the partition entry array
    #[get = "pub"]
    partition_table_lba: u64,
    /// Number of entries in the partition entry array
    #[get = "pub"]
    entry_count: u32,
    /// Size in bytes of one partition entry
    #[get = "pub"]
    entry_size: u32,
    /// CRC32 of the partition entry array, not verified
    #[get = "pub"]
    entry_array_crc32: u32,
}

impl GptHeader {
    /// Decodes a GPT header from the raw bytes of its sector.
    ///
    /// # Errors
    /// Returns `DecodeError::OutOfRangeOffset` if the buffer is too small to hold the header fields.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, DecodeError> {
        let header = GptHeader {
            signature: utils::bytes_at(buffer, offset::SIGNATURE)?,
            revision: utils::u32_at(buffer, offset::REVISION)?,
            header_size: utils::u32_at(buffer, offset::HEADER_SIZE)?,
            header_crc32: utils::u32_at(buffer, offset::HEADER_CRC32)?,
            current_lba: utils::u64_at(buffer, offset::CURRENT_LBA)?,
            backup_lba: utils::u64_at(buffer, offset::BACKUP_LBA)?,
            data_start_lba: utils::u64_at(buffer, offset::FIRST_USABLE_LBA)?,
            data_end_lba: utils::u64_at(buffer, offset::LAST_USABLE_LBA)?,
            disk_guid: Guid(utils::bytes_at(buffer, offset::DISK_GUID)?),
            partition_table_lba: utils::u64_at(buffer, offset::PART_TABLE_LBA)?,
            entry_count: utils::u32_at(buffer, offset::ENTRY_COUNT)?,
            entry_size: utils::u32_at(buffer, offset::ENTRY_SIZE)?,
            entry_array_crc32: utils::u32_at(buffer, offset::ENTRY_ARRAY_CRC32)?,
        };

        trace!("Decoded GPT header: {header:?}");
        Ok(header)
    }

    /// Returns whether the header carries the `EFI PART` signature.
    pub fn has_efi_signature(&self) -> bool {
        self.signature == EFI_SIGNATURE
    }
}

impl LayoutDisplay for GptHeader {
    fn display_layout(&self, indent: u8) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        let indent = " ".repeat(indent.into());

        let rows: [(&str, String); 10] = [
            (
                "Signature",
                String::from_utf8_lossy(&self.signature).into_owned(),
            ),
            (
                "Revision",
                format!("{}.{}", self.revision >> 16, self.revision & 0xFFFF),
            ),
            ("Current LBA", self.current_lba.to_string()),
            ("Backup LBA", self.backup_lba.to_string()),
            ("Partition table LBA", self.partition_table_lba.to_string()),
            ("Data area start LBA", self.data_start_lba.to_string()),
            ("Data area end LBA", self.data_end_lba.to_string()),
            ("Entry count", self.entry_count.to_string()),
            ("Entry size", self.entry_size.to_string()),
            ("Disk GUID", self.disk_guid.to_string()),
        ];

        writeln!(out, "{}┌{:─^60}┐", indent, " GPT Header ")?;
        for (name, value) in rows {
            writeln!(out, "{}├{:<22}{:>38}┤", indent, name, value)?;
        }
        writeln!(out, "{}└{:─<60}┘", indent, "")?;

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::XorShift;

    fn put_u64(buf: &mut [u8], offset: usize, value: u64) {
        buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn decodes_usable_data_area() {
        let mut buf = [0u8; 512];
        put_u64(&mut buf, offset::FIRST_USABLE_LBA, 2048);
        put_u64(&mut buf, offset::LAST_USABLE_LBA, 206848);

        let header = GptHeader::from_bytes(&buf).unwrap();
        assert_eq!(*header.data_start_lba(), 2048);
        assert_eq!(*header.data_end_lba(), 206848);
        assert_eq!(*header.partition_table_lba(), 0);
    }

    #[test]
    fn decodes_a_standard_header() {
        let mut buf = [0u8; 512];
        buf[..8].copy_from_slice(&EFI_SIGNATURE);
        buf[8..12].copy_from_slice(&0x0001_0000u32.to_le_bytes());
        buf[12..16].copy_from_slice(&92u32.to_le_bytes());
        put_u64(&mut buf, offset::CURRENT_LBA, 1);
        put_u64(&mut buf, offset::BACKUP_LBA, 409599);
        put_u64(&mut buf, offset::PART_TABLE_LBA, 2);
        buf[80..84].copy_from_slice(&128u32.to_le_bytes());
        buf[84..88].copy_from_slice(&128u32.to_le_bytes());

        let header = GptHeader::from_bytes(&buf).unwrap();
        assert!(header.has_efi_signature());
        assert_eq!(*header.revision(), 0x0001_0000);
        assert_eq!(*header.header_size(), 92);
        assert_eq!(*header.backup_lba(), 409599);
        assert_eq!(*header.partition_table_lba(), 2);
        assert_eq!(*header.entry_count(), 128);
        assert_eq!(*header.entry_size(), 128);

        let layout = header.display_layout(0).unwrap();
        assert!(layout.contains("EFI PART"));
        assert!(layout.contains("1.0"));
    }

    #[test]
    fn garbage_is_decoded_not_rejected() {
        let buf = [0xFFu8; 512];
        let header = GptHeader::from_bytes(&buf).unwrap();
        assert!(!header.has_efi_signature());
        assert_eq!(*header.partition_table_lba(), u64::MAX);
    }

    #[test]
    fn short_buffer_is_out_of_range() {
        assert!(matches!(
            GptHeader::from_bytes(&[0u8; 64]),
            Err(DecodeError::OutOfRangeOffset { offset: 56, width: 16, .. })
        ));
    }

    #[test]
    fn fields_ignore_bytes_outside_their_range() {
        let mut rng = XorShift(0x1234_5678_9ABC_DEF1);
        let mut buf = [0u8; 512];
        put_u64(&mut buf, offset::PART_TABLE_LBA, 2);
        put_u64(&mut buf, offset::FIRST_USABLE_LBA, 34);
        put_u64(&mut buf, offset::LAST_USABLE_LBA, 4062);

        for _ in 0..32 {
            let mut noisy = [0u8; 512];
            rng.fill(&mut noisy);
            for off in [
                offset::PART_TABLE_LBA,
                offset::FIRST_USABLE_LBA,
                offset::LAST_USABLE_LBA,
            ] {
                noisy[off..off + 8].copy_from_slice(&buf[off..off + 8]);
            }

            let header = GptHeader::from_bytes(&noisy).unwrap();
            assert_eq!(*header.partition_table_lba(), 2);
            assert_eq!(*header.data_start_lba(), 34);
            assert_eq!(*header.data_end_lba(), 4062);
        }
    }
}
