/// The size of a logical sector in bytes.
pub const SECTOR_SIZE: usize = 512;

/// Directory holding the block device nodes.
pub const DEV_DIR: &str = "/dev";

/// LBA of the primary GPT header. LBA 0 holds the protective MBR.
pub const GPT_HEADER_LBA: u64 = 1;

/// LBA of the partition entry array on a standard layout.
pub const PART_TABLE_LBA: u64 = 2;

/// Size in bytes of the part of a partition entry this crate decodes.
pub const PART_ENTRY_SIZE: usize = 128;

/// Number of entries decoded when the table is read as a single sector.
pub const SECTOR_PART_CNT: usize = SECTOR_SIZE / PART_ENTRY_SIZE;

/// Upper bound on the size of a partition entry array read from disk.
pub const MAX_PART_ARRAY_SIZE: u64 = 1024 * 1024;

/// Offset of the BIOS Parameter Block within a boot sector.
pub const BPB_OFFSET: usize = 11;

/// Number of bytes in a binary gigabyte.
pub const GIB: f64 = 1_073_741_824.0;
