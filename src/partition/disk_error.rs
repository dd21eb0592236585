//! Error types for the disk inspection pipeline.
//!
//! Every failure of a device read, a decoder or the address computation ends up
//! here, and each maps to its own process exit code.

use thiserror::Error;

use crate::device::DeviceError;
use crate::filesystem::fat_error::FATError;
use crate::utils::DecodeError;

/// Represents errors that can occur while inspecting a disk.
#[derive(Error, Debug)]
pub enum DiskError {
    /// Reading from the device failed.
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
    /// A GPT structure could not be decoded.
    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),
    /// The FAT volume of a partition could not be analysed.
    #[error("FAT error: {0}")]
    Fat(#[from] FATError),
    /// The partition index is past the end of the partition table.
    #[error("Invalid partition #{index}: the table holds {count} entries")]
    InvalidPartition { index: usize, count: usize },
    /// The partition index designates an unused slot.
    #[error("Partition #{0} is unused")]
    UnusedPartition(usize),
}

impl DiskError {
    /// Returns the process exit code reporting this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            DiskError::Device(DeviceError::DeviceNotFound(_)) => 2,
            DiskError::Device(DeviceError::OpenFailed { .. }) => 3,
            DiskError::Device(DeviceError::OffsetOverflow(_))
            | DiskError::Fat(FATError::ArithmeticOverflow { .. }) => 6,
            DiskError::Device(_) => 4,
            DiskError::Decode(_) | DiskError::Fat(FATError::Decode(_)) => 5,
            DiskError::InvalidPartition { .. } | DiskError::UnusedPartition(_) => 7,
        }
    }
}
