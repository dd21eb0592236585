//! Error types for device reads.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading a byte range from a device.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The path does not resolve to a block device or a disk image.
    #[error("Device not found: {}", .0.display())]
    DeviceNotFound(PathBuf),

    /// The device exists but could not be opened for reading.
    #[error("Unable to open {}: {source}", path.display())]
    OpenFailed { path: PathBuf, source: io::Error },

    /// Positioning the device handle at the requested offset failed.
    #[error("Failed to seek to byte {offset}: {source}")]
    SeekFailed { offset: u64, source: io::Error },

    /// The device returned fewer bytes than requested.
    #[error("Short read at byte {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: u32,
        actual: u32,
    },

    /// A read of zero bytes was requested.
    #[error("Requested a read of zero bytes")]
    EmptyRead,

    /// The sector number cannot be expressed as a byte offset.
    #[error("Byte offset of sector {0} overflows")]
    OffsetOverflow(u64),
}
