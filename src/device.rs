//! Raw access to block devices and disk images.
//!
//! This module provides:
//! - Exact byte-range reads from a device path (the only code touching I/O)
//! - Enumeration of the whole-disk devices present on the machine

pub mod device_error;
pub mod enumerate;
pub mod reader;

pub use device_error::DeviceError;
pub use reader::{read_at, read_exact_at, read_sector};
