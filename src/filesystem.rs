//! FAT volume analysis.
//!
//! This module provides:
//! - Decoding of the BIOS Parameter Block fields locating the FAT region
//! - Computation of the first data cluster LBA
//! - Display of the volume layout

pub mod bpb;
pub mod fat;
pub mod fat_error;
