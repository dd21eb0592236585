//!
//! GPTForensics: A library and CLI for inspecting GPT disks and their FAT volumes.
//!
//! This crate provides tools for:
//! - Reading exact byte ranges from block devices and disk images
//! - Decoding the GPT header and the partition entry array
//! - Decoding the BIOS Parameter Block of a FAT volume and locating its first data cluster
//! - Handling user commands and printing disk and volume layouts
//!
//! Nothing is ever written to the inspected device.
//!
//! # Re-exports
//! - [`Disk`]: GPT disk with its header and partition table
//! - [`FatVolume`]: FAT volume geometry
//! - [`DiskError`]: Errors of the inspection pipeline

pub mod commands;
pub mod constants;
pub mod device;
pub mod filesystem;
pub mod partition;
pub mod traits;
pub mod utils;

/// GPT disk with its header and partition table (see [`partition::disk::Disk`]).
pub use crate::partition::disk::Disk;
/// Errors of the inspection pipeline (see [`partition::disk_error::DiskError`]).
pub use crate::partition::disk_error::DiskError;
/// FAT volume geometry (see [`filesystem::fat::FatVolume`]).
pub use crate::filesystem::fat::FatVolume;
