//! GUID Partition Table parsing.
//!
//! This module provides:
//! - Decoding of the GPT header and of the partition entry array
//! - The `Disk` pipeline chaining device reads and decoders
//! - The error taxonomy surfaced to the command-line front end

pub mod disk;
pub mod disk_error;
pub mod entry;
pub mod gpt;
pub mod guid;
