//! This module defines the `Command` enum and its associated methods for parsing
//! and handling user commands in the GPT inspection tool.
//!
//! The `Command` enum represents the commands that the user can input, such as
//! listing disks, opening one, printing its layout or analysing a partition.

/// Represents a user command in the GPT inspection tool.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// Command to quit the program.
    Quit,
    /// Command to list the disks of the machine.
    List,
    /// Command to open a disk, encapsulating the device name or path as a `String`.
    Open(String),
    /// Command to print the GPT header and the partition table.
    Print,
    /// Analyse the FAT volume of a partition, numbered from 1.
    Partition(usize),
    /// Hex dump of a sector.
    Dump(u64),
    /// Command for an unknown input, encapsulating the raw input as a `String`.
    Unknown(String),
    /// Command for invalid input, encapsulating an error message as a `String`.
    Invalid(String),
    /// Command for an empty input.
    Empty,
}

impl Command {
    /// Parses a string into a `Command` instance.
    ///
    /// # Parameters
    /// - `s`: A string slice representing the user input.
    ///
    /// # Returns
    /// - `Command::Quit` if the input is "quit".
    /// - `Command::List` if the input is "list".
    /// - `Command::Open` with the device if the input starts with "open" followed by an argument.
    /// - `Command::Print` if the input is "print".
    /// - `Command::Partition` if the input is "part" followed by a partition number.
    /// - `Command::Dump` if the input is "dump" followed by a sector number.
    /// - `Command::Unknown` if the input does not match any known command.
    /// - `Command::Invalid` if an argument is missing or cannot be parsed.
    /// - `Command::Empty` if the input is empty or contains only whitespace.
    pub fn from_string(s: &str) -> Self {
        let mut parts = s.split_whitespace();
        match parts.next() {
            Some("quit") => Command::Quit,
            Some("list") => Command::List,
            Some("open") => match parts.next() {
                Some(arg) => Command::Open(arg.to_string()),
                None => Command::Invalid(String::from(
                    "Missing arg: 'open' expects a device name or the path to a disk image.",
                )),
            },
            Some("print") => Command::Print,
            Some("part") => match parts.next() {
                Some(arg) => match arg.parse::<usize>() {
                    Ok(nb) => Command::Partition(nb),
                    Err(_) => Command::Invalid(String::from(
                        "Arg parsing error: 'part' expects an unsigned integer.",
                    )),
                },
                None => Command::Invalid(String::from(
                    "Missing arg: 'part' expects the partition number.",
                )),
            },
            Some("dump") => match parts.next() {
                Some(arg) => match arg.parse::<u64>() {
                    Ok(lba) => Command::Dump(lba),
                    Err(_) => Command::Invalid(String::from(
                        "Arg parsing error: 'dump' expects a sector number.",
                    )),
                },
                None => Command::Invalid(String::from(
                    "Missing arg: 'dump' expects the sector number.",
                )),
            },
            Some(other) => Command::Unknown(other.to_string()),
            None => Command::Empty,
        }
    }
}
