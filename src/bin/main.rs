//! This is the main entry point for the GPT inspection tool.
//!
//! Given a device on the command line, the tool prints the GPT header and the partition
//! table, optionally analyses one partition as a FAT volume, and exits with a code
//! reporting the first error met. Without a device, it starts an interactive prompt.
//!
//! Usage: `main [-v...] [--single-sector] [<device> [<partition>]]`

use gpt_forensics::commands::Command;
use gpt_forensics::constants::{DEV_DIR, SECTOR_SIZE};
use gpt_forensics::device::enumerate::list_block_devices;
use gpt_forensics::partition::disk::TableScope;
use gpt_forensics::traits::LayoutDisplay;
use gpt_forensics::utils::{hex_dump, lba_to_offset};
use gpt_forensics::{Disk, DiskError};
use log::{error, warn};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

/// Exit code for a malformed command line.
const USAGE_EXIT_CODE: i32 = 1;

/// Represents the runtime state of the program.
///
/// This struct keeps track of the currently opened disk and of the settings used to open disks.
struct RunState {
    /// The currently opened disk.
    disk: Option<Disk>,
    /// How much of the partition entry array is decoded.
    scope: TableScope,
    /// Directory holding the device nodes.
    dev_dir: PathBuf,
}

/// Settings parsed from the command line.
struct Args {
    verbosity: usize,
    scope: TableScope,
    device: Option<String>,
    partition: Option<usize>,
}

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("Usage: main [-v...] [--single-sector] [<device> [<partition>]]");
            process::exit(USAGE_EXIT_CODE);
        }
    };

    stderrlog::new()
        .module(module_path!())
        .module("gpt_forensics")
        .verbosity(args.verbosity)
        .init()
        .unwrap();

    let mut run_state = RunState {
        disk: None,
        scope: args.scope,
        dev_dir: PathBuf::from(DEV_DIR),
    };

    match args.device {
        Some(device) => {
            let path = resolve_device(&run_state.dev_dir, &device);
            if let Err(err) = inspect(&path, args.partition, run_state.scope) {
                error!("{err}");
                process::exit(err.exit_code());
            }
        }
        None => interactive(&mut run_state),
    }
}

fn parse_args<I: Iterator<Item = String>>(args: I) -> Result<Args, String> {
    let mut parsed = Args {
        verbosity: 1,
        scope: TableScope::Header,
        device: None,
        partition: None,
    };

    for arg in args {
        match arg.as_str() {
            "--single-sector" => parsed.scope = TableScope::SingleSector,
            flag if flag.starts_with("-v") && flag[1..].chars().all(|c| c == 'v') => {
                parsed.verbosity += flag.len() - 1
            }
            flag if flag.starts_with('-') => return Err(format!("Unknown option: {flag}")),
            value if parsed.device.is_none() => parsed.device = Some(value.to_string()),
            value if parsed.partition.is_none() => match value.parse::<usize>() {
                Ok(nb) if nb > 0 => parsed.partition = Some(nb),
                _ => return Err(format!("Invalid partition number: {value}")),
            },
            value => return Err(format!("Unexpected argument: {value}")),
        }
    }

    Ok(parsed)
}

/// Joins a bare device name to the device directory; anything containing a `/` is a path.
fn resolve_device(dev_dir: &Path, device: &str) -> PathBuf {
    if device.contains('/') {
        PathBuf::from(device)
    } else {
        dev_dir.join(device)
    }
}

/// Runs the whole pipeline once, stopping at the first error.
fn inspect(path: &Path, part_nb: Option<usize>, scope: TableScope) -> Result<(), DiskError> {
    let disk = Disk::open_with(path, scope)?;
    print_layout(&disk);

    if let Some(part_nb) = part_nb {
        print_volume(&disk, part_nb)?;
    }

    Ok(())
}

fn print_layout<T: LayoutDisplay>(item: &T) {
    match item.display_layout(0) {
        Ok(layout) => print!("{layout}"),
        Err(e) => error!("Print layout error: {e}"),
    }
}

fn print_volume(disk: &Disk, part_nb: usize) -> Result<(), DiskError> {
    let vol = disk.volume(part_nb - 1)?;
    print_layout(&vol);
    println!(
        "LBA address of the first cluster: {}",
        vol.first_data_cluster_lba()
    );
    Ok(())
}

fn interactive(run_state: &mut RunState) {
    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut s = String::new();
        match io::stdin().read_line(&mut s) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error!("Failed to read command: {e}");
                break;
            }
        }

        match Command::from_string(&s) {
            Command::Quit => break,
            Command::List => match list_block_devices(&run_state.dev_dir) {
                Ok(names) if names.is_empty() => println!("No disk found in this machine"),
                Ok(names) => names.iter().for_each(|name| println!("{name}")),
                Err(e) => error!("Could not list {}: {e}", run_state.dev_dir.display()),
            },
            Command::Open(device) => {
                let path = resolve_device(&run_state.dev_dir, &device);
                match Disk::open_with(&path, run_state.scope) {
                    Ok(disk) => run_state.disk = Some(disk),
                    Err(err) => error!("{err}"),
                }
            }
            Command::Print => match &run_state.disk {
                Some(disk) => print_layout(disk),
                None => warn!("Open a disk first"),
            },
            Command::Partition(part_nb) => match &run_state.disk {
                Some(_) if part_nb == 0 => error!("Partition numbers start at 1."),
                Some(disk) => {
                    if let Err(err) = print_volume(disk, part_nb) {
                        error!("{err}");
                    }
                }
                None => warn!("Open a disk first"),
            },
            Command::Dump(lba) => match &run_state.disk {
                Some(disk) => dump_sector(disk, lba),
                None => warn!("Open a disk first"),
            },
            Command::Unknown(s) => error!("Unknown command: {s:?}"),
            Command::Invalid(s) => error!("{s}"),
            Command::Empty => {}
        }
    }
}

fn dump_sector(disk: &Disk, lba: u64) {
    let sector = match disk.read_sector(lba) {
        Ok(sector) => sector,
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    let base = lba_to_offset(lba).unwrap_or_default();
    println!("Sector {lba} ({SECTOR_SIZE} bytes)");
    match hex_dump(&sector, base) {
        Ok(dump) => print!("{dump}"),
        Err(e) => error!("Dump error: {e}"),
    }
}
