use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, warn};

use super::device_error::DeviceError;
use crate::constants::SECTOR_SIZE;
use crate::utils::lba_to_offset;

/// Reads exactly `length` bytes starting at `offset` from a seekable source.
///
/// # Parameters
/// - `reader`: The source to read from
/// - `offset`: Absolute byte offset of the first byte to read
/// - `length`: Number of bytes to read, must be greater than 0
///
/// # Errors
/// - `DeviceError::EmptyRead` if `length` is 0
/// - `DeviceError::SeekFailed` if the source cannot be positioned at `offset`
/// - `DeviceError::ShortRead` if the source ends, or fails, before `length` bytes were read.
///   Nothing of a partial read is returned.
pub fn read_exact_at<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    length: u32,
) -> Result<Vec<u8>, DeviceError> {
    if length == 0 {
        return Err(DeviceError::EmptyRead);
    }

    reader
        .seek(SeekFrom::Start(offset))
        .map_err(|source| DeviceError::SeekFailed { offset, source })?;

    let mut buffer = vec![0; length as usize];
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!("Read error at byte {}: {err}", offset + filled as u64);
                break;
            }
        }
    }

    if filled < buffer.len() {
        return Err(DeviceError::ShortRead {
            offset,
            expected: length,
            actual: filled as u32,
        });
    }

    Ok(buffer)
}

/// Reads `length` bytes at `offset` from the device at `path`.
///
/// The device is opened read-only for the duration of the call and closed before returning.
/// Both block devices and regular files (disk images) are accepted.
///
/// # Errors
/// - `DeviceError::EmptyRead` if `length` is 0
/// - `DeviceError::DeviceNotFound` if `path` does not exist or is neither a block device
///   nor a regular file. No open, seek or read is attempted in that case.
/// - `DeviceError::OpenFailed` if `path` cannot be inspected or opened for reading
/// - `DeviceError::SeekFailed` and `DeviceError::ShortRead` as for [`read_exact_at`]
pub fn read_at(path: &Path, offset: u64, length: u32) -> Result<Vec<u8>, DeviceError> {
    if length == 0 {
        return Err(DeviceError::EmptyRead);
    }

    check_device(path, fs::metadata(path))?;

    debug!("Reading {length} bytes at byte {offset} of {}", path.display());

    let mut file = File::open(path).map_err(|source| DeviceError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;

    read_exact_at(&mut file, offset, length)
}

/// Reads the sector `lba` of the device at `path`.
pub fn read_sector(path: &Path, lba: u64) -> Result<Vec<u8>, DeviceError> {
    let offset = lba_to_offset(lba).ok_or(DeviceError::OffsetOverflow(lba))?;
    read_at(path, offset, SECTOR_SIZE as u32)
}

/// Classifies the result of looking up `path` before it is opened.
fn check_device(path: &Path, metadata: io::Result<fs::Metadata>) -> Result<(), DeviceError> {
    match metadata {
        Ok(metadata) if is_device_like(&metadata.file_type()) => Ok(()),
        Ok(_) => Err(DeviceError::DeviceNotFound(path.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(DeviceError::DeviceNotFound(path.to_path_buf()))
        }
        Err(source) => Err(DeviceError::OpenFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(unix)]
fn is_device_like(file_type: &fs::FileType) -> bool {
    use std::os::unix::fs::FileTypeExt;

    file_type.is_block_device() || file_type.is_file()
}

#[cfg(not(unix))]
fn is_device_like(file_type: &fs::FileType) -> bool {
    file_type.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn temp_image(name: &str, data: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "gpt_forensics_reader_{}_{name}.img",
            std::process::id()
        ));
        fs::write(&path, data).unwrap();
        path
    }

    /// A source that fails every read after the seek.
    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }
    }

    impl Seek for Broken {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn reads_the_requested_range() {
        let data: Vec<u8> = (0..=255).collect();
        let bytes = read_exact_at(&mut Cursor::new(data), 16, 4).unwrap();
        assert_eq!(bytes, vec![16, 17, 18, 19]);
    }

    #[test]
    fn short_source_fails_with_short_read() {
        let mut source = Cursor::new(vec![0xAB; 10]);
        match read_exact_at(&mut source, 0, 512) {
            Err(DeviceError::ShortRead {
                offset,
                expected,
                actual,
            }) => assert_eq!((offset, expected, actual), (0, 512, 10)),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn read_past_the_end_is_a_short_read() {
        let mut source = Cursor::new(vec![0; 1024]);
        assert!(matches!(
            read_exact_at(&mut source, 4096, 512),
            Err(DeviceError::ShortRead { actual: 0, .. })
        ));
    }

    #[test]
    fn io_errors_surface_as_short_read() {
        assert!(matches!(
            read_exact_at(&mut Broken, 0, 8),
            Err(DeviceError::ShortRead { actual: 0, .. })
        ));
    }

    #[test]
    fn zero_length_is_rejected() {
        let mut source = Cursor::new(vec![0; 16]);
        assert!(matches!(
            read_exact_at(&mut source, 0, 0),
            Err(DeviceError::EmptyRead)
        ));
    }

    #[test]
    fn missing_device_is_not_found() {
        let path = Path::new("/dev/gpt_forensics_does_not_exist");
        match read_at(path, 512, 512) {
            Err(DeviceError::DeviceNotFound(p)) => assert_eq!(p, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn directory_is_not_a_device() {
        assert!(matches!(
            read_at(&std::env::temp_dir(), 0, 512),
            Err(DeviceError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn lookup_failures_other_than_not_found_are_open_failures() {
        let path = Path::new("/dev/sdz");
        let denied = Err(io::Error::from(io::ErrorKind::PermissionDenied));
        match check_device(path, denied) {
            Err(DeviceError::OpenFailed { path: p, source }) => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let missing = Err(io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(
            check_device(path, missing),
            Err(DeviceError::DeviceNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn overlong_name_is_an_open_failure() {
        let path = std::env::temp_dir().join("x".repeat(300));
        assert!(matches!(
            read_at(&path, 0, 512),
            Err(DeviceError::OpenFailed { .. })
        ));
    }

    #[test]
    fn reads_a_sector_from_an_image() {
        let mut data = vec![0u8; 3 * SECTOR_SIZE];
        data[SECTOR_SIZE * 2] = 0x42;
        let path = temp_image("sector", &data);

        let sector = read_sector(&path, 2).unwrap();
        assert_eq!(sector.len(), SECTOR_SIZE);
        assert_eq!(sector[0], 0x42);
        assert!(matches!(
            read_sector(&path, 3),
            Err(DeviceError::ShortRead { actual: 0, .. })
        ));
        assert!(matches!(
            read_sector(&path, u64::MAX),
            Err(DeviceError::OffsetOverflow(u64::MAX))
        ));

        fs::remove_file(path).unwrap();
    }
}
