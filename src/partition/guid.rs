use std::fmt;

/// A 16-byte GUID as stored on disk.
///
/// The first three groups are little-endian, the last two are stored byte by byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// Returns whether every byte of the GUID is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Returns a human-readable name for well-known partition type GUIDs.
    pub fn type_name(&self) -> Option<&'static str> {
        let name = match self.to_string().as_str() {
            "00000000-0000-0000-0000-000000000000" => "Unused",
            "C12A7328-F81F-11D2-BA4B-00A0C93EC93B" => "EFI System",
            "21686148-6449-6E6F-744E-656564454649" => "BIOS Boot",
            "E3C9E316-0B5C-4DB8-817D-F92DF00215AE" => "MS Reserved",
            "EBD0A0A2-B9E5-4433-87C0-68B6B72699C7" => "Basic Data",
            "DE94BBA4-06D1-4D40-A16A-BFD50179D6AC" => "WinRE",
            "0FC63DAF-8483-4772-8E79-3D69D8477DE4" => "Linux FS",
            "0657FD6D-A4AB-43C4-84E5-0933C84B4F4F" => "Linux Swap",
            "E6D6D379-F507-44C2-A23C-238F2A3DF928" => "Linux LVM",
            "48465300-0000-11AA-AA11-00306543ECAC" => "Apple HFS+",
            _ => return None,
        };

        Some(name)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-",
            u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            u16::from_le_bytes([b[4], b[5]]),
            u16::from_le_bytes([b[6], b[7]]),
            b[8],
            b[9],
        )?;
        for byte in &b[10..] {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}
