use std::fs;
use std::io;
use std::path::Path;

/// Lists the whole-disk device names found in `dir`, sorted.
///
/// Partitions (`sda1`, `nvme0n1p1`, ...) and unrelated nodes are skipped.
pub fn list_block_devices(dir: &Path) -> io::Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_whole_disk(name))
        .collect();
    names.sort();

    Ok(names)
}

/// Returns whether `name` looks like a whole-disk device node.
fn is_whole_disk(name: &str) -> bool {
    for prefix in ["sd", "vd", "hd", "xvd"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            return !rest.is_empty() && rest.chars().all(|c| c.is_ascii_lowercase());
        }
    }

    if let Some(rest) = name.strip_prefix("nvme") {
        return match rest.split_once('n') {
            Some((ctrl, ns)) => is_number(ctrl) && is_number(ns),
            None => false,
        };
    }

    if let Some(rest) = name.strip_prefix("mmcblk") {
        return is_number(rest);
    }

    false
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_whole_disks() {
        for name in ["sda", "sdab", "vdb", "xvda", "nvme0n1", "nvme12n3", "mmcblk0"] {
            assert!(is_whole_disk(name), "{name}");
        }
        for name in ["sda1", "sd", "nvme0n1p1", "nvme0", "mmcblk0p2", "loop0", "tty1", "null"] {
            assert!(!is_whole_disk(name), "{name}");
        }
    }

    #[test]
    fn lists_sorted_disks_from_a_directory() {
        let dir = std::env::temp_dir().join(format!("gpt_forensics_dev_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["sdb", "sda", "sda1", "null", "nvme0n1"] {
            fs::write(dir.join(name), b"").unwrap();
        }

        let names = list_block_devices(&dir).unwrap();
        assert_eq!(names, vec!["nvme0n1", "sda", "sdb"]);

        fs::remove_dir_all(dir).unwrap();
    }
}
