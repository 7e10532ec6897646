//! In-memory mock filesystem for testing discovery without a real `/proc`.
//!
//! Allows tests to run on macOS and in CI environments where the kernel
//! neighbor table is empty or absent.

use crate::collector::traits::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Header line of `/proc/net/arp` as printed by the kernel.
pub const ARP_HEADER: &str =
    "IP address       HW type     Flags       HW address            Mask     Device";

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content, replacing any previous one.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Builds a filesystem whose `/proc/net/arp` lists one neighbor per
    /// `(ip, device)` pair.
    pub fn with_neighbors(neighbors: &[(&str, &str)]) -> Self {
        let mut content = String::from(ARP_HEADER);
        content.push('\n');
        for (ip, device) in neighbors {
            content.push_str(&format!(
                "{ip:<16} 0x1         0x2         52:54:00:12:34:56     *        {device}\n"
            ));
        }

        let mut fs = Self::new();
        fs.add_file("/proc/net/arp", content);
        fs
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/net/arp", "header\n");

        assert!(fs.exists(Path::new("/proc/net/arp")));
        let content = fs.read_to_string(Path::new("/proc/net/arp")).unwrap();
        assert_eq!(content, "header\n");
    }

    #[test]
    fn test_mock_fs_missing_file() {
        let fs = MockFs::new();
        assert!(!fs.exists(Path::new("/proc/net/arp")));
        let err = fs.read_to_string(Path::new("/proc/net/arp")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_with_neighbors_layout() {
        let fs = MockFs::with_neighbors(&[("10.0.0.1", "eth0"), ("10.0.0.2", "eth1")]);
        let content = fs.read_to_string(Path::new("/proc/net/arp")).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], ARP_HEADER);
        assert_eq!(lines[1].split_whitespace().nth(5), Some("eth0"));
        assert_eq!(lines[2].split_whitespace().nth(5), Some("eth1"));
    }
}
