//! Interface discovery from the kernel neighbor (ARP) table.
//!
//! `/proc/net/arp` has one header line followed by one record per neighbor:
//!
//! ```text
//! IP address       HW type     Flags       HW address            Mask     Device
//! 192.168.1.1      0x1         0x2         aa:bb:cc:dd:ee:ff     *        eth0
//! ```
//!
//! The sixth column names the interface the neighbor is reachable through,
//! which makes the table a cheap proxy for "interfaces with recent traffic".

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::collector::traits::FileSystem;
use crate::error::DiscoveryError;

/// Default location of the kernel neighbor table.
pub const DEFAULT_NEIGHBOR_TABLE: &str = "/proc/net/arp";

/// Zero-based column holding the device name.
const DEVICE_FIELD: usize = 5;

/// Parses neighbor-table content into the distinct interface names it lists.
///
/// The first line is treated as a header and skipped. Lines with fewer than
/// six fields contribute nothing. The result is sorted so that every caller
/// sees the same order for the same table.
pub fn parse_neighbor_table(content: &str) -> Vec<String> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(DEVICE_FIELD))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Discovers active interfaces by reading the neighbor table.
pub struct InterfaceDiscoverer<F: FileSystem> {
    fs: F,
    path: PathBuf,
}

impl<F: FileSystem> InterfaceDiscoverer<F> {
    /// Creates a discoverer reading the neighbor table at `path`.
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    /// Returns the path of the neighbor table being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the neighbor table and returns the sorted set of interface names.
    pub fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        debug!("Reading {} to discover interfaces", self.path.display());

        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|source| DiscoveryError {
                path: self.path.clone(),
                source,
            })?;

        let interfaces = parse_neighbor_table(&content);
        debug!(
            "Discovered {} interface(s): {:?}",
            interfaces.len(),
            interfaces
        );
        Ok(interfaces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{ARP_HEADER, MockFs};

    #[test]
    fn test_parse_single_neighbor() {
        let content = "IP address HW type Flags HW address Mask Device\n\
                       10.0.0.1 0x1 0x2 52:54:00:aa:bb:cc * eth0\n";
        assert_eq!(parse_neighbor_table(content), vec!["eth0"]);
    }

    #[test]
    fn test_parse_deduplicates_and_sorts() {
        let content = format!(
            "{ARP_HEADER}\n\
             10.0.0.3 0x1 0x2 52:54:00:00:00:03 * eth1\n\
             10.0.0.1 0x1 0x2 52:54:00:00:00:01 * eth0\n\
             10.0.0.2 0x1 0x2 52:54:00:00:00:02 * eth1\n\
             172.17.0.2 0x1 0x2 02:42:ac:11:00:02 * docker0\n"
        );
        assert_eq!(
            parse_neighbor_table(&content),
            vec!["docker0", "eth0", "eth1"]
        );
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let content = format!(
            "{ARP_HEADER}\n\
             10.0.0.1 0x1 0x2 52:54:00:00:00:01 *\n\
             \n\
             garbage\n\
             10.0.0.2 0x1 0x2 52:54:00:00:00:02 * bond0\n"
        );
        assert_eq!(parse_neighbor_table(&content), vec!["bond0"]);
    }

    #[test]
    fn test_parse_header_only_and_empty() {
        assert!(parse_neighbor_table("").is_empty());
        assert!(parse_neighbor_table(ARP_HEADER).is_empty());
        assert!(parse_neighbor_table(&format!("{ARP_HEADER}\n")).is_empty());
    }

    #[test]
    fn test_parse_header_is_never_an_interface() {
        // A header that happens to have six fields must still be skipped.
        let content = "a b c d e header0\n1 2 3 4 5 eth0\n";
        assert_eq!(parse_neighbor_table(content), vec!["eth0"]);
    }

    #[test]
    fn test_parse_extra_fields_use_sixth_column() {
        let content = format!("{ARP_HEADER}\n10.0.0.1 0x1 0x2 aa * wlan0 trailing junk\n");
        assert_eq!(parse_neighbor_table(&content), vec!["wlan0"]);
    }

    #[test]
    fn test_discover_from_mock() {
        let fs = MockFs::with_neighbors(&[("10.0.0.1", "eth0"), ("10.0.0.9", "eth0")]);
        let discoverer = InterfaceDiscoverer::new(fs, DEFAULT_NEIGHBOR_TABLE);
        assert_eq!(discoverer.discover().unwrap(), vec!["eth0"]);
    }

    #[test]
    fn test_discover_missing_table() {
        let discoverer = InterfaceDiscoverer::new(MockFs::new(), DEFAULT_NEIGHBOR_TABLE);
        let err = discoverer.discover().unwrap_err();
        assert_eq!(err.path, Path::new(DEFAULT_NEIGHBOR_TABLE));
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_discover_custom_path() {
        let mut fs = MockFs::new();
        fs.add_file("/tmp/arp", format!("{ARP_HEADER}\n1.1.1.1 0x1 0x2 aa * ens3\n"));
        let discoverer = InterfaceDiscoverer::new(fs, "/tmp/arp");
        assert_eq!(discoverer.path(), Path::new("/tmp/arp"));
        assert_eq!(discoverer.discover().unwrap(), vec!["ens3"]);
    }
}
