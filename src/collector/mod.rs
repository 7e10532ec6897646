//! Interface discovery for the exporter.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │     InterfaceDiscoverer      │
//! │  - /proc/net/arp (column 6)  │
//! └──────────────┬───────────────┘
//!                │
//!         ┌──────▼──────┐
//!         │  FileSystem │ (trait)
//!         └──────┬──────┘
//!         ┌──────┴──────┐
//!  ┌──────▼──────┐ ┌────▼────────┐
//!  │   RealFs    │ │   MockFs    │
//!  │  (Linux)    │ │  (Testing)  │
//!  └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use ethtool_exporter::collector::{InterfaceDiscoverer, MockFs};
//!
//! let fs = MockFs::with_neighbors(&[("10.0.0.1", "eth0")]);
//! let discoverer = InterfaceDiscoverer::new(fs, "/proc/net/arp");
//! assert_eq!(discoverer.discover().unwrap(), vec!["eth0"]);
//! ```

pub mod mock;
mod neighbor;
pub mod traits;

pub use mock::MockFs;
pub use neighbor::{DEFAULT_NEIGHBOR_TABLE, InterfaceDiscoverer, parse_neighbor_table};
pub use traits::{FileSystem, RealFs};
