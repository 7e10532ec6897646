//! Per-interface NIC driver statistics.
//!
//! The exporter only needs one capability from the kernel: "give me the named
//! counters of interface X". [`StatsProvider`] is that seam; [`EthtoolStats`]
//! implements it with `SIOCETHTOOL` ioctls on Linux and [`MockStats`] replays
//! scripted results in tests.

#[cfg(target_os = "linux")]
mod ethtool;
mod mock;

use std::collections::BTreeMap;

use crate::error::StatsError;

#[cfg(target_os = "linux")]
pub use ethtool::EthtoolStats;
pub use mock::MockStats;

/// Counter name to value, as reported by the driver.
pub type Counters = BTreeMap<String, u64>;

/// Source of raw driver counters for a named interface.
pub trait StatsProvider {
    /// Returns every counter the driver exposes for `interface`.
    fn interface_stats(&self, interface: &str) -> Result<Counters, StatsError>;
}

impl<T: StatsProvider + ?Sized> StatsProvider for &T {
    fn interface_stats(&self, interface: &str) -> Result<Counters, StatsError> {
        (**self).interface_stats(interface)
    }
}

impl<T: StatsProvider + ?Sized> StatsProvider for Box<T> {
    fn interface_stats(&self, interface: &str) -> Result<Counters, StatsError> {
        (**self).interface_stats(interface)
    }
}

/// Opens the platform's stats capability.
///
/// Fails when the control socket cannot be created, or on platforms without
/// ethtool support. Callers treat this as fatal.
pub fn open_default() -> Result<Box<dyn StatsProvider>, StatsError> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(EthtoolStats::new()?))
    }
    #[cfg(not(target_os = "linux"))]
    {
        Err(StatsError::Unsupported)
    }
}
