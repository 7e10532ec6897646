//! Scripted stats provider for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StatsError;
use crate::stats::{Counters, StatsProvider};

enum Scripted {
    Counters(Counters),
    Failure(String),
}

/// Stats provider returning fixed per-interface results.
///
/// Interfaces without a script fail with "no such device". Every query is
/// recorded so tests can assert which interfaces were visited.
#[derive(Default)]
pub struct MockStats {
    scripts: HashMap<String, Scripted>,
    queried: Mutex<Vec<String>>,
}

impl MockStats {
    /// Creates a provider with no scripted interfaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful response for `interface`.
    pub fn with_counters<K: Into<String>>(
        mut self,
        interface: &str,
        counters: impl IntoIterator<Item = (K, u64)>,
    ) -> Self {
        let counters = counters.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.scripts
            .insert(interface.to_string(), Scripted::Counters(counters));
        self
    }

    /// Scripts a failure for `interface`.
    pub fn with_failure(mut self, interface: &str, message: impl Into<String>) -> Self {
        self.scripts
            .insert(interface.to_string(), Scripted::Failure(message.into()));
        self
    }

    /// Interfaces queried so far, in call order.
    pub fn queried(&self) -> Vec<String> {
        self.queried
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

impl StatsProvider for MockStats {
    fn interface_stats(&self, interface: &str) -> Result<Counters, StatsError> {
        if let Ok(mut queried) = self.queried.lock() {
            queried.push(interface.to_string());
        }

        match self.scripts.get(interface) {
            Some(Scripted::Counters(counters)) => Ok(counters.clone()),
            Some(Scripted::Failure(message)) => Err(StatsError::Other(message.clone())),
            None => Err(StatsError::Other(format!("{interface}: no such device"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_counters() {
        let stats = MockStats::new().with_counters("eth0", [("rx-errors", 3), ("tx.packets", 100)]);
        let counters = stats.interface_stats("eth0").unwrap();
        assert_eq!(counters.get("rx-errors"), Some(&3));
        assert_eq!(counters.get("tx.packets"), Some(&100));
    }

    #[test]
    fn test_scripted_failure_and_unknown() {
        let stats = MockStats::new().with_failure("eth1", "permission denied");
        assert_eq!(
            stats.interface_stats("eth1").unwrap_err().to_string(),
            "permission denied"
        );
        assert!(stats.interface_stats("lo").is_err());
        assert_eq!(stats.queried(), vec!["eth1", "lo"]);
    }
}
