//! Exportable samples and per-interface batches.

use crate::stats::Counters;

/// Prefix shared by every exported metric.
pub const METRIC_PREFIX: &str = "ethtool_";

/// Label carrying the source interface.
pub const INTERFACE_LABEL: &str = "interface";

/// Turns a driver counter name into a valid metric name.
///
/// Characters outside `[A-Za-z0-9_:]` (drivers commonly use `-` and `.`)
/// become `_`, and [`METRIC_PREFIX`] is prepended unless already present.
/// Distinct raw names can therefore map to one metric: `x` and `ethtool_x`,
/// or `rx-errors` and `rx_errors`. [`Batch::new`] keeps every such sample.
/// Applying it twice yields the same result as applying it once.
pub fn normalize_metric_name(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.starts_with(METRIC_PREFIX) {
        sanitized
    } else {
        format!("{METRIC_PREFIX}{sanitized}")
    }
}

/// A single normalized observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: String,
    pub interface: String,
    pub value: u64,
    pub timestamp_ms: i64,
}

/// All samples collected from one interface in one cycle.
///
/// Samples are ordered by raw counter name and share one timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    interface: String,
    timestamp_ms: i64,
    samples: Vec<Sample>,
}

impl Batch {
    /// Builds a batch from the raw counters of `interface`.
    pub fn new(interface: &str, counters: &Counters, timestamp_ms: i64) -> Self {
        let samples = counters
            .iter()
            .map(|(name, &value)| Sample {
                metric: normalize_metric_name(name),
                interface: interface.to_string(),
                value,
                timestamp_ms,
            })
            .collect();

        Self {
            interface: interface.to_string(),
            timestamp_ms,
            samples,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
