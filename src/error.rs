//! Error taxonomy for the exporter.
//!
//! Each error type maps to the scope it aborts: a [`DiscoveryError`] skips the
//! whole cycle, while stats, encoding, and delivery errors only skip one
//! interface. None of them is fatal except [`StatsError::Init`] at startup.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The neighbor table could not be read.
#[derive(Debug, Error)]
#[error("failed to read neighbor table {path:?}: {source}")]
pub struct DiscoveryError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Driver statistics could not be retrieved.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The stats capability could not be opened at all.
    #[error("failed to initialize ethtool control socket: {0}")]
    Init(#[source] io::Error),

    /// Interface name is empty or longer than the kernel allows.
    #[error("invalid interface name {0:?}")]
    InvalidInterface(String),

    /// A `SIOCETHTOOL` request was rejected by the kernel or driver.
    #[error("{op} failed for {interface}: {source}")]
    Ioctl {
        interface: String,
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// The driver's counter set changed size between requests.
    #[error("{interface}: driver reported {actual} counters, expected {expected}")]
    CounterSetChanged {
        interface: String,
        expected: usize,
        actual: usize,
    },

    /// The stats capability is not available on this platform.
    #[error("ethtool statistics are not supported on this platform")]
    Unsupported,

    /// Scripted failure, used by test providers.
    #[error("{0}")]
    Other(String),
}

/// A batch could not be serialized into a wire payload.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("protobuf encoding failed: {0}")]
    Protobuf(#[from] prost::EncodeError),

    #[error("snappy compression failed: {0}")]
    Snappy(#[from] snap::Error),
}

/// A payload could not be delivered to the remote endpoint.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The endpoint answered with a status outside `200..300`.
    #[error("unexpected status code: {status}")]
    Status { status: u16 },

    /// Connection, DNS, TLS, or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Runtime configuration is invalid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid endpoint URL {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("interval must be at least 1 second, got {0}")]
    InvalidInterval(u64),
}

/// Any failure that aborts the export of a single interface.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
