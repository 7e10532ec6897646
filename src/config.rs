//! Validated runtime configuration.
//!
//! Built once at startup from command-line arguments and handed to each
//! component at construction; nothing reads it from global state.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::collector::DEFAULT_NEIGHBOR_TABLE;
use crate::error::ConfigError;
use crate::metrics::Encoding;
use crate::scheduler::DEFAULT_INTERVAL;

/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ExporterConfig {
    /// Absolute `http`/`https` URL payloads are POSTed to.
    pub endpoint: Url,
    pub encoding: Encoding,
    /// Pause between cycles.
    pub interval: Duration,
    /// Per-request timeout; `None` waits forever.
    pub timeout: Option<Duration>,
    pub neighbor_table: PathBuf,
    /// Enables debug-level logging.
    pub debug: bool,
}

impl ExporterConfig {
    /// Validates `endpoint` and fills the remaining fields with defaults.
    pub fn new(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            encoding: Encoding::default(),
            interval: DEFAULT_INTERVAL,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            neighbor_table: PathBuf::from(DEFAULT_NEIGHBOR_TABLE),
            debug: false,
        })
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the cycle interval; must be at least one second.
    pub fn with_interval_secs(mut self, secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::InvalidInterval(secs));
        }
        self.interval = Duration::from_secs(secs);
        Ok(self)
    }

    /// Sets the HTTP timeout; `0` disables it.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn with_neighbor_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.neighbor_table = path.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExporterConfig::new("http://localhost:9090/api/v1/write").unwrap();
        assert_eq!(config.endpoint.as_str(), "http://localhost:9090/api/v1/write");
        assert_eq!(config.encoding, Encoding::RemoteWrite);
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.neighbor_table, PathBuf::from("/proc/net/arp"));
        assert!(!config.debug);
    }

    #[test]
    fn test_rejects_relative_and_garbage_urls() {
        assert!(matches!(
            ExporterConfig::new("/api/v1/write"),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            ExporterConfig::new(""),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = ExporterConfig::new("ftp://example.com/write").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEndpoint {
                url: "ftp://example.com/write".into(),
                reason: "unsupported scheme 'ftp'".into(),
            }
        );
    }

    #[test]
    fn test_interval_and_timeout() {
        let config = ExporterConfig::new("https://prom.example/write")
            .unwrap()
            .with_interval_secs(5)
            .unwrap()
            .with_timeout_secs(0);
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.timeout, None);

        let err = ExporterConfig::new("https://prom.example/write")
            .unwrap()
            .with_interval_secs(0)
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidInterval(0));
    }

    #[test]
    fn test_builders() {
        let config = ExporterConfig::new("http://127.0.0.1:8080/")
            .unwrap()
            .with_encoding(Encoding::Text)
            .with_neighbor_table("/tmp/arp")
            .with_debug(true);
        assert_eq!(config.encoding, Encoding::Text);
        assert_eq!(config.neighbor_table, PathBuf::from("/tmp/arp"));
        assert!(config.debug);
    }
}
