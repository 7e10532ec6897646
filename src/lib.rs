//! ethtool-exporter - NIC driver statistics exporter library.
//!
//! Discovers active interfaces from the kernel neighbor table, reads their
//! ethtool driver counters and pushes them to a Prometheus-compatible
//! endpoint every cycle.
//!
//! - `collector` - interface discovery over a mockable filesystem
//! - `stats` - per-interface driver counters (ethtool ioctl, mock)
//! - `metrics` - sample model, name normalization, wire encodings
//! - `push` - HTTP delivery
//! - `scheduler` - fixed-interval collection loop and clock abstraction
//! - `config` - validated runtime configuration
//! - `error` - error types for every failure scope

pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod push;
pub mod scheduler;
pub mod stats;
