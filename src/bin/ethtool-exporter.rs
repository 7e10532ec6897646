//! ethtool-exporter - NIC driver statistics exporter daemon.
//!
//! Every interval, reads the kernel neighbor table to find active interfaces,
//! collects their ethtool driver counters and pushes them to a Prometheus
//! remote-write (or text) endpoint.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use ethtool_exporter::collector::{
    DEFAULT_NEIGHBOR_TABLE, FileSystem, InterfaceDiscoverer, RealFs,
};
use ethtool_exporter::config::{DEFAULT_TIMEOUT_SECS, ExporterConfig};
use ethtool_exporter::error::ConfigError;
use ethtool_exporter::metrics::Encoding;
use ethtool_exporter::push::HttpPusher;
use ethtool_exporter::scheduler::{DEFAULT_INTERVAL, Scheduler, SystemClock};
use ethtool_exporter::stats;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\n  commit: ",
    env!("GIT_SHA"),
    "\n  built:  ",
    env!("GIT_DATE")
);

const USAGE: &str = "Usage: ethtool-exporter --prom=http://localhost:9090/api/v1/write [--debug]";

/// NIC driver statistics exporter.
#[derive(Parser)]
#[command(
    name = "ethtool-exporter",
    about = "Pushes ethtool NIC statistics to Prometheus",
    version,
    long_version = LONG_VERSION
)]
struct Args {
    /// Prometheus Remote Write API endpoint (required).
    #[arg(long, value_name = "URL")]
    prom: Option<String>,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,

    /// Payload format: "remote-write" (snappy protobuf) or "text".
    #[arg(long, default_value_t = Encoding::RemoteWrite)]
    format: Encoding,

    /// Seconds to sleep between collection cycles.
    #[arg(long, default_value_t = DEFAULT_INTERVAL.as_secs())]
    interval: u64,

    /// HTTP request timeout in seconds (0 disables the timeout).
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Path to the kernel neighbor table.
    #[arg(long, default_value = DEFAULT_NEIGHBOR_TABLE)]
    neighbor_table: PathBuf,
}

impl Args {
    fn into_config(self, endpoint: &str) -> Result<ExporterConfig, ConfigError> {
        Ok(ExporterConfig::new(endpoint)?
            .with_encoding(self.format)
            .with_interval_secs(self.interval)?
            .with_timeout_secs(self.timeout)
            .with_neighbor_table(self.neighbor_table)
            .with_debug(self.debug))
    }
}

/// Initializes the tracing subscriber.
/// Default level is INFO; `--debug` raises it to DEBUG, `-q` lowers it to ERROR.
fn init_logging(debug: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("ethtool_exporter={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();

    let Some(endpoint) = args.prom.clone() else {
        eprintln!("{}", USAGE);
        process::exit(1);
    };

    let quiet = args.quiet;
    let config = match args.into_config(&endpoint) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    init_logging(config.debug, quiet);

    info!(
        "ethtool-exporter {} starting (commit {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_SHA")
    );
    info!(
        "Config: endpoint={}, format={}, interval={}s, neighbor_table={}",
        config.endpoint,
        config.encoding,
        config.interval.as_secs(),
        config.neighbor_table.display()
    );
    match config.timeout {
        Some(timeout) => debug!("HTTP timeout: {}s", timeout.as_secs()),
        None => warn!("HTTP timeout disabled, a stalled endpoint will block collection"),
    }

    let stats = match stats::open_default() {
        Ok(stats) => stats,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    debug!("Ethtool handle initialized successfully");

    let pusher = match HttpPusher::new(config.endpoint.clone(), config.timeout) {
        Ok(pusher) => pusher,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let fs = RealFs::new();
    if !fs.exists(&config.neighbor_table) {
        warn!(
            "{} does not exist yet, cycles will be skipped until it appears",
            config.neighbor_table.display()
        );
    }
    let discoverer = InterfaceDiscoverer::new(fs, config.neighbor_table.clone());
    let mut scheduler = Scheduler::new(discoverer, stats, pusher, SystemClock)
        .with_encoding(config.encoding)
        .with_interval(config.interval);

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let cycles = scheduler.run(&running);
    info!("Shutting down after {} cycles", cycles);
}
