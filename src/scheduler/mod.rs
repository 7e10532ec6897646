//! Fixed-interval collection loop.
//!
//! The scheduler alternates between two states. In `Collecting` it runs one
//! cycle: discover interfaces, then for each one fetch counters, encode and
//! push. In `Idle` it sleeps for the configured interval. Failures are
//! contained: a discovery failure ends the cycle early, any other failure
//! only skips the interface it happened on.

mod clock;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::collector::{FileSystem, InterfaceDiscoverer};
use crate::error::{DiscoveryError, ExportError};
use crate::metrics::{Batch, Encoding};
use crate::push::Pusher;
use crate::stats::StatsProvider;

pub use clock::{Clock, MockClock, SystemClock};

/// Default pause between the end of one cycle and the start of the next.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Granularity at which the idle sleep checks for shutdown.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Collecting,
}

/// Result of exporting one interface.
#[derive(Debug)]
pub enum InterfaceOutcome {
    /// Batch delivered; `status` is the backend's 2xx answer. A driver with
    /// no counters still pushes an empty batch (`samples == 0`).
    Pushed { samples: usize, status: u16 },
    /// Stats, encoding or delivery failed.
    Failed(ExportError),
}

#[derive(Debug)]
pub struct InterfaceReport {
    pub interface: String,
    pub outcome: InterfaceOutcome,
}

/// What happened during one cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Set when the neighbor table could not be read; `interfaces` is then empty.
    pub discovery_error: Option<DiscoveryError>,
    pub interfaces: Vec<InterfaceReport>,
}

impl CycleReport {
    /// Number of interfaces whose batch was delivered.
    pub fn pushed(&self) -> usize {
        self.interfaces
            .iter()
            .filter(|r| matches!(r.outcome, InterfaceOutcome::Pushed { .. }))
            .count()
    }

    /// Number of interfaces skipped because of an error.
    pub fn failed(&self) -> usize {
        self.interfaces
            .iter()
            .filter(|r| matches!(r.outcome, InterfaceOutcome::Failed(_)))
            .count()
    }

    /// Total samples delivered across all interfaces.
    pub fn samples(&self) -> usize {
        self.interfaces
            .iter()
            .map(|r| match r.outcome {
                InterfaceOutcome::Pushed { samples, .. } => samples,
                _ => 0,
            })
            .sum()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.discovery_error.is_some() {
            return write!(f, "discovery failed");
        }
        write!(
            f,
            "{} interfaces, {} pushed ({} samples), {} failed",
            self.interfaces.len(),
            self.pushed(),
            self.samples(),
            self.failed()
        )
    }
}

/// Drives discovery, collection, encoding and delivery on a fixed interval.
pub struct Scheduler<F, S, P, C>
where
    F: FileSystem,
    S: StatsProvider,
    P: Pusher,
    C: Clock,
{
    discoverer: InterfaceDiscoverer<F>,
    stats: S,
    pusher: P,
    clock: C,
    encoding: Encoding,
    interval: Duration,
    state: SchedulerState,
}

impl<F, S, P, C> Scheduler<F, S, P, C>
where
    F: FileSystem,
    S: StatsProvider,
    P: Pusher,
    C: Clock,
{
    /// Creates a scheduler using remote-write encoding and a 30 s interval.
    pub fn new(discoverer: InterfaceDiscoverer<F>, stats: S, pusher: P, clock: C) -> Self {
        Self {
            discoverer,
            stats,
            pusher,
            clock,
            encoding: Encoding::default(),
            interval: DEFAULT_INTERVAL,
            state: SchedulerState::Idle,
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs cycles until `running` is cleared.
    ///
    /// The flag is checked before each cycle and while idling, so shutdown
    /// takes effect after the in-flight cycle completes. Returns the number
    /// of cycles run.
    pub fn run(&mut self, running: &AtomicBool) -> u64 {
        info!(
            "Starting collection loop (interval={}s, format={})",
            self.interval.as_secs(),
            self.encoding
        );

        let mut cycles: u64 = 0;
        while running.load(Ordering::SeqCst) {
            let report = self.run_cycle();
            cycles += 1;
            info!("Cycle #{}: {}", cycles, report);

            self.idle(running);
        }
        cycles
    }

    /// Runs exactly one collection cycle.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.state = SchedulerState::Collecting;
        debug!("Starting collection cycle");

        let report = match self.discoverer.discover() {
            Ok(interfaces) => CycleReport {
                discovery_error: None,
                interfaces: interfaces
                    .into_iter()
                    .map(|interface| {
                        let outcome = self.collect_interface(&interface);
                        InterfaceReport { interface, outcome }
                    })
                    .collect(),
            },
            Err(e) => {
                warn!("Failed to get interfaces: {}", e);
                CycleReport {
                    discovery_error: Some(e),
                    interfaces: Vec::new(),
                }
            }
        };

        self.state = SchedulerState::Idle;
        report
    }

    fn collect_interface(&self, interface: &str) -> InterfaceOutcome {
        debug!("Collecting stats for interface: {}", interface);

        match self.export_interface(interface) {
            Ok(outcome) => {
                if let InterfaceOutcome::Pushed { samples, status } = &outcome {
                    debug!(
                        "Pushed {} metrics for {} (HTTP {})",
                        samples, interface, status
                    );
                }
                outcome
            }
            Err(e) => {
                warn!("Failed to export {}: {}", interface, e);
                InterfaceOutcome::Failed(e)
            }
        }
    }

    fn export_interface(&self, interface: &str) -> Result<InterfaceOutcome, ExportError> {
        let counters = self.stats.interface_stats(interface)?;

        let batch = Batch::new(interface, &counters, self.clock.now_unix_millis());
        if batch.is_empty() {
            debug!("No driver counters for {}", interface);
        }

        let payload = self.encoding.encode(&batch)?;
        let status = self.pusher.push(&payload)?;

        Ok(InterfaceOutcome::Pushed {
            samples: batch.len(),
            status,
        })
    }

    /// Sleeps for the interval in short slices, returning early on shutdown.
    fn idle(&self, running: &AtomicBool) {
        debug!("Sleeping for {} seconds", self.interval.as_secs());

        let mut remaining = self.interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let slice = remaining.min(SLEEP_SLICE);
            self.clock.sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
    }
}
