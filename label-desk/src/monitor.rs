//! Connection Monitor - background status polling
//!
//! Runs one full refresh shortly after startup, then re-reads the transport
//! flag on a fixed interval and publishes it. Never starts a connection
//! attempt after the first refresh; the bridge's own auto-reconnect does that.

use crate::connection::PrinterConnectionManager;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(100);

pub struct ConnectionMonitor {
    manager: PrinterConnectionManager,
    check_interval: Duration,
    initial_delay: Duration,
}

impl ConnectionMonitor {
    pub fn new(manager: PrinterConnectionManager, check_interval: Duration) -> Self {
        Self {
            manager,
            check_interval,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Run until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = sleep(self.initial_delay) => {}
        }

        tokio::select! {
            _ = shutdown.cancelled() => return,
            snapshot = self.manager.refresh() => {
                info!(
                    status = %snapshot.status,
                    printers = snapshot.printers.len(),
                    selected = ?snapshot.selected_printer,
                    "Initial printer refresh"
                );
            }
        }

        let mut ticker = interval_at(Instant::now() + self.check_interval, self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Connection monitor stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let previous = self.manager.status();
                    let status = self.manager.refresh_status();
                    if status != previous {
                        info!(%previous, %status, "Printer connection changed");
                    }
                }
            }
        }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
