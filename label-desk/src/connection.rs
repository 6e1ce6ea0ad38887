//! Printer connection manager
//!
//! Owns the connection status, the selected printer, and the single in-flight
//! connection attempt. Cheap to clone; every clone shares the same state.
//!
//! None of the public operations return bridge errors. Failures surface as a
//! [`ConnectionStatus`], an empty printer list, or a failed [`PrintResult`].

use crate::bridge::{BridgeLoader, BridgeNotice, BridgeSlot, PrinterTarget, RawPrintJob, TransportState};
use crate::error::BridgeError;
use crate::noise::{GuardedBridge, NoiseFilter};
use crate::retry::{PollOutcome, RetryPolicy, poll_until_open};
use crate::status::{ConnectionSnapshot, ConnectionStatus, PrintResult};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

pub const MSG_SENT: &str = "Print job sent successfully!";
pub const MSG_NOT_CONNECTED: &str =
    "Printer service not connected. Please ensure the print bridge is running.";
pub const MSG_NOT_INSTALLED: &str = "Print bridge not available. Please install the client app.";

/// Default name hints for auto-selecting the label printer
pub const DEFAULT_PREFERRED_PRINTERS: &[&str] = &["tsc", "te244"];

type Attempt = Shared<BoxFuture<'static, ConnectionStatus>>;

/// Builder for [`PrinterConnectionManager`]
#[derive(Debug, Clone)]
pub struct ConnectionManagerBuilder {
    policy: RetryPolicy,
    filter: NoiseFilter,
    preferred: Vec<String>,
}

impl Default for ConnectionManagerBuilder {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            filter: NoiseFilter::default(),
            preferred: DEFAULT_PREFERRED_PRINTERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ConnectionManagerBuilder {
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn noise_filter(mut self, filter: NoiseFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Case-insensitive name fragments used to auto-select a printer
    pub fn preferred_printers<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred = hints
            .into_iter()
            .map(|h| h.into().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        self
    }

    pub fn build(self, slot: BridgeSlot) -> PrinterConnectionManager {
        let bridge = match slot {
            BridgeSlot::Available(bridge) => Ok(GuardedBridge::new(bridge, self.filter)),
            BridgeSlot::Unavailable(reason) => Err(reason),
        };
        let (status, _) = watch::channel(ConnectionStatus::NotInstalled);

        PrinterConnectionManager {
            inner: Arc::new(Inner {
                bridge,
                policy: self.policy,
                preferred: self.preferred,
                status,
                in_flight: Mutex::new(None),
                next_attempt: AtomicU64::new(0),
                selected: Mutex::new(None),
            }),
        }
    }
}

struct Inner {
    /// Guarded bridge, or why there is none
    bridge: Result<GuardedBridge, String>,
    policy: RetryPolicy,
    preferred: Vec<String>,
    status: watch::Sender<ConnectionStatus>,
    in_flight: Mutex<Option<(u64, Attempt)>>,
    next_attempt: AtomicU64,
    selected: Mutex<Option<String>>,
}

impl Inner {
    fn publish(&self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            debug!(%previous, %status, "Connection status changed");
        }
    }

    async fn connect(&self) -> ConnectionStatus {
        let bridge = match &self.bridge {
            Ok(bridge) => bridge,
            Err(reason) => {
                debug!(%reason, "No bridge to connect");
                return ConnectionStatus::NotInstalled;
            }
        };
        bridge.install_notice_filter();

        match tokio::time::timeout(self.policy.deadline, self.open_transport(bridge)).await {
            Ok(status) => status,
            Err(_) => {
                let err = BridgeError::ConnectionTimeout(format!(
                    "no open transport within {} ms",
                    self.policy.deadline.as_millis()
                ));
                warn!(error = %err, "Bridge connection deadline reached");
                ConnectionStatus::Disconnected
            }
        }
    }

    async fn open_transport(&self, bridge: &GuardedBridge) -> ConnectionStatus {
        bridge.set_auto_reconnect(true);
        if bridge.start().await.is_err() {
            return ConnectionStatus::NotInstalled;
        }

        match poll_until_open(&self.policy, || bridge.transport_state()).await {
            PollOutcome::Open { attempt } => {
                info!(attempt, "Print bridge connected");
                ConnectionStatus::Connected
            }
            PollOutcome::Exhausted => {
                let err = BridgeError::ConnectionTimeout(format!(
                    "transport still closed after {} attempts",
                    self.policy.max_attempts
                ));
                warn!(error = %err, "Print bridge did not open; auto-reconnect stays enabled");
                ConnectionStatus::Disconnected
            }
            PollOutcome::Failed(_) => ConnectionStatus::NotInstalled,
        }
    }
}

/// Connection state machine over the print bridge
#[derive(Clone)]
pub struct PrinterConnectionManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for PrinterConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrinterConnectionManager")
            .field("status", &self.status())
            .field("available", &self.is_available())
            .field("selected", &self.selected_printer())
            .finish()
    }
}

impl PrinterConnectionManager {
    pub fn builder() -> ConnectionManagerBuilder {
        ConnectionManagerBuilder::default()
    }

    pub fn new(slot: BridgeSlot) -> Self {
        Self::builder().build(slot)
    }

    /// Resolve the bridge through `loader` and build with defaults
    pub async fn load(loader: &dyn BridgeLoader) -> Self {
        Self::new(BridgeSlot::load(loader).await)
    }

    pub fn is_available(&self) -> bool {
        self.inner.bridge.is_ok()
    }

    /// Why the bridge is unavailable, if it is
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.inner.bridge.as_ref().err().map(String::as_str)
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.policy
    }

    /// Last published status
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }

    /// Genuine bridge errors that arrive outside any call
    pub fn subscribe_notices(&self) -> Option<broadcast::Receiver<BridgeNotice>> {
        self.inner.bridge.as_ref().ok().map(GuardedBridge::subscribe)
    }

    /// Connect to the bridge, sharing any attempt already in flight
    ///
    /// Concurrent callers await the same attempt and see the same status.
    /// A new attempt starts only once the previous one has completed.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> ConnectionStatus {
        let attempt = {
            let mut in_flight = self.inner.in_flight.lock();
            match in_flight.as_ref() {
                Some((_, attempt)) if attempt.peek().is_none() => {
                    debug!("Joining in-flight connection attempt");
                    attempt.clone()
                }
                _ => {
                    if self.get_status() == ConnectionStatus::Connected {
                        self.inner.publish(ConnectionStatus::Connected);
                        return ConnectionStatus::Connected;
                    }
                    let id = self.inner.next_attempt.fetch_add(1, Ordering::Relaxed);
                    let attempt = self.spawn_attempt(id);
                    *in_flight = Some((id, attempt.clone()));
                    attempt
                }
            }
        };
        attempt.await
    }

    /// Run one attempt as its own task
    ///
    /// The task keeps running if every caller gives up, and clears its
    /// in-flight slot when done. Only the task holds the shared state, so a
    /// dropped manager is released once the attempt ends.
    fn spawn_attempt(&self, id: u64) -> Attempt {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let status = inner.connect().await;
            inner.publish(status);
            let mut in_flight = inner.in_flight.lock();
            if in_flight.as_ref().is_some_and(|(current, _)| *current == id) {
                *in_flight = None;
            }
            status
        });

        handle
            .map(|joined| match joined {
                Ok(status) => status,
                Err(e) => {
                    warn!(error = %e, "Connection attempt task failed");
                    ConnectionStatus::Disconnected
                }
            })
            .boxed()
            .shared()
    }

    /// Read the transport flag without connecting
    pub fn get_status(&self) -> ConnectionStatus {
        let Ok(bridge) = &self.inner.bridge else {
            return ConnectionStatus::NotInstalled;
        };
        match bridge.transport_state() {
            Ok(TransportState::Open) => ConnectionStatus::Connected,
            Ok(TransportState::Connecting) => ConnectionStatus::Checking,
            Ok(TransportState::Closed) => ConnectionStatus::Disconnected,
            Err(_) => ConnectionStatus::NotInstalled,
        }
    }

    /// [`get_status`](Self::get_status), then publish the result
    pub fn refresh_status(&self) -> ConnectionStatus {
        let status = self.get_status();
        self.inner.publish(status);
        status
    }

    /// Installed printer names; empty on any failure
    pub async fn list_printers(&self) -> Vec<String> {
        let Ok(bridge) = &self.inner.bridge else {
            return Vec::new();
        };
        if !self.get_status().is_connected() {
            self.initialize().await;
        }
        bridge.printers().await.unwrap_or_default()
    }

    /// Send a raw command stream
    ///
    /// Without an explicit `printer` the selected printer is used, then the
    /// bridge default.
    #[instrument(skip(self, commands), fields(bytes = commands.len()))]
    pub async fn send(&self, commands: &str, printer: Option<&str>) -> PrintResult {
        let Ok(bridge) = &self.inner.bridge else {
            return PrintResult::failure(MSG_NOT_INSTALLED);
        };

        if !self.get_status().is_connected() {
            match self.initialize().await {
                ConnectionStatus::Connected => {}
                ConnectionStatus::NotInstalled => return PrintResult::failure(MSG_NOT_INSTALLED),
                _ => return PrintResult::failure(MSG_NOT_CONNECTED),
            }
        }

        let target = match printer {
            Some(name) => PrinterTarget::from_name(Some(name)),
            None => PrinterTarget::from_name(self.selected_printer().as_deref()),
        };
        debug!(%target, "Dispatching print job");

        match bridge.dispatch(RawPrintJob::new(target, commands)).await {
            Ok(()) => {
                info!("Print job sent");
                PrintResult::success(MSG_SENT)
            }
            Err(e) => PrintResult::failure(format!("Print failed: {}", e)),
        }
    }

    /// Manual refresh: connect, list printers, and auto-select one
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> ConnectionSnapshot {
        self.inner.publish(ConnectionStatus::Checking);
        let status = self.initialize().await;

        let printers = if status.is_connected() {
            self.list_printers().await
        } else {
            Vec::new()
        };

        if self.selected_printer().is_none()
            && let Some(preferred) = self.pick_preferred(&printers)
        {
            info!(printer = %preferred, "Auto-selected label printer");
            self.select_printer(Some(preferred));
        }

        ConnectionSnapshot {
            status,
            printers,
            selected_printer: self.selected_printer(),
        }
    }

    fn pick_preferred(&self, printers: &[String]) -> Option<String> {
        printers
            .iter()
            .find(|name| {
                let lower = name.to_lowercase();
                self.inner.preferred.iter().any(|hint| lower.contains(hint))
            })
            .cloned()
    }

    pub fn select_printer(&self, printer: Option<String>) {
        *self.inner.selected.lock() = printer.filter(|p| !p.is_empty());
    }

    pub fn selected_printer(&self) -> Option<String> {
        self.inner.selected.lock().clone()
    }
}
