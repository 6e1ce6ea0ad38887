//! Bridge noise boundary
//!
//! The native bridge reports transport chatter (raw event objects, websocket
//! protocol errors) that is never actionable. [`GuardedBridge`] wraps every
//! call into the bridge and screens its errors and unsolicited notices
//! through a [`NoiseFilter`]. Nothing outside the wrapped bridge is touched.

use crate::bridge::{BridgeNotice, PrintBridge, RawPrintJob, TransportState};
use crate::error::{BridgeError, BridgeResult};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, error, trace, warn};

/// Content signatures of known bridge noise
pub const NOISE_SIGNATURES: &[&str] = &[
    "[object Event]",
    "WebSocket",
    "jsprintmanager",
    "JSPrintManager",
    "ws://",
    "wss://",
];

const NOTICE_CAPACITY: usize = 64;

/// Substring matcher over a fixed signature set
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    signatures: Vec<String>,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self {
            signatures: NOISE_SIGNATURES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NoiseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signature, e.g. for a different bridge vendor
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signatures.push(signature.into());
        self
    }

    pub fn is_noise(&self, text: &str) -> bool {
        self.signatures.iter().any(|sig| text.contains(sig.as_str()))
    }

    pub fn is_noise_error(&self, err: &BridgeError) -> bool {
        self.is_noise(&err.to_string())
    }

    pub fn is_noise_notice(&self, notice: &BridgeNotice) -> bool {
        self.is_noise(&notice.message)
            || notice.source.as_deref().is_some_and(|s| self.is_noise(s))
    }
}

/// Bridge wrapper that screens errors through a [`NoiseFilter`]
#[derive(Debug, Clone)]
pub struct GuardedBridge {
    inner: Arc<dyn PrintBridge>,
    filter: NoiseFilter,
    notices: broadcast::Sender<BridgeNotice>,
    /// Bridge notices buffered since construction, until the drain takes them
    pending: Arc<Mutex<Option<broadcast::Receiver<BridgeNotice>>>>,
    drain_installed: Arc<AtomicBool>,
}

impl GuardedBridge {
    pub fn new(inner: Arc<dyn PrintBridge>, filter: NoiseFilter) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let pending = inner.notices();
        Self {
            inner,
            filter,
            notices,
            pending: Arc::new(Mutex::new(pending)),
            drain_installed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn filter(&self) -> &NoiseFilter {
        &self.filter
    }

    /// Genuine (non-noise) notices from the bridge
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeNotice> {
        self.notices.subscribe()
    }

    /// Start draining the bridge's notice stream
    ///
    /// The bridge stream is subscribed when the wrapper is built, so notices
    /// raised before this call are still screened. Only the first call
    /// installs the drain task; later calls return `false`. Must run inside
    /// a tokio runtime.
    pub fn install_notice_filter(&self) -> bool {
        if self.drain_installed.swap(true, Ordering::SeqCst) {
            return false;
        }
        let Some(mut rx) = self.pending.lock().take() else {
            debug!("Bridge has no notice stream");
            return true;
        };

        let filter = self.filter.clone();
        let tx = self.notices.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notice) if filter.is_noise_notice(&notice) => {
                        trace!(message = %notice.message, "Suppressed bridge noise");
                    }
                    Ok(notice) => {
                        error!(
                            message = %notice.message,
                            source = ?notice.source,
                            "Bridge reported an error"
                        );
                        let _ = tx.send(notice);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Bridge notice stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        true
    }

    fn screen<T>(&self, op: &'static str, result: BridgeResult<T>) -> BridgeResult<T> {
        if let Err(e) = &result {
            if self.filter.is_noise_error(e) {
                trace!(op, error = %e, "Bridge noise");
            } else {
                warn!(op, error = %e, "Bridge call failed");
            }
        }
        result
    }

    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.inner.set_auto_reconnect(enabled);
    }

    pub async fn start(&self) -> BridgeResult<()> {
        let result = self.inner.start().await;
        self.screen("start", result)
    }

    pub fn transport_state(&self) -> BridgeResult<TransportState> {
        self.screen("transport_state", self.inner.transport_state())
    }

    pub async fn printers(&self) -> BridgeResult<Vec<String>> {
        let result = self.inner.printers().await;
        self.screen("printers", result)
    }

    pub async fn dispatch(&self, job: RawPrintJob) -> BridgeResult<()> {
        let result = self.inner.dispatch(job).await;
        self.screen("dispatch", result)
    }
}
