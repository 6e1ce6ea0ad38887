//! Print bridge capability
//!
//! The bridge is the external client that owns the real connection to the
//! printer driver. The desk only sees it through [`PrintBridge`]; whether one
//! exists at all is resolved once into a [`BridgeSlot`].

mod memory;
mod network;

pub use memory::MemoryBridge;
pub use network::NetworkBridge;

use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Where users download the bridge client app
pub const BRIDGE_DOWNLOAD_URL: &str = "https://www.neodynamic.com/downloads/jspm/";

/// Transport flag reported by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Started but not open yet
    Connecting,
    Open,
    Closed,
}

/// Printer a job is bound to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PrinterTarget {
    /// Bridge's default printer
    #[default]
    Default,
    Named(String),
}

impl PrinterTarget {
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some(n) if !n.is_empty() => PrinterTarget::Named(n.to_string()),
            _ => PrinterTarget::Default,
        }
    }
}

impl fmt::Display for PrinterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterTarget::Default => f.write_str("<default>"),
            PrinterTarget::Named(name) => f.write_str(name),
        }
    }
}

/// Raw command payload bound to a printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPrintJob {
    pub target: PrinterTarget,
    pub commands: String,
}

impl RawPrintJob {
    pub fn new(target: PrinterTarget, commands: impl Into<String>) -> Self {
        Self {
            target,
            commands: commands.into(),
        }
    }
}

/// Unsolicited error report from the bridge
///
/// These arrive outside of any call (socket events, background reconnects).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeNotice {
    pub message: String,
    pub source: Option<String>,
}

impl BridgeNotice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Capability surface consumed from the bridge
#[async_trait]
pub trait PrintBridge: Send + Sync + fmt::Debug {
    /// Toggle the bridge's own reconnect loop
    fn set_auto_reconnect(&self, enabled: bool);

    /// Start the transport; completes before the transport is open
    async fn start(&self) -> BridgeResult<()>;

    /// Cheap read of the transport flag
    fn transport_state(&self) -> BridgeResult<TransportState>;

    /// Installed printer names
    async fn printers(&self) -> BridgeResult<Vec<String>>;

    async fn dispatch(&self, job: RawPrintJob) -> BridgeResult<()>;

    /// Stream of unsolicited errors, if the bridge produces any
    fn notices(&self) -> Option<broadcast::Receiver<BridgeNotice>> {
        None
    }
}

/// Loads the bridge adapter
#[async_trait]
pub trait BridgeLoader: Send + Sync {
    async fn load(&self) -> BridgeResult<Arc<dyn PrintBridge>>;
}

#[async_trait]
impl<F, Fut> BridgeLoader for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = BridgeResult<Arc<dyn PrintBridge>>> + Send,
{
    async fn load(&self) -> BridgeResult<Arc<dyn PrintBridge>> {
        (self)().await
    }
}

/// Bridge adapter resolved once at startup
#[derive(Debug, Clone)]
pub enum BridgeSlot {
    Available(Arc<dyn PrintBridge>),
    /// No adapter; carries the reason
    Unavailable(String),
}

impl BridgeSlot {
    pub async fn load(loader: &dyn BridgeLoader) -> Self {
        match loader.load().await {
            Ok(bridge) => {
                info!("Print bridge loaded");
                BridgeSlot::Available(bridge)
            }
            Err(e) => {
                warn!(error = %e, download = BRIDGE_DOWNLOAD_URL, "Print bridge not available");
                BridgeSlot::Unavailable(e.to_string())
            }
        }
    }

    pub fn from_bridge(bridge: impl PrintBridge + 'static) -> Self {
        BridgeSlot::Available(Arc::new(bridge))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        BridgeSlot::Unavailable(reason.into())
    }

    pub fn is_available(&self) -> bool {
        matches!(self, BridgeSlot::Available(_))
    }

    pub fn bridge(&self) -> BridgeResult<&Arc<dyn PrintBridge>> {
        match self {
            BridgeSlot::Available(bridge) => Ok(bridge),
            BridgeSlot::Unavailable(reason) => Err(BridgeError::Unavailable(reason.clone())),
        }
    }
}
