//! Bridge over raw TCP printers
//!
//! Networked TSC printers take the command stream directly on port 9100, so
//! no client app is involved. The transport counts as open while at least one
//! configured printer answered the last reachability check.

use super::{PrintBridge, PrinterTarget, RawPrintJob, TransportState};
use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tracing::{debug, info, instrument};
use tspl_printer::{NetworkPrinter, Printer, encode_commands};

const STATE_CLOSED: u8 = 0;
const STATE_CONNECTING: u8 = 1;
const STATE_OPEN: u8 = 2;

#[derive(Debug)]
pub struct NetworkBridge {
    printers: Vec<(String, NetworkPrinter)>,
    state: AtomicU8,
    auto_reconnect: AtomicBool,
}

impl NetworkBridge {
    pub fn new() -> Self {
        Self {
            printers: Vec::new(),
            state: AtomicU8::new(STATE_CLOSED),
            auto_reconnect: AtomicBool::new(false),
        }
    }

    /// Register a printer under a display name; the first one is the default
    pub fn with_printer(mut self, name: impl Into<String>, printer: NetworkPrinter) -> Self {
        self.printers.push((name.into(), printer));
        self
    }

    fn set_state(&self, state: u8) {
        self.state.store(state, Ordering::SeqCst);
    }

    fn resolve(&self, target: &PrinterTarget) -> BridgeResult<&NetworkPrinter> {
        let found = match target {
            PrinterTarget::Default => self.printers.first(),
            PrinterTarget::Named(name) => self.printers.iter().find(|(n, _)| n == name),
        };
        found
            .map(|(_, printer)| printer)
            .ok_or_else(|| BridgeError::Dispatch(format!("Unknown printer: {}", target)))
    }
}

impl Default for NetworkBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrintBridge for NetworkBridge {
    fn set_auto_reconnect(&self, enabled: bool) {
        self.auto_reconnect.store(enabled, Ordering::SeqCst);
    }

    #[instrument(skip(self), fields(printers = self.printers.len()))]
    async fn start(&self) -> BridgeResult<()> {
        if self.printers.is_empty() {
            return Err(BridgeError::Unavailable("no network printers configured".into()));
        }
        self.set_state(STATE_CONNECTING);

        for (name, printer) in &self.printers {
            match printer.ensure_online().await {
                Ok(()) => {
                    info!(printer = %name, addr = %printer.addr(), "Network printer reachable");
                    self.set_state(STATE_OPEN);
                    return Ok(());
                }
                Err(e) => debug!(printer = %name, error = %e, "Network printer not reachable"),
            }
        }

        self.set_state(STATE_CLOSED);
        Ok(())
    }

    fn transport_state(&self) -> BridgeResult<TransportState> {
        Ok(match self.state.load(Ordering::SeqCst) {
            STATE_OPEN => TransportState::Open,
            STATE_CONNECTING => TransportState::Connecting,
            _ => TransportState::Closed,
        })
    }

    async fn printers(&self) -> BridgeResult<Vec<String>> {
        Ok(self.printers.iter().map(|(name, _)| name.clone()).collect())
    }

    #[instrument(skip(self, job), fields(target = %job.target, bytes = job.commands.len()))]
    async fn dispatch(&self, job: RawPrintJob) -> BridgeResult<()> {
        let printer = self.resolve(&job.target)?;
        match printer.print(&encode_commands(&job.commands)).await {
            Ok(()) => {
                self.set_state(STATE_OPEN);
                Ok(())
            }
            Err(e) => {
                if self.auto_reconnect.load(Ordering::SeqCst) {
                    self.set_state(STATE_CONNECTING);
                } else {
                    self.set_state(STATE_CLOSED);
                }
                Err(e.into())
            }
        }
    }
}
