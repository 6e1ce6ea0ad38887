//! In-process bridge with a scriptable transport
//!
//! Records every dispatched job. Used by tests and demos in place of the
//! native client.

use super::{BridgeNotice, PrintBridge, RawPrintJob, TransportState};
use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Debug)]
pub struct MemoryBridge {
    state: Mutex<TransportState>,
    /// Transport reads after `start` before the flag flips to open
    opens_after: Option<u32>,
    reads: AtomicU32,
    /// Status reads fail while set
    read_error: Mutex<Option<String>>,
    start_error: Option<String>,
    dispatch_error: Option<String>,
    start_delay: Duration,
    printers: Vec<String>,
    jobs: Mutex<Vec<RawPrintJob>>,
    start_calls: AtomicUsize,
    auto_reconnect: AtomicBool,
    notices: broadcast::Sender<BridgeNotice>,
}

impl Default for MemoryBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBridge {
    /// Bridge whose transport is open on the first read after `start`
    pub fn new() -> Self {
        let (notices, _) = broadcast::channel(32);
        Self {
            state: Mutex::new(TransportState::Closed),
            opens_after: Some(1),
            reads: AtomicU32::new(0),
            read_error: Mutex::new(None),
            start_error: None,
            dispatch_error: None,
            start_delay: Duration::ZERO,
            printers: vec!["TSC TE244".to_string()],
            jobs: Mutex::new(Vec::new()),
            start_calls: AtomicUsize::new(0),
            auto_reconnect: AtomicBool::new(false),
            notices,
        }
    }

    /// Transport opens on the `reads`-th status read after `start`
    pub fn opening_after(reads: u32) -> Self {
        Self {
            opens_after: Some(reads.max(1)),
            ..Self::new()
        }
    }

    /// Transport stays in `Connecting` forever
    pub fn never_opening() -> Self {
        Self {
            opens_after: None,
            ..Self::new()
        }
    }

    pub fn failing_start(reason: impl Into<String>) -> Self {
        Self {
            start_error: Some(reason.into()),
            ..Self::new()
        }
    }

    pub fn failing_dispatch(mut self, reason: impl Into<String>) -> Self {
        self.dispatch_error = Some(reason.into());
        self
    }

    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn with_printers<I, S>(mut self, printers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.printers = printers.into_iter().map(Into::into).collect();
        self
    }

    /// Force the transport flag (simulates drops and reconnects)
    pub fn set_state(&self, state: TransportState) {
        *self.state.lock() = state;
    }

    /// Make status reads fail (`Some`) or succeed again (`None`)
    pub fn set_read_error(&self, reason: Option<&str>) {
        *self.read_error.lock() = reason.map(str::to_string);
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn jobs(&self) -> Vec<RawPrintJob> {
        self.jobs.lock().clone()
    }

    pub fn auto_reconnect(&self) -> bool {
        self.auto_reconnect.load(Ordering::SeqCst)
    }

    /// Emit an unsolicited error; returns how many receivers saw it
    pub fn emit_notice(&self, notice: BridgeNotice) -> usize {
        self.notices.send(notice).unwrap_or(0)
    }

    fn ensure_open(&self) -> BridgeResult<()> {
        match *self.state.lock() {
            TransportState::Open => Ok(()),
            state => Err(BridgeError::Transport(format!(
                "transport is {:?}",
                state
            ))),
        }
    }
}

#[async_trait]
impl PrintBridge for MemoryBridge {
    fn set_auto_reconnect(&self, enabled: bool) {
        self.auto_reconnect.store(enabled, Ordering::SeqCst);
    }

    async fn start(&self) -> BridgeResult<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }
        if let Some(reason) = &self.start_error {
            return Err(BridgeError::Transport(reason.clone()));
        }
        self.reads.store(0, Ordering::SeqCst);
        *self.state.lock() = TransportState::Connecting;
        Ok(())
    }

    fn transport_state(&self) -> BridgeResult<TransportState> {
        if let Some(reason) = self.read_error.lock().as_ref() {
            return Err(BridgeError::Transport(reason.clone()));
        }
        let mut state = self.state.lock();
        if *state == TransportState::Connecting
            && let Some(threshold) = self.opens_after
        {
            let reads = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            if reads >= threshold {
                *state = TransportState::Open;
            }
        }
        Ok(*state)
    }

    async fn printers(&self) -> BridgeResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.printers.clone())
    }

    async fn dispatch(&self, job: RawPrintJob) -> BridgeResult<()> {
        if let Some(reason) = &self.dispatch_error {
            return Err(BridgeError::Dispatch(reason.clone()));
        }
        self.ensure_open()?;
        self.jobs.lock().push(job);
        Ok(())
    }

    fn notices(&self) -> Option<broadcast::Receiver<BridgeNotice>> {
        Some(self.notices.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::PrinterTarget;

    #[tokio::test]
    async fn test_transport_opens_after_scripted_reads() {
        let bridge = MemoryBridge::opening_after(3);
        assert_eq!(bridge.transport_state().unwrap(), TransportState::Closed);

        bridge.start().await.unwrap();
        assert_eq!(bridge.transport_state().unwrap(), TransportState::Connecting);
        assert_eq!(bridge.transport_state().unwrap(), TransportState::Connecting);
        assert_eq!(bridge.transport_state().unwrap(), TransportState::Open);
        assert_eq!(bridge.start_calls(), 1);
    }

    #[test]
    fn test_scripted_read_error() {
        let bridge = MemoryBridge::new();
        bridge.set_read_error(Some("adapter gone"));
        assert!(matches!(
            bridge.transport_state(),
            Err(BridgeError::Transport(ref m)) if m == "adapter gone"
        ));
        bridge.set_read_error(None);
        assert_eq!(bridge.transport_state().unwrap(), TransportState::Closed);
    }

    #[tokio::test]
    async fn test_dispatch_requires_open_transport() {
        let bridge = MemoryBridge::new();
        let job = RawPrintJob::new(PrinterTarget::Default, "CLS\r\n");
        assert!(bridge.dispatch(job.clone()).await.is_err());

        bridge.start().await.unwrap();
        bridge.transport_state().unwrap();
        bridge.dispatch(job.clone()).await.unwrap();
        assert_eq!(bridge.jobs(), vec![job]);
    }

    #[tokio::test]
    async fn test_failing_dispatch() {
        let bridge = MemoryBridge::new().failing_dispatch("paper out");
        bridge.set_state(TransportState::Open);
        let err = bridge
            .dispatch(RawPrintJob::new(PrinterTarget::Default, "PRINT 1\r\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Dispatch(ref m) if m == "paper out"));
        assert!(bridge.jobs().is_empty());
    }
}
