//! Label desk: queue plus printing
//!
//! Ties the [`PrintQueue`] to the encoders and the connection manager. While
//! a queue print is in flight the queue is locked against edits.

use crate::connection::PrinterConnectionManager;
use crate::error::QueueError;
use crate::queue::{LabelSource, PrintQueue, QueueEntry, clamp_copies};
use crate::status::PrintResult;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, instrument, warn};
use tspl_printer::{BarcodeLabel, LabelConfig, LabelResult, LayoutProfile, SlotPosition, TsplEncoder};

pub const MSG_NO_ITEMS: &str = "No items selected";
pub const MSG_PRINT_IN_PROGRESS: &str = "A print job is already in progress";

/// Clears the printing flag on drop
struct PrintingGuard<'a>(&'a AtomicBool);

impl<'a> PrintingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PrintingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct LabelDesk<S: LabelSource = BarcodeLabel> {
    connection: PrinterConnectionManager,
    /// Queue and test-label layout
    encoder: TsplEncoder,
    /// Single-slot layout
    compact: TsplEncoder,
    queue: Mutex<PrintQueue<S>>,
    printing: AtomicBool,
}

impl<S: LabelSource> LabelDesk<S> {
    pub fn new(connection: PrinterConnectionManager, config: &LabelConfig) -> Self {
        let encoder = TsplEncoder::new(config);
        let compact = TsplEncoder::new(config).with_profile(LayoutProfile::compact());
        Self::with_encoders(connection, encoder, compact)
    }

    pub fn with_encoders(
        connection: PrinterConnectionManager,
        encoder: TsplEncoder,
        compact: TsplEncoder,
    ) -> Self {
        let columns = encoder.config().columns;
        Self {
            connection,
            encoder,
            compact,
            queue: Mutex::new(PrintQueue::new(columns)),
            printing: AtomicBool::new(false),
        }
    }

    pub fn connection(&self) -> &PrinterConnectionManager {
        &self.connection
    }

    pub fn is_printing(&self) -> bool {
        self.printing.load(Ordering::Acquire)
    }

    /// Lock the queue for editing; fails while a queue print is running
    fn edit_queue<T>(&self, edit: impl FnOnce(&mut PrintQueue<S>) -> T) -> Result<T, QueueError> {
        let mut queue = self.queue.lock();
        if self.is_printing() {
            return Err(QueueError::Busy);
        }
        Ok(edit(&mut queue))
    }

    /// Returns the entry's resulting copy count
    pub fn add_to_queue(&self, item: S, copies: u32) -> Result<u32, QueueError> {
        self.edit_queue(|q| q.add_or_merge(item, copies))
    }

    pub fn remove_from_queue(&self, id: &S::Id) -> Result<(), QueueError> {
        self.edit_queue(|q| {
            q.remove(id);
        })
    }

    pub fn adjust_copies(&self, id: &S::Id, delta: i64) -> Result<Option<u32>, QueueError> {
        self.edit_queue(|q| q.adjust_copies(id, delta))
    }

    pub fn clear_queue(&self) -> Result<(), QueueError> {
        self.edit_queue(PrintQueue::clear)
    }

    pub fn total_labels(&self) -> usize {
        self.queue.lock().total_labels()
    }

    pub fn total_strips(&self) -> usize {
        self.queue.lock().total_strips()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn queue_entries(&self) -> Vec<QueueEntry<S>>
    where
        S: Clone,
    {
        self.queue.lock().entries().to_vec()
    }

    /// Print every queued label; the queue is cleared only on success
    #[instrument(skip(self))]
    pub async fn print_all(&self) -> PrintResult {
        let Some(_guard) = PrintingGuard::acquire(&self.printing) else {
            warn!("Print requested while another is in flight");
            return PrintResult::failure(MSG_PRINT_IN_PROGRESS);
        };

        let labels = {
            let queue = self.queue.lock();
            if queue.is_empty() {
                return PrintResult::failure(MSG_NO_ITEMS);
            }
            queue
                .flatten()
                .into_iter()
                .map(LabelSource::to_label)
                .collect::<LabelResult<Vec<_>>>()
        };
        let labels = match labels {
            Ok(labels) => labels,
            Err(e) => return PrintResult::failure(format!("Print failed: {}", e)),
        };

        let strips = self.encoder.strip_count(labels.len());
        let commands = self.encoder.generate(&labels, 1);
        let result = self.connection.send(&commands, None).await;
        if !result.success {
            return result;
        }

        self.queue.lock().clear();
        info!(labels = labels.len(), strips, "Queue printed");
        PrintResult::success(format!(
            "Printed {} label(s) on {} strip(s)!",
            labels.len(),
            strips
        ))
    }

    /// Print one item now without touching the queue
    ///
    /// Refused while a queue print is in flight.
    #[instrument(skip(self, item))]
    pub async fn print_single(&self, item: &S, copies: u32) -> PrintResult {
        if self.is_printing() {
            warn!("Single print requested while the queue is printing");
            return PrintResult::failure(MSG_PRINT_IN_PROGRESS);
        }
        let label = match item.to_label() {
            Ok(label) => label,
            Err(e) => return PrintResult::failure(format!("Print failed: {}", e)),
        };
        let labels = vec![label; clamp_copies(copies as i64) as usize];
        let strips = self.encoder.strip_count(labels.len());
        let commands = self.encoder.generate(&labels, 1);
        let result = self.connection.send(&commands, None).await;
        if !result.success {
            return result;
        }

        info!(labels = labels.len(), strips, "Single item printed");
        PrintResult::success(format!(
            "Printed {} label(s) on {} strip(s)!",
            labels.len(),
            strips
        ))
    }

    /// Print one item into chosen slots of a single strip
    #[instrument(skip(self, item))]
    pub async fn print_single_slot(
        &self,
        item: &S,
        position: SlotPosition,
        copies: u32,
    ) -> PrintResult {
        let label = match item.to_label() {
            Ok(label) => label,
            Err(e) => return PrintResult::failure(format!("Print failed: {}", e)),
        };
        let commands = self
            .compact
            .generate_single(&label, position, clamp_copies(copies as i64));
        self.connection.send(&commands, None).await
    }

    /// Alignment test strip
    pub async fn print_test_label(&self) -> PrintResult {
        let commands = self.encoder.generate_test_label();
        self.connection.send(&commands, None).await
    }
}
