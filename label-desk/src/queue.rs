//! Print queue
//!
//! Ordered list of items to print, each with a copy count in
//! `[MIN_COPIES, MAX_COPIES]`. Flattening the queue gives the label sequence
//! the encoder paginates.

use std::fmt::Debug;
use tspl_printer::{BarcodeLabel, LabelResult};

pub const MIN_COPIES: u32 = 1;
pub const MAX_COPIES: u32 = 100;

pub fn clamp_copies(copies: i64) -> u32 {
    copies.clamp(MIN_COPIES as i64, MAX_COPIES as i64) as u32
}

/// Anything that can be rendered as a barcode label
pub trait LabelSource {
    /// Identity used for merging queue entries
    type Id: PartialEq + Clone + Debug;

    fn source_id(&self) -> Self::Id;

    fn to_label(&self) -> LabelResult<BarcodeLabel>;
}

impl LabelSource for BarcodeLabel {
    type Id = String;

    fn source_id(&self) -> String {
        self.barcode().to_string()
    }

    fn to_label(&self) -> LabelResult<BarcodeLabel> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry<S> {
    pub item: S,
    pub copies: u32,
}

#[derive(Debug, Clone)]
pub struct PrintQueue<S: LabelSource> {
    entries: Vec<QueueEntry<S>>,
    columns: usize,
}

impl<S: LabelSource> Default for PrintQueue<S> {
    fn default() -> Self {
        Self::new(2)
    }
}

impl<S: LabelSource> PrintQueue<S> {
    /// Queue for label stock with `columns` slots per strip
    pub fn new(columns: usize) -> Self {
        Self {
            entries: Vec::new(),
            columns: columns.max(1),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    fn position(&self, id: &S::Id) -> Option<usize> {
        self.entries.iter().position(|e| &e.item.source_id() == id)
    }

    /// Add an item, or add `copies` to its existing entry
    ///
    /// A merged entry keeps its position. Returns the resulting copy count.
    pub fn add_or_merge(&mut self, item: S, copies: u32) -> u32 {
        match self.position(&item.source_id()) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.copies = clamp_copies(entry.copies as i64 + copies as i64);
                entry.copies
            }
            None => {
                let copies = clamp_copies(copies as i64);
                self.entries.push(QueueEntry { item, copies });
                copies
            }
        }
    }

    pub fn remove(&mut self, id: &S::Id) -> Option<QueueEntry<S>> {
        self.position(id).map(|idx| self.entries.remove(idx))
    }

    /// Returns the new count, or `None` when the item is not queued
    pub fn adjust_copies(&mut self, id: &S::Id, delta: i64) -> Option<u32> {
        let idx = self.position(id)?;
        let entry = &mut self.entries[idx];
        entry.copies = clamp_copies((entry.copies as i64).saturating_add(delta));
        Some(entry.copies)
    }

    pub fn get(&self, id: &S::Id) -> Option<&QueueEntry<S>> {
        self.position(id).map(|idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[QueueEntry<S>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_labels(&self) -> usize {
        self.entries.iter().map(|e| e.copies as usize).sum()
    }

    pub fn total_strips(&self) -> usize {
        self.total_labels().div_ceil(self.columns)
    }

    /// One reference per physical label, in entry order
    pub fn flatten(&self) -> Vec<&S> {
        self.entries
            .iter()
            .flat_map(|e| std::iter::repeat_n(&e.item, e.copies as usize))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
