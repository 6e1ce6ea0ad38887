//! # label-desk
//!
//! Barcode label printing for the shop counter.
//!
//! ## Scope
//!
//! This crate decides WHAT to print and when:
//! - Connection state over the print bridge ([`PrinterConnectionManager`])
//! - Background status polling ([`ConnectionMonitor`])
//! - The label queue and its print actions ([`PrintQueue`], [`LabelDesk`])
//!
//! Command generation lives in `tspl-printer`.
//!
//! ## Example
//!
//! ```ignore
//! use label_desk::{BridgeSlot, DeskConfig, LabelDesk, MemoryBridge};
//!
//! let config = DeskConfig::from_env();
//! let manager = config
//!     .connection_builder()
//!     .build(BridgeSlot::from_bridge(MemoryBridge::new()));
//! let desk: LabelDesk = LabelDesk::with_encoders(
//!     manager.clone(),
//!     config.encoder(),
//!     config.compact_encoder(),
//! );
//!
//! desk.add_to_queue(BarcodeLabel::new("8901234")?, 2)?;
//! let result = desk.print_all().await;
//! ```

pub mod bridge;
pub mod config;
pub mod connection;
pub mod desk;
pub mod error;
pub mod logger;
pub mod monitor;
pub mod noise;
pub mod queue;
pub mod retry;
pub mod status;

// Re-exports
pub use bridge::{
    BRIDGE_DOWNLOAD_URL, BridgeLoader, BridgeNotice, BridgeSlot, MemoryBridge, NetworkBridge,
    PrintBridge, PrinterTarget, RawPrintJob, TransportState,
};
pub use config::DeskConfig;
pub use connection::{
    ConnectionManagerBuilder, MSG_NOT_CONNECTED, MSG_NOT_INSTALLED, MSG_SENT,
    PrinterConnectionManager,
};
pub use desk::{LabelDesk, MSG_NO_ITEMS, MSG_PRINT_IN_PROGRESS};
pub use error::{BridgeError, BridgeResult, QueueError};
pub use monitor::ConnectionMonitor;
pub use noise::{GuardedBridge, NOISE_SIGNATURES, NoiseFilter};
pub use queue::{LabelSource, MAX_COPIES, MIN_COPIES, PrintQueue, QueueEntry, clamp_copies};
pub use retry::{PollOutcome, RetryPolicy, poll_until_open};
pub use status::{ConnectionSnapshot, ConnectionStatus, PrintResult};

pub use tspl_printer::{BarcodeLabel, LabelConfig, SlotPosition};
