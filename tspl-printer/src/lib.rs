//! # tspl-printer
//!
//! TSPL barcode label library - low-level label printing only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - Label stock geometry (mm → dots, column offsets, text truncation)
//! - TSPL command building for n-up label strips
//! - Field sanitizing and code page encoding
//! - Network printing (TCP port 9100)
//!
//! Deciding WHAT to print and talking to the print bridge belongs to
//! `label-desk`.
//!
//! ## Example
//!
//! ```ignore
//! use tspl_printer::{BarcodeLabel, LabelConfig, TsplEncoder};
//!
//! let label = BarcodeLabel::new("8901234")?
//!     .with_product_name("Silk Saree")
//!     .with_price("2499");
//!
//! let commands = TsplEncoder::new(&LabelConfig::default()).generate(&[label], 1);
//! ```

mod config;
mod encoding;
mod error;
mod label;
mod layout;
mod printer;
mod tspl;

// Re-exports
pub use config::{FALLBACK_DPI, LabelConfig, MAX_COLUMNS, MAX_DIMENSION_MM, MAX_DPI};
pub use encoding::{QUOTE_ESCAPE, encode_commands, sanitize_field};
pub use error::{LabelError, LabelResult};
pub use label::BarcodeLabel;
pub use layout::{
    ELLIPSIS, LayoutProfile, RowPositions, StripGeometry, format_inches, mm_to_dots, mm_to_inches,
    truncate,
};
pub use printer::{NetworkPrinter, Printer, RAW_PORT};
pub use tspl::{
    Align, DEFAULT_BRAND, DEFAULT_PRICE_PREFIX, SlotPosition, TsplBuilder, TsplEncoder,
    generate_single_label_tspl, generate_test_label, generate_tspl_commands,
};
