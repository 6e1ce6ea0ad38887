//! Label geometry
//!
//! Pure helpers that turn millimetre label stock into device dots and
//! place elements on a strip. Nothing here performs I/O.

use crate::config::LabelConfig;

const MM_PER_INCH: f64 = 25.4;

/// Marker appended to truncated text
pub const ELLIPSIS: &str = "..";

/// Convert millimetres to device dots at the given resolution
pub fn mm_to_dots(mm: f64, dpi: u32) -> u32 {
    let dots = (mm / MM_PER_INCH * dpi as f64).round();
    if dots.is_finite() && dots > 0.0 {
        dots as u32
    } else {
        0
    }
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

/// Inches with two decimals, as SIZE and GAP expect
pub fn format_inches(mm: f64) -> String {
    format!("{:.2}", mm_to_inches(mm))
}

/// Keep at most `max_chars` characters, marking a cut with [`ELLIPSIS`]
///
/// Text at or under the limit passes through unchanged. Longer text keeps
/// its first `max_chars - 2` characters. The result never exceeds the
/// limit, so truncating twice equals truncating once.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Horizontal geometry of one strip, in dots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripGeometry {
    pub label_width: u32,
    pub column_gap: u32,
    pub columns: usize,
}

impl StripGeometry {
    pub fn new(config: &LabelConfig) -> Self {
        Self {
            label_width: mm_to_dots(config.width, config.dpi),
            column_gap: mm_to_dots(config.column_gap, config.dpi),
            columns: config.columns.max(1),
        }
    }

    /// Left edge of column `col` (0-based)
    pub fn offset(&self, col: usize) -> u32 {
        let col = u32::try_from(col).unwrap_or(u32::MAX);
        col.saturating_mul(self.label_width.saturating_add(self.column_gap))
    }

    /// Horizontal centre of column `col`
    pub fn center(&self, col: usize) -> u32 {
        // round(w / 2) for non-negative integers
        self.offset(col).saturating_add(self.label_width.div_ceil(2))
    }
}

/// Vertical layout profile
///
/// Each element sits at a fixed cursor position; the cursor advances by a
/// constant after every element whether or not an optional element was
/// drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutProfile {
    pub name: &'static str,
    /// Cursor position of the brand line
    pub top: u32,
    pub brand_font: &'static str,
    /// Advance from brand line to barcode
    pub brand_advance: u32,
    pub barcode_height: u32,
    /// Offset of the barcode from the column's left edge
    pub barcode_inset: u32,
    pub barcode_narrow: u32,
    pub barcode_wide: u32,
    /// Space between bottom of bars and the human readable line
    pub barcode_text_gap: u32,
    pub barcode_text_font: &'static str,
    /// Advance from human readable line to product name
    pub barcode_text_advance: u32,
    pub name_font: &'static str,
    pub name_max_chars: usize,
    /// Advance from product name to price
    pub name_advance: u32,
    pub price_font: &'static str,
}

impl LayoutProfile {
    /// Layout used for "print now" and queued batches
    pub fn primary() -> Self {
        Self {
            name: "primary",
            top: 10,
            brand_font: "3",
            brand_advance: 30,
            barcode_height: 50,
            barcode_inset: 10,
            barcode_narrow: 2,
            barcode_wide: 2,
            barcode_text_gap: 8,
            barcode_text_font: "2",
            barcode_text_advance: 24,
            name_font: "3",
            name_max_chars: 18,
            name_advance: 28,
            price_font: "4",
        }
    }

    /// Tighter layout with smaller fonts, used for single-slot prints
    pub fn compact() -> Self {
        Self {
            name: "compact",
            top: 8,
            brand_font: "2",
            brand_advance: 24,
            barcode_height: 45,
            barcode_inset: 10,
            barcode_narrow: 2,
            barcode_wide: 2,
            barcode_text_gap: 5,
            barcode_text_font: "2",
            barcode_text_advance: 20,
            name_font: "2",
            name_max_chars: 16,
            name_advance: 20,
            price_font: "3",
        }
    }

    pub fn rows(&self) -> RowPositions {
        let brand = self.top;
        let barcode = brand + self.brand_advance;
        let barcode_text = barcode + self.barcode_height + self.barcode_text_gap;
        let product_name = barcode_text + self.barcode_text_advance;
        let price = product_name + self.name_advance;
        RowPositions {
            brand,
            barcode,
            barcode_text,
            product_name,
            price,
        }
    }
}

impl Default for LayoutProfile {
    fn default() -> Self {
        Self::primary()
    }
}

/// Resolved vertical positions for every element of a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPositions {
    pub brand: u32,
    pub barcode: u32,
    pub barcode_text: u32,
    pub product_name: u32,
    pub price: u32,
}
