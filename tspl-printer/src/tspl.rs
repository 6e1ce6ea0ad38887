//! TSPL command generation
//!
//! [`TsplBuilder`] is a thin fluent writer over the command grammar.
//! [`TsplEncoder`] lays barcode labels out on 2-up (or n-up) strips and
//! drives the builder.

use tracing::{debug, instrument};

use crate::config::LabelConfig;
use crate::encoding::sanitize_field;
use crate::label::BarcodeLabel;
use crate::layout::{LayoutProfile, StripGeometry, format_inches, truncate};

/// Brand line printed at the top of every label
pub const DEFAULT_BRAND: &str = "SONAKSHI BOUTIQUE";

/// Prefix placed in front of the raw price string
pub const DEFAULT_PRICE_PREFIX: &str = "Rs.";

const DENSITY: u8 = 10;
const SPEED: u8 = 3;

/// TEXT alignment field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left = 1,
    Center = 2,
    Right = 3,
}

/// Which slot(s) of a strip a single-label print should fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotPosition {
    Left,
    Right,
    #[default]
    Both,
}

impl SlotPosition {
    /// Column indices this position covers on a strip with `columns` slots
    pub fn columns(self, columns: usize) -> Vec<usize> {
        let columns = columns.max(1);
        match self {
            SlotPosition::Left => vec![0],
            SlotPosition::Right => vec![columns - 1],
            SlotPosition::Both => (0..columns).collect(),
        }
    }
}

impl std::str::FromStr for SlotPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(SlotPosition::Left),
            "right" => Ok(SlotPosition::Right),
            "both" => Ok(SlotPosition::Both),
            other => Err(format!("unknown slot position: {}", other)),
        }
    }
}

// ============================================================================
// Command builder
// ============================================================================

/// String-based TSPL command builder
///
/// Every directive is terminated with CRLF. Field content passed to
/// [`TsplBuilder::text`] and [`TsplBuilder::barcode`] is written verbatim;
/// callers sanitize it first.
#[derive(Debug, Default)]
pub struct TsplBuilder {
    buf: String,
}

impl TsplBuilder {
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(1024),
        }
    }

    fn line(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self.buf.push_str("\r\n");
        self
    }

    // === Header ===

    /// SIZE in inches (already formatted)
    pub fn size(&mut self, width: &str, height: &str) -> &mut Self {
        self.line(&format!("SIZE {},{}", width, height))
    }

    /// GAP in inches with zero offset
    pub fn gap(&mut self, gap: &str) -> &mut Self {
        self.line(&format!("GAP {},0", gap))
    }

    pub fn direction(&mut self, direction: u8) -> &mut Self {
        self.line(&format!("DIRECTION {}", direction))
    }

    pub fn density(&mut self, density: u8) -> &mut Self {
        self.line(&format!("DENSITY {}", density))
    }

    pub fn speed(&mut self, speed: u8) -> &mut Self {
        self.line(&format!("SPEED {}", speed))
    }

    /// Write the five job header directives for `config`
    pub fn header(&mut self, config: &LabelConfig) -> &mut Self {
        self.size(
            &format_inches(config.strip_width_mm()),
            &format_inches(config.height),
        )
        .gap(&format_inches(config.gap))
        .direction(config.direction)
        .density(DENSITY)
        .speed(SPEED)
    }

    // === Strip body ===

    /// Clear the image buffer
    pub fn cls(&mut self) -> &mut Self {
        self.line("CLS")
    }

    /// Unrotated, unscaled TEXT element
    pub fn text(&mut self, x: u32, y: u32, font: &str, align: Align, content: &str) -> &mut Self {
        self.line(&format!(
            "TEXT {},{},\"{}\",0,1,1,{},\"{}\"",
            x, y, font, align as u8, content
        ))
    }

    /// Code128 barcode without its built-in caption
    pub fn barcode(
        &mut self,
        x: u32,
        y: u32,
        height: u32,
        narrow: u32,
        wide: u32,
        content: &str,
    ) -> &mut Self {
        self.line(&format!(
            "BARCODE {},{},\"128\",{},0,0,{},{},\"{}\"",
            x, y, height, narrow, wide, content
        ))
    }

    pub fn print(&mut self, copies: u32) -> &mut Self {
        self.line(&format!("PRINT {}", copies))
    }

    // === Build ===

    pub fn finalize(self) -> String {
        self.buf
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

// ============================================================================
// Label encoder
// ============================================================================

/// Lays barcode labels out onto strips and emits the TSPL job
#[derive(Debug, Clone)]
pub struct TsplEncoder {
    config: LabelConfig,
    profile: LayoutProfile,
    brand: String,
    price_prefix: String,
}

impl TsplEncoder {
    /// Encoder for `config` with the primary layout
    ///
    /// An invalid config is degraded to usable geometry rather than rejected.
    pub fn new(config: &LabelConfig) -> Self {
        Self {
            config: config.sanitized(),
            profile: LayoutProfile::primary(),
            brand: DEFAULT_BRAND.to_string(),
            price_prefix: DEFAULT_PRICE_PREFIX.to_string(),
        }
    }

    pub fn with_profile(mut self, profile: LayoutProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    pub fn with_price_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.price_prefix = prefix.into();
        self
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    pub fn profile(&self) -> &LayoutProfile {
        &self.profile
    }

    /// Number of strips `label_count` labels occupy
    pub fn strip_count(&self, label_count: usize) -> usize {
        label_count.div_ceil(self.config.columns)
    }

    /// Encode labels (one entry per physical label) into a full job
    ///
    /// Labels fill strips `columns` at a time in input order; a short final
    /// group leaves the trailing slots empty. Each strip ends with
    /// `PRINT copies`.
    #[instrument(skip(self, labels), fields(labels = labels.len(), profile = self.profile.name))]
    pub fn generate(&self, labels: &[BarcodeLabel], copies: u32) -> String {
        let geo = StripGeometry::new(&self.config);
        let mut b = TsplBuilder::new();
        b.header(&self.config);

        for strip in labels.chunks(self.config.columns) {
            b.cls();
            for (col, label) in strip.iter().enumerate() {
                self.write_label(&mut b, &geo, col, label);
            }
            b.print(copies.max(1));
        }

        debug!(strips = self.strip_count(labels.len()), "tspl job generated");
        b.finalize()
    }

    /// One strip with `label` in the chosen slot(s)
    pub fn generate_single(&self, label: &BarcodeLabel, position: SlotPosition, copies: u32) -> String {
        let geo = StripGeometry::new(&self.config);
        let mut b = TsplBuilder::new();
        b.header(&self.config).cls();
        for col in position.columns(self.config.columns) {
            self.write_label(&mut b, &geo, col, label);
        }
        b.print(copies.max(1));
        b.finalize()
    }

    /// Alignment strip: "TEST" plus a LEFT/RIGHT marker in every slot
    pub fn generate_test_label(&self) -> String {
        let geo = StripGeometry::new(&self.config);
        let mut b = TsplBuilder::new();
        b.header(&self.config).cls();
        for col in 0..self.config.columns {
            let marker = if col == 0 { "LEFT" } else { "RIGHT" };
            b.text(geo.center(col), 30, "2", Align::Center, "TEST")
                .text(geo.center(col), 60, "1", Align::Center, marker);
        }
        b.print(1);
        b.finalize()
    }

    fn write_label(&self, b: &mut TsplBuilder, geo: &StripGeometry, col: usize, label: &BarcodeLabel) {
        let p = &self.profile;
        let rows = p.rows();
        let x = geo.center(col);
        let barcode = sanitize_field(label.barcode());

        b.text(x, rows.brand, p.brand_font, Align::Center, &sanitize_field(&self.brand))
            .barcode(
                geo.offset(col) + p.barcode_inset,
                rows.barcode,
                p.barcode_height,
                p.barcode_narrow,
                p.barcode_wide,
                &barcode,
            )
            .text(x, rows.barcode_text, p.barcode_text_font, Align::Center, &barcode);

        if let Some(name) = label.product_name() {
            let name = truncate(name, p.name_max_chars);
            b.text(x, rows.product_name, p.name_font, Align::Center, &sanitize_field(&name));
        }

        if let Some(price) = label.price() {
            let price = format!("{}{}", self.price_prefix, price);
            b.text(x, rows.price, p.price_font, Align::Center, &sanitize_field(&price));
        }
    }
}

impl Default for TsplEncoder {
    fn default() -> Self {
        Self::new(&LabelConfig::default())
    }
}

/// Encode a batch with the primary layout
pub fn generate_tspl_commands(labels: &[BarcodeLabel], copies: u32, config: &LabelConfig) -> String {
    TsplEncoder::new(config).generate(labels, copies)
}

/// Encode one label into selected slot(s) with the compact layout
pub fn generate_single_label_tspl(
    label: &BarcodeLabel,
    position: SlotPosition,
    copies: u32,
    config: &LabelConfig,
) -> String {
    TsplEncoder::new(config)
        .with_profile(LayoutProfile::compact())
        .generate_single(label, position, copies)
}

pub fn generate_test_label(config: &LabelConfig) -> String {
    TsplEncoder::new(config).generate_test_label()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saree() -> BarcodeLabel {
        BarcodeLabel::new("8901234")
            .unwrap()
            .with_product_name("Silk Saree")
            .with_price("2499")
    }

    fn count(haystack: &str, line_prefix: &str) -> usize {
        haystack
            .split("\r\n")
            .filter(|l| l.starts_with(line_prefix))
            .count()
    }

    #[test]
    fn test_builder_basic() {
        let mut b = TsplBuilder::new();
        b.cls().text(10, 20, "3", Align::Center, "hi").print(2);
        assert_eq!(
            b.finalize(),
            "CLS\r\nTEXT 10,20,\"3\",0,1,1,2,\"hi\"\r\nPRINT 2\r\n"
        );
    }

    #[test]
    fn test_single_label_exact_output() {
        let out = generate_tspl_commands(&[saree()], 1, &LabelConfig::default());
        let expected = concat!(
            "SIZE 3.07,0.98\r\n",
            "GAP 0.08,0\r\n",
            "DIRECTION 1\r\n",
            "DENSITY 10\r\n",
            "SPEED 3\r\n",
            "CLS\r\n",
            "TEXT 152,10,\"3\",0,1,1,2,\"SONAKSHI BOUTIQUE\"\r\n",
            "BARCODE 10,40,\"128\",50,0,0,2,2,\"8901234\"\r\n",
            "TEXT 152,98,\"2\",0,1,1,2,\"8901234\"\r\n",
            "TEXT 152,122,\"3\",0,1,1,2,\"Silk Saree\"\r\n",
            "TEXT 152,150,\"4\",0,1,1,2,\"Rs.2499\"\r\n",
            "PRINT 1\r\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_pairs_into_strips() {
        let labels: Vec<_> = (0..5)
            .map(|i| BarcodeLabel::new(format!("B{i}")).unwrap())
            .collect();
        let out = generate_tspl_commands(&labels, 1, &LabelConfig::default());
        assert_eq!(count(&out, "CLS"), 3);
        assert_eq!(count(&out, "PRINT "), 3);
        assert_eq!(count(&out, "SIZE "), 1);
        assert_eq!(count(&out, "BARCODE "), 5);
        // second slot of the first strip sits at offset 320 + inset 10
        assert!(out.contains("BARCODE 330,40,\"128\",50,0,0,2,2,\"B1\"\r\n"));
        // the last strip holds only B4, in the left slot
        let last = out.rsplit("CLS\r\n").next().unwrap();
        assert!(last.contains("BARCODE 10,40,\"128\",50,0,0,2,2,\"B4\""));
        assert_eq!(count(last, "BARCODE "), 1);
    }

    #[test]
    fn test_strip_count_follows_columns() {
        let labels: Vec<_> = (0..7)
            .map(|i| BarcodeLabel::new(format!("{i}")).unwrap())
            .collect();
        let config = LabelConfig {
            columns: 3,
            ..LabelConfig::default()
        };
        let out = generate_tspl_commands(&labels, 1, &config);
        assert_eq!(count(&out, "CLS"), 3);
        assert_eq!(TsplEncoder::new(&config).strip_count(7), 3);
    }

    #[test]
    fn test_empty_batch_is_header_only() {
        let out = generate_tspl_commands(&[], 1, &LabelConfig::default());
        assert_eq!(count(&out, "CLS"), 0);
        assert_eq!(count(&out, "PRINT"), 0);
        assert!(out.starts_with("SIZE "));
    }

    #[test]
    fn test_copies_multiplier_per_strip() {
        let out = generate_tspl_commands(&[saree(), saree(), saree()], 4, &LabelConfig::default());
        assert_eq!(count(&out, "PRINT 4"), 2);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let label = BarcodeLabel::new("777").unwrap();
        let out = generate_tspl_commands(&[label], 1, &LabelConfig::default());
        assert_eq!(count(&out, "TEXT "), 2);
        assert!(!out.contains("Rs."));
    }

    #[test]
    fn test_long_name_truncated() {
        let label = BarcodeLabel::new("1")
            .unwrap()
            .with_product_name("Banarasi Silk Saree Red");
        let out = generate_tspl_commands(&[label.clone()], 1, &LabelConfig::default());
        assert!(out.contains("\"Banarasi Silk Sa..\""));

        let out = generate_single_label_tspl(&label, SlotPosition::Left, 1, &LabelConfig::default());
        assert!(out.contains("\"Banarasi Silk ..\""));
    }

    #[test]
    fn test_quotes_escaped() {
        let label = BarcodeLabel::new("1")
            .unwrap()
            .with_product_name("12\" Scarf");
        let out = generate_tspl_commands(&[label], 1, &LabelConfig::default());
        assert!(out.contains("\"12\\[\"] Scarf\""));
    }

    #[test]
    fn test_single_label_positions() {
        let config = LabelConfig::default();
        let left = generate_single_label_tspl(&saree(), SlotPosition::Left, 1, &config);
        assert_eq!(count(&left, "BARCODE "), 1);
        assert!(left.contains("BARCODE 10,32,\"128\",45,"));
        assert!(left.contains("TEXT 152,8,\"2\",0,1,1,2,\"SONAKSHI BOUTIQUE\""));

        let right = generate_single_label_tspl(&saree(), SlotPosition::Right, 3, &config);
        assert!(right.contains("BARCODE 330,32,"));
        assert!(right.ends_with("PRINT 3\r\n"));

        let both = generate_single_label_tspl(&saree(), SlotPosition::Both, 1, &config);
        assert_eq!(count(&both, "CLS"), 1);
        assert_eq!(count(&both, "BARCODE "), 2);
        assert!(both.contains("TEXT 472,122,\"3\",0,1,1,2,\"Rs.2499\""));
    }

    #[test]
    fn test_test_label() {
        let out = generate_test_label(&LabelConfig::default());
        assert_eq!(count(&out, "CLS"), 1);
        assert!(out.contains("TEXT 152,30,\"2\",0,1,1,2,\"TEST\""));
        assert!(out.contains("TEXT 152,60,\"1\",0,1,1,2,\"LEFT\""));
        assert!(out.contains("TEXT 472,60,\"1\",0,1,1,2,\"RIGHT\""));
        assert!(out.ends_with("PRINT 1\r\n"));
    }

    #[test]
    fn test_invalid_config_degrades() {
        let config = LabelConfig {
            columns: 0,
            dpi: 0,
            ..LabelConfig::default()
        };
        let out = generate_tspl_commands(&[saree(), saree()], 1, &config);
        assert_eq!(count(&out, "CLS"), 2);
    }

    #[test]
    fn test_oversized_config_degrades() {
        let config = LabelConfig {
            dpi: u32::MAX,
            columns: 100_000,
            ..LabelConfig::default()
        };
        let out = generate_tspl_commands(&[saree(), saree()], 1, &config);
        assert_eq!(count(&out, "CLS"), 1);

        let single = generate_single_label_tspl(&saree(), SlotPosition::Both, 1, &config);
        assert_eq!(count(&single, "BARCODE"), crate::config::MAX_COLUMNS);
        let test = generate_test_label(&config);
        assert_eq!(test.matches("\"TEST\"").count(), crate::config::MAX_COLUMNS);
    }

    #[test]
    fn test_custom_brand_and_prefix() {
        let out = TsplEncoder::default()
            .with_brand("ACME")
            .with_price_prefix("INR ")
            .generate(&[saree()], 1);
        assert!(out.contains("\"ACME\""));
        assert!(out.contains("\"INR 2499\""));
    }

    #[test]
    fn test_slot_position_parse() {
        assert_eq!("LEFT".parse::<SlotPosition>().unwrap(), SlotPosition::Left);
        assert!("middle".parse::<SlotPosition>().is_err());
        assert_eq!(SlotPosition::Right.columns(1), vec![0]);
    }
}
