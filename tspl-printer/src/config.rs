//! Label stock configuration
//!
//! Describes the physical label roll: per-label size, feed gap, print
//! direction, printer resolution and how many labels sit side by side on
//! one strip.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{LabelError, LabelResult};

/// Resolution assumed when a config carries an unusable DPI
pub const FALLBACK_DPI: u32 = 203;

/// Highest resolution of any TSPL printer in use
pub const MAX_DPI: u32 = 600;

/// Most label slots a strip may hold
pub const MAX_COLUMNS: usize = 8;

/// Upper bound for any single millimetre dimension
pub const MAX_DIMENSION_MM: f64 = 500.0;

/// Physical label stock description (millimetres unless noted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelConfig {
    /// Width of a single label slot
    pub width: f64,
    /// Label height
    pub height: f64,
    /// Vertical gap between strips
    pub gap: f64,
    /// Print direction, 0 or 1
    pub direction: u8,
    /// Printer resolution in dots per inch
    pub dpi: u32,
    /// Label slots per strip
    pub columns: usize,
    /// Horizontal gap between slots
    pub column_gap: f64,
}

impl LabelConfig {
    /// TSC TE244 with 38x25mm 2-up stock
    pub fn tsc_te244() -> Self {
        Self {
            width: 38.0,
            height: 25.0,
            gap: 2.0,
            direction: 1,
            dpi: 203,
            columns: 2,
            column_gap: 2.0,
        }
    }

    /// Check the config for values the encoder cannot honour exactly
    pub fn validate(&self) -> LabelResult<()> {
        if self.columns == 0 || self.columns > MAX_COLUMNS {
            return Err(LabelError::InvalidConfig(format!(
                "columns must be between 1 and {}, got {}",
                MAX_COLUMNS, self.columns
            )));
        }
        if self.dpi == 0 || self.dpi > MAX_DPI {
            return Err(LabelError::InvalidConfig(format!(
                "dpi must be between 1 and {}, got {}",
                MAX_DPI, self.dpi
            )));
        }
        if self.direction > 1 {
            return Err(LabelError::InvalidConfig(format!(
                "direction must be 0 or 1, got {}",
                self.direction
            )));
        }
        for (name, value) in [
            ("width", self.width),
            ("height", self.height),
            ("gap", self.gap),
            ("columnGap", self.column_gap),
        ] {
            if !value.is_finite() || !(0.0..=MAX_DIMENSION_MM).contains(&value) {
                return Err(LabelError::InvalidConfig(format!(
                    "{} must be between 0 and {} mm, got {}",
                    name, MAX_DIMENSION_MM, value
                )));
            }
        }
        Ok(())
    }

    /// Best-effort copy that the encoder can always lay out
    pub fn sanitized(&self) -> Self {
        if let Err(e) = self.validate() {
            warn!(error = %e, "label config invalid, degrading geometry");
        } else {
            return self.clone();
        }

        let mm = |v: f64| {
            if v.is_finite() && v >= 0.0 {
                v.min(MAX_DIMENSION_MM)
            } else {
                0.0
            }
        };
        Self {
            width: mm(self.width),
            height: mm(self.height),
            gap: mm(self.gap),
            direction: self.direction.min(1),
            dpi: if self.dpi == 0 { FALLBACK_DPI } else { self.dpi.min(MAX_DPI) },
            columns: self.columns.clamp(1, MAX_COLUMNS),
            column_gap: mm(self.column_gap),
        }
    }

    /// Total strip width: every slot plus the gaps between them
    pub fn strip_width_mm(&self) -> f64 {
        let columns = self.columns.max(1);
        self.width * columns as f64 + self.column_gap * (columns - 1) as f64
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self::tsc_te244()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_te244() {
        let config = LabelConfig::default();
        assert_eq!(config.columns, 2);
        assert_eq!(config.dpi, 203);
        assert!(config.validate().is_ok());
        assert_eq!(config.strip_width_mm(), 78.0);
    }

    #[test]
    fn test_sanitized_fixes_columns_and_dpi() {
        let config = LabelConfig {
            columns: 0,
            dpi: 0,
            width: f64::NAN,
            ..LabelConfig::default()
        };
        assert!(config.validate().is_err());

        let fixed = config.sanitized();
        assert_eq!(fixed.columns, 1);
        assert_eq!(fixed.dpi, FALLBACK_DPI);
        assert_eq!(fixed.width, 0.0);
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn test_sanitized_caps_oversized_values() {
        let config = LabelConfig {
            dpi: u32::MAX,
            columns: usize::MAX,
            width: 1e12,
            ..LabelConfig::default()
        };
        assert!(config.validate().is_err());

        let fixed = config.sanitized();
        assert_eq!(fixed.dpi, MAX_DPI);
        assert_eq!(fixed.columns, MAX_COLUMNS);
        assert_eq!(fixed.width, MAX_DIMENSION_MM);
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"width":40,"height":30,"gap":3,"direction":0,"dpi":300,"columns":1,"columnGap":0}"#;
        let config: LabelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.dpi, 300);
        assert_eq!(config.columns, 1);
        assert_eq!(config.strip_width_mm(), 40.0);
    }
}
