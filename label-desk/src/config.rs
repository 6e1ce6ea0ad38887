//! Desk configuration from environment variables
//!
//! A `.env` file is loaded first when present. Unset or unparsable values
//! fall back to the defaults below.

use crate::connection::{ConnectionManagerBuilder, DEFAULT_PREFERRED_PRINTERS, PrinterConnectionManager};
use crate::monitor::{ConnectionMonitor, DEFAULT_CHECK_INTERVAL, DEFAULT_INITIAL_DELAY};
use crate::retry::RetryPolicy;
use std::str::FromStr;
use std::time::Duration;
use tspl_printer::{DEFAULT_BRAND, DEFAULT_PRICE_PREFIX, LabelConfig, LayoutProfile, TsplEncoder};

#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub label: LabelConfig,
    pub retry: RetryPolicy,
    pub status_poll_interval: Duration,
    pub initial_refresh_delay: Duration,
    pub preferred_printers: Vec<String>,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub brand: String,
    pub price_prefix: String,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl DeskConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = LabelConfig::default();
        let retry = RetryPolicy::default();
        let millis = |key: &str, default: Duration| {
            Duration::from_millis(parse_or(lookup(key), default.as_millis() as u64))
        };

        let label = LabelConfig {
            width: parse_or(lookup("LABEL_WIDTH_MM"), base.width),
            height: parse_or(lookup("LABEL_HEIGHT_MM"), base.height),
            gap: parse_or(lookup("LABEL_GAP_MM"), base.gap),
            direction: parse_or(lookup("LABEL_DIRECTION"), base.direction),
            dpi: parse_or(lookup("LABEL_DPI"), base.dpi),
            columns: parse_or(lookup("LABEL_COLUMNS"), base.columns),
            column_gap: parse_or(lookup("LABEL_COLUMN_GAP_MM"), base.column_gap),
        };

        let retry = RetryPolicy {
            grace: millis("BRIDGE_GRACE_MS", retry.grace),
            interval: millis("BRIDGE_POLL_INTERVAL_MS", retry.interval),
            max_attempts: parse_or(lookup("BRIDGE_MAX_ATTEMPTS"), retry.max_attempts),
            deadline: millis("BRIDGE_DEADLINE_MS", retry.deadline),
        };

        let preferred_printers = match lookup("PREFERRED_PRINTERS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_PREFERRED_PRINTERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        Self {
            label,
            retry,
            status_poll_interval: millis("STATUS_POLL_INTERVAL_MS", DEFAULT_CHECK_INTERVAL),
            initial_refresh_delay: millis("INITIAL_REFRESH_DELAY_MS", DEFAULT_INITIAL_DELAY),
            preferred_printers,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: lookup("LOG_DIR").filter(|d| !d.is_empty()),
            brand: lookup("BRAND_TEXT").unwrap_or_else(|| DEFAULT_BRAND.into()),
            price_prefix: lookup("PRICE_PREFIX").unwrap_or_else(|| DEFAULT_PRICE_PREFIX.into()),
        }
    }

    pub fn label_config(&self) -> &LabelConfig {
        &self.label
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Primary-layout encoder with the configured brand and price prefix
    pub fn encoder(&self) -> TsplEncoder {
        TsplEncoder::new(&self.label)
            .with_brand(self.brand.clone())
            .with_price_prefix(self.price_prefix.clone())
    }

    pub fn compact_encoder(&self) -> TsplEncoder {
        self.encoder().with_profile(LayoutProfile::compact())
    }

    pub fn connection_builder(&self) -> ConnectionManagerBuilder {
        PrinterConnectionManager::builder()
            .retry_policy(self.retry)
            .preferred_printers(self.preferred_printers.iter().cloned())
    }

    pub fn monitor(&self, manager: PrinterConnectionManager) -> ConnectionMonitor {
        ConnectionMonitor::new(manager, self.status_poll_interval)
            .with_initial_delay(self.initial_refresh_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DeskConfig::default();
        assert_eq!(config.label, LabelConfig::default());
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.status_poll_interval, Duration::from_secs(10));
        assert_eq!(config.initial_refresh_delay, Duration::from_millis(100));
        assert_eq!(config.preferred_printers, ["tsc", "te244"]);
        assert_eq!(config.log_level, "info");
        assert!(config.log_dir.is_none());
        assert_eq!(config.brand, DEFAULT_BRAND);
    }

    #[test]
    fn test_overrides() {
        let config = DeskConfig::from_lookup(lookup_from(&[
            ("LABEL_WIDTH_MM", "50"),
            ("LABEL_COLUMNS", "3"),
            ("BRIDGE_MAX_ATTEMPTS", "4"),
            ("BRIDGE_DEADLINE_MS", "6000"),
            ("PREFERRED_PRINTERS", " Zebra , ,TSC "),
            ("PRICE_PREFIX", "₹"),
        ]));
        assert_eq!(config.label.width, 50.0);
        assert_eq!(config.label.columns, 3);
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.deadline, Duration::from_secs(6));
        assert_eq!(config.preferred_printers, ["zebra", "tsc"]);
        assert_eq!(config.price_prefix, "₹");
    }

    #[test]
    fn test_unparsable_falls_back() {
        let config = DeskConfig::from_lookup(lookup_from(&[
            ("LABEL_DPI", "lots"),
            ("BRIDGE_GRACE_MS", "-1"),
        ]));
        assert_eq!(config.label.dpi, 203);
        assert_eq!(config.retry.grace, Duration::from_millis(500));
    }

    #[test]
    fn test_encoder_uses_brand() {
        let config = DeskConfig::from_lookup(lookup_from(&[("BRAND_TEXT", "MY SHOP")]));
        let label = tspl_printer::BarcodeLabel::new("8901234").unwrap();
        let out = config.encoder().generate(&[label], 1);
        assert!(out.contains("\"MY SHOP\""));
        assert_eq!(config.compact_encoder().profile().name, "compact");
    }
}
