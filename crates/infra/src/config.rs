//! Configuration loading and representation.
//!
//! Read from `PANTRY_*` environment variables. Parsing works over any
//! key/value source so tests never touch the process environment.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};

pub use pantry_observability::LogFormat;

pub const LOG_FORMAT_VAR: &str = "PANTRY_LOG_FORMAT";
pub const UNKNOWN_USER_LABEL_VAR: &str = "PANTRY_UNKNOWN_USER_LABEL";
pub const BILLING_FALLBACK_VAR: &str = "PANTRY_BILLING_FALLBACK";

/// What the billing aggregator does with a month label it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillingFallback {
    /// Bill the current UTC month and log a warning.
    #[default]
    CurrentMonth,
    /// Fail with `InvalidMonthLabel`.
    Reject,
}

impl BillingFallback {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "current-month" | "current" => Ok(BillingFallback::CurrentMonth),
            "reject" => Ok(BillingFallback::Reject),
            other => bail!("unknown billing fallback '{other}' (expected current-month or reject)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PantryConfig {
    pub log_format: LogFormat,
    /// Rendered when the identity system cannot resolve a user.
    pub unknown_user_label: String,
    pub billing_fallback: BillingFallback,
}

impl Default for PantryConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            unknown_user_label: "Unknown".to_string(),
            billing_fallback: BillingFallback::default(),
        }
    }
}

impl PantryConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_pairs(std::env::vars())
    }

    /// Build from `(name, value)` pairs; unset variables take defaults.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let mut config = Self::default();

        if let Some(raw) = vars.get(LOG_FORMAT_VAR) {
            config.log_format = raw
                .parse::<LogFormat>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid {LOG_FORMAT_VAR}"))?;
        }

        if let Some(raw) = vars.get(UNKNOWN_USER_LABEL_VAR) {
            let label = raw.trim();
            if label.is_empty() {
                bail!("{UNKNOWN_USER_LABEL_VAR} cannot be empty");
            }
            config.unknown_user_label = label.to_string();
        }

        if let Some(raw) = vars.get(BILLING_FALLBACK_VAR) {
            config.billing_fallback =
                BillingFallback::parse(raw).with_context(|| format!("invalid {BILLING_FALLBACK_VAR}"))?;
        }

        Ok(config)
    }

    /// Install the process-wide tracing subscriber in the configured format.
    pub fn init_tracing(&self) {
        pantry_observability::init_with(self.log_format);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = PantryConfig::from_pairs(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config, PantryConfig::default());
        assert_eq!(config.unknown_user_label, "Unknown");
        assert_eq!(config.billing_fallback, BillingFallback::CurrentMonth);
    }

    #[test]
    fn reads_every_variable() {
        let config = PantryConfig::from_pairs([
            ("PANTRY_LOG_FORMAT", "pretty"),
            ("PANTRY_UNKNOWN_USER_LABEL", " (deleted user) "),
            ("PANTRY_BILLING_FALLBACK", "reject"),
            ("UNRELATED", "ignored"),
        ])
        .unwrap();

        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.unknown_user_label, "(deleted user)");
        assert_eq!(config.billing_fallback, BillingFallback::Reject);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = PantryConfig::from_pairs([("PANTRY_BILLING_FALLBACK", "guess")]).unwrap_err();
        assert!(format!("{err:#}").contains("PANTRY_BILLING_FALLBACK"));

        let err = PantryConfig::from_pairs([("PANTRY_LOG_FORMAT", "xml")]).unwrap_err();
        assert!(format!("{err:#}").contains("unknown log format"));

        assert!(PantryConfig::from_pairs([("PANTRY_UNKNOWN_USER_LABEL", "  ")]).is_err());
    }
}
