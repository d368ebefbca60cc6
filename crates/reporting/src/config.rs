//! Reporting configuration.

use serde::{Deserialize, Serialize};

use salesplan_core::{DomainError, DomainResult};

pub const ALERT_LOOKAHEAD_ENV: &str = "SALESPLAN_ALERT_LOOKAHEAD_DAYS";
pub const DUE_SOON_ENV: &str = "SALESPLAN_DUE_SOON_DAYS";

/// Thresholds used by the metrics aggregator and due-status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Unpaid installments due within this many days are alerted.
    pub alert_lookahead_days: u32,
    /// The next installment counts as due soon within this many days.
    pub due_soon_days: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            alert_lookahead_days: 7,
            due_soon_days: 3,
        }
    }
}

impl MetricsConfig {
    pub fn with_alert_lookahead_days(mut self, days: u32) -> Self {
        self.alert_lookahead_days = days;
        self
    }

    pub fn with_due_soon_days(mut self, days: u32) -> Self {
        self.due_soon_days = days;
        self
    }

    /// Defaults overridden by `SALESPLAN_ALERT_LOOKAHEAD_DAYS` and
    /// `SALESPLAN_DUE_SOON_DAYS` when set.
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DomainResult<Self> {
        let mut config = Self::default();
        if let Some(days) = parse_days(&lookup, ALERT_LOOKAHEAD_ENV)? {
            config = config.with_alert_lookahead_days(days);
        }
        if let Some(days) = parse_days(&lookup, DUE_SOON_ENV)? {
            config = config.with_due_soon_days(days);
        }
        Ok(config)
    }
}

fn parse_days(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> DomainResult<Option<u32>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|e| DomainError::validation(format!("{key}={raw:?}: {e}"))),
    }
}
