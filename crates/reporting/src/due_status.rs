//! Due-status classification of a sale's next installment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salesplan_core::DomainResult;
use salesplan_core::calendar::days_until;
use salesplan_sales::Sale;
use salesplan_sales::tracker::next_unpaid;

use crate::config::MetricsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DueStatus {
    Overdue,
    DueSoon,
    OnTime,
}

/// The first unpaid installment of a sale and how close it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDue {
    pub installment_number: u32,
    pub due_date: DateTime<Utc>,
    pub value: f64,
    pub days_diff: i64,
    pub status: DueStatus,
}

/// Classify a day count: negative is overdue, up to `due_soon_days` is due soon.
pub fn classify(days_diff: i64, config: &MetricsConfig) -> DueStatus {
    if days_diff < 0 {
        DueStatus::Overdue
    } else if days_diff <= i64::from(config.due_soon_days) {
        DueStatus::DueSoon
    } else {
        DueStatus::OnTime
    }
}

/// Status of the sale's first unpaid installment; `None` once fully paid.
pub fn next_due(sale: &Sale, now: DateTime<Utc>, config: &MetricsConfig) -> DomainResult<Option<NextDue>> {
    Ok(next_unpaid(sale)?.map(|inst| {
        let days_diff = days_until(inst.due_date, now);
        NextDue {
            installment_number: inst.number,
            due_date: inst.due_date,
            value: inst.value,
            days_diff,
            status: classify(days_diff, config),
        }
    }))
}
