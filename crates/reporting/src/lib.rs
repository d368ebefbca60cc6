//! Read-side reporting over recorded sales.
//!
//! Everything here is a pure function of the sales (and products) passed in,
//! a reporting period and a caller-supplied `now`. Nothing reads the clock
//! and nothing is cached between calls.

pub mod breakdown;
pub mod config;
pub mod due_status;
pub mod metrics;
pub mod period;
pub mod receivables;

pub use breakdown::{CategoryProfit, DailyTotals, daily_totals, profit_by_category};
pub use config::MetricsConfig;
pub use due_status::{DueStatus, NextDue, classify, next_due};
pub use metrics::{Alert, FinancialMetrics, compute_metrics};
pub use period::ReportingPeriod;
pub use receivables::{ReceivablesSummary, receivables_summary, stock_valuation};

#[cfg(test)]
mod test_support;
