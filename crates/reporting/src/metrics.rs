//! Dashboard metrics.
//!
//! [`compute_metrics`] walks every sale's full projected schedule, so legacy
//! sales contribute each installment to the month it actually falls in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use salesplan_core::calendar::days_until;
use salesplan_core::{DomainResult, SaleId};
use salesplan_sales::Sale;

use crate::config::MetricsConfig;
use crate::period::ReportingPeriod;

/// An unpaid installment that is overdue or due within the lookahead window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub sale_id: SaleId,
    pub installment_number: u32,
    /// Whole days until the due date; negative when overdue.
    pub days_diff: i64,
}

/// Financial summary for one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetrics {
    /// Lifetime sum of sale prices.
    pub total_revenue: f64,
    /// Lifetime sum of sale costs.
    pub total_cost: f64,
    pub net_profit: f64,
    /// `net_profit / total_revenue` as a ratio; 0 without revenue.
    pub margin: f64,
    /// Sorted by `days_diff`, most overdue first.
    pub alerts: Vec<Alert>,
    /// Every unpaid installment, any month.
    pub pending_total: f64,
    /// Paid installments due in the period.
    pub received_month: f64,
    /// Profit of sales made in the period.
    pub profit_month: f64,
    /// Unpaid installments due in the period.
    pub pending_month: f64,
}

/// Compute the dashboard metrics for `period` as seen at `now`.
pub fn compute_metrics(
    sales: &[Sale],
    period: ReportingPeriod,
    now: DateTime<Utc>,
    config: &MetricsConfig,
) -> DomainResult<FinancialMetrics> {
    let lookahead = i64::from(config.alert_lookahead_days);

    let mut total_revenue = 0.0;
    let mut total_cost = 0.0;
    let mut profit_month = 0.0;
    let mut pending_total = 0.0;
    let mut received_month = 0.0;
    let mut pending_month = 0.0;
    let mut upcoming: Vec<(i64, DateTime<Utc>, Alert)> = Vec::new();

    for sale in sales {
        total_revenue += sale.total_price();
        total_cost += sale.total_cost();
        if period.contains(sale.date()) {
            profit_month += sale.total_profit();
        }

        for inst in sale.projected_schedule()? {
            let in_period = period.contains(inst.due_date);
            if inst.paid {
                if in_period {
                    received_month += inst.value;
                }
                continue;
            }

            pending_total += inst.value;
            if in_period {
                pending_month += inst.value;
            }

            let days_diff = days_until(inst.due_date, now);
            if days_diff <= lookahead {
                upcoming.push((
                    days_diff,
                    inst.due_date,
                    Alert {
                        sale_id: sale.id_typed(),
                        installment_number: inst.number,
                        days_diff,
                    },
                ));
            }
        }
    }

    upcoming.sort_by_key(|(days, due, _)| (*days, *due));
    let alerts: Vec<Alert> = upcoming.into_iter().map(|(_, _, alert)| alert).collect();

    let net_profit = total_revenue - total_cost;
    let margin = if total_revenue > 0.0 {
        net_profit / total_revenue
    } else {
        0.0
    };

    debug!(
        sales = sales.len(),
        month = period.month(),
        year = period.year(),
        alerts = alerts.len(),
        "computed financial metrics"
    );

    Ok(FinancialMetrics {
        total_revenue,
        total_cost,
        net_profit,
        margin,
        alerts,
        pending_total,
        received_month,
        profit_month,
        pending_month,
    })
}
