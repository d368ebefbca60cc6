//! Receivables and stock valuation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salesplan_core::DomainResult;
use salesplan_core::calendar::days_until;
use salesplan_products::Product;
use salesplan_sales::Sale;

/// Outstanding amounts across all sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablesSummary {
    /// Sales with at least one unpaid installment.
    pub open_sales: usize,
    pub pending_total: f64,
    pub overdue_total: f64,
    pub overdue_count: usize,
}

/// Summarise unpaid installments as of `now`.
///
/// An installment is overdue once its due date is at least one whole day
/// behind `now`.
pub fn receivables_summary(sales: &[Sale], now: DateTime<Utc>) -> DomainResult<ReceivablesSummary> {
    let mut summary = ReceivablesSummary::default();

    for sale in sales {
        let mut open = false;
        for inst in sale.projected_schedule()?.into_iter().filter(|i| !i.paid) {
            open = true;
            summary.pending_total += inst.value;
            if days_until(inst.due_date, now) < 0 {
                summary.overdue_total += inst.value;
                summary.overdue_count += 1;
            }
        }
        if open {
            summary.open_sales += 1;
        }
    }

    Ok(summary)
}

/// Value of all units on hand at acquisition cost.
pub fn stock_valuation(products: &[Product]) -> f64 {
    products.iter().map(Product::stock_cost).sum()
}
