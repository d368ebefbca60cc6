//! Chart series for a reporting period: profit per category and revenue per day.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use salesplan_core::ProductId;
use salesplan_products::Product;
use salesplan_sales::{Sale, SaleKind};

use crate::period::ReportingPeriod;

/// Bucket for commission sales.
pub const COMMISSION_CATEGORY: &str = "Commissions";
/// Bucket for items whose product is no longer in the catalogue.
pub const UNCATEGORIZED: &str = "Other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProfit {
    pub category: String,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub revenue: f64,
    pub profit: f64,
}

/// Profit per product category of the sales made in `period`.
///
/// Commission sales go to [`COMMISSION_CATEGORY`]. Categories with no
/// positive profit are dropped; the rest are sorted by profit, highest first.
pub fn profit_by_category(
    sales: &[Sale],
    products: &[Product],
    period: ReportingPeriod,
) -> Vec<CategoryProfit> {
    let categories: HashMap<ProductId, &str> = products
        .iter()
        .map(|p| (p.id_typed(), p.category()))
        .collect();

    let mut grouped: BTreeMap<&str, f64> = BTreeMap::new();
    for sale in in_period(sales, period) {
        if sale.kind() == SaleKind::Commission {
            *grouped.entry(COMMISSION_CATEGORY).or_default() += sale.total_profit();
            continue;
        }
        for item in sale.items() {
            let category = item
                .product_id
                .and_then(|id| categories.get(&id).copied())
                .unwrap_or(UNCATEGORIZED);
            *grouped.entry(category).or_default() += item.total_price() - item.total_cost();
        }
    }

    let mut breakdown: Vec<CategoryProfit> = grouped
        .into_iter()
        .filter(|(_, profit)| *profit > 0.0)
        .map(|(category, profit)| CategoryProfit {
            category: category.to_string(),
            profit,
        })
        .collect();
    breakdown.sort_by(|a, b| b.profit.total_cmp(&a.profit));
    breakdown
}

/// Revenue and profit per UTC calendar day for the sales made in `period`,
/// in date order. Days without sales are omitted.
pub fn daily_totals(sales: &[Sale], period: ReportingPeriod) -> Vec<DailyTotals> {
    let mut days: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for sale in in_period(sales, period) {
        let totals = days.entry(utc_day(sale.date())).or_default();
        totals.0 += sale.total_price();
        totals.1 += sale.total_profit();
    }

    days.into_iter()
        .map(|(date, (revenue, profit))| DailyTotals {
            date,
            revenue,
            profit,
        })
        .collect()
}

fn in_period(sales: &[Sale], period: ReportingPeriod) -> impl Iterator<Item = &Sale> {
    sales.iter().filter(move |sale| period.contains(sale.date()))
}

fn utc_day(date: DateTime<Utc>) -> NaiveDate {
    date.date_naive()
}
