//! Installment generation.
//!
//! Splits the financed part of a sale (total price minus down payment) into
//! equal monthly installments. Each value is truncated to cents and the last
//! installment absorbs the remainder, so the schedule always sums to
//! the financed amount.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use salesplan_core::calendar::{MAX_INSTALLMENTS, monthly_due_dates};
use salesplan_core::money::{ensure_non_negative, floor_cents, is_zero};
use salesplan_core::{DomainError, DomainResult};

use crate::schedule::Installment;

/// Terms a schedule is generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentTerms {
    pub total_price: f64,
    pub down_payment: f64,
    pub count: u32,
    pub first_due_date: DateTime<Utc>,
}

impl InstallmentTerms {
    pub fn new(total_price: f64, down_payment: f64, count: u32, first_due_date: DateTime<Utc>) -> Self {
        Self {
            total_price,
            down_payment,
            count,
            first_due_date,
        }
    }

    /// Amount left to pay after the down payment.
    pub fn financed_amount(&self) -> f64 {
        self.total_price - self.down_payment
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.count == 0 {
            return Err(DomainError::validation("installment count must be at least 1"));
        }
        validate_down_payment(self.total_price, self.down_payment)
    }
}

/// Check that a down payment is non-negative and does not exceed the total price.
pub fn validate_down_payment(total_price: f64, down_payment: f64) -> DomainResult<()> {
    ensure_non_negative("total price", total_price)?;
    ensure_non_negative("down payment", down_payment)?;
    if down_payment > total_price {
        return Err(DomainError::validation(format!(
            "down payment ({down_payment}) exceeds total price ({total_price})"
        )));
    }
    Ok(())
}

/// Split `amount` into `count` parts truncated to cents, the last taking the
/// remainder, so the parts sum to `amount`.
///
/// Returns an empty split when nothing is left to finance.
pub fn split_amount(amount: f64, count: u32) -> DomainResult<Vec<f64>> {
    if count == 0 {
        return Err(DomainError::validation("installment count must be at least 1"));
    }
    if count > MAX_INSTALLMENTS {
        return Err(DomainError::validation(format!(
            "installment count {count} exceeds the maximum of {MAX_INSTALLMENTS}"
        )));
    }
    ensure_non_negative("financed amount", amount)?;
    if is_zero(amount) {
        return Ok(Vec::new());
    }

    let base = floor_cents(amount / f64::from(count));
    let last = amount - base * f64::from(count - 1);
    if base <= 0.0 {
        return Err(DomainError::validation(format!(
            "amount {amount} is too small to split into {count} installments"
        )));
    }

    let mut values = vec![base; count as usize];
    if let Some(tail) = values.last_mut() {
        *tail = last;
    }
    Ok(values)
}

/// Generate the explicit schedule for `terms`.
///
/// Installments are numbered from 1, start `Pending`, and fall due one
/// calendar month apart starting at the first due date. When the down payment
/// covers the whole price the schedule is empty.
pub fn generate_installments(terms: &InstallmentTerms) -> DomainResult<Vec<Installment>> {
    terms.validate()?;

    let values = split_amount(terms.financed_amount(), terms.count)?;
    if values.is_empty() {
        debug!(count = terms.count, "nothing financed; generated empty schedule");
        return Ok(Vec::new());
    }
    let dates = monthly_due_dates(terms.first_due_date, terms.count)?;

    let installments: Vec<Installment> = values
        .into_iter()
        .zip(dates)
        .enumerate()
        .map(|(i, (value, due_date))| Installment::pending(i as u32 + 1, due_date, value))
        .collect();

    debug!(
        count = installments.len(),
        financed = terms.financed_amount(),
        "generated installment schedule"
    );
    Ok(installments)
}
