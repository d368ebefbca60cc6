//! Calendar arithmetic for due dates.
//!
//! All dates are `DateTime<Utc>`; month bucketing is done in UTC.

use chrono::{DateTime, Datelike, Months, Utc};

use crate::error::{DomainError, DomainResult};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Longest schedule accepted anywhere: 50 years of monthly installments.
pub const MAX_INSTALLMENTS: u32 = 600;

/// Advance `date` by `n` calendar months.
///
/// The day-of-month is kept when it exists in the target month and clamped to
/// the target month's last day otherwise (2024-01-31 + 1 month = 2024-02-29).
/// The time of day is preserved. Returns `None` only when the result falls
/// outside the representable date range.
pub fn advance_months(date: DateTime<Utc>, n: u32) -> Option<DateTime<Utc>> {
    date.checked_add_months(Months::new(n))
}

/// Due dates for `count` monthly installments starting at `first`.
///
/// Each date is one calendar month after the previous one, so a clamp in a
/// short month carries into the following dates.
pub fn monthly_due_dates(first: DateTime<Utc>, count: u32) -> DomainResult<Vec<DateTime<Utc>>> {
    if count > MAX_INSTALLMENTS {
        return Err(DomainError::validation(format!(
            "installment count {count} exceeds the maximum of {MAX_INSTALLMENTS}"
        )));
    }
    let mut dates = Vec::with_capacity(count as usize);
    let mut current = first;
    for i in 0..count {
        if i > 0 {
            current = advance_months(current, 1)
                .ok_or_else(|| DomainError::validation("due date out of range"))?;
        }
        dates.push(current);
    }
    Ok(dates)
}

/// Whole days from `now` until `due`, rounded towards negative infinity.
///
/// Overdue dates yield negative values.
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (due - now).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// Zero-based month (0–11) and year of `date`.
pub fn month_and_year(date: DateTime<Utc>) -> (u32, i32) {
    (date.month0(), date.year())
}

/// Convert epoch milliseconds into a UTC timestamp.
pub fn from_epoch_millis(millis: i64) -> DomainResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DomainError::validation(format!("timestamp out of range: {millis}")))
}
