//! Calendar month used to bucket monthly figures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salesplan_core::calendar::month_and_year;
use salesplan_core::{DomainError, DomainResult};

/// A calendar month in UTC. `month` is zero-based (0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportingPeriod {
    month: u32,
    year: i32,
}

impl ReportingPeriod {
    pub fn new(month: u32, year: i32) -> DomainResult<Self> {
        if month > 11 {
            return Err(DomainError::validation(format!(
                "month must be in 0..=11, got {month}"
            )));
        }
        Ok(Self { month, year })
    }

    /// The period containing `date`.
    pub fn containing(date: DateTime<Utc>) -> Self {
        let (month, year) = month_and_year(date);
        Self { month, year }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        month_and_year(date) == (self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_is_zero_based_and_bounded() {
        assert!(ReportingPeriod::new(11, 2024).is_ok());
        assert!(ReportingPeriod::new(12, 2024).unwrap_err().is_validation());
    }

    #[test]
    fn contains_uses_utc_month_boundaries() {
        let january = ReportingPeriod::new(0, 2024).unwrap();
        assert!(january.contains(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()));
        assert!(!january.contains(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        assert!(!january.contains(Utc.with_ymd_and_hms(2023, 1, 15, 0, 0, 0).unwrap()));
    }

    #[test]
    fn containing_round_trips() {
        let date = Utc.with_ymd_and_hms(2025, 7, 4, 8, 0, 0).unwrap();
        let period = ReportingPeriod::containing(date);
        assert_eq!((period.month(), period.year()), (6, 2025));
        assert!(period.contains(date));
    }
}
