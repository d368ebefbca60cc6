//! Payment schedules.
//!
//! A sale stores its schedule in one of two shapes: an explicit list of
//! installments, or the legacy compact form (count + first due date + paid
//! counter). Everything downstream reads schedules through
//! [`PaymentSchedule::is_paid`] and [`PaymentSchedule::project`], which hide the
//! difference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salesplan_core::calendar::{MAX_INSTALLMENTS, monthly_due_dates};
use salesplan_core::{DomainError, DomainResult};

use crate::generator::split_amount;

/// Payment status of a single installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstallmentStatus {
    Pending,
    Paid,
}

/// One line of an explicit schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    /// 1-based position; defines chronological order within the sale.
    pub number: u32,
    pub due_date: DateTime<Utc>,
    pub value: f64,
    pub status: InstallmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Installment {
    pub fn pending(number: u32, due_date: DateTime<Utc>, value: f64) -> Self {
        Self {
            number,
            due_date,
            value,
            status: InstallmentStatus::Pending,
            paid_at: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }
}

/// Compact schedule kept by sales recorded before explicit installments existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySchedule {
    pub installments_count: u32,
    /// Due date of installment 1.
    pub due_date: DateTime<Utc>,
    /// Installments 1..=paid_installments are paid.
    pub paid_installments: u32,
}

impl LegacySchedule {
    pub fn new(
        installments_count: u32,
        due_date: DateTime<Utc>,
        paid_installments: u32,
    ) -> DomainResult<Self> {
        if installments_count == 0 {
            return Err(DomainError::validation("installment count must be at least 1"));
        }
        if installments_count > MAX_INSTALLMENTS {
            return Err(DomainError::validation(format!(
                "installment count {installments_count} exceeds the maximum of {MAX_INSTALLMENTS}"
            )));
        }
        if paid_installments > installments_count {
            return Err(DomainError::validation(format!(
                "paid installments ({paid_installments}) exceed installment count ({installments_count})"
            )));
        }
        Ok(Self {
            installments_count,
            due_date,
            paid_installments,
        })
    }
}

/// The schedule attached to a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PaymentSchedule {
    Explicit { installments: Vec<Installment> },
    Legacy(LegacySchedule),
}

/// An installment as seen by reporting: number, date, value and whether it is paid.
///
/// For explicit schedules this mirrors the stored line; for legacy schedules it
/// is computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedInstallment {
    pub number: u32,
    pub due_date: DateTime<Utc>,
    pub value: f64,
    pub paid: bool,
}

impl PaymentSchedule {
    pub fn explicit(installments: Vec<Installment>) -> Self {
        Self::Explicit { installments }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    /// Number of installments in the schedule.
    ///
    /// A legacy schedule with nothing financed still reports its stored count.
    pub fn len(&self) -> usize {
        match self {
            Self::Explicit { installments } => installments.len(),
            Self::Legacy(legacy) => legacy.installments_count as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether installment `number` is paid.
    ///
    /// Unknown numbers are reported as unpaid.
    pub fn is_paid(&self, number: u32) -> bool {
        match self {
            Self::Explicit { installments } => installments
                .iter()
                .find(|inst| inst.number == number)
                .is_some_and(Installment::is_paid),
            Self::Legacy(legacy) => number >= 1 && number <= legacy.paid_installments,
        }
    }

    /// Every installment with its due date, value and paid flag, in order.
    ///
    /// `financed` is the amount the schedule covers (total price minus down
    /// payment); only legacy schedules need it, since explicit lines carry
    /// their own values.
    pub fn project(&self, financed: f64) -> DomainResult<Vec<ProjectedInstallment>> {
        match self {
            Self::Explicit { installments } => {
                let mut projected: Vec<ProjectedInstallment> = installments
                    .iter()
                    .map(|inst| ProjectedInstallment {
                        number: inst.number,
                        due_date: inst.due_date,
                        value: inst.value,
                        paid: inst.is_paid(),
                    })
                    .collect();
                projected.sort_by_key(|inst| inst.number);
                Ok(projected)
            }
            Self::Legacy(legacy) => {
                let values = split_amount(financed, legacy.installments_count)?;
                if values.is_empty() {
                    return Ok(Vec::new());
                }
                let dates = monthly_due_dates(legacy.due_date, legacy.installments_count)?;

                Ok(values
                    .into_iter()
                    .zip(dates)
                    .enumerate()
                    .map(|(i, (value, due_date))| {
                        let number = i as u32 + 1;
                        ProjectedInstallment {
                            number,
                            due_date,
                            value,
                            paid: number <= legacy.paid_installments,
                        }
                    })
                    .collect())
            }
        }
    }

    /// Convert into explicit installment lines.
    ///
    /// Legacy installments carry their paid flag but no paid-at timestamp.
    pub fn materialize(&self, financed: f64) -> DomainResult<Vec<Installment>> {
        match self {
            Self::Explicit { installments } => Ok(installments.clone()),
            Self::Legacy(_) => Ok(self
                .project(financed)?
                .into_iter()
                .map(|inst| Installment {
                    number: inst.number,
                    due_date: inst.due_date,
                    value: inst.value,
                    status: if inst.paid {
                        InstallmentStatus::Paid
                    } else {
                        InstallmentStatus::Pending
                    },
                    paid_at: None,
                })
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn legacy(count: u32, paid: u32) -> PaymentSchedule {
        PaymentSchedule::Legacy(LegacySchedule::new(count, ymd(2024, 1, 15), paid).unwrap())
    }

    #[test]
    fn legacy_schedule_rejects_zero_count_and_overpaid_counter() {
        assert!(LegacySchedule::new(0, ymd(2024, 1, 1), 0).is_err());
        assert!(LegacySchedule::new(2, ymd(2024, 1, 1), 3).is_err());
        assert!(LegacySchedule::new(MAX_INSTALLMENTS + 1, ymd(2024, 1, 1), 0).is_err());
    }

    #[test]
    fn legacy_is_paid_follows_the_counter() {
        let schedule = legacy(3, 1);
        assert!(schedule.is_paid(1));
        assert!(!schedule.is_paid(2));
        assert!(!schedule.is_paid(0));
    }

    #[test]
    fn explicit_is_paid_reads_status() {
        let mut paid = Installment::pending(1, ymd(2024, 1, 15), 100.0);
        paid.status = InstallmentStatus::Paid;
        let schedule = PaymentSchedule::explicit(vec![
            paid,
            Installment::pending(2, ymd(2024, 2, 15), 100.0),
        ]);
        assert!(schedule.is_paid(1));
        assert!(!schedule.is_paid(2));
        assert!(!schedule.is_paid(9));
    }

    #[test]
    fn legacy_projection_walks_every_month() {
        let projected = legacy(3, 1).project(900.0).unwrap();
        assert_eq!(projected.len(), 3);
        assert_eq!(projected[0].due_date, ymd(2024, 1, 15));
        assert_eq!(projected[1].due_date, ymd(2024, 2, 15));
        assert_eq!(projected[2].due_date, ymd(2024, 3, 15));
        assert!(projected.iter().all(|inst| inst.value == 300.0));
        assert_eq!(
            projected.iter().map(|inst| inst.paid).collect::<Vec<_>>(),
            vec![true, false, false]
        );
    }

    #[test]
    fn legacy_projection_with_nothing_financed_is_empty() {
        assert!(legacy(1, 0).project(0.0).unwrap().is_empty());
    }

    #[test]
    fn explicit_projection_is_ordered_by_number() {
        let schedule = PaymentSchedule::explicit(vec![
            Installment::pending(2, ymd(2024, 2, 15), 50.0),
            Installment::pending(1, ymd(2024, 1, 15), 50.0),
        ]);
        let numbers: Vec<u32> = schedule.project(100.0).unwrap().iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn materialize_keeps_legacy_paid_flags() {
        let lines = legacy(3, 2).materialize(300.0).unwrap();
        let statuses: Vec<InstallmentStatus> = lines.iter().map(|l| l.status).collect();
        assert_eq!(
            statuses,
            vec![
                InstallmentStatus::Paid,
                InstallmentStatus::Paid,
                InstallmentStatus::Pending
            ]
        );
        assert!(lines.iter().all(|l| l.paid_at.is_none()));
    }

    #[test]
    fn schedule_serializes_with_kind_tag() {
        let json = serde_json::to_value(legacy(3, 1)).unwrap();
        assert_eq!(json["kind"], "legacy");
        assert_eq!(json["installmentsCount"], 3);
        assert_eq!(json["paidInstallments"], 1);

        let explicit = PaymentSchedule::explicit(vec![Installment::pending(1, ymd(2024, 1, 15), 10.0)]);
        let json = serde_json::to_value(&explicit).unwrap();
        assert_eq!(json["kind"], "explicit");
        assert_eq!(json["installments"][0]["status"], "PENDING");
        let back: PaymentSchedule = serde_json::from_value(json).unwrap();
        assert_eq!(back, explicit);
    }
}
