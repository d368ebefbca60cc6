//! Payment state tracking.
//!
//! Thin operations over the [`Sale`] aggregate that callers use to record
//! payments. Reporting only ever asks [`is_paid`].

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use salesplan_core::{Aggregate, DomainError, DomainResult};

use crate::sale::{MarkInstallmentPaid, Sale, SaleCommand, SettleSale};
use crate::schedule::ProjectedInstallment;

/// What a `mark_paid` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Recorded,
    AlreadyPaid,
}

/// Mark installment `number` of `sale` as paid.
///
/// Marking an installment that is already paid is a no-op. On a legacy
/// schedule, skipping ahead of the paid counter is a
/// [`DomainError::Sequence`] and leaves the sale untouched.
pub fn mark_paid(sale: &mut Sale, number: u32, paid_at: DateTime<Utc>) -> DomainResult<PaymentOutcome> {
    let cmd = SaleCommand::MarkInstallmentPaid(MarkInstallmentPaid {
        sale_id: sale.id_typed(),
        number,
        paid_at,
    });

    let events = match sale.execute(&cmd) {
        Ok(events) => events,
        Err(err @ DomainError::Sequence { .. }) => {
            warn!(sale_id = %sale.id_typed(), number, error = %err, "rejected out-of-order payment");
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    if events.is_empty() {
        debug!(sale_id = %sale.id_typed(), number, "installment already paid");
        return Ok(PaymentOutcome::AlreadyPaid);
    }

    debug!(sale_id = %sale.id_typed(), number, "installment paid");
    Ok(PaymentOutcome::Recorded)
}

/// Whether installment `number` of `sale` is paid.
pub fn is_paid(sale: &Sale, number: u32) -> bool {
    sale.schedule().is_paid(number)
}

/// Mark every outstanding installment of `sale` as paid.
pub fn settle(sale: &mut Sale, paid_at: DateTime<Utc>) -> DomainResult<PaymentOutcome> {
    let cmd = SaleCommand::SettleSale(SettleSale {
        sale_id: sale.id_typed(),
        paid_at,
    });
    let events = sale.execute(&cmd)?;

    if events.is_empty() {
        return Ok(PaymentOutcome::AlreadyPaid);
    }
    debug!(sale_id = %sale.id_typed(), "sale settled");
    Ok(PaymentOutcome::Recorded)
}

/// First unpaid installment in schedule order, if any.
pub fn next_unpaid(sale: &Sale) -> DomainResult<Option<ProjectedInstallment>> {
    Ok(sale
        .projected_schedule()?
        .into_iter()
        .find(|inst| !inst.paid))
}

/// Sum of all unpaid installment values.
pub fn outstanding_amount(sale: &Sale) -> DomainResult<f64> {
    Ok(sale
        .projected_schedule()?
        .iter()
        .filter(|inst| !inst.paid)
        .map(|inst| inst.value)
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sale::test_support::*;

    #[test]
    fn explicit_mark_paid_twice_stays_paid() {
        let mut sale = explicit_sale();
        assert_eq!(mark_paid(&mut sale, 1, ymd(2024, 1, 15)).unwrap(), PaymentOutcome::Recorded);
        assert_eq!(
            mark_paid(&mut sale, 1, ymd(2024, 1, 16)).unwrap(),
            PaymentOutcome::AlreadyPaid
        );
        assert!(is_paid(&sale, 1));
        assert!(!is_paid(&sale, 2));
    }

    #[test]
    fn legacy_skip_is_rejected_and_state_unchanged() {
        let mut sale = legacy_sale();
        let before = sale.clone();
        let err = mark_paid(&mut sale, 3, ymd(2024, 1, 15)).unwrap_err();
        assert!(matches!(err, DomainError::Sequence { requested: 3, paid: 0 }));
        assert_eq!(sale, before);
    }

    #[test]
    fn legacy_repeat_is_a_no_op() {
        let mut sale = legacy_sale();
        mark_paid(&mut sale, 1, ymd(2024, 1, 15)).unwrap();
        assert_eq!(
            mark_paid(&mut sale, 1, ymd(2024, 1, 15)).unwrap(),
            PaymentOutcome::AlreadyPaid
        );
        assert!(is_paid(&sale, 1));
        assert!(!is_paid(&sale, 2));
    }

    #[test]
    fn legacy_number_out_of_range_is_a_validation_error() {
        let mut sale = legacy_sale();
        assert!(mark_paid(&mut sale, 0, ymd(2024, 1, 15)).unwrap_err().is_validation());
        assert!(mark_paid(&mut sale, 4, ymd(2024, 1, 15)).unwrap_err().is_validation());
    }

    #[test]
    fn next_unpaid_and_outstanding_follow_payments() {
        let mut sale = legacy_sale();
        assert_eq!(outstanding_amount(&sale).unwrap(), 900.0);

        mark_paid(&mut sale, 1, ymd(2024, 1, 15)).unwrap();
        let next = next_unpaid(&sale).unwrap().unwrap();
        assert_eq!(next.number, 2);
        assert_eq!(next.due_date, ymd(2024, 2, 15));
        assert_eq!(outstanding_amount(&sale).unwrap(), 600.0);

        assert_eq!(settle(&mut sale, ymd(2024, 2, 1)).unwrap(), PaymentOutcome::Recorded);
        assert!(next_unpaid(&sale).unwrap().is_none());
        assert_eq!(settle(&mut sale, ymd(2024, 2, 2)).unwrap(), PaymentOutcome::AlreadyPaid);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: a legacy counter only ever advances one step at a time;
            /// any attempted payment either succeeds in order, is a no-op, or
            /// fails without changing the sale.
            #[test]
            fn legacy_counter_only_advances_in_sequence(
                attempts in prop::collection::vec(1u32..=3, 0..12)
            ) {
                let mut sale = legacy_sale();
                let mut paid = 0u32;

                for number in attempts {
                    let before = sale.clone();
                    match mark_paid(&mut sale, number, ymd(2024, 1, 15)) {
                        Ok(PaymentOutcome::Recorded) => {
                            prop_assert_eq!(number, paid + 1);
                            paid = number;
                        }
                        Ok(PaymentOutcome::AlreadyPaid) => {
                            prop_assert!(number <= paid);
                            prop_assert_eq!(&sale, &before);
                        }
                        Err(err) => {
                            prop_assert!(
                                matches!(err, DomainError::Sequence { .. }),
                                "unexpected error: {:?}",
                                err
                            );
                            prop_assert!(number > paid + 1);
                            prop_assert_eq!(&sale, &before);
                        }
                    }
                    for n in 1..=3 {
                        prop_assert_eq!(is_paid(&sale, n), n <= paid);
                    }
                }
            }
        }
    }
}
