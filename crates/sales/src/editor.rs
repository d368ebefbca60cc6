//! Manual plan editing.
//!
//! A [`PlanEditor`] is a working copy of one sale's installments. Dates and
//! values can be changed freely; nothing is redistributed and an imbalance
//! against the financed amount never blocks the commit. It is only reported
//! through [`PlanEditor::reconciliation_delta`] and the [`CommitReport`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use salesplan_core::money::{approx_eq, ensure_positive};
use salesplan_core::{
    Aggregate, AggregateRoot, AuditEntry, DomainError, DomainResult, ExpectedVersion, SaleId,
};

use crate::sale::{ReplaceInstallments, Sale, SaleCommand};
use crate::schedule::{Installment, InstallmentStatus};

/// Result of a single edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// The edit touched an installment that is already paid. It was applied,
    /// but the paid record now disagrees with what was collected.
    HistoricalEdit { number: u32 },
}

/// Plan total differs from the financed amount by at least one cent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationWarning {
    pub target_total: f64,
    pub plan_total: f64,
    /// `target_total - plan_total`.
    pub delta: f64,
}

/// What a commit did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReport {
    pub delta: f64,
    pub warning: Option<ReconciliationWarning>,
    /// Numbers of paid installments that were edited.
    pub historical_edits: Vec<u32>,
    /// Sale version after the commit.
    pub version: u64,
    /// The sale held a legacy schedule before the commit.
    pub converted_from_legacy: bool,
    /// Events applied by the commit.
    pub audit: Vec<AuditEntry>,
}

/// Mutable working copy of a sale's installment list.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanEditor {
    sale_id: SaleId,
    base_version: u64,
    target_total: f64,
    installments: Vec<Installment>,
    historical_edits: Vec<u32>,
}

impl PlanEditor {
    /// Open an editor on `sale`.
    ///
    /// Legacy schedules are materialized into explicit lines.
    pub fn open(sale: &Sale) -> DomainResult<Self> {
        let mut installments = sale.schedule().materialize(sale.financed_amount())?;
        installments.sort_by_key(|inst| inst.number);
        if sale.schedule().is_legacy() {
            debug!(sale_id = %sale.id_typed(), count = installments.len(), "materialized legacy schedule");
        }

        Ok(Self {
            sale_id: sale.id_typed(),
            base_version: sale.version(),
            target_total: sale.financed_amount(),
            installments,
            historical_edits: Vec::new(),
        })
    }

    pub fn sale_id(&self) -> SaleId {
        self.sale_id
    }

    /// Sale version the editor was opened at.
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    pub fn installments(&self) -> &[Installment] {
        &self.installments
    }

    /// Numbers of paid installments edited so far.
    pub fn historical_edits(&self) -> &[u32] {
        &self.historical_edits
    }

    /// Change the due date of the installment at `index` (0-based).
    pub fn set_installment_date(&mut self, index: usize, date: DateTime<Utc>) -> DomainResult<EditOutcome> {
        let inst = self.line_mut(index)?;
        inst.due_date = date;
        let number = inst.number;
        let paid = inst.is_paid();
        Ok(self.record_edit(number, paid))
    }

    /// Change the value of the installment at `index` (0-based).
    ///
    /// The value must be finite and positive. Other installments are left
    /// alone.
    pub fn set_installment_value(&mut self, index: usize, value: f64) -> DomainResult<EditOutcome> {
        ensure_positive("installment value", value)?;
        let inst = self.line_mut(index)?;
        inst.value = value;
        let number = inst.number;
        let paid = inst.is_paid();
        Ok(self.record_edit(number, paid))
    }

    /// Amount the schedule must cover: total price minus down payment.
    pub fn target_total(&self) -> f64 {
        self.target_total
    }

    pub fn plan_total(&self) -> f64 {
        self.installments.iter().map(|inst| inst.value).sum()
    }

    /// `target_total - plan_total`; positive when the plan collects too little.
    pub fn reconciliation_delta(&self) -> f64 {
        self.target_total - self.plan_total()
    }

    pub fn is_balanced(&self) -> bool {
        approx_eq(self.plan_total(), self.target_total)
    }

    pub fn reconciliation_warning(&self) -> Option<ReconciliationWarning> {
        if self.is_balanced() {
            return None;
        }
        Some(ReconciliationWarning {
            target_total: self.target_total,
            plan_total: self.plan_total(),
            delta: self.reconciliation_delta(),
        })
    }

    /// Replace the sale's schedule with the edited list.
    ///
    /// Installments paid on the sale are kept paid even if they were paid
    /// after the editor was opened. A legacy sale becomes explicit.
    pub fn commit(self, sale: &mut Sale, at: DateTime<Utc>) -> DomainResult<CommitReport> {
        if sale.id_typed() != self.sale_id {
            return Err(DomainError::invariant("editor opened on a different sale"));
        }

        let warning = self.reconciliation_warning();
        let delta = self.reconciliation_delta();
        let converted_from_legacy = sale.schedule().is_legacy();

        let current: BTreeMap<u32, Installment> = sale
            .schedule()
            .materialize(sale.financed_amount())?
            .into_iter()
            .filter(Installment::is_paid)
            .map(|inst| (inst.number, inst))
            .collect();

        let mut installments = self.installments;
        for inst in &mut installments {
            if let Some(paid) = current.get(&inst.number) {
                inst.status = InstallmentStatus::Paid;
                inst.paid_at = inst.paid_at.or(paid.paid_at);
            }
        }

        let cmd = SaleCommand::ReplaceInstallments(ReplaceInstallments {
            sale_id: self.sale_id,
            installments,
            occurred_at: at,
        });
        let events = sale.execute(&cmd)?;
        let audit: Vec<AuditEntry> = events.iter().map(AuditEntry::of).collect();

        if let Some(w) = &warning {
            warn!(
                sale_id = %self.sale_id,
                target_total = w.target_total,
                plan_total = w.plan_total,
                delta = w.delta,
                "committed unbalanced installment plan"
            );
        } else {
            debug!(sale_id = %self.sale_id, "committed installment plan");
        }

        Ok(CommitReport {
            delta,
            warning,
            historical_edits: self.historical_edits,
            version: sale.version(),
            converted_from_legacy,
            audit,
        })
    }

    /// Like [`commit`](Self::commit), but fails with a conflict when the sale's
    /// version does not match `expected`.
    pub fn commit_expecting(
        self,
        sale: &mut Sale,
        expected: ExpectedVersion,
        at: DateTime<Utc>,
    ) -> DomainResult<CommitReport> {
        expected.check(sale.version())?;
        self.commit(sale, at)
    }

    fn line_mut(&mut self, index: usize) -> DomainResult<&mut Installment> {
        let len = self.installments.len();
        self.installments.get_mut(index).ok_or_else(|| {
            DomainError::validation(format!("installment index {index} out of range (0..{len})"))
        })
    }

    fn record_edit(&mut self, number: u32, paid: bool) -> EditOutcome {
        if !paid {
            return EditOutcome::Applied;
        }
        warn!(sale_id = %self.sale_id, number, "edited an installment that is already paid");
        if !self.historical_edits.contains(&number) {
            self.historical_edits.push(number);
        }
        EditOutcome::HistoricalEdit { number }
    }
}
