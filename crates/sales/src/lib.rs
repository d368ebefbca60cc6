//! Sales domain module.
//!
//! This crate contains the business rules for recorded sales and their
//! installment plans: schedule generation, payment tracking, manual plan
//! editing and checkout against the product catalogue. It is pure domain
//! logic (no IO, no storage).

pub mod checkout;
pub mod editor;
pub mod generator;
pub mod sale;
pub mod schedule;
pub mod tracker;

pub use checkout::checkout;
pub use editor::{CommitReport, EditOutcome, PlanEditor, ReconciliationWarning};
pub use generator::{InstallmentTerms, generate_installments, split_amount};
pub use sale::{
    InstallmentPaid, InstallmentsReplaced, MarkInstallmentPaid, NewSale, PaymentMethod,
    ReplaceInstallments, Sale, SaleCommand, SaleEvent, SaleItem, SaleKind, SaleRecord, SaleSettled,
    SaleStatus, ScheduleRequest, SettleSale,
};
pub use schedule::{
    Installment, InstallmentStatus, LegacySchedule, PaymentSchedule, ProjectedInstallment,
};
pub use tracker::PaymentOutcome;
