//! `salesplan-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! errors, identifiers, aggregate/event traits, and the money and calendar
//! arithmetic shared by the schedule and reporting crates.

pub mod aggregate;
pub mod calendar;
pub mod error;
pub mod event;
pub mod id;
pub mod money;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use event::{AuditEntry, Event};
pub use id::{ProductId, SaleId};
