use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A domain event emitted by an aggregate.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **versioned** (schema evolution)
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "sales.installment.paid").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Audit line for one applied event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub event_type: String,
    pub schema_version: u32,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn of<E: Event>(event: &E) -> Self {
        Self {
            event_type: event.event_type().to_string(),
            schema_version: event.version(),
            occurred_at: event.occurred_at(),
        }
    }
}
