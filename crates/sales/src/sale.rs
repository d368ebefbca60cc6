use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salesplan_core::calendar::MAX_INSTALLMENTS;
use salesplan_core::money::{ensure_non_negative, ensure_positive};
use salesplan_core::{Aggregate, AggregateRoot, DomainError, DomainResult, Event, ProductId, SaleId};

use crate::generator::{InstallmentTerms, generate_installments, split_amount, validate_down_payment};
use crate::schedule::{
    Installment, InstallmentStatus, LegacySchedule, PaymentSchedule, ProjectedInstallment,
};

/// What was sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleKind {
    /// Catalogue products; stock is decremented.
    Sale,
    /// A service commission; no product, no cost, no stock.
    Commission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Pix,
    Card,
    Cash,
}

/// Derived payment state of a whole sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleStatus {
    Pending,
    Paid,
}

/// Sold line: product, quantity, prices captured at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// `None` for commission lines.
    pub product_id: Option<ProductId>,
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub unit_cost: f64,
}

impl SaleItem {
    pub fn product(
        product_id: ProductId,
        description: impl Into<String>,
        quantity: u32,
        unit_price: f64,
        unit_cost: f64,
    ) -> Self {
        Self {
            product_id: Some(product_id),
            description: description.into(),
            quantity,
            unit_price,
            unit_cost,
        }
    }

    pub fn commission(description: impl Into<String>, value: f64) -> Self {
        Self {
            product_id: None,
            description: description.into(),
            quantity: 1,
            unit_price: value,
            unit_cost: 0.0,
        }
    }

    pub fn total_price(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }

    pub fn total_cost(&self) -> f64 {
        self.unit_cost * f64::from(self.quantity)
    }
}

/// How the schedule of a new sale should be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScheduleRequest {
    /// Generate and store every installment.
    Explicit { count: u32, first_due_date: DateTime<Utc> },
    /// Store only count, first due date and a paid counter.
    Legacy { count: u32, first_due_date: DateTime<Utc> },
}

/// Input for recording a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSale {
    pub sale_id: SaleId,
    pub kind: SaleKind,
    pub customer_name: Option<String>,
    pub items: Vec<SaleItem>,
    pub down_payment: f64,
    pub payment_method: PaymentMethod,
    pub date: DateTime<Utc>,
    pub schedule: ScheduleRequest,
}

/// Aggregate root: Sale.
///
/// Totals are fixed when the sale is recorded; afterwards only the schedule
/// changes, through [`SaleCommand`]s. Deserialization goes through
/// [`SaleRecord`] and applies the same schedule checks as [`Sale::record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SaleRecord")]
pub struct Sale {
    id: SaleId,
    kind: SaleKind,
    customer_name: Option<String>,
    items: Vec<SaleItem>,
    total_price: f64,
    total_cost: f64,
    total_profit: f64,
    down_payment: f64,
    payment_method: PaymentMethod,
    date: DateTime<Utc>,
    schedule: PaymentSchedule,
    version: u64,
}

/// Unchecked wire form of a [`Sale`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    id: SaleId,
    kind: SaleKind,
    #[serde(default)]
    customer_name: Option<String>,
    items: Vec<SaleItem>,
    total_price: f64,
    total_cost: f64,
    total_profit: f64,
    down_payment: f64,
    payment_method: PaymentMethod,
    date: DateTime<Utc>,
    schedule: PaymentSchedule,
    #[serde(default)]
    version: u64,
}

impl TryFrom<SaleRecord> for Sale {
    type Error = DomainError;

    fn try_from(raw: SaleRecord) -> Result<Self, Self::Error> {
        ensure_non_negative("total cost", raw.total_cost)?;
        validate_down_payment(raw.total_price, raw.down_payment)?;

        let financed = raw.total_price - raw.down_payment;
        let schedule = match raw.schedule {
            PaymentSchedule::Explicit { installments } => {
                validate_installments(&installments)?;
                PaymentSchedule::explicit(installments)
            }
            PaymentSchedule::Legacy(legacy) => {
                let legacy = LegacySchedule::new(
                    legacy.installments_count,
                    legacy.due_date,
                    legacy.paid_installments,
                )?;
                split_amount(financed, legacy.installments_count)?;
                PaymentSchedule::Legacy(legacy)
            }
        };

        Ok(Self {
            id: raw.id,
            kind: raw.kind,
            customer_name: raw.customer_name,
            items: raw.items,
            total_price: raw.total_price,
            total_cost: raw.total_cost,
            total_profit: raw.total_profit,
            down_payment: raw.down_payment,
            payment_method: raw.payment_method,
            date: raw.date,
            schedule,
            version: raw.version,
        })
    }
}

/// Numbers start at 1 and are unique; values are finite and positive.
fn validate_installments(installments: &[Installment]) -> DomainResult<()> {
    if installments.len() > MAX_INSTALLMENTS as usize {
        return Err(DomainError::validation(format!(
            "schedule has {} installments, the maximum is {MAX_INSTALLMENTS}",
            installments.len()
        )));
    }
    let mut numbers: Vec<u32> = installments.iter().map(|i| i.number).collect();
    numbers.sort_unstable();
    if numbers.first() == Some(&0) {
        return Err(DomainError::validation("installment numbers start at 1"));
    }
    if numbers.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(DomainError::validation("installment numbers must be unique"));
    }
    for inst in installments {
        ensure_positive("installment value", inst.value)?;
    }
    Ok(())
}

impl Sale {
    /// Record a sale: validate the items, compute totals and build the schedule.
    pub fn record(new_sale: NewSale) -> DomainResult<Self> {
        if new_sale.items.is_empty() {
            return Err(DomainError::validation("sale must have at least one item"));
        }

        for item in &new_sale.items {
            if item.quantity == 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            ensure_non_negative("unit price", item.unit_price)?;
            ensure_non_negative("unit cost", item.unit_cost)?;
            match (new_sale.kind, item.product_id) {
                (SaleKind::Sale, None) => {
                    return Err(DomainError::validation("sale items must reference a product"));
                }
                (SaleKind::Commission, Some(_)) => {
                    return Err(DomainError::validation(
                        "commission items must not reference a product",
                    ));
                }
                _ => {}
            }
        }

        let total_price: f64 = new_sale.items.iter().map(SaleItem::total_price).sum();
        let total_cost: f64 = new_sale.items.iter().map(SaleItem::total_cost).sum();
        validate_down_payment(total_price, new_sale.down_payment)?;

        let schedule = match new_sale.schedule {
            ScheduleRequest::Explicit { count, first_due_date } => {
                let terms =
                    InstallmentTerms::new(total_price, new_sale.down_payment, count, first_due_date);
                PaymentSchedule::explicit(generate_installments(&terms)?)
            }
            ScheduleRequest::Legacy { count, first_due_date } => {
                let legacy = LegacySchedule::new(count, first_due_date, 0)?;
                // Projection splits on demand; reject terms it could not split.
                split_amount(total_price - new_sale.down_payment, count)?;
                PaymentSchedule::Legacy(legacy)
            }
        };

        Ok(Self {
            id: new_sale.sale_id,
            kind: new_sale.kind,
            customer_name: new_sale.customer_name,
            items: new_sale.items,
            total_price,
            total_cost,
            total_profit: total_price - total_cost,
            down_payment: new_sale.down_payment,
            payment_method: new_sale.payment_method,
            date: new_sale.date,
            schedule,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn kind(&self) -> SaleKind {
        self.kind
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn total_profit(&self) -> f64 {
        self.total_profit
    }

    /// Profit as a fraction of the price (0 when the price is 0).
    pub fn profit_margin(&self) -> f64 {
        if self.total_price > 0.0 {
            self.total_profit / self.total_price
        } else {
            0.0
        }
    }

    pub fn down_payment(&self) -> f64 {
        self.down_payment
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// When the sale was made.
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn schedule(&self) -> &PaymentSchedule {
        &self.schedule
    }

    /// Amount covered by the schedule: total price minus down payment.
    pub fn financed_amount(&self) -> f64 {
        self.total_price - self.down_payment
    }

    pub fn projected_schedule(&self) -> DomainResult<Vec<ProjectedInstallment>> {
        self.schedule.project(self.financed_amount())
    }

    pub fn status(&self) -> DomainResult<SaleStatus> {
        let outstanding = self.projected_schedule()?.iter().any(|inst| !inst.paid);
        Ok(if outstanding {
            SaleStatus::Pending
        } else {
            SaleStatus::Paid
        })
    }
}

impl AggregateRoot for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: MarkInstallmentPaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkInstallmentPaid {
    pub sale_id: SaleId,
    pub number: u32,
    pub paid_at: DateTime<Utc>,
}

/// Command: ReplaceInstallments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceInstallments {
    pub sale_id: SaleId,
    pub installments: Vec<Installment>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SettleSale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleSale {
    pub sale_id: SaleId,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SaleCommand {
    MarkInstallmentPaid(MarkInstallmentPaid),
    ReplaceInstallments(ReplaceInstallments),
    SettleSale(SettleSale),
}

/// Event: InstallmentPaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPaid {
    pub sale_id: SaleId,
    pub number: u32,
    pub paid_at: DateTime<Utc>,
}

/// Event: InstallmentsReplaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentsReplaced {
    pub sale_id: SaleId,
    pub installments: Vec<Installment>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleSettled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSettled {
    pub sale_id: SaleId,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SaleEvent {
    InstallmentPaid(InstallmentPaid),
    InstallmentsReplaced(InstallmentsReplaced),
    SaleSettled(SaleSettled),
}

impl Event for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::InstallmentPaid(_) => "sales.installment.paid",
            SaleEvent::InstallmentsReplaced(_) => "sales.installments.replaced",
            SaleEvent::SaleSettled(_) => "sales.sale.settled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SaleEvent::InstallmentPaid(e) => e.paid_at,
            SaleEvent::InstallmentsReplaced(e) => e.occurred_at,
            SaleEvent::SaleSettled(e) => e.paid_at,
        }
    }
}

impl Aggregate for Sale {
    type Command = SaleCommand;
    type Event = SaleEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SaleEvent::InstallmentPaid(e) => match &mut self.schedule {
                PaymentSchedule::Explicit { installments } => {
                    if let Some(inst) = installments.iter_mut().find(|i| i.number == e.number) {
                        inst.status = InstallmentStatus::Paid;
                        inst.paid_at = Some(e.paid_at);
                    }
                }
                PaymentSchedule::Legacy(legacy) => {
                    legacy.paid_installments = legacy.paid_installments.max(e.number);
                }
            },
            SaleEvent::InstallmentsReplaced(e) => {
                let mut installments = e.installments.clone();
                installments.sort_by_key(|inst| inst.number);
                self.schedule = PaymentSchedule::explicit(installments);
            }
            SaleEvent::SaleSettled(e) => match &mut self.schedule {
                PaymentSchedule::Explicit { installments } => {
                    for inst in installments.iter_mut().filter(|i| !i.is_paid()) {
                        inst.status = InstallmentStatus::Paid;
                        inst.paid_at = Some(e.paid_at);
                    }
                }
                PaymentSchedule::Legacy(legacy) => {
                    legacy.paid_installments = legacy.installments_count;
                }
            },
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SaleCommand::MarkInstallmentPaid(cmd) => self.handle_mark_paid(cmd),
            SaleCommand::ReplaceInstallments(cmd) => self.handle_replace(cmd),
            SaleCommand::SettleSale(cmd) => self.handle_settle(cmd),
        }
    }
}

impl Sale {
    fn ensure_sale_id(&self, sale_id: SaleId) -> Result<(), DomainError> {
        if self.id != sale_id {
            return Err(DomainError::invariant("sale_id mismatch"));
        }
        Ok(())
    }

    /// Already-paid installments produce no event; a legacy installment may
    /// only be paid right after the last paid one.
    fn handle_mark_paid(&self, cmd: &MarkInstallmentPaid) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_sale_id(cmd.sale_id)?;

        match &self.schedule {
            PaymentSchedule::Explicit { installments } => {
                let inst = installments
                    .iter()
                    .find(|i| i.number == cmd.number)
                    .ok_or_else(|| {
                        DomainError::validation(format!("unknown installment {}", cmd.number))
                    })?;
                if inst.is_paid() {
                    return Ok(vec![]);
                }
            }
            PaymentSchedule::Legacy(legacy) => {
                if cmd.number == 0 || cmd.number > legacy.installments_count {
                    return Err(DomainError::validation(format!(
                        "installment {} is outside 1..={}",
                        cmd.number, legacy.installments_count
                    )));
                }
                if cmd.number <= legacy.paid_installments {
                    return Ok(vec![]);
                }
                if legacy.paid_installments < cmd.number - 1 {
                    return Err(DomainError::sequence(cmd.number, legacy.paid_installments));
                }
            }
        }

        Ok(vec![SaleEvent::InstallmentPaid(InstallmentPaid {
            sale_id: cmd.sale_id,
            number: cmd.number,
            paid_at: cmd.paid_at,
        })])
    }

    fn handle_replace(&self, cmd: &ReplaceInstallments) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_sale_id(cmd.sale_id)?;
        validate_installments(&cmd.installments)?;

        Ok(vec![SaleEvent::InstallmentsReplaced(InstallmentsReplaced {
            sale_id: cmd.sale_id,
            installments: cmd.installments.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_settle(&self, cmd: &SettleSale) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_sale_id(cmd.sale_id)?;

        let outstanding = match &self.schedule {
            PaymentSchedule::Explicit { installments } => installments.iter().any(|i| !i.is_paid()),
            PaymentSchedule::Legacy(legacy) => {
                legacy.paid_installments < legacy.installments_count
            }
        };
        if !outstanding {
            return Ok(vec![]);
        }

        Ok(vec![SaleEvent::SaleSettled(SaleSettled {
            sale_id: cmd.sale_id,
            paid_at: cmd.paid_at,
        })])
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    pub fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    pub fn new_sale(total: f64, down: f64, schedule: ScheduleRequest) -> NewSale {
        NewSale {
            sale_id: SaleId::new(),
            kind: SaleKind::Sale,
            customer_name: Some("Ana".to_string()),
            items: vec![SaleItem::product(ProductId::new(), "Perfume", 1, total, total * 0.4)],
            down_payment: down,
            payment_method: PaymentMethod::Pix,
            date: ymd(2024, 1, 10),
            schedule,
        }
    }

    /// 900 in three installments from 2024-01-15, explicit.
    pub fn explicit_sale() -> Sale {
        Sale::record(new_sale(
            900.0,
            0.0,
            ScheduleRequest::Explicit {
                count: 3,
                first_due_date: ymd(2024, 1, 15),
            },
        ))
        .unwrap()
    }

    /// 900 in three installments from 2024-01-15, legacy counter.
    pub fn legacy_sale() -> Sale {
        Sale::record(new_sale(
            900.0,
            0.0,
            ScheduleRequest::Legacy {
                count: 3,
                first_due_date: ymd(2024, 1, 15),
            },
        ))
        .unwrap()
    }
}
