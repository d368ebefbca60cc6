use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salesplan_core::money::ensure_non_negative;
use salesplan_core::{Aggregate, AggregateRoot, DomainError, Event, ProductId};

/// Aggregate root: Product.
///
/// Stock is a non-negative count; it only moves through [`ProductCommand`]s so
/// that a sale can never take it below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    category: String,
    /// Current selling price per unit.
    unit_price: f64,
    /// Acquisition cost per unit.
    unit_cost: f64,
    stock: u32,
    #[serde(default)]
    version: u64,
}

impl Product {
    /// Register a catalogue entry.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        category: impl Into<String>,
        unit_price: f64,
        unit_cost: f64,
        stock: u32,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        ensure_non_negative("unit price", unit_price)?;
        ensure_non_negative("unit cost", unit_cost)?;

        Ok(Self {
            id,
            name,
            category: category.into(),
            unit_price,
            unit_cost,
            stock,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_cost
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Whether `quantity` units can be sold without going below zero.
    pub fn can_fulfil(&self, quantity: u32) -> bool {
        quantity <= self.stock
    }

    /// Value of the units on hand at acquisition cost.
    pub fn stock_cost(&self) -> f64 {
        self.unit_cost * f64::from(self.stock)
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: SellStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellStock {
    pub product_id: ProductId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Restock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restock {
    pub product_id: ProductId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    SellStock(SellStock),
    Restock(Restock),
}

/// Event: StockSold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSold {
    pub product_id: ProductId,
    pub quantity: u32,
    pub remaining: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReplenished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReplenished {
    pub product_id: ProductId,
    pub quantity: u32,
    pub on_hand: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    StockSold(StockSold),
    StockReplenished(StockReplenished),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::StockSold(_) => "products.stock.sold",
            ProductEvent::StockReplenished(_) => "products.stock.replenished",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::StockSold(e) => e.occurred_at,
            ProductEvent::StockReplenished(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::StockSold(e) => {
                self.stock = e.remaining;
            }
            ProductEvent::StockReplenished(e) => {
                self.stock = e.on_hand;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::SellStock(cmd) => self.handle_sell(cmd),
            ProductCommand::Restock(cmd) => self.handle_restock(cmd),
        }
    }
}

impl Product {
    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_sell(&self, cmd: &SellStock) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_product_id(cmd.product_id)?;

        if cmd.quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        if !self.can_fulfil(cmd.quantity) {
            return Err(DomainError::validation(format!(
                "insufficient stock for {}: requested {}, available {}",
                self.name, cmd.quantity, self.stock
            )));
        }
        let remaining = self.stock - cmd.quantity;

        Ok(vec![ProductEvent::StockSold(StockSold {
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            remaining,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_restock(&self, cmd: &Restock) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_product_id(cmd.product_id)?;

        if cmd.quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        let on_hand = self
            .stock
            .checked_add(cmd.quantity)
            .ok_or_else(|| DomainError::validation("stock count overflow"))?;

        Ok(vec![ProductEvent::StockReplenished(StockReplenished {
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            on_hand,
            occurred_at: cmd.occurred_at,
        })])
    }
}
