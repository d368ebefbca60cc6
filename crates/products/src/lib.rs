//! Product catalogue module.
//!
//! Catalogue entries and their stock counts, implemented purely as
//! deterministic domain logic (no IO, no storage).

pub mod product;

pub use product::{
    Product, ProductCommand, ProductEvent, Restock, SellStock, StockReplenished, StockSold,
};
