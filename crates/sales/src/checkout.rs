//! Recording a sale against the product catalogue.

use std::collections::BTreeMap;

use tracing::debug;

use salesplan_core::{Aggregate, DomainError, DomainResult, Event, ProductId};
use salesplan_products::{Product, ProductCommand, SellStock};

use crate::sale::{NewSale, Sale, SaleKind};

/// Record `new_sale` and take its items out of stock.
///
/// Stock moves for every product or for none: all commands are decided
/// before any is applied, so an insufficient quantity on one line leaves the
/// whole catalogue untouched. Commissions do not touch stock.
pub fn checkout(products: &mut [Product], new_sale: NewSale) -> DomainResult<Sale> {
    let sale = Sale::record(new_sale)?;
    if sale.kind() == SaleKind::Commission {
        return Ok(sale);
    }

    let mut quantities: BTreeMap<ProductId, u32> = BTreeMap::new();
    for item in sale.items() {
        if let Some(product_id) = item.product_id {
            let entry = quantities.entry(product_id).or_default();
            *entry = entry
                .checked_add(item.quantity)
                .ok_or_else(|| DomainError::validation("quantity overflow"))?;
        }
    }

    let mut decided = Vec::with_capacity(quantities.len());
    for (product_id, quantity) in quantities {
        let index = products
            .iter()
            .position(|p| p.id_typed() == product_id)
            .ok_or_else(|| DomainError::validation(format!("unknown product {product_id}")))?;
        let cmd = ProductCommand::SellStock(SellStock {
            product_id,
            quantity,
            occurred_at: sale.date(),
        });
        let events = products[index].handle(&cmd)?;
        decided.push((index, events));
    }

    for (index, events) in decided {
        for event in &events {
            debug!(
                product_id = %products[index].id_typed(),
                event = event.event_type(),
                "stock moved"
            );
            products[index].apply(event);
        }
    }

    debug!(
        sale_id = %sale.id_typed(),
        total_price = sale.total_price(),
        installments = sale.schedule().len(),
        "sale recorded"
    );
    Ok(sale)
}
