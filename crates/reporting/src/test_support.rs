use chrono::{DateTime, TimeZone, Utc};

use salesplan_core::{ProductId, SaleId};
use salesplan_sales::{NewSale, PaymentMethod, Sale, SaleItem, SaleKind, ScheduleRequest};

pub fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn record(total: f64, cost: f64, down: f64, date: DateTime<Utc>, schedule: ScheduleRequest) -> Sale {
    Sale::record(NewSale {
        sale_id: SaleId::new(),
        kind: SaleKind::Sale,
        customer_name: None,
        items: vec![SaleItem::product(ProductId::new(), "Perfume", 1, total, cost)],
        down_payment: down,
        payment_method: PaymentMethod::Pix,
        date,
        schedule,
    })
    .unwrap()
}

pub fn explicit(total: f64, cost: f64, down: f64, count: u32, first_due: DateTime<Utc>) -> Sale {
    record(
        total,
        cost,
        down,
        first_due,
        ScheduleRequest::Explicit {
            count,
            first_due_date: first_due,
        },
    )
}

pub fn legacy(total: f64, cost: f64, down: f64, count: u32, first_due: DateTime<Utc>) -> Sale {
    record(
        total,
        cost,
        down,
        first_due,
        ScheduleRequest::Legacy {
            count,
            first_due_date: first_due,
        },
    )
}
