//! End-to-end flows: record, pay, edit, report.

use chrono::{DateTime, TimeZone, Utc};

use salesplan_core::calendar::from_epoch_millis;
use salesplan_core::{DomainError, ProductId, SaleId};
use salesplan_products::Product;
use salesplan_reporting::{
    DueStatus, MetricsConfig, ReportingPeriod, compute_metrics, next_due, receivables_summary,
    stock_valuation,
};
use salesplan_sales::tracker::{is_paid, mark_paid};
use salesplan_sales::{
    NewSale, PaymentMethod, PaymentSchedule, PlanEditor, SaleItem, SaleKind, ScheduleRequest,
    checkout,
};

fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn catalogue() -> Vec<Product> {
    vec![Product::new(ProductId::new(), "Perfume", "Fragrance", 900.0, 360.0, 5).unwrap()]
}

fn perfume_sale(products: &[Product], schedule: ScheduleRequest) -> NewSale {
    let p = &products[0];
    NewSale {
        sale_id: SaleId::new(),
        kind: SaleKind::Sale,
        customer_name: Some("Beatriz".to_string()),
        items: vec![SaleItem::product(
            p.id_typed(),
            p.name(),
            1,
            p.unit_price(),
            p.unit_cost(),
        )],
        down_payment: 0.0,
        payment_method: PaymentMethod::Card,
        date: ymd(2024, 1, 10),
        schedule,
    }
}

#[test]
fn legacy_sale_reports_each_installment_in_its_own_month() {
    salesplan_observability::init();

    let mut products = catalogue();
    let order = perfume_sale(
        &products,
        ScheduleRequest::Legacy {
            count: 3,
            first_due_date: ymd(2024, 1, 15),
        },
    );
    let mut sale = checkout(&mut products, order).unwrap();
    mark_paid(&mut sale, 1, ymd(2024, 1, 15)).unwrap();
    assert_eq!(products[0].stock(), 4);

    let sales = vec![sale];
    let january = ReportingPeriod::new(0, 2024).unwrap();
    let m = compute_metrics(&sales, january, ymd(2024, 1, 20), &MetricsConfig::default()).unwrap();

    assert_eq!(m.received_month, 300.0);
    assert_eq!(m.pending_month, 0.0);
    assert_eq!(m.pending_total, 600.0);
    assert_eq!(m.profit_month, 540.0);
    assert!(m.alerts.is_empty());

    let february = ReportingPeriod::new(1, 2024).unwrap();
    let m = compute_metrics(
        &sales,
        february,
        ymd(2024, 2, 10),
        &MetricsConfig::default(),
    )
    .unwrap();
    assert_eq!(m.pending_month, 300.0);
    assert_eq!(m.profit_month, 0.0);
    assert_eq!(m.alerts.len(), 1);
    assert_eq!(m.alerts[0].installment_number, 2);
    assert_eq!(m.alerts[0].days_diff, 5);
}

#[test]
fn explicit_plan_edit_keeps_paid_installment_and_reports_delta() {
    salesplan_observability::init();

    let mut products = catalogue();
    let order = perfume_sale(
        &products,
        ScheduleRequest::Explicit {
            count: 3,
            first_due_date: ymd(2024, 1, 15),
        },
    );
    let mut sale = checkout(&mut products, order).unwrap();
    mark_paid(&mut sale, 1, ymd(2024, 1, 15)).unwrap();

    let mut editor = PlanEditor::open(&sale).unwrap();
    editor.set_installment_value(1, 250.0).unwrap();
    assert_eq!(editor.reconciliation_delta(), 50.0);

    let report = editor.commit(&mut sale, ymd(2024, 1, 16)).unwrap();
    assert_eq!(report.delta, 50.0);
    assert!(report.warning.is_some());
    assert!(is_paid(&sale, 1));

    let m = compute_metrics(
        std::slice::from_ref(&sale),
        ReportingPeriod::new(1, 2024).unwrap(),
        ymd(2024, 2, 1),
        &MetricsConfig::default(),
    )
    .unwrap();
    assert_eq!(m.pending_month, 250.0);
    assert_eq!(m.pending_total, 550.0);
}

#[test]
fn legacy_sale_becomes_explicit_after_edit() {
    let mut products = catalogue();
    let order = perfume_sale(
        &products,
        ScheduleRequest::Legacy {
            count: 3,
            first_due_date: ymd(2024, 1, 31),
        },
    );
    let mut sale = checkout(&mut products, order).unwrap();
    mark_paid(&mut sale, 1, ymd(2024, 1, 31)).unwrap();

    let dates: Vec<_> = sale
        .projected_schedule()
        .unwrap()
        .iter()
        .map(|i| i.due_date)
        .collect();
    assert_eq!(
        dates,
        vec![ymd(2024, 1, 31), ymd(2024, 2, 29), ymd(2024, 3, 29)]
    );

    let editor = PlanEditor::open(&sale).unwrap();
    editor.commit(&mut sale, ymd(2024, 2, 1)).unwrap();
    assert!(matches!(sale.schedule(), PaymentSchedule::Explicit { .. }));
    assert!(is_paid(&sale, 1));
    assert!(!is_paid(&sale, 2));
}

#[test]
fn out_of_order_legacy_payment_does_not_move_metrics() {
    let mut products = catalogue();
    let order = perfume_sale(
        &products,
        ScheduleRequest::Legacy {
            count: 3,
            first_due_date: ymd(2024, 1, 15),
        },
    );
    let mut sale = checkout(&mut products, order).unwrap();

    let err = mark_paid(&mut sale, 3, ymd(2024, 1, 15)).unwrap_err();
    assert_eq!(err, DomainError::sequence(3, 0));

    let summary = receivables_summary(std::slice::from_ref(&sale), ymd(2024, 2, 20)).unwrap();
    assert_eq!(summary.pending_total, 900.0);
    assert_eq!(summary.overdue_count, 2);
    assert_eq!(summary.overdue_total, 600.0);

    let next = next_due(&sale, ymd(2024, 2, 20), &MetricsConfig::default())
        .unwrap()
        .unwrap();
    assert_eq!(next.installment_number, 1);
    assert_eq!(next.status, DueStatus::Overdue);
}

#[test]
fn stock_is_only_taken_when_the_whole_sale_fits() {
    let mut products = catalogue();
    let mut order = perfume_sale(
        &products,
        ScheduleRequest::Explicit {
            count: 1,
            first_due_date: ymd(2024, 2, 10),
        },
    );
    order.items[0].quantity = 6;

    assert!(checkout(&mut products, order).unwrap_err().is_validation());
    assert_eq!(products[0].stock(), 5);
    assert_eq!(stock_valuation(&products), 1800.0);
}

#[test]
fn epoch_millis_boundary_feeds_the_aggregator() {
    let mut products = catalogue();
    let order = perfume_sale(
        &products,
        ScheduleRequest::Explicit {
            count: 3,
            first_due_date: ymd(2024, 1, 15),
        },
    );
    let sale = checkout(&mut products, order).unwrap();

    // 2024-01-13T12:00:00Z
    let now = from_epoch_millis(1_705_147_200_000).unwrap();
    let m = compute_metrics(
        &[sale],
        ReportingPeriod::containing(now),
        now,
        &MetricsConfig::default(),
    )
    .unwrap();
    assert_eq!(m.pending_month, 300.0);
    assert_eq!(m.alerts[0].days_diff, 2);
}
