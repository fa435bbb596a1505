//! Checkout, refunds, loyalty points, invoices and shipments against a real
//! database.

use std::str::FromStr;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use shopdesk_core::error::CoreError;
use shopdesk_core::orders::{CartRequest, OrderStatus};
use shopdesk_core::shipping::ShipmentStatus;
use shopdesk_db::error::DbError;
use shopdesk_db::models::customer::CreateCustomer;
use shopdesk_db::models::invoice::CreateInvoice;
use shopdesk_db::models::loyalty::AdjustLoyalty;
use shopdesk_db::models::order::{NewSale, RefundOrder};
use shopdesk_db::models::payment::PaymentFilter;
use shopdesk_db::models::product::CreateProduct;
use shopdesk_db::models::settings::UpdateStoreSettings;
use shopdesk_db::models::shipment::CreateShipment;
use shopdesk_db::repositories::{
    CustomerRepo, InvoiceRepo, LoyaltyRepo, OrderRepo, PaymentRepo, ProductRepo, SettingsRepo,
    ShipmentRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// 10% tax, 5.00 flat shipping, 1 point per unit, 0.01 per point.
async fn configure_store(pool: &PgPool) {
    SettingsRepo::update(
        pool,
        &UpdateStoreSettings {
            default_tax_rate: Some(d("10")),
            flat_shipping_fee: Some(d("5.00")),
            loyalty_points_per_unit: Some(1),
            loyalty_point_value: Some(d("0.01")),
            ..Default::default()
        },
    )
    .await
    .unwrap();
}

async fn seed_product(pool: &PgPool, sku: &str, price: &str, stock: i32) -> i64 {
    ProductRepo::create(
        pool,
        &CreateProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            description: None,
            category: None,
            price: d(price),
            cost: None,
            stock_quantity: Some(stock),
            reorder_level: None,
            is_active: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_customer(pool: &PgPool) -> i64 {
    CustomerRepo::create(
        pool,
        &CreateCustomer {
            name: "Dana Buyer".to_string(),
            email: Some("dana@example.test".to_string()),
            phone: None,
            address: None,
            notes: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn online_sale(customer_id: Option<i64>, product_id: i64, quantity: i32) -> NewSale {
    NewSale {
        customer_id,
        channel: "online".to_string(),
        status: "paid".to_string(),
        lines: vec![CartRequest {
            product_id,
            quantity,
        }],
        points_to_redeem: 0,
        manual_discount: Decimal::ZERO,
        charge_shipping: true,
        shipping_address: Some("1 Main St".to_string()),
        notes: None,
        method: "card".to_string(),
        reference: Some("ch_test_1".to_string()),
        created_by: None,
    }
}

async fn stock_of(pool: &PgPool, product_id: i64) -> i32 {
    ProductRepo::find_by_id(pool, product_id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

async fn points_of(pool: &PgPool, customer_id: i64) -> i64 {
    LoyaltyRepo::summary(pool, customer_id)
        .await
        .unwrap()
        .unwrap()
        .balance
}

// ---------------------------------------------------------------------------
// Checkout and refunds
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_checkout_with_points_then_refund(pool: PgPool) {
    configure_store(&pool).await;
    let product = seed_product(&pool, "TEE-M", "20.00", 5).await;
    let customer = seed_customer(&pool).await;
    LoyaltyRepo::adjust(
        &pool,
        customer,
        &AdjustLoyalty {
            points: 500,
            note: Some("Welcome bonus".to_string()),
        },
        None,
    )
    .await
    .unwrap();

    let mut sale = online_sale(Some(customer), product, 2);
    sale.points_to_redeem = 500;
    let detail = OrderRepo::record_sale(&pool, &sale).await.unwrap();
    let order = &detail.order;

    assert_eq!(order.order_number, format!("SO-{:06}", order.id));
    assert_eq!(order.subtotal, d("40.00"));
    assert_eq!(order.discount, d("5.00"));
    assert_eq!(order.tax, d("3.50"));
    assert_eq!(order.shipping_fee, d("5.00"));
    assert_eq!(order.total, d("43.50"));
    assert_eq!(order.points_redeemed, 500);
    assert_eq!(order.points_earned, 35);
    assert_eq!(detail.items[0].product_name, "Product TEE-M");
    assert_eq!(stock_of(&pool, product).await, 3);
    assert_eq!(points_of(&pool, customer).await, 35);

    let filter = PaymentFilter {
        order_id: Some(order.id),
        ..Default::default()
    };
    let payments = PaymentRepo::list(&pool, &filter, 50, 0).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].payment_type, "sale");
    assert_eq!(payments[0].amount, d("43.50"));
    assert_eq!(payments[0].reference.as_deref(), Some("ch_test_1"));

    let refunded = OrderRepo::refund(&pool, order.id, &RefundOrder::default(), None)
        .await
        .unwrap();
    assert_eq!(refunded.order.status, "refunded");
    assert_eq!(stock_of(&pool, product).await, 5);
    assert_eq!(points_of(&pool, customer).await, 500);

    let payments = PaymentRepo::list(&pool, &filter, 50, 0).await.unwrap();
    let refund = payments
        .iter()
        .find(|p| p.payment_type == "refund")
        .expect("refund payment recorded");
    assert_eq!(refund.amount, d("-43.50"));
    assert_eq!(refund.method, "card");

    assert_matches!(
        OrderRepo::refund(&pool, order.id, &RefundOrder::default(), None).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insufficient_stock_changes_nothing(pool: PgPool) {
    let product = seed_product(&pool, "MUG", "8.00", 2).await;

    assert_matches!(
        OrderRepo::record_sale(&pool, &online_sale(None, product, 3)).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );
    assert_eq!(stock_of(&pool, product).await, 2);
    let payments = PaymentRepo::list(&pool, &PaymentFilter::default(), 50, 0)
        .await
        .unwrap();
    assert!(payments.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_redeeming_more_than_balance_fails(pool: PgPool) {
    configure_store(&pool).await;
    let product = seed_product(&pool, "CAP", "15.00", 10).await;
    let customer = seed_customer(&pool).await;

    let mut sale = online_sale(Some(customer), product, 1);
    sale.points_to_redeem = 10;
    assert_matches!(
        OrderRepo::record_sale(&pool, &sale).await,
        Err(DbError::Core(CoreError::Validation(_)))
    );

    let mut anonymous = online_sale(None, product, 1);
    anonymous.points_to_redeem = 10;
    assert_matches!(
        OrderRepo::record_sale(&pool, &anonymous).await,
        Err(DbError::Core(CoreError::Validation(_)))
    );
    assert_eq!(stock_of(&pool, product).await, 10);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_loyalty_adjustment_cannot_go_negative(pool: PgPool) {
    let customer = seed_customer(&pool).await;
    assert_matches!(
        LoyaltyRepo::adjust(
            &pool,
            customer,
            &AdjustLoyalty {
                points: -1,
                note: None,
            },
            None,
        )
        .await,
        Err(DbError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        LoyaltyRepo::adjust(
            &pool,
            9999,
            &AdjustLoyalty {
                points: 10,
                note: None,
            },
            None,
        )
        .await,
        Err(DbError::Core(CoreError::NotFound { .. }))
    );
}

// ---------------------------------------------------------------------------
// Invoices and shipments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invoice_lifecycle(pool: PgPool) {
    let product = seed_product(&pool, "BAG", "30.00", 4).await;
    let order = OrderRepo::record_sale(&pool, &online_sale(None, product, 1))
        .await
        .unwrap()
        .order;

    let input = CreateInvoice {
        order_id: order.id,
        notes: None,
    };
    let invoice = InvoiceRepo::create(&pool, &input, None).await.unwrap();
    assert_eq!(invoice.status, "draft");
    assert_eq!(invoice.amount, order.total);
    assert!(invoice.invoice_number.starts_with("INV-"));

    // One live invoice per order.
    assert_matches!(
        InvoiceRepo::create(&pool, &input, None).await,
        Err(DbError::Database(_))
    );

    assert_matches!(
        InvoiceRepo::pay(&pool, invoice.id).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );
    let issued = InvoiceRepo::issue(&pool, invoice.id).await.unwrap();
    assert_eq!(issued.status, "issued");
    let (issued_at, due_at) = (issued.issued_at.unwrap(), issued.due_at.unwrap());
    assert_eq!((due_at - issued_at).num_days(), 30);

    let paid = InvoiceRepo::pay(&pool, invoice.id).await.unwrap();
    assert_eq!(paid.status, "paid");
    assert!(paid.paid_at.is_some());
    assert_matches!(
        InvoiceRepo::void(&pool, invoice.id).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_shipment_moves_order_along(pool: PgPool) {
    let product = seed_product(&pool, "LAMP", "45.00", 3).await;
    let order = OrderRepo::record_sale(&pool, &online_sale(None, product, 1))
        .await
        .unwrap()
        .order;

    let shipment = ShipmentRepo::create(
        &pool,
        &CreateShipment {
            order_id: order.id,
            carrier: "UPS".to_string(),
            tracking_number: Some("1Z999".to_string()),
            notes: None,
        },
        None,
    )
    .await
    .unwrap();
    assert_eq!(shipment.status, "pending");

    assert_matches!(
        ShipmentRepo::update_status(&pool, shipment.id, ShipmentStatus::Delivered).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );

    let in_transit = ShipmentRepo::update_status(&pool, shipment.id, ShipmentStatus::InTransit)
        .await
        .unwrap();
    assert!(in_transit.shipped_at.is_some());
    let current = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(current.status, OrderStatus::Shipped.as_str());

    let delivered = ShipmentRepo::update_status(&pool, shipment.id, ShipmentStatus::Delivered)
        .await
        .unwrap();
    assert!(delivered.delivered_at.is_some());
    let current = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(current.status, OrderStatus::Delivered.as_str());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pos_orders_are_not_shipped(pool: PgPool) {
    let product = seed_product(&pool, "PEN", "2.00", 50).await;
    let mut sale = online_sale(None, product, 5);
    sale.channel = "pos".to_string();
    sale.status = "completed".to_string();
    sale.charge_shipping = false;
    sale.method = "cash".to_string();
    let order = OrderRepo::record_sale(&pool, &sale).await.unwrap().order;
    assert_eq!(order.shipping_fee, Decimal::ZERO);
    assert_eq!(order.total, d("10.00"));

    assert_matches!(
        ShipmentRepo::create(
            &pool,
            &CreateShipment {
                order_id: order.id,
                carrier: "UPS".to_string(),
                tracking_number: None,
                notes: None,
            },
            None,
        )
        .await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );
}
