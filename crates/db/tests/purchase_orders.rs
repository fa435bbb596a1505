//! Purchase order lifecycle against a real database: totals, sending,
//! partial and full receiving, vendor payments and the guards between them.

use std::str::FromStr;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use shopdesk_core::error::CoreError;
use shopdesk_core::purchasing::{PaymentStatus, ShippingStatus};
use shopdesk_db::error::DbError;
use shopdesk_db::models::payment::RecordVendorPayment;
use shopdesk_db::models::product::CreateProduct;
use shopdesk_db::models::purchase_order::{CreatePurchaseOrder, PurchaseOrderLineInput};
use shopdesk_db::models::receipt::{ReceiveGoods, ReceiveLine};
use shopdesk_db::models::vendor::CreateVendor;
use shopdesk_db::repositories::{PaymentRepo, ProductRepo, PurchaseOrderRepo, VendorRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn seed_vendor(pool: &PgPool) -> i64 {
    VendorRepo::create(
        pool,
        &CreateVendor {
            name: "Acme Supply".to_string(),
            contact_name: None,
            email: Some("orders@acme.test".to_string()),
            phone: None,
            address: None,
            notes: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_product(pool: &PgPool, sku: &str) -> i64 {
    ProductRepo::create(
        pool,
        &CreateProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            description: None,
            category: Some("Mugs".to_string()),
            price: d("19.99"),
            cost: Some(d("5.00")),
            stock_quantity: Some(0),
            reorder_level: Some(2),
            is_active: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn line(
    product_id: i64,
    quantity: i32,
    unit_cost: &str,
    tax_rate: &str,
    shipping: &str,
) -> PurchaseOrderLineInput {
    PurchaseOrderLineInput {
        product_id,
        quantity,
        unit_cost: d(unit_cost),
        tax_rate: d(tax_rate),
        shipping: d(shipping),
    }
}

fn vendor_payment(amount: &str) -> RecordVendorPayment {
    RecordVendorPayment {
        amount: d(amount),
        method: "bank_transfer".to_string(),
        reference: None,
        notes: None,
        paid_at: None,
    }
}

/// Draft PO with two lines: 10 x 5.00 at 10% tax + 2.50 shipping, 4 x 12.50.
async fn seed_purchase_order(pool: &PgPool) -> (i64, i64, i64) {
    let vendor_id = seed_vendor(pool).await;
    let mug = seed_product(pool, "MUG-1").await;
    let cup = seed_product(pool, "CUP-1").await;
    let detail = PurchaseOrderRepo::create(
        pool,
        &CreatePurchaseOrder {
            vendor_id,
            expected_at: None,
            notes: None,
            items: vec![
                line(mug, 10, "5.00", "10", "2.50"),
                line(cup, 4, "12.50", "0", "0"),
            ],
        },
        None,
    )
    .await
    .unwrap();
    (detail.order.id, mug, cup)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_computes_totals_and_number(pool: PgPool) {
    let (po_id, _, _) = seed_purchase_order(&pool).await;
    let detail = PurchaseOrderRepo::find_detail(&pool, po_id).await.unwrap().unwrap();

    assert_eq!(detail.order.po_number, format!("PO-{po_id:06}"));
    assert_eq!(detail.order.status, "draft");
    assert_eq!(detail.order.subtotal, d("100.00"));
    assert_eq!(detail.order.tax_total, d("5.00"));
    assert_eq!(detail.order.shipping_total, d("2.50"));
    assert_eq!(detail.order.total, d("107.50"));
    assert_eq!(detail.balance, d("107.50"));
    assert_eq!(detail.payment_status, PaymentStatus::Unpaid);
    assert_eq!(detail.shipping_status, ShippingStatus::NotReceived);

    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.items[0].line_no, 1);
    assert_eq!(detail.items[0].total_price, d("57.50"));
    assert_eq!(detail.items[1].total_price, d("50.00"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_draft_cannot_receive_or_be_paid(pool: PgPool) {
    let (po_id, _, _) = seed_purchase_order(&pool).await;
    let items = PurchaseOrderRepo::list_items(&pool, po_id).await.unwrap();

    let receive = ReceiveGoods {
        items: vec![ReceiveLine {
            purchase_order_item_id: items[0].id,
            quantity: 1,
        }],
        notes: None,
    };
    assert_matches!(
        PurchaseOrderRepo::receive(&pool, po_id, &receive, None).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );
    assert_matches!(
        PurchaseOrderRepo::record_payment(&pool, po_id, &vendor_payment("10.00"), None).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_partial_then_full_receipt(pool: PgPool) {
    let (po_id, mug, cup) = seed_purchase_order(&pool).await;
    let sent = PurchaseOrderRepo::send(&pool, po_id).await.unwrap();
    assert_eq!(sent.status, "sent");
    assert!(sent.ordered_at.is_some());

    let items = PurchaseOrderRepo::list_items(&pool, po_id).await.unwrap();
    let first = PurchaseOrderRepo::receive(
        &pool,
        po_id,
        &ReceiveGoods {
            items: vec![ReceiveLine {
                purchase_order_item_id: items[0].id,
                quantity: 6,
            }],
            notes: Some("First pallet".to_string()),
        },
        None,
    )
    .await
    .unwrap();
    assert!(first.receipt.receipt_number.starts_with("RC-"));
    assert_eq!(first.items.len(), 1);

    let detail = PurchaseOrderRepo::find_detail(&pool, po_id).await.unwrap().unwrap();
    assert_eq!(detail.order.status, "partial");
    assert_eq!(detail.shipping_status, ShippingStatus::Partial);
    let mug_stock = ProductRepo::find_by_id(&pool, mug).await.unwrap().unwrap();
    assert_eq!(mug_stock.stock_quantity, 6);

    // Receiving more than is outstanding is rejected and changes nothing.
    let over = ReceiveGoods {
        items: vec![ReceiveLine {
            purchase_order_item_id: items[0].id,
            quantity: 5,
        }],
        notes: None,
    };
    assert_matches!(
        PurchaseOrderRepo::receive(&pool, po_id, &over, None).await,
        Err(DbError::Core(CoreError::Validation(_)))
    );
    let mug_stock = ProductRepo::find_by_id(&pool, mug).await.unwrap().unwrap();
    assert_eq!(mug_stock.stock_quantity, 6);

    PurchaseOrderRepo::receive(
        &pool,
        po_id,
        &ReceiveGoods {
            items: vec![
                ReceiveLine {
                    purchase_order_item_id: items[0].id,
                    quantity: 4,
                },
                ReceiveLine {
                    purchase_order_item_id: items[1].id,
                    quantity: 4,
                },
            ],
            notes: None,
        },
        None,
    )
    .await
    .unwrap();

    let detail = PurchaseOrderRepo::find_detail(&pool, po_id).await.unwrap().unwrap();
    assert_eq!(detail.order.status, "received");
    assert_eq!(detail.shipping_status, ShippingStatus::Received);
    let cup_stock = ProductRepo::find_by_id(&pool, cup).await.unwrap().unwrap();
    assert_eq!(cup_stock.stock_quantity, 4);

    assert_matches!(
        PurchaseOrderRepo::cancel(&pool, po_id).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_vendor_payments_track_balance(pool: PgPool) {
    let (po_id, _, _) = seed_purchase_order(&pool).await;
    PurchaseOrderRepo::send(&pool, po_id).await.unwrap();

    let payment = PurchaseOrderRepo::record_payment(&pool, po_id, &vendor_payment("40.00"), None)
        .await
        .unwrap();
    assert_eq!(payment.payment_type, "vendor");
    assert_eq!(payment.amount, d("-40.00"));
    assert_eq!(payment.purchase_order_id, Some(po_id));

    let detail = PurchaseOrderRepo::find_detail(&pool, po_id).await.unwrap().unwrap();
    assert_eq!(detail.order.amount_paid, d("40.00"));
    assert_eq!(detail.balance, d("67.50"));
    assert_eq!(detail.payment_status, PaymentStatus::Partial);

    assert_matches!(
        PurchaseOrderRepo::record_payment(&pool, po_id, &vendor_payment("67.51"), None).await,
        Err(DbError::Core(CoreError::Validation(_)))
    );

    PurchaseOrderRepo::record_payment(&pool, po_id, &vendor_payment("67.50"), None)
        .await
        .unwrap();
    let detail = PurchaseOrderRepo::find_detail(&pool, po_id).await.unwrap().unwrap();
    assert_eq!(detail.payment_status, PaymentStatus::Paid);

    // Deleting a vendor payment restores the balance.
    PaymentRepo::delete(&pool, payment.id).await.unwrap();
    let detail = PurchaseOrderRepo::find_detail(&pool, po_id).await.unwrap().unwrap();
    assert_eq!(detail.order.amount_paid, d("67.50"));
    assert_eq!(detail.balance, d("40.00"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_only_drafts_are_deleted(pool: PgPool) {
    let (po_id, _, _) = seed_purchase_order(&pool).await;
    PurchaseOrderRepo::send(&pool, po_id).await.unwrap();
    assert_matches!(
        PurchaseOrderRepo::delete(&pool, po_id).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );

    let cancelled = PurchaseOrderRepo::cancel(&pool, po_id).await.unwrap();
    assert_eq!(cancelled.status, "cancelled");

    let vendor_id = seed_vendor(&pool).await;
    let bowl = seed_product(&pool, "BOWL-1").await;
    let draft = PurchaseOrderRepo::create(
        &pool,
        &CreatePurchaseOrder {
            vendor_id,
            expected_at: None,
            notes: None,
            items: vec![line(bowl, 1, "3.00", "0", "0")],
        },
        None,
    )
    .await
    .unwrap();
    let draft_id = draft.order.id;
    PurchaseOrderRepo::delete(&pool, draft_id).await.unwrap();
    assert!(PurchaseOrderRepo::find_by_id(&pool, draft_id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_receipts_with_crossed_lines(pool: PgPool) {
    let vendor_id = seed_vendor(&pool).await;
    let mug = seed_product(&pool, "MUG-1").await;
    let cup = seed_product(&pool, "CUP-1").await;

    let mut po_ids = Vec::new();
    for products in [[mug, cup], [cup, mug]] {
        let detail = PurchaseOrderRepo::create(
            &pool,
            &CreatePurchaseOrder {
                vendor_id,
                expected_at: None,
                notes: None,
                items: products
                    .iter()
                    .map(|&p| line(p, 10, "1.00", "0", "0"))
                    .collect(),
            },
            None,
        )
        .await
        .unwrap();
        PurchaseOrderRepo::send(&pool, detail.order.id).await.unwrap();
        po_ids.push(detail.order.id);
    }

    // Each receipt lists its lines in PO order, so the two transactions
    // touch the same products in opposite orders.
    let mut receipts = Vec::new();
    for &po_id in &po_ids {
        let items = PurchaseOrderRepo::list_items(&pool, po_id).await.unwrap();
        receipts.push(ReceiveGoods {
            items: items
                .iter()
                .map(|i| ReceiveLine {
                    purchase_order_item_id: i.id,
                    quantity: 1,
                })
                .collect(),
            notes: None,
        });
    }

    for _ in 0..5 {
        let (first, second) = tokio::join!(
            PurchaseOrderRepo::receive(&pool, po_ids[0], &receipts[0], None),
            PurchaseOrderRepo::receive(&pool, po_ids[1], &receipts[1], None),
        );
        assert!(first.is_ok(), "first receipt failed: {first:?}");
        assert!(second.is_ok(), "second receipt failed: {second:?}");
    }

    for product_id in [mug, cup] {
        let product = ProductRepo::find_by_id(&pool, product_id).await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 10);
    }
}
