//! Point of sale, refunds, invoices, shipments, expenses and reports.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{body_json, delete_auth, get_auth, post_json_auth, put_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn send(pool: &PgPool, token: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = post_json_auth(common::build_test_app(pool.clone()), uri, body, token).await;
    let status = response.status();
    (status, body_json(response).await)
}

async fn fetch(pool: &PgPool, token: &str, uri: &str) -> Value {
    let response = get_auth(common::build_test_app(pool.clone()), uri, token).await;
    assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    body_json(response).await
}

async fn create_product(pool: &PgPool, token: &str, stock: i32) -> i64 {
    let (status, json) = send(
        pool,
        token,
        "/api/v1/products",
        json!({ "sku": "MUG-1", "name": "Mug", "price": 12.5, "stock_quantity": stock }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"]["id"].as_i64().unwrap()
}

async fn pos_sale(pool: &PgPool, token: &str, product_id: i64, quantity: i32) -> Value {
    let (status, json) = send(
        pool,
        token,
        "/api/v1/pos/sales",
        json!({ "items": [{ "product_id": product_id, "quantity": quantity }], "method": "cash" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"].clone()
}

fn today_period() -> String {
    let today = Utc::now().date_naive();
    format!("from={today}&to={today}")
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pos_sale_is_completed_and_paid(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let product_id = create_product(&pool, &token, 5).await;

    let order = pos_sale(&pool, &token, product_id, 2).await;
    assert_eq!(order["channel"], "pos");
    assert_eq!(order["status"], "completed");
    assert_eq!(order["total"].as_f64(), Some(25.0));

    let payments = fetch(
        &pool,
        &token,
        &format!("/api/v1/payments?order_id={}", order["id"]),
    )
    .await;
    let payment = &payments["data"][0];
    assert_eq!(payment["payment_type"], "sale");
    assert_eq!(payment["amount"].as_f64(), Some(25.0));
    assert_eq!(payment["direction"], "income");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refund_restocks_and_reports(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let product_id = create_product(&pool, &token, 5).await;
    let order = pos_sale(&pool, &token, product_id, 2).await;
    let refund_uri = format!("/api/v1/orders/{}/refund", order["id"]);

    let (status, json) = send(&pool, &token, &refund_uri, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "refunded");

    let (status, _) = send(&pool, &token, &refund_uri, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let product = fetch(&pool, &token, &format!("/api/v1/products/{product_id}")).await;
    assert_eq!(product["data"]["stock_quantity"], 5);

    let summary = fetch(&pool, &token, &format!("/api/v1/reports/summary?{}", today_period())).await;
    assert_eq!(summary["data"]["gross_sales"].as_f64(), Some(25.0));
    assert_eq!(summary["data"]["refunds"].as_f64(), Some(25.0));
    assert_eq!(summary["data"]["net_revenue"].as_f64(), Some(0.0));
    assert_eq!(summary["data"]["order_count"], 1);

    let daily = fetch(
        &pool,
        &token,
        &format!("/api/v1/reports/sales-by-day?{}", today_period()),
    )
    .await;
    assert_eq!(daily["data"]["days"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refunded_status_is_only_set_by_refund(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let product_id = create_product(&pool, &token, 5).await;
    let order = pos_sale(&pool, &token, product_id, 1).await;

    let response = put_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/orders/{}/status", order["id"]),
        json!({ "status": "refunded" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invoice_lifecycle(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let product_id = create_product(&pool, &token, 5).await;
    let order = pos_sale(&pool, &token, product_id, 2).await;

    let (status, json) = send(
        &pool,
        &token,
        "/api/v1/invoices",
        json!({ "order_id": order["id"] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let invoice = &json["data"];
    assert_eq!(invoice["status"], "draft");
    assert_eq!(invoice["amount"].as_f64(), Some(25.0));
    assert_eq!(invoice["is_overdue"], false);
    let id = invoice["id"].as_i64().unwrap();

    // Drafts cannot be paid directly.
    let (status, _) = send(&pool, &token, &format!("/api/v1/invoices/{id}/pay"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) =
        send(&pool, &token, &format!("/api/v1/invoices/{id}/issue"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "issued");
    assert!(json["data"]["due_at"].is_string());

    let (status, json) = send(&pool, &token, &format!("/api/v1/invoices/{id}/pay"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "paid");

    let (status, _) = send(&pool, &token, &format!("/api/v1/invoices/{id}/void"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let listed = fetch(&pool, &token, "/api/v1/invoices?status=paid").await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn shipments_carry_the_order_along(pool: PgPool) {
    let staff = common::staff_token(&pool).await;
    let product_id = create_product(&pool, &staff, 5).await;
    let (customer, _) = common::register_customer(&pool, "alice").await;
    let (_, json) = send(
        &pool,
        &customer,
        "/api/v1/store/checkout",
        json!({
            "items": [{ "product_id": product_id, "quantity": 1 }],
            "shipping_address": "1 Main Street",
        }),
    )
    .await;
    let order_id = json["data"]["id"].as_i64().unwrap();

    let (status, json) = send(
        &pool,
        &staff,
        "/api/v1/shipments",
        json!({ "order_id": order_id, "carrier": "UPS", "tracking_number": "1Z999" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["status"], "pending");
    let shipment_uri = format!("/api/v1/shipments/{}/status", json["data"]["id"]);

    // Skipping transit is not allowed.
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &shipment_uri,
        json!({ "status": "delivered" }),
        &staff,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    for (next, order_status) in [("in_transit", "shipped"), ("delivered", "delivered")] {
        let response = put_json_auth(
            common::build_test_app(pool.clone()),
            &shipment_uri,
            json!({ "status": next }),
            &staff,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let order = fetch(&pool, &staff, &format!("/api/v1/orders/{order_id}")).await;
        assert_eq!(order["data"]["status"], order_status);
    }

    let mine = fetch(&pool, &customer, &format!("/api/v1/store/orders/{order_id}")).await;
    assert_eq!(mine["data"]["shipments"][0]["status"], "delivered");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pos_orders_cannot_be_shipped(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let product_id = create_product(&pool, &token, 5).await;
    let order = pos_sale(&pool, &token, product_id, 1).await;

    let (status, _) = send(
        &pool,
        &token,
        "/api/v1/shipments",
        json!({ "order_id": order["id"], "carrier": "UPS" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expenses_feed_the_reports(pool: PgPool) {
    let token = common::staff_token(&pool).await;

    let (status, json) = send(
        &pool,
        &token,
        "/api/v1/expense-categories",
        json!({ "name": "Rent", "kind": "fixed", "color": "#aabbcc" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["kind"], "FIXED");
    assert_eq!(json["data"]["color"], "#AABBCC");
    let category_id = json["data"]["id"].as_i64().unwrap();

    let (status, json) = send(
        &pool,
        &token,
        "/api/v1/expenses",
        json!({ "category_id": category_id, "description": "October rent", "amount": 40.0, "method": "bank_transfer" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(json["data"]["payment_id"].is_i64());

    let summary = fetch(&pool, &token, &format!("/api/v1/reports/summary?{}", today_period())).await;
    assert_eq!(summary["data"]["expenses"].as_f64(), Some(40.0));
    assert_eq!(summary["data"]["net_cash_flow"].as_f64(), Some(-40.0));

    let breakdown = fetch(
        &pool,
        &token,
        &format!("/api/v1/reports/expenses-by-category?{}", today_period()),
    )
    .await;
    assert_eq!(breakdown["data"]["fixed_total"].as_f64(), Some(40.0));
    assert_eq!(breakdown["data"]["categories"][0]["share"].as_f64(), Some(100.0));

    let response = delete_auth(
        common::build_test_app(pool),
        &format!("/api/v1/expense-categories/{category_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn manual_adjustments_and_their_limits(pool: PgPool) {
    let token = common::staff_token(&pool).await;

    let (status, json) = send(
        &pool,
        &token,
        "/api/v1/payments",
        json!({ "payment_type": "adjustment", "amount": -5.0, "method": "cash", "notes": "Till short" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["direction"], "outflow");
    let id = json["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &pool,
        &token,
        "/api/v1/payments",
        json!({ "payment_type": "sale", "amount": 5.0, "method": "cash" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let listed = fetch(&pool, &token, "/api/v1/payments?payment_type=adjustment").await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/payments/{id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let listed = fetch(&pool, &token, "/api/v1/payments").await;
    assert_eq!(listed["data"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn purchase_order_report_lists_totals(pool: PgPool) {
    let token = common::staff_token(&pool).await;

    let report = fetch(&pool, &token, "/api/v1/reports/purchase-orders").await;
    assert!(report["data"]["by_status"].is_array());
    assert_eq!(report["data"]["overdue"], json!([]));
}
