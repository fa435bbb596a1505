//! Purchase order lifecycle over HTTP: draft, send, receive, pay.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get_auth, post_json_auth, put_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create_vendor(pool: &PgPool, token: &str) -> i64 {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/vendors",
        json!({ "name": "Acme Supply", "email": "orders@acme.test" }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn create_product(pool: &PgPool, token: &str, sku: &str, stock: i32) -> i64 {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/products",
        json!({ "sku": sku, "name": format!("Product {sku}"), "price": 12.5, "cost": 5.0, "stock_quantity": stock }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Draft PO for 10 units at 5.00 with 10% tax and 2.00 shipping.
async fn create_po(pool: &PgPool, token: &str, vendor_id: i64, product_id: i64) -> Value {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/purchase-orders",
        json!({
            "vendor_id": vendor_id,
            "items": [
                { "product_id": product_id, "quantity": 10, "unit_cost": 5.0, "tax_rate": 10, "shipping": 2.0 }
            ]
        }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn post_action(pool: &PgPool, token: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = post_json_auth(common::build_test_app(pool.clone()), uri, body, token).await;
    let status = response.status();
    (status, body_json(response).await)
}

fn amount(value: &Value) -> f64 {
    value.as_f64().expect("amount should be a JSON number")
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn draft_totals_are_derived_from_lines(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let vendor_id = create_vendor(&pool, &token).await;
    let product_id = create_product(&pool, &token, "BOLT-1", 0).await;

    let po = create_po(&pool, &token, vendor_id, product_id).await;

    assert_eq!(po["status"], "draft");
    assert_eq!(amount(&po["subtotal"]), 50.0);
    assert_eq!(amount(&po["tax_total"]), 5.0);
    assert_eq!(amount(&po["shipping_total"]), 2.0);
    assert_eq!(amount(&po["total"]), 57.0);
    assert_eq!(amount(&po["balance"]), 57.0);
    assert_eq!(po["payment_status"], "unpaid");
    assert_eq!(po["shipping_status"], "not_received");

    let line = &po["items"][0];
    assert_eq!(amount(&line["cost_excl_tax"]), 50.0);
    assert_eq!(amount(&line["total_tax"]), 5.0);
    assert_eq!(amount(&line["cost_incl_tax"]), 55.0);
    assert_eq!(amount(&line["total_price"]), 57.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_vendor_is_rejected(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let product_id = create_product(&pool, &token, "BOLT-1", 0).await;

    let (status, json) = post_action(
        &pool,
        &token,
        "/api/v1/purchase-orders",
        json!({ "vendor_id": 9999, "items": [{ "product_id": product_id, "quantity": 1, "unit_cost": 1.0 }] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn line_total_beyond_stored_range_is_rejected(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let vendor_id = create_vendor(&pool, &token).await;
    let product_id = create_product(&pool, &token, "BOLT-1", 0).await;

    let (status, json) = post_action(
        &pool,
        &token,
        "/api/v1/purchase-orders",
        json!({
            "vendor_id": vendor_id,
            "items": [{ "product_id": product_id, "quantity": 1000000, "unit_cost": 1000000, "tax_rate": 0, "shipping": 0 }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    // Each line fits on its own; the summed total does not.
    let line = json!({ "product_id": product_id, "quantity": 1000, "unit_cost": 1000000 });
    let (status, json) = post_action(
        &pool,
        &token,
        "/api/v1/purchase-orders",
        json!({ "vendor_id": vendor_id, "items": [line.clone(), line] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_draft_is_saved_but_cannot_be_sent(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let vendor_id = create_vendor(&pool, &token).await;
    let product_id = create_product(&pool, &token, "BOLT-1", 0).await;

    let (status, json) = post_action(
        &pool,
        &token,
        "/api/v1/purchase-orders",
        json!({ "vendor_id": vendor_id, "items": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let po = &json["data"];
    assert_eq!(amount(&po["total"]), 0.0);
    let uri = format!("/api/v1/purchase-orders/{}", po["id"]);

    let (status, json) = post_action(&pool, &token, &format!("{uri}/send"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let edit = json!({ "items": [{ "product_id": product_id, "quantity": 1, "unit_cost": 5.0 }] });
    let response = put_json_auth(common::build_test_app(pool.clone()), &uri, edit, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let (status, json) = post_action(&pool, &token, &format!("{uri}/send"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "sent");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn draft_can_be_edited_but_sent_cannot(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let vendor_id = create_vendor(&pool, &token).await;
    let product_id = create_product(&pool, &token, "BOLT-1", 0).await;
    let po = create_po(&pool, &token, vendor_id, product_id).await;
    let uri = format!("/api/v1/purchase-orders/{}", po["id"]);

    let edit = json!({ "items": [{ "product_id": product_id, "quantity": 2, "unit_cost": 5.0 }] });
    let response = put_json_auth(common::build_test_app(pool.clone()), &uri, edit.clone(), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(amount(&body_json(response).await["data"]["total"]), 10.0);

    let (status, _) = post_action(&pool, &token, &format!("{uri}/send"), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let response = put_json_auth(common::build_test_app(pool.clone()), &uri, edit, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = delete_auth(common::build_test_app(pool), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn receiving_moves_stock_and_status(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let vendor_id = create_vendor(&pool, &token).await;
    let product_id = create_product(&pool, &token, "BOLT-1", 3).await;
    let po = create_po(&pool, &token, vendor_id, product_id).await;
    let id = po["id"].as_i64().unwrap();
    let item_id = po["items"][0]["id"].as_i64().unwrap();
    let receive_uri = format!("/api/v1/purchase-orders/{id}/receive");

    // Receiving a draft is not allowed.
    let body = json!({ "items": [{ "purchase_order_item_id": item_id, "quantity": 4 }] });
    let (status, _) = post_action(&pool, &token, &receive_uri, body.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    post_action(&pool, &token, &format!("/api/v1/purchase-orders/{id}/send"), json!({})).await;

    let (status, receipt) = post_action(&pool, &token, &receive_uri, body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["data"]["items"][0]["quantity"], 4);

    let detail = body_json(
        get_auth(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/purchase-orders/{id}"),
            &token,
        )
        .await,
    )
    .await;
    assert_eq!(detail["data"]["status"], "partial");
    assert_eq!(detail["data"]["shipping_status"], "partial");
    assert_eq!(detail["data"]["items"][0]["quantity_received"], 4);

    // Over-receiving the remaining six units fails.
    let (status, json) = post_action(
        &pool,
        &token,
        &receive_uri,
        json!({ "items": [{ "purchase_order_item_id": item_id, "quantity": 7 }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, _) = post_action(
        &pool,
        &token,
        &receive_uri,
        json!({ "items": [{ "purchase_order_item_id": item_id, "quantity": 6 }] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let product = body_json(
        get_auth(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/products/{product_id}"),
            &token,
        )
        .await,
    )
    .await;
    assert_eq!(product["data"]["stock_quantity"], 13);

    let receipts = body_json(
        get_auth(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/purchase-orders/{id}/receipts"),
            &token,
        )
        .await,
    )
    .await;
    assert_eq!(receipts["data"].as_array().unwrap().len(), 2);

    let detail = body_json(
        get_auth(
            common::build_test_app(pool),
            &format!("/api/v1/purchase-orders/{id}"),
            &token,
        )
        .await,
    )
    .await;
    assert_eq!(detail["data"]["status"], "received");
    assert_eq!(detail["data"]["shipping_status"], "received");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payments_reduce_the_balance(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let vendor_id = create_vendor(&pool, &token).await;
    let product_id = create_product(&pool, &token, "BOLT-1", 0).await;
    let po = create_po(&pool, &token, vendor_id, product_id).await;
    let id = po["id"].as_i64().unwrap();
    let pay_uri = format!("/api/v1/purchase-orders/{id}/payments");

    // Drafts cannot be paid.
    let (status, _) =
        post_action(&pool, &token, &pay_uri, json!({ "amount": 10.0, "method": "cash" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    post_action(&pool, &token, &format!("/api/v1/purchase-orders/{id}/send"), json!({})).await;

    let (status, payment) = post_action(
        &pool,
        &token,
        &pay_uri,
        json!({ "amount": 20.0, "method": "bank_transfer", "reference": "TX-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["data"]["payment_type"], "vendor");
    assert_eq!(amount(&payment["data"]["amount"]), -20.0);
    assert_eq!(payment["data"]["vendor_id"], vendor_id);

    let (status, json) =
        post_action(&pool, &token, &pay_uri, json!({ "amount": 40.0, "method": "cash" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, _) =
        post_action(&pool, &token, &pay_uri, json!({ "amount": 10.0, "method": "barter" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let detail = body_json(
        get_auth(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/purchase-orders/{id}"),
            &token,
        )
        .await,
    )
    .await;
    assert_eq!(amount(&detail["data"]["amount_paid"]), 20.0);
    assert_eq!(amount(&detail["data"]["balance"]), 37.0);
    assert_eq!(detail["data"]["payment_status"], "partial");

    let (status, _) =
        post_action(&pool, &token, &pay_uri, json!({ "amount": 37.0, "method": "cash" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let payments = body_json(
        get_auth(common::build_test_app(pool.clone()), &pay_uri, &token).await,
    )
    .await;
    assert_eq!(payments["data"].as_array().unwrap().len(), 2);

    let detail = body_json(
        get_auth(
            common::build_test_app(pool),
            &format!("/api/v1/purchase-orders/{id}"),
            &token,
        )
        .await,
    )
    .await;
    assert_eq!(detail["data"]["payment_status"], "paid");
    assert_eq!(amount(&detail["data"]["balance"]), 0.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn draft_delete_and_cancel(pool: PgPool) {
    let token = common::staff_token(&pool).await;
    let vendor_id = create_vendor(&pool, &token).await;
    let product_id = create_product(&pool, &token, "BOLT-1", 0).await;

    let draft = create_po(&pool, &token, vendor_id, product_id).await;
    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/purchase-orders/{}", draft["id"]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let sent = create_po(&pool, &token, vendor_id, product_id).await;
    let id = sent["id"].as_i64().unwrap();
    post_action(&pool, &token, &format!("/api/v1/purchase-orders/{id}/send"), json!({})).await;
    let (status, json) =
        post_action(&pool, &token, &format!("/api/v1/purchase-orders/{id}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "cancelled");

    let list = body_json(
        get_auth(
            common::build_test_app(pool),
            "/api/v1/purchase-orders?status=cancelled",
            &token,
        )
        .await,
    )
    .await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}
