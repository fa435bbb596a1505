//! Public catalog and customer checkout.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create_product(pool: &PgPool, token: &str, body: Value) -> i64 {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/products",
        body,
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn checkout(pool: &PgPool, token: &str, body: Value) -> (StatusCode, Value) {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/store/checkout",
        body,
        token,
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn catalog_is_public_and_hides_cost(pool: PgPool) {
    let staff = common::staff_token(&pool).await;
    create_product(
        &pool,
        &staff,
        json!({ "sku": "MUG-1", "name": "Mug", "price": 12.5, "cost": 4.0, "stock_quantity": 5, "category": "Kitchen" }),
    )
    .await;
    create_product(
        &pool,
        &staff,
        json!({ "sku": "OLD-1", "name": "Retired", "price": 1.0, "is_active": false }),
    )
    .await;

    let response = get(common::build_test_app(pool.clone()), "/api/v1/store/products").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let products = json["data"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["sku"], "MUG-1");
    assert_eq!(products[0]["in_stock"], true);
    assert!(products[0].get("cost").is_none());
    assert!(products[0].get("reorder_level").is_none());

    let categories = body_json(get(common::build_test_app(pool), "/api/v1/store/categories").await).await;
    assert_eq!(categories["data"], json!(["Kitchen"]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inactive_product_is_404_in_store(pool: PgPool) {
    let staff = common::staff_token(&pool).await;
    let id = create_product(
        &pool,
        &staff,
        json!({ "sku": "OLD-1", "name": "Retired", "price": 1.0, "is_active": false }),
    )
    .await;

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/store/products/{id}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn checkout_takes_stock_and_awards_points(pool: PgPool) {
    let staff = common::staff_token(&pool).await;
    let product_id = create_product(
        &pool,
        &staff,
        json!({ "sku": "MUG-1", "name": "Mug", "price": 12.5, "stock_quantity": 5 }),
    )
    .await;
    let (token, customer_id) = common::register_customer(&pool, "alice").await;

    let (status, json) = checkout(
        &pool,
        &token,
        json!({
            "items": [{ "product_id": product_id, "quantity": 2 }],
            "shipping_address": "1 Main Street",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order = &json["data"];
    assert_eq!(order["channel"], "online");
    assert_eq!(order["status"], "paid");
    assert_eq!(order["customer_id"], customer_id);
    assert_eq!(order["total"].as_f64(), Some(25.0));
    assert_eq!(order["points_earned"], 25);
    assert_eq!(order["items"][0]["sku"], "MUG-1");
    assert_eq!(order["items"][0]["line_total"].as_f64(), Some(25.0));

    let product = body_json(
        get_auth(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/products/{product_id}"),
            &staff,
        )
        .await,
    )
    .await;
    assert_eq!(product["data"]["stock_quantity"], 3);

    let loyalty = body_json(
        get_auth(common::build_test_app(pool), "/api/v1/store/loyalty", &token).await,
    )
    .await;
    assert_eq!(loyalty["data"]["balance"], 25);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn checkout_beyond_stock_is_409(pool: PgPool) {
    let staff = common::staff_token(&pool).await;
    let product_id = create_product(
        &pool,
        &staff,
        json!({ "sku": "MUG-1", "name": "Mug", "price": 12.5, "stock_quantity": 1 }),
    )
    .await;
    let (token, _) = common::register_customer(&pool, "alice").await;

    let (status, json) = checkout(
        &pool,
        &token,
        json!({
            "items": [{ "product_id": product_id, "quantity": 2 }],
            "shipping_address": "1 Main Street",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn checkout_requires_address(pool: PgPool) {
    let staff = common::staff_token(&pool).await;
    let product_id = create_product(
        &pool,
        &staff,
        json!({ "sku": "MUG-1", "name": "Mug", "price": 12.5, "stock_quantity": 5 }),
    )
    .await;
    let (token, _) = common::register_customer(&pool, "alice").await;

    let (status, _) = checkout(
        &pool,
        &token,
        json!({
            "items": [{ "product_id": product_id, "quantity": 1 }],
            "shipping_address": "   ",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn customers_only_see_their_own_orders(pool: PgPool) {
    let staff = common::staff_token(&pool).await;
    let product_id = create_product(
        &pool,
        &staff,
        json!({ "sku": "MUG-1", "name": "Mug", "price": 12.5, "stock_quantity": 5 }),
    )
    .await;
    let (alice, _) = common::register_customer(&pool, "alice").await;
    let (bob, _) = common::register_customer(&pool, "bob").await;

    let (_, json) = checkout(
        &pool,
        &alice,
        json!({
            "items": [{ "product_id": product_id, "quantity": 1 }],
            "shipping_address": "1 Main Street",
        }),
    )
    .await;
    let order_id = json["data"]["id"].as_i64().unwrap();

    let mine = body_json(
        get_auth(common::build_test_app(pool.clone()), "/api/v1/store/orders", &alice).await,
    )
    .await;
    assert_eq!(mine["data"].as_array().unwrap().len(), 1);

    let detail = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/store/orders/{order_id}"),
        &alice,
    )
    .await;
    assert_eq!(detail.status(), StatusCode::OK);
    let detail = body_json(detail).await;
    assert_eq!(detail["data"]["shipments"], json!([]));

    let theirs = body_json(
        get_auth(common::build_test_app(pool.clone()), "/api/v1/store/orders", &bob).await,
    )
    .await;
    assert_eq!(theirs["data"], json!([]));

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/store/orders/{order_id}"),
        &bob,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn staff_cannot_check_out(pool: PgPool) {
    let staff = common::staff_token(&pool).await;

    let (status, _) = checkout(
        &pool,
        &staff,
        json!({ "items": [], "shipping_address": "1 Main Street" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
