use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use oja_common::Kobo;
use oja_engine::{
    db_types::{Market, MarketProduct, OrderItem, OrderStatusType, ProductPrice},
    events::EventProducers,
    matching::MatchConfig,
    CatalogApi,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{sample_order, send_request},
    mocks::MockMarketplaceDb,
};
use crate::routes::{CreateOrderRoute, OrderByNoRoute, SearchOrdersRoute};

#[actix_web::test]
async fn fetching_an_order_returns_the_order_and_its_items() {
    let req = TestRequest::get().uri("/orders/OJA-20240614-7G2K4A");
    let (status, body) = send_request(req, configure_reads).await;
    assert_eq!(status, StatusCode::OK);
    let result: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["order"]["order_no"], "OJA-20240614-7G2K4A");
    assert_eq!(result["items"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn unknown_orders_return_404() {
    let req = TestRequest::get().uri("/orders/OJA-20240614-ZZZZZZ");
    let (status, body) = send_request(req, configure_missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("does not exist"), "body was {body}");
}

#[actix_web::test]
async fn the_search_path_is_not_swallowed_by_the_order_path() {
    // Routes are registered in the same order as in server.rs; "search" must not be read as an
    // order number.
    let req = TestRequest::get().uri("/orders/search?customer_phone=%2B2348012345678");
    let (status, body) = send_request(req, configure_reads).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn status_filters_bind_from_the_query_string() {
    // The wire form is a single comma-separated value, not a repeated parameter.
    let req = TestRequest::get().uri("/orders/search?status=Paid,Pending");
    let (status, body) = send_request(req, configure_status_search).await;
    assert_eq!(status, StatusCode::OK, "body was {body}");

    let req = TestRequest::get().uri("/orders/search?status=Shipped");
    let (status, _) = send_request(req, configure_status_search).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn orders_are_created_from_resolvable_lines_only() {
    let req = TestRequest::post().uri("/orders").set_json(json!({
        "market_id": 1,
        "customer_phone": "+2348012345678",
        "delivery_address": "14 Adeola Odeku St, Victoria Island",
        "items": [
            { "text": "2x 1kg rice" },
            { "text": "jollof seasoning cube deluxe" }
        ]
    }));
    let (status, body) = send_request(req, configure_intake).await;
    assert_eq!(status, StatusCode::OK, "body was {body}");
    let result: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["order"]["order_no"], "OJA-20240614-7G2K4A");
    let skipped = result["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0]["reason"].as_str().unwrap().contains("No match"));
}

#[actix_web::test]
async fn an_order_with_no_resolvable_lines_is_rejected() {
    let req = TestRequest::post().uri("/orders").set_json(json!({
        "market_id": 1,
        "customer_phone": "+2348012345678",
        "delivery_address": "14 Adeola Odeku St, Victoria Island",
        "items": [{ "text": "flux capacitor" }]
    }));
    let (status, body) = send_request(req, configure_intake).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("No cart line could be matched"), "body was {body}");
}

fn configure_reads(cfg: &mut ServiceConfig) {
    let mut db = MockMarketplaceDb::new();
    db.expect_fetch_order_by_order_no().returning(|_| Ok(Some(sample_order(OrderStatusType::Pending))));
    db.expect_fetch_order_items().returning(|_| Ok(vec![sample_item()]));
    db.expect_search_orders().returning(|_| Ok(vec![]));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(SearchOrdersRoute::<MockMarketplaceDb>::new())
        .service(OrderByNoRoute::<MockMarketplaceDb>::new())
        .app_data(web::Data::new(api));
}

fn configure_status_search(cfg: &mut ServiceConfig) {
    let mut db = MockMarketplaceDb::new();
    db.expect_search_orders()
        .withf(|q| q.status.as_deref() == Some([OrderStatusType::Paid, OrderStatusType::Pending].as_slice()))
        .returning(|_| Ok(vec![]));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(SearchOrdersRoute::<MockMarketplaceDb>::new()).app_data(web::Data::new(api));
}

fn configure_missing(cfg: &mut ServiceConfig) {
    let mut db = MockMarketplaceDb::new();
    db.expect_fetch_order_by_order_no().returning(|_| Ok(None));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(OrderByNoRoute::<MockMarketplaceDb>::new()).app_data(web::Data::new(api));
}

fn configure_intake(cfg: &mut ServiceConfig) {
    let mut catalog_db = MockMarketplaceDb::new();
    catalog_db.expect_fetch_market().returning(|_| Ok(Some(sample_market())));
    catalog_db.expect_fetch_catalog_for_market().returning(|_| Ok(vec![sample_product()]));
    catalog_db.expect_fetch_prices_for_product().returning(|_| Ok(vec![sample_price()]));
    let catalog_api = CatalogApi::new(catalog_db, MatchConfig::default());

    let mut orders_db = MockMarketplaceDb::new();
    orders_db.expect_insert_order().returning(|_, _| Ok(sample_order(OrderStatusType::Pending)));
    orders_db.expect_fetch_order_items().returning(|_| Ok(vec![sample_item()]));
    let orders_api = OrderFlowApi::new(orders_db, EventProducers::default());

    cfg.service(CreateOrderRoute::<MockMarketplaceDb>::new())
        .app_data(web::Data::new(catalog_api))
        .app_data(web::Data::new(orders_api));
}

fn sample_item() -> OrderItem {
    OrderItem {
        id: 1,
        order_id: 1,
        market_product_id: Some(7),
        product_name: "Rice".to_string(),
        measurement_scale: "1kg".to_string(),
        quantity: 2,
        unit_price: Kobo::from(120_000),
        total_price: Kobo::from(240_000),
    }
}

fn sample_market() -> Market {
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    Market {
        id: 1,
        name: "Mile 12".to_string(),
        address: "Mile 12, Lagos".to_string(),
        delivery_fee: Kobo::from(50_000),
        is_active: true,
        created_at: ts,
        updated_at: ts,
    }
}

fn sample_product() -> MarketProduct {
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    MarketProduct {
        id: 7,
        market_id: 1,
        agent_id: None,
        base_name: "Rice".to_string(),
        custom_name: None,
        is_available: true,
        created_at: ts,
        updated_at: ts,
    }
}

fn sample_price() -> ProductPrice {
    ProductPrice {
        id: 1,
        market_product_id: 7,
        measurement_scale: "1kg".to_string(),
        price: Kobo::from(120_000),
        stock_count: None,
        is_available: true,
    }
}
