use actix_web::{guard, http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use oja_common::Secret;
use oja_engine::{db_types::OrderStatusType, events::EventProducers, OrderFlowApi};
use serde_json::json;

use super::{
    helpers::{sample_order, send_request},
    mocks::MockMarketplaceDb,
};
use crate::{middleware::api_key::ApiKeyMiddlewareFactory, routes::update_status};

const TEST_KEY: &str = "a-very-secret-operator-key";

#[actix_web::test]
async fn status_updates_require_the_api_key() {
    let req = status_request(json!({ "status": "Confirmed" }));
    let (status, _) = send_request(req, configure_with_key).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn a_wrong_api_key_is_rejected() {
    let req = status_request(json!({ "status": "Confirmed" })).insert_header(("oja-api-key", "nope"));
    let (status, _) = send_request(req, configure_with_key).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn the_right_api_key_applies_the_transition() {
    let req = status_request(json!({ "status": "Confirmed" })).insert_header(("oja-api-key", TEST_KEY));
    let (status, body) = send_request(req, configure_with_key).await;
    assert_eq!(status, StatusCode::OK, "body was {body}");
    let order: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["status"], "Confirmed");
}

#[actix_web::test]
async fn an_illegal_transition_comes_back_as_400() {
    let req = status_request(json!({ "status": "OutForDelivery" })).insert_header(("oja-api-key", TEST_KEY));
    let (status, body) = send_request(req, configure_with_key).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Illegal order state change"), "body was {body}");
}

#[actix_web::test]
async fn no_configured_key_means_every_request_is_rejected() {
    let req = status_request(json!({ "status": "Confirmed" })).insert_header(("oja-api-key", TEST_KEY));
    let (status, _) = send_request(req, configure_without_key).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn status_request(body: serde_json::Value) -> TestRequest {
    TestRequest::post().uri("/orders/OJA-20240614-7G2K4A/status").set_json(body)
}

fn configure_with_key(cfg: &mut ServiceConfig) {
    configure(cfg, Some(Secret::new(TEST_KEY.to_string())));
}

fn configure_without_key(cfg: &mut ServiceConfig) {
    configure(cfg, None);
}

fn configure(cfg: &mut ServiceConfig, key: Option<Secret<String>>) {
    let mut db = MockMarketplaceDb::new();
    db.expect_fetch_order_by_order_no().returning(|_| Ok(Some(sample_order(OrderStatusType::Pending))));
    db.expect_mark_order_status().returning(|_, _, to, _| Ok(sample_order(to)));
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(
        web::resource("/orders/{order_no}/status")
            .guard(guard::Post())
            .wrap(ApiKeyMiddlewareFactory::new(key))
            .to(update_status::<MockMarketplaceDb>),
    )
    .app_data(web::Data::new(api));
}
