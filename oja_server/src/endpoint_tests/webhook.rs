use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use oja_common::Secret;
use oja_engine::{db_types::OrderStatusType, events::EventProducers, traits::PaymentOutcome, OrderFlowApi};
use serde_json::json;

use super::{
    helpers::{sample_order, send_request},
    mocks::MockMarketplaceDb,
};
use crate::{
    helpers::calculate_hmac,
    middleware::paystack_sig::{SignatureMiddlewareFactory, PAYSTACK_SIGNATURE_HEADER},
    paystack_routes::PaystackWebhookRoute,
};

const TEST_SECRET: &str = "sk_test_1234567890";

fn charge_body(event: &str) -> String {
    json!({
        "event": event,
        "data": {
            "status": "success",
            "reference": "OJA-20240614-7G2K4A-9f3ab2c1",
            "amount": 290_000
        }
    })
    .to_string()
}

fn signed_request(body: String) -> TestRequest {
    let signature = calculate_hmac(TEST_SECRET, body.as_bytes());
    TestRequest::post()
        .uri("/webhook")
        .insert_header(("content-type", "application/json"))
        .insert_header((PAYSTACK_SIGNATURE_HEADER, signature))
        .set_payload(body)
}

#[actix_web::test]
async fn deliveries_without_a_signature_are_rejected() {
    let req = TestRequest::post()
        .uri("/webhook")
        .insert_header(("content-type", "application/json"))
        .set_payload(charge_body("charge.success"));
    let (status, _) = send_request(req, configure_untouched).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn deliveries_with_a_bad_signature_are_rejected() {
    let body = charge_body("charge.success");
    let signature = calculate_hmac("some-other-key", body.as_bytes());
    let req = TestRequest::post()
        .uri("/webhook")
        .insert_header(("content-type", "application/json"))
        .insert_header((PAYSTACK_SIGNATURE_HEADER, signature))
        .set_payload(body);
    let (status, _) = send_request(req, configure_untouched).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn a_tampered_body_fails_verification() {
    let signature = calculate_hmac(TEST_SECRET, charge_body("charge.success").as_bytes());
    let tampered = charge_body("charge.success").replace("290000", "1");
    let req = TestRequest::post()
        .uri("/webhook")
        .insert_header(("content-type", "application/json"))
        .insert_header((PAYSTACK_SIGNATURE_HEADER, signature))
        .set_payload(tampered);
    let (status, _) = send_request(req, configure_untouched).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn a_verified_charge_success_is_applied_and_acknowledged() {
    let req = signed_request(charge_body("charge.success"));
    let (status, body) = send_request(req, configure_confirms).await;
    assert_eq!(status, StatusCode::OK, "body was {body}");
    let res: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["success"], true);
}

#[actix_web::test]
async fn a_verified_charge_failed_is_applied_and_acknowledged() {
    let req = signed_request(charge_body("charge.failed"));
    let (status, body) = send_request(req, configure_fails).await;
    assert_eq!(status, StatusCode::OK, "body was {body}");
    let res: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["success"], true);
}

#[actix_web::test]
async fn unrelated_events_are_acknowledged_without_touching_the_db() {
    let req = signed_request(charge_body("transfer.success"));
    let (status, body) = send_request(req, configure_untouched).await;
    assert_eq!(status, StatusCode::OK);
    let res: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["success"], true);
    assert!(res["message"].as_str().unwrap().contains("ignored"));
}

#[actix_web::test]
async fn underpayments_are_reported_as_failures_in_the_ack() {
    let req = signed_request(charge_body("charge.success"));
    let (status, body) = send_request(req, configure_underpaid).await;
    assert_eq!(status, StatusCode::OK);
    let res: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["success"], false);
    assert!(res["message"].as_str().unwrap().contains("Underpayment"));
}

/// The db must never be written when the signature check fails, so no expectations are set; any
/// call panics the test.
fn configure_untouched(cfg: &mut ServiceConfig) {
    let db = MockMarketplaceDb::new();
    configure_with(cfg, db);
}

fn configure_confirms(cfg: &mut ServiceConfig) {
    let mut db = MockMarketplaceDb::new();
    db.expect_confirm_payment()
        .withf(|reference, _| reference == "OJA-20240614-7G2K4A-9f3ab2c1")
        .returning(|_, _| Ok(PaymentOutcome::Confirmed(sample_order(OrderStatusType::Paid))));
    configure_with(cfg, db);
}

fn configure_fails(cfg: &mut ServiceConfig) {
    let mut db = MockMarketplaceDb::new();
    db.expect_fail_payment().returning(|_| Ok(PaymentOutcome::Failed(sample_order(OrderStatusType::Failed))));
    configure_with(cfg, db);
}

fn configure_underpaid(cfg: &mut ServiceConfig) {
    let mut db = MockMarketplaceDb::new();
    db.expect_confirm_payment().returning(|_, paid| {
        Ok(PaymentOutcome::Underpaid { order: sample_order(OrderStatusType::Pending), paid })
    });
    configure_with(cfg, db);
}

fn configure_with(cfg: &mut ServiceConfig, db: MockMarketplaceDb) {
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(
        web::scope("")
            .wrap(SignatureMiddlewareFactory::new(Secret::new(TEST_SECRET.to_string())))
            .service(PaystackWebhookRoute::<MockMarketplaceDb>::new()),
    )
    .app_data(web::Data::new(api));
}
