use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
    HttpResponse,
};
use chrono::{TimeZone, Utc};
use oja_common::Kobo;
use oja_engine::db_types::{Order, OrderNo, OrderStatusType};

/// Runs one request against a test app built from `configure`. Errors raised by middleware are
/// rendered into their responses, so tests can assert on the status code either way.
pub async fn send_request(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let _ = env_logger::try_init().ok();
    let service = test::init_service(App::new().configure(configure)).await;
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1,
        Err(e) => HttpResponse::from_error(e),
    };
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub fn sample_order(status: OrderStatusType) -> Order {
    let ts = Utc.with_ymd_and_hms(2024, 6, 14, 9, 30, 0).unwrap();
    Order {
        id: 1,
        order_no: OrderNo::from("OJA-20240614-7G2K4A"),
        customer_name: Some("Amaka".to_string()),
        customer_phone: "+2348012345678".to_string(),
        delivery_address: "14 Adeola Odeku St, Victoria Island".to_string(),
        latitude: None,
        longitude: None,
        market_id: 1,
        agent_id: None,
        subtotal: Kobo::from(240_000),
        delivery_fee: Kobo::from(50_000),
        total_amount: Kobo::from(290_000),
        payment_reference: Some("OJA-20240614-7G2K4A-9f3ab2c1".to_string()),
        status,
        created_at: ts,
        updated_at: ts,
        paid_at: None,
        assigned_at: None,
        delivered_at: None,
    }
}
