use std::time::Duration;

use actix_web::{dev::Server, guard, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use oja_engine::{
    events::{EventHandlers, EventProducers},
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
};
use paystack_tools::PaystackApi;

use crate::{
    assignment_worker::start_assignment_worker,
    config::ServerConfig,
    errors::ServerError,
    integrations::{hooks::create_event_hooks, relay::NotificationClient},
    middleware::{api_key::ApiKeyMiddlewareFactory, paystack_sig::SignatureMiddlewareFactory},
    paystack_routes::PaystackWebhookRoute,
    routes::{
        health,
        update_status,
        CreateOrderRoute,
        OrderByNoRoute,
        OrderHistoryRoute,
        PayOrderRoute,
        ResolveQueryRoute,
        SearchOrdersRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let relay = NotificationClient::new(config.relay.clone());
    let hooks = create_event_hooks(db.clone(), relay);
    let handlers = EventHandlers::new(25, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    if config.assign_sweep_seconds > 0 {
        // The handle is deliberately dropped; the worker runs for the life of the process.
        let _ = start_assignment_worker(db.clone(), producers.clone(), config.assign_sweep_seconds);
    } else {
        info!("🕰️ The assignment worker is disabled");
    }
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let paystack_api =
        PaystackApi::new(config.paystack.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let matching = config.matching;
    let webhook_secret = config.webhook_secret.clone();
    let api_key = config.api_key.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let catalog_api = CatalogApi::new(db.clone(), matching);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("oja::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(paystack_api.clone()));
        // `/orders/search` must register before `/orders/{order_no}`, or the literal segment
        // would be swallowed by the path parameter.
        let api_scope = web::scope("/api")
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(SearchOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByNoRoute::<SqliteDatabase>::new())
            .service(OrderHistoryRoute::<SqliteDatabase>::new())
            .service(PayOrderRoute::<SqliteDatabase>::new())
            .service(ResolveQueryRoute::<SqliteDatabase>::new())
            .service(
                web::resource("/orders/{order_no}/status")
                    .name("update_status")
                    .guard(guard::Post())
                    .wrap(ApiKeyMiddlewareFactory::new(api_key.clone()))
                    .to(update_status::<SqliteDatabase>),
            );
        let webhook_scope = web::scope("/paystack")
            .wrap(SignatureMiddlewareFactory::new(webhook_secret.clone()))
            .service(PaystackWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
