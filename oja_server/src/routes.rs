//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are async and must never block the worker thread; every database call and every
//! Paystack round trip is awaited.

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use oja_engine::{
    catalog_objects::ItemAvailability,
    db_types::{NewOrder, NewOrderItem, OrderNo},
    helpers::new_order_number,
    order_objects::{OrderQueryFilter, OrderResult},
    traits::MarketplaceDatabase,
    CatalogApi,
    OrderFlowApi,
};
use paystack_tools::{NewTransaction, PaystackApi};

use crate::{
    data_objects::{
        NewOrderRequest,
        NewOrderResponse,
        PaymentInitResponse,
        ResolveQuery,
        SkippedLine,
        StatusUpdateRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(create_order => Post "/orders" impl MarketplaceDatabase);
/// Route handler for order intake.
///
/// Each cart line arrives as free text ("2 paint beans") and is resolved against the market's
/// catalog before the order is stored. Lines that resolve to a priced variant become line items;
/// lines that do not are reported back in `skipped` with a reason. An order with no resolvable
/// lines is rejected outright.
pub async fn create_order<B: MarketplaceDatabase>(
    body: web::Json<NewOrderRequest>,
    orders_api: web::Data<OrderFlowApi<B>>,
    catalog_api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST new order for market {} with {} lines", req.market_id, req.items.len());
    let market = catalog_api
        .db()
        .fetch_market(req.market_id)
        .await
        .map_err(ServerError::from)?
        .ok_or_else(|| ServerError::NoRecordFound(format!("The requested market {} does not exist", req.market_id)))?;
    let mut items = Vec::with_capacity(req.items.len());
    let mut skipped = Vec::new();
    for line in &req.items {
        match catalog_api.resolve_line(req.market_id, &line.text).await? {
            ItemAvailability::Available { product, price, quantity, .. } => {
                let quantity = line.quantity.unwrap_or(quantity).max(1);
                let item = NewOrderItem::new(product.display_name(), price.measurement_scale.as_str(), quantity, price.price)
                    .for_product(product.id);
                items.push(item);
            },
            ItemAvailability::ScaleUnavailable { product, requested_scale, .. } => {
                let scale = requested_scale.unwrap_or_else(|| "default".to_string());
                skipped.push(SkippedLine {
                    text: line.text.clone(),
                    reason: format!("{} is not sold per {scale} right now", product.display_name()),
                });
            },
            ItemAvailability::NotFound { query } => {
                skipped.push(SkippedLine { text: line.text.clone(), reason: format!("No match for \"{query}\"") });
            },
        }
    }
    if items.is_empty() {
        info!("💻️ Order for market {} rejected: none of the {} lines resolved", req.market_id, req.items.len());
        return Err(ServerError::InvalidRequestBody("No cart line could be matched to a catalog entry".to_string()));
    }
    let mut order = NewOrder::new(new_order_number(), req.market_id, req.customer_phone, req.delivery_address)
        .with_delivery_fee(market.delivery_fee);
    order.customer_name = req.customer_name;
    order.latitude = req.latitude;
    order.longitude = req.longitude;
    let order = orders_api.process_new_order(order, &items).await?;
    let items = orders_api.db().fetch_order_items(&order.order_no).await?;
    info!("💻️ Order {} created ({} items, {} skipped)", order.order_no, items.len(), skipped.len());
    Ok(HttpResponse::Ok().json(NewOrderResponse { order, items, skipped }))
}

route!(order_by_no => Get "/orders/{order_no}" impl MarketplaceDatabase);
pub async fn order_by_no<B: MarketplaceDatabase>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_no = OrderNo::from(path.into_inner());
    debug!("💻️ GET order {order_no}");
    let order = api
        .db()
        .fetch_order_by_order_no(&order_no)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_no} does not exist")))?;
    let items = api.db().fetch_order_items(&order_no).await?;
    Ok(HttpResponse::Ok().json(OrderResult { order, items }))
}

route!(order_history => Get "/orders/{order_no}/history" impl MarketplaceDatabase);
/// The append-only status log of an order, oldest entry first.
pub async fn order_history<B: MarketplaceDatabase>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_no = OrderNo::from(path.into_inner());
    debug!("💻️ GET history for order {order_no}");
    let history = api.db().fetch_status_history(&order_no).await?;
    Ok(HttpResponse::Ok().json(history))
}

route!(search_orders => Get "/orders/search" impl MarketplaceDatabase);
pub async fn search_orders<B: MarketplaceDatabase>(
    query: web::Query<OrderQueryFilter>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner();
    debug!("💻️ GET order search {filter:?}");
    let orders = api.db().search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

/// Route handler for operator-driven status transitions.
///
/// Registered behind the API-key middleware in `server.rs` rather than through `route!`, since
/// the middleware needs the configured key.
pub async fn update_status<B: MarketplaceDatabase>(
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_no = OrderNo::from(path.into_inner());
    let req = body.into_inner();
    debug!("💻️ POST status {} for order {order_no}", req.status);
    let message = req.message.unwrap_or_else(|| format!("Status set to {} by operator", req.status));
    let order = api.update_status(&order_no, req.status, &message).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------

route!(pay_order => Post "/orders/{order_no}/pay" impl MarketplaceDatabase);
/// Route handler for payment initialization.
///
/// Attaches a fresh payment reference to the order, registers the pending transaction with
/// Paystack, and hands the checkout authorization back to the customer. Re-initialization is
/// allowed while the order is unpaid and replaces the previous reference.
pub async fn pay_order<B: MarketplaceDatabase>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
    paystack: web::Data<PaystackApi>,
) -> Result<HttpResponse, ServerError> {
    let order_no = OrderNo::from(path.into_inner());
    debug!("💻️ POST pay for order {order_no}");
    let order = api.initialize_payment(&order_no).await?;
    let reference = order
        .payment_reference
        .clone()
        .ok_or_else(|| ServerError::BackendError("Payment initialization produced no reference".to_string()))?;
    // Paystack requires an email per transaction; customers are phone-first, so one is derived.
    let email = format!("{}@customers.oja.ng", order.customer_phone.trim_start_matches('+'));
    let tx = NewTransaction::new(order.total_amount, email, reference.clone());
    let auth = paystack.initialize_transaction(&tx).await?;
    info!("💻️ Payment for {order_no} initialized with reference {reference}");
    Ok(HttpResponse::Ok().json(PaymentInitResponse {
        order_no: order.order_no,
        reference,
        amount: order.total_amount,
        authorization_url: auth.authorization_url,
        access_code: auth.access_code,
    }))
}

//----------------------------------------------   Catalog  ----------------------------------------------------

route!(resolve_query => Get "/markets/{market_id}/resolve" impl MarketplaceDatabase);
/// Resolves one free-text cart line against a market's catalog without creating anything. Used
/// by the chat front-end to probe availability while the customer is still typing their list.
pub async fn resolve_query<B: MarketplaceDatabase>(
    path: web::Path<i64>,
    query: web::Query<ResolveQuery>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let market_id = path.into_inner();
    let q = query.into_inner().q;
    debug!("💻️ GET resolve \"{q}\" in market {market_id}");
    let availability = api.resolve_line(market_id, &q).await?;
    Ok(HttpResponse::Ok().json(availability))
}
