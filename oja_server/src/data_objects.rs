use std::fmt::Display;

use oja_common::Kobo;
use oja_engine::db_types::{Order, OrderItem, OrderNo, OrderStatusType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// One raw cart line as the customer typed it. An explicit `quantity` overrides whatever quantity
/// the line parser extracts from the text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub text: String,
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub market_id: i64,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub customer_phone: String,
    pub delivery_address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub items: Vec<OrderLineRequest>,
}

/// A cart line that could not be turned into a priced line item, with a customer-facing reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedLine {
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Lines that were dropped from the order (no match, or the scale is unavailable). The
    /// customer should be told about these rather than silently charged for less.
    pub skipped: Vec<SkippedLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatusType,
    #[serde(default)]
    pub message: Option<String>,
}

/// What the customer needs to complete a Paystack checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInitResponse {
    pub order_no: OrderNo,
    pub reference: String,
    pub amount: Kobo,
    pub authorization_url: String,
    pub access_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveQuery {
    pub q: String,
}
