//! The customer notification relay.
//!
//! Customers talk to oja over chat, so order updates go back out through a relay service (a
//! WhatsApp/SMS bridge) rather than directly from the server. Notifications are strictly
//! best-effort: a relay outage must never hold up or roll back an order transition, so failures
//! are logged and dropped.

use log::*;
use oja_engine::db_types::{Order, OrderNo};
use reqwest::Client;
use serde::Serialize;

use crate::config::RelayConfig;

#[derive(Debug, Clone, Serialize)]
pub struct Notification<'a> {
    pub order_no: &'a OrderNo,
    pub customer_phone: &'a str,
    pub status: String,
    pub message: String,
}

#[derive(Clone)]
pub struct NotificationClient {
    client: Client,
    config: RelayConfig,
}

impl NotificationClient {
    pub fn new(config: RelayConfig) -> Self {
        Self { client: Client::new(), config }
    }

    /// Sends one customer-facing message about an order. No-op when no relay is configured.
    pub async fn notify(&self, order: &Order, message: String) {
        let Some(url) = &self.config.url else {
            trace!("📬️ No relay configured; dropping notification for {}", order.order_no);
            return;
        };
        let notification = Notification {
            order_no: &order.order_no,
            customer_phone: &order.customer_phone,
            status: order.status.to_string(),
            message,
        };
        let result = self
            .client
            .post(format!("{url}/notify"))
            .bearer_auth(self.config.token.reveal())
            .json(&notification)
            .send()
            .await;
        match result {
            Ok(res) if res.status().is_success() => {
                debug!("📬️ Notification for {} delivered to relay", order.order_no);
            },
            Ok(res) => {
                warn!("📬️ Relay rejected notification for {}. Status {}", order.order_no, res.status());
            },
            Err(e) => {
                warn!("📬️ Could not reach relay for {}. {e}", order.order_no);
            },
        }
    }
}
