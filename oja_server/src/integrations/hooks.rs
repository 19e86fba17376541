//! Wires the engine's lifecycle events to their off-request-path consumers: the customer
//! notification relay and the immediate agent-assignment attempt after payment.

use log::*;
use oja_engine::{
    db_types::OrderStatusType,
    events::{EventHooks, EventProducers},
    OrderFlowApi,
    SqliteDatabase,
};

use crate::integrations::relay::NotificationClient;

pub fn create_event_hooks(db: SqliteDatabase, relay: NotificationClient) -> EventHooks {
    let mut hooks = EventHooks::default();
    let (paid_db, paid_relay) = (db, relay.clone());
    hooks.on_order_paid(move |event| {
        let db = paid_db.clone();
        let relay = paid_relay.clone();
        Box::pin(async move {
            let order = event.order;
            relay
                .notify(&order, format!("Payment of {} received for order {}. We're finding you an agent.", order.total_amount, order.order_no))
                .await;
            // Assignment runs off the webhook path. The api here carries no producers; the
            // assignment notification is sent directly below instead of through an event.
            let api = OrderFlowApi::new(db, EventProducers::default());
            match api.assign_agent(&order.order_no).await {
                Ok(Some((order, agent))) => {
                    relay.notify(&order, format!("{} is handling your order {}.", agent.name, order.order_no)).await;
                },
                Ok(None) => {
                    debug!("📬️ Order {} waits for the assignment sweep", order.order_no);
                },
                Err(e) => {
                    warn!("📬️ Could not attempt assignment for {}. {e}", order.order_no);
                },
            }
        })
    });
    let assigned_relay = relay.clone();
    hooks.on_agent_assigned(move |event| {
        let relay = assigned_relay.clone();
        Box::pin(async move {
            relay
                .notify(&event.order, format!("{} is handling your order {}.", event.agent.name, event.order.order_no))
                .await;
        })
    });
    let delivered_relay = relay.clone();
    hooks.on_order_delivered(move |event| {
        let relay = delivered_relay.clone();
        Box::pin(async move {
            relay
                .notify(&event.order, format!("Order {} has been delivered. Thank you for shopping with oja!", event.order.order_no))
                .await;
        })
    });
    hooks.on_order_annulled(move |event| {
        let relay = relay.clone();
        Box::pin(async move {
            let message = match event.status {
                OrderStatusType::Failed => {
                    format!("The payment for order {} did not go through. You can try paying again.", event.order.order_no)
                },
                _ => format!("Order {} has been cancelled.", event.order.order_no),
            };
            relay.notify(&event.order, message).await;
        })
    });
    hooks
}
