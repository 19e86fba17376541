use serde::{Deserialize, Serialize};

use crate::db_types::{Agent, Order, OrderStatusType};

/// Fired once an order has been durably marked as paid. Exactly one of these is published per
/// order; replayed webhooks are absorbed before the event is raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired when an agent accepts (or is swept into) an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAssignedEvent {
    pub order: Order,
    pub agent: Agent,
}

impl AgentAssignedEvent {
    pub fn new(order: Order, agent: Agent) -> Self {
        Self { order, agent }
    }
}

/// Fired when an order reaches `Delivered`. Earnings and session side effects have already been
/// committed by the time subscribers see this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDeliveredEvent {
    pub order: Order,
}

impl OrderDeliveredEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired when an order is cancelled or failed. `status` records which of the two it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.status;
        Self { order, status }
    }
}
