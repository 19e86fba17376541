use oja_common::Kobo;
use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// The result of applying a verified charge notification to the order book.
///
/// Only `Confirmed` and `Failed` represent a state change; every other variant is an
/// acknowledged no-op, which is what makes webhook replays safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaymentOutcome {
    /// The order was marked as paid.
    Confirmed(Order),
    /// The order was marked as failed.
    Failed(Order),
    /// The order had already left the payable states; nothing was written.
    AlreadyProcessed(Order),
    /// The charged amount does not cover the order total; the order is untouched.
    Underpaid { order: Order, paid: Kobo },
    /// No order carries this payment reference. Acknowledged so the gateway stops retrying.
    UnmatchedReference(String),
}

impl PaymentOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            PaymentOutcome::Confirmed(order)
            | PaymentOutcome::Failed(order)
            | PaymentOutcome::AlreadyProcessed(order)
            | PaymentOutcome::Underpaid { order, .. } => Some(order),
            PaymentOutcome::UnmatchedReference(_) => None,
        }
    }

    /// True when this application actually changed order state.
    pub fn changed_state(&self) -> bool {
        matches!(self, PaymentOutcome::Confirmed(_) | PaymentOutcome::Failed(_))
    }
}
