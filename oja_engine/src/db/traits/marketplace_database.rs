use oja_common::Kobo;
use thiserror::Error;

use crate::{
    db_types::{Agent, NewOrder, NewOrderItem, Order, OrderNo, OrderStatusType},
    traits::{CatalogError, CatalogManagement, OrderManagement, PaymentOutcome},
};

/// This trait defines the highest level of behaviour for backends supporting the oja engine.
///
/// This behaviour includes:
/// * Atomic order intake (order, items, initial status log row, customer session).
/// * Item mutation with totals recomputation in the same transaction.
/// * Optimistically-guarded status transitions with their side effects.
/// * Payment reconciliation keyed on the payment reference.
/// * Agent assignment with commission capture.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + OrderManagement + CatalogManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Takes a new order and, in a single atomic transaction:
    /// * stores the order and its line items,
    /// * computes `subtotal` from the items and `total_amount = subtotal + delivery_fee`,
    /// * appends the initial "Order received" status log row,
    /// * ensures the customer has an `Active` session.
    ///
    /// Returns [`MarketplaceError::OrderAlreadyExists`] if the order number is already taken.
    async fn insert_order(&self, order: NewOrder, items: &[NewOrderItem]) -> Result<Order, MarketplaceError>;

    /// Appends a line item to an order that is still open for changes (`Pending`/`Confirmed`)
    /// and recomputes the totals in the same transaction.
    async fn add_item(&self, order_no: &OrderNo, item: NewOrderItem) -> Result<Order, MarketplaceError>;

    /// Replaces all line items of an order that is still open for changes and recomputes the
    /// totals in the same transaction.
    async fn replace_items(&self, order_no: &OrderNo, items: &[NewOrderItem]) -> Result<Order, MarketplaceError>;

    /// Moves an order from `from` to `to` in a single transaction:
    /// * the `UPDATE` is guarded with `AND status = from`, so a concurrent transition loses and
    ///   surfaces as [`MarketplaceError::OrderUpdateConflict`];
    /// * `paid_at` / `assigned_at` / `delivered_at` are stamped when entering the matching state;
    /// * exactly one status log row is appended with the caller's message;
    /// * entering `Delivered` settles the order's pending earnings and completes the customer's
    ///   active session.
    ///
    /// Transition *legality* is the caller's concern ([`crate::OrderFlowApi`] checks the
    /// transition table); this method only guarantees atomicity and the optimistic guard.
    async fn mark_order_status(
        &self,
        order_no: &OrderNo,
        from: OrderStatusType,
        to: OrderStatusType,
        message: &str,
    ) -> Result<Order, MarketplaceError>;

    /// Stores the payment reference on an order ahead of the Paystack redirect. Re-initializing
    /// replaces any previous reference. Fails with [`MarketplaceError::PaymentReferenceClash`] if
    /// another order already carries the reference.
    async fn set_payment_reference(&self, order_no: &OrderNo, reference: &str) -> Result<Order, MarketplaceError>;

    /// Applies a verified `charge.success` to the order carrying `reference`. See
    /// [`PaymentOutcome`] for the possible results; only `Confirmed` writes anything, which makes
    /// replayed webhook deliveries safe.
    async fn confirm_payment(&self, reference: &str, amount: Kobo) -> Result<PaymentOutcome, MarketplaceError>;

    /// Applies a verified `charge.failed` to the order carrying `reference`. Orders that have
    /// already left the payable states are reported as `AlreadyProcessed` and left untouched.
    async fn fail_payment(&self, reference: &str) -> Result<PaymentOutcome, MarketplaceError>;

    /// Attempts to assign an agent to a `Paid` order. Picks the first agent in the order's
    /// market, in insertion order, that is active, not suspended, and below their open-order
    /// ceiling. In one transaction: the order moves to `Assigned` (guarded on `Paid`), the agent
    /// and `assigned_at` are stamped, and a `Pending` earning of `commission_rate × subtotal` is
    /// recorded.
    ///
    /// Returns `Ok(None)` when no agent is currently eligible; the sweep worker retries later.
    async fn assign_agent(&self, order_no: &OrderNo) -> Result<Option<(Order, Agent)>, MarketplaceError>;

    /// Orders that are `Paid` but carry no agent, oldest first. Input for the assignment sweep.
    async fn fetch_unassigned_paid_orders(&self) -> Result<Vec<Order>, MarketplaceError>;
}

#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists: {0}")]
    OrderAlreadyExists(OrderNo),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNo),
    #[error("The requested order change would result in a no-op.")]
    OrderModificationNoOp,
    #[error("Items cannot be changed once an order is {0}")]
    OrderModificationForbidden(OrderStatusType),
    #[error("Illegal status transition: {from} → {to}")]
    InvalidStatusTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Order {0} was modified concurrently; the transition lost the race")]
    OrderUpdateConflict(OrderNo),
    #[error("The requested market {0} does not exist")]
    MarketNotFound(i64),
    #[error("The requested agent {0} does not exist")]
    AgentNotFound(i64),
    #[error("Payment reference {0} is already attached to another order")]
    PaymentReferenceClash(String),
    #[error("{0} is not supported")]
    UnsupportedAction(String),
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        MarketplaceError::DatabaseError(e.to_string())
    }
}

impl From<CatalogError> for MarketplaceError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::MarketNotFound(id) => MarketplaceError::MarketNotFound(id),
            other => MarketplaceError::DatabaseError(other.to_string()),
        }
    }
}
