use crate::{
    db_types::{AgentEarning, CustomerSession, Order, OrderItem, OrderNo, OrderStatusLogEntry},
    oja_api::order_objects::OrderQueryFilter,
    traits::MarketplaceError,
};

/// Read-side queries over orders and their satellite records. The write-side machinery lives in
/// [`crate::traits::MarketplaceDatabase`].
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with the given order number, or `None` if it does not exist.
    async fn fetch_order_by_order_no(&self, order_no: &OrderNo) -> Result<Option<Order>, MarketplaceError>;

    /// Fetches the order carrying the given payment reference, or `None`. References are unique,
    /// so at most one order matches.
    async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, MarketplaceError>;

    /// Fetches the line items for an order, in insertion order.
    async fn fetch_order_items(&self, order_no: &OrderNo) -> Result<Vec<OrderItem>, MarketplaceError>;

    /// Fetches the append-only status log for an order, oldest first.
    async fn fetch_status_history(&self, order_no: &OrderNo) -> Result<Vec<OrderStatusLogEntry>, MarketplaceError>;

    /// Fetches orders according to the criteria in the filter, ordered by `created_at` ascending.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError>;

    /// Fetches the earning records tied to an order (at most one per agent).
    async fn fetch_earnings_for_order(&self, order_no: &OrderNo) -> Result<Vec<AgentEarning>, MarketplaceError>;

    /// Fetches the customer's `Active` session, if one exists.
    async fn fetch_active_session(&self, customer_phone: &str) -> Result<Option<CustomerSession>, MarketplaceError>;
}
