//! `SqliteDatabase` is a concrete implementation of an oja marketplace backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use oja_common::Kobo;
use sqlx::SqlitePool;

use super::db::{agents, catalog, db_url, new_pool, orders, sessions};
use crate::{
    db_types::{
        Agent,
        AgentEarning,
        CustomerSession,
        Market,
        MarketProduct,
        NewOrder,
        NewOrderItem,
        Order,
        OrderItem,
        OrderNo,
        OrderStatusLogEntry,
        OrderStatusType,
        ProductPrice,
    },
    oja_api::order_objects::OrderQueryFilter,
    traits::{CatalogError, CatalogManagement, MarketplaceDatabase, MarketplaceError, OrderManagement, PaymentOutcome},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder, items: &[NewOrderItem]) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let phone = order.customer_phone.clone();
        let order = orders::insert_order(order, items, &mut tx).await?;
        orders::insert_items(order.id, items, &mut tx).await?;
        orders::insert_status_log(order.id, OrderStatusType::Pending, "Order received", &mut tx).await?;
        let session = sessions::ensure_active_session(&phone, &mut tx).await?;
        tx.commit().await?;
        debug!("📝️ Order {} saved with {} items under session {}", order.order_no, items.len(), session.id);
        Ok(order)
    }

    async fn add_item(&self, order_no: &OrderNo, item: NewOrderItem) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_no(order_no, &mut tx)
            .await?
            .ok_or_else(|| MarketplaceError::OrderNotFound(order_no.clone()))?;
        if !order.status.allows_item_changes() {
            return Err(MarketplaceError::OrderModificationForbidden(order.status));
        }
        orders::insert_items(order.id, std::slice::from_ref(&item), &mut tx).await?;
        let order = orders::recompute_totals(order.id, &mut tx).await?;
        tx.commit().await?;
        debug!("📝️ Item '{}' added to order {order_no}. New total: {}", item.product_name, order.total_amount);
        Ok(order)
    }

    async fn replace_items(&self, order_no: &OrderNo, items: &[NewOrderItem]) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_no(order_no, &mut tx)
            .await?
            .ok_or_else(|| MarketplaceError::OrderNotFound(order_no.clone()))?;
        if !order.status.allows_item_changes() {
            return Err(MarketplaceError::OrderModificationForbidden(order.status));
        }
        orders::delete_items(order.id, &mut tx).await?;
        orders::insert_items(order.id, items, &mut tx).await?;
        let order = orders::recompute_totals(order.id, &mut tx).await?;
        tx.commit().await?;
        debug!("📝️ Order {order_no} now has {} items. New total: {}", items.len(), order.total_amount);
        Ok(order)
    }

    async fn mark_order_status(
        &self,
        order_no: &OrderNo,
        from: OrderStatusType,
        to: OrderStatusType,
        message: &str,
    ) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::guarded_status_update(order_no, from, to, &mut tx).await? {
            Some(order) => order,
            // Zero rows matched. Distinguish "no such order" from "lost the race".
            None => {
                let err = match orders::fetch_order_by_order_no(order_no, &mut tx).await? {
                    Some(_) => MarketplaceError::OrderUpdateConflict(order_no.clone()),
                    None => MarketplaceError::OrderNotFound(order_no.clone()),
                };
                tx.rollback().await?;
                return Err(err);
            },
        };
        orders::insert_status_log(order.id, to, message, &mut tx).await?;
        if to == OrderStatusType::Delivered {
            let settled = agents::settle_earnings_for_order(order.id, &mut tx).await?;
            let completed = sessions::complete_active_session(&order.customer_phone, &mut tx).await?;
            debug!("📝️ Order {order_no} delivered. {settled} earning(s) settled, {completed} session(s) completed");
        }
        tx.commit().await?;
        debug!("📝️ Order {order_no} moved from {from} to {to}");
        Ok(order)
    }

    async fn set_payment_reference(&self, order_no: &OrderNo, reference: &str) -> Result<Order, MarketplaceError> {
        // Must run in an explicit transaction. Fetching the RETURNING row does not step the
        // statement to completion, and on an autocommit connection the implicit transaction
        // rolls the UPDATE back.
        let mut tx = self.pool.begin().await?;
        let order = orders::set_payment_reference(order_no, reference, &mut tx).await?;
        tx.commit().await?;
        debug!("📝️ Payment reference {reference} attached to order {order_no}");
        Ok(order)
    }

    /// Takes a verified `charge.success` and, in a single atomic transaction,
    /// * looks up the order carrying the payment reference,
    /// * checks that the order is still payable and the amount covers the total,
    /// * moves the order to `Paid` (guarded on its current status) and logs the payment.
    ///
    /// Every no-op outcome commits nothing, so Paystack's redeliveries are harmless.
    async fn confirm_payment(&self, reference: &str, amount: Kobo) -> Result<PaymentOutcome, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::fetch_order_by_payment_reference(reference, &mut tx).await? {
            Some(order) => order,
            None => {
                warn!("📝️ charge.success for unknown payment reference {reference}");
                return Ok(PaymentOutcome::UnmatchedReference(reference.to_string()));
            },
        };
        if !order.status.can_transition_to(OrderStatusType::Paid) {
            debug!("📝️ Order {} is already {}. Ignoring replayed charge.success", order.order_no, order.status);
            return Ok(PaymentOutcome::AlreadyProcessed(order));
        }
        if amount < order.total_amount {
            warn!(
                "📝️ Order {} was underpaid: {amount} received, {} due. Holding the order as-is.",
                order.order_no, order.total_amount
            );
            return Ok(PaymentOutcome::Underpaid { order, paid: amount });
        }
        let order_no = order.order_no.clone();
        let paid = orders::guarded_status_update(&order_no, order.status, OrderStatusType::Paid, &mut tx)
            .await?
            .ok_or_else(|| MarketplaceError::OrderUpdateConflict(order_no.clone()))?;
        let message = format!("Payment of {amount} confirmed (ref {reference})");
        orders::insert_status_log(paid.id, OrderStatusType::Paid, &message, &mut tx).await?;
        tx.commit().await?;
        info!("📝️ Order {order_no} confirmed as paid ({amount})");
        Ok(PaymentOutcome::Confirmed(paid))
    }

    async fn fail_payment(&self, reference: &str) -> Result<PaymentOutcome, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::fetch_order_by_payment_reference(reference, &mut tx).await? {
            Some(order) => order,
            None => {
                warn!("📝️ charge.failed for unknown payment reference {reference}");
                return Ok(PaymentOutcome::UnmatchedReference(reference.to_string()));
            },
        };
        // A failed charge may only annul orders that were never paid. `paid_at` survives every
        // later transition, so a late or replayed charge.failed against an order in fulfilment
        // is a no-op even though Failed is reachable from those states.
        if order.paid_at.is_some() || !order.status.can_transition_to(OrderStatusType::Failed) {
            debug!("📝️ Order {} is {}. Ignoring charge.failed", order.order_no, order.status);
            return Ok(PaymentOutcome::AlreadyProcessed(order));
        }
        let order_no = order.order_no.clone();
        let failed = orders::guarded_status_update(&order_no, order.status, OrderStatusType::Failed, &mut tx)
            .await?
            .ok_or_else(|| MarketplaceError::OrderUpdateConflict(order_no.clone()))?;
        let message = format!("Payment failed (ref {reference})");
        orders::insert_status_log(failed.id, OrderStatusType::Failed, &message, &mut tx).await?;
        tx.commit().await?;
        info!("📝️ Order {order_no} marked as failed after charge.failed");
        Ok(PaymentOutcome::Failed(failed))
    }

    async fn assign_agent(&self, order_no: &OrderNo) -> Result<Option<(Order, Agent)>, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_no(order_no, &mut tx)
            .await?
            .ok_or_else(|| MarketplaceError::OrderNotFound(order_no.clone()))?;
        if order.status != OrderStatusType::Paid {
            debug!("📝️ Order {order_no} is {}, not Paid. Skipping assignment", order.status);
            return Ok(None);
        }
        let Some(agent) = agents::find_eligible_agent(order.market_id, &mut tx).await? else {
            debug!("📝️ No eligible agent in market {} for order {order_no}. Will retry later", order.market_id);
            return Ok(None);
        };
        // The guard loses against a concurrent assignment or cancellation; either way the sweep
        // picks the order up again if it is still Paid.
        let Some(order) = orders::guarded_assign(order_no, agent.id, &mut tx).await? else {
            debug!("📝️ Order {order_no} changed state while assigning. Skipping");
            tx.rollback().await?;
            return Ok(None);
        };
        let commission = agents::commission_for(&agent, order.subtotal);
        agents::insert_pending_earning(agent.id, order.id, commission, &mut tx).await?;
        let message = format!("Assigned to agent {}", agent.name);
        orders::insert_status_log(order.id, OrderStatusType::Assigned, &message, &mut tx).await?;
        tx.commit().await?;
        info!("📝️ Order {order_no} assigned to agent {} ({} commission pending)", agent.name, commission);
        Ok(Some((order, agent)))
    }

    async fn fetch_unassigned_paid_orders(&self) -> Result<Vec<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_unassigned_paid_orders(&mut conn).await?;
        Ok(orders)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_order_no(&self, order_no: &OrderNo) -> Result<Option<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_no(order_no, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_payment_reference(&self, reference: &str) -> Result<Option<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_payment_reference(reference, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_no: &OrderNo) -> Result<Vec<OrderItem>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_no(order_no, &mut conn)
            .await?
            .ok_or_else(|| MarketplaceError::OrderNotFound(order_no.clone()))?;
        let items = orders::fetch_order_items(order.id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_status_history(&self, order_no: &OrderNo) -> Result<Vec<OrderStatusLogEntry>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_no(order_no, &mut conn)
            .await?
            .ok_or_else(|| MarketplaceError::OrderNotFound(order_no.clone()))?;
        let history = orders::fetch_status_history(order.id, &mut conn).await?;
        Ok(history)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_earnings_for_order(&self, order_no: &OrderNo) -> Result<Vec<AgentEarning>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_no(order_no, &mut conn)
            .await?
            .ok_or_else(|| MarketplaceError::OrderNotFound(order_no.clone()))?;
        let earnings = agents::fetch_earnings_for_order(order.id, &mut conn).await?;
        Ok(earnings)
    }

    async fn fetch_active_session(&self, customer_phone: &str) -> Result<Option<CustomerSession>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let session = sessions::fetch_active_session(customer_phone, &mut conn).await?;
        Ok(session)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_market(&self, market_id: i64) -> Result<Option<Market>, CatalogError> {
        let mut conn = self.pool.acquire().await.map_err(|e| CatalogError::DatabaseError(e.to_string()))?;
        let market = catalog::fetch_market(market_id, &mut conn).await?;
        Ok(market)
    }

    async fn fetch_catalog_for_market(&self, market_id: i64) -> Result<Vec<MarketProduct>, CatalogError> {
        let mut conn = self.pool.acquire().await.map_err(|e| CatalogError::DatabaseError(e.to_string()))?;
        let products = catalog::fetch_catalog_for_market(market_id, &mut conn).await?;
        Ok(products)
    }

    async fn fetch_prices_for_product(&self, product_id: i64) -> Result<Vec<ProductPrice>, CatalogError> {
        let mut conn = self.pool.acquire().await.map_err(|e| CatalogError::DatabaseError(e.to_string()))?;
        let prices = catalog::fetch_prices_for_product(product_id, &mut conn).await?;
        Ok(prices)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, reading the URL from `OJA_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
