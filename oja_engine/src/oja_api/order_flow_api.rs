use std::fmt::Debug;

use log::*;
use oja_common::Kobo;

use crate::{
    db_types::{Agent, NewOrder, NewOrderItem, Order, OrderNo, OrderStatusType},
    events::{AgentAssignedEvent, EventProducers, OrderAnnulledEvent, OrderDeliveredEvent, OrderPaidEvent},
    helpers::new_payment_reference,
    traits::{MarketplaceDatabase, MarketplaceError, PaymentOutcome},
};

/// `OrderFlowApi` is the primary API for handling order and payment flows in response to order
/// intake, payment gateway events and agent activity.
///
/// Every write goes through the backend in a single transaction; events are published only after
/// the corresponding transaction has committed.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Submit a new order with its line items.
    ///
    /// This should be a brand-new order. If the order number already exists, an error is
    /// returned. The order, items, initial status log row and customer session are stored
    /// atomically; the totals invariant (`total_amount = subtotal + delivery_fee`) holds on the
    /// returned record.
    pub async fn process_new_order(&self, order: NewOrder, items: &[NewOrderItem]) -> Result<Order, MarketplaceError> {
        let order = self.db.insert_order(order, items).await?;
        debug!("🔄️📦️ Order {} created with {} items, total {}", order.order_no, items.len(), order.total_amount);
        Ok(order)
    }

    /// Appends one item to an order that is still open for changes.
    pub async fn add_item(&self, order_no: &OrderNo, item: NewOrderItem) -> Result<Order, MarketplaceError> {
        let order = self.db.add_item(order_no, item).await?;
        debug!("🔄️📦️ Item added to {}. New total: {}", order.order_no, order.total_amount);
        Ok(order)
    }

    /// Replaces the full item list of an order that is still open for changes.
    pub async fn replace_items(&self, order_no: &OrderNo, items: &[NewOrderItem]) -> Result<Order, MarketplaceError> {
        let order = self.db.replace_items(order_no, items).await?;
        debug!("🔄️📦️ Items replaced on {}. New total: {}", order.order_no, order.total_amount);
        Ok(order)
    }

    /// Changes the status of an order.
    ///
    /// The transition must be legal under [`OrderStatusType::can_transition_to`]:
    /// * a transition to the current status is [`MarketplaceError::OrderModificationNoOp`];
    /// * a transition outside the table is [`MarketplaceError::InvalidStatusTransition`];
    /// * a legal transition is applied atomically with an optimistic guard on the old status, so
    ///   racing callers get [`MarketplaceError::OrderUpdateConflict`] instead of a double apply.
    ///
    /// Side effects on the committed transition:
    /// * `paid_at` / `assigned_at` / `delivered_at` are stamped when entering the matching state;
    /// * one status log row is appended with `message`;
    /// * entering `Delivered` settles pending earnings and completes the customer session;
    /// * the matching event (paid / delivered / annulled) is published.
    pub async fn update_status(
        &self,
        order_no: &OrderNo,
        new_status: OrderStatusType,
        message: &str,
    ) -> Result<Order, MarketplaceError> {
        let order = self
            .db
            .fetch_order_by_order_no(order_no)
            .await?
            .ok_or_else(|| MarketplaceError::OrderNotFound(order_no.clone()))?;
        if order.status == new_status {
            return Err(MarketplaceError::OrderModificationNoOp);
        }
        if !order.status.can_transition_to(new_status) {
            return Err(MarketplaceError::InvalidStatusTransition { from: order.status, to: new_status });
        }
        let updated = self.db.mark_order_status(order_no, order.status, new_status, message).await?;
        info!("🔄️ Order {} moved {} → {new_status}", updated.order_no, order.status);
        match new_status {
            OrderStatusType::Paid => self.call_order_paid_hook(&updated).await,
            OrderStatusType::Delivered => self.call_order_delivered_hook(&updated).await,
            OrderStatusType::Cancelled | OrderStatusType::Failed => self.call_order_annulled_hook(&updated).await,
            _ => {},
        }
        Ok(updated)
    }

    /// Attaches a fresh payment reference to an unpaid order, ahead of the Paystack
    /// `transaction/initialize` call. Re-initialization replaces the previous reference; orders
    /// that have already been paid are rejected.
    pub async fn initialize_payment(&self, order_no: &OrderNo) -> Result<Order, MarketplaceError> {
        let order = self
            .db
            .fetch_order_by_order_no(order_no)
            .await?
            .ok_or_else(|| MarketplaceError::OrderNotFound(order_no.clone()))?;
        if !matches!(order.status, OrderStatusType::Pending | OrderStatusType::Confirmed) {
            return Err(MarketplaceError::OrderModificationForbidden(order.status));
        }
        let reference = new_payment_reference(order_no);
        let order = self.db.set_payment_reference(order_no, &reference).await?;
        debug!("🔄️💰️ Payment reference {reference} attached to {}", order.order_no);
        Ok(order)
    }

    /// Applies a verified `charge.success` notification.
    ///
    /// Reprocessing an already-applied charge is a safe no-op ([`PaymentOutcome::AlreadyProcessed`]);
    /// exactly one `OrderPaidEvent` is published per order no matter how often the gateway
    /// retries the delivery.
    pub async fn confirm_payment(&self, reference: &str, amount: Kobo) -> Result<PaymentOutcome, MarketplaceError> {
        let outcome = self.db.confirm_payment(reference, amount).await?;
        match &outcome {
            PaymentOutcome::Confirmed(order) => {
                info!("🔄️💰️ Payment of {amount} confirmed for {}", order.order_no);
                self.call_order_paid_hook(order).await;
            },
            PaymentOutcome::AlreadyProcessed(order) => {
                info!("🔄️💰️ Replayed charge for {} ignored; order is already {}", order.order_no, order.status);
            },
            PaymentOutcome::Underpaid { order, paid } => {
                warn!("🔄️💰️ Underpayment of {paid} against {} for {}; order untouched", order.total_amount, order.order_no);
            },
            PaymentOutcome::UnmatchedReference(r) => {
                warn!("🔄️💰️ Charge with unknown reference {r}; acknowledged, no action");
            },
            PaymentOutcome::Failed(_) => unreachable!("confirm_payment never fails an order"),
        }
        Ok(outcome)
    }

    /// Applies a verified `charge.failed` notification: the order moves to `Failed` with the
    /// same replay and unknown-reference semantics as [`Self::confirm_payment`].
    pub async fn fail_payment(&self, reference: &str) -> Result<PaymentOutcome, MarketplaceError> {
        let outcome = self.db.fail_payment(reference).await?;
        match &outcome {
            PaymentOutcome::Failed(order) => {
                info!("🔄️💰️ Charge failed; order {} marked as Failed", order.order_no);
                self.call_order_annulled_hook(order).await;
            },
            PaymentOutcome::AlreadyProcessed(order) => {
                info!("🔄️💰️ Replayed failed charge for {} ignored; order is already {}", order.order_no, order.status);
            },
            PaymentOutcome::UnmatchedReference(r) => {
                warn!("🔄️💰️ Failed charge with unknown reference {r}; acknowledged, no action");
            },
            _ => {},
        }
        Ok(outcome)
    }

    /// Tries to assign an agent to a paid order. `Ok(None)` means no agent in the order's market
    /// is currently eligible; the sweep worker will retry. On success an `AgentAssignedEvent` is
    /// published.
    pub async fn assign_agent(&self, order_no: &OrderNo) -> Result<Option<(Order, Agent)>, MarketplaceError> {
        let assigned = self.db.assign_agent(order_no).await?;
        match &assigned {
            Some((order, agent)) => {
                info!("🔄️ Order {} assigned to agent {} ({})", order.order_no, agent.name, agent.id);
                self.call_agent_assigned_hook(order, agent).await;
            },
            None => {
                debug!("🔄️ No eligible agent for order {order_no} right now");
            },
        }
        Ok(assigned)
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            trace!("🔄️📦️ Notifying order paid hook subscribers");
            emitter.publish_event(OrderPaidEvent::new(order.clone())).await;
        }
    }

    async fn call_agent_assigned_hook(&self, order: &Order, agent: &Agent) {
        for emitter in &self.producers.agent_assigned_producer {
            trace!("🔄️📦️ Notifying agent assigned hook subscribers");
            emitter.publish_event(AgentAssignedEvent::new(order.clone(), agent.clone())).await;
        }
    }

    async fn call_order_delivered_hook(&self, order: &Order) {
        for emitter in &self.producers.order_delivered_producer {
            trace!("🔄️📦️ Notifying order delivered hook subscribers");
            emitter.publish_event(OrderDeliveredEvent::new(order.clone())).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            trace!("🔄️📦️ Notifying order annulled hook subscribers");
            emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
