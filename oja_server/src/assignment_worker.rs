use log::*;
use oja_engine::{events::EventProducers, MarketplaceDatabase, OrderFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the assignment sweep. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The sweep picks up paid orders that could not be assigned immediately (every agent was at
/// capacity, say) and retries them once a slot frees up. Assignments made here publish the same
/// `AgentAssignedEvent` as the on-payment attempt, so the customer is notified either way.
pub fn start_assignment_worker(db: SqliteDatabase, producers: EventProducers, period_seconds: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(period_seconds));
        let api = OrderFlowApi::new(db, producers);
        info!("🕰️ Agent assignment worker started (period {period_seconds}s)");
        loop {
            timer.tick().await;
            trace!("🕰️ Running assignment sweep");
            let orders = match api.db().fetch_unassigned_paid_orders().await {
                Ok(orders) => orders,
                Err(e) => {
                    error!("🕰️ Could not fetch unassigned paid orders: {e}");
                    continue;
                },
            };
            if orders.is_empty() {
                continue;
            }
            info!("🕰️ {} paid orders await assignment", orders.len());
            let mut assigned = 0;
            for order in &orders {
                match api.assign_agent(&order.order_no).await {
                    Ok(Some(_)) => assigned += 1,
                    Ok(None) => {},
                    Err(e) => {
                        error!("🕰️ Could not assign order {}: {e}", order.order_no);
                    },
                }
            }
            info!("🕰️ Assignment sweep done. {assigned}/{} orders assigned", orders.len());
        }
    })
}
