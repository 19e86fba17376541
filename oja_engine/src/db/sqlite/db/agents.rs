use chrono::Utc;
use log::debug;
use oja_common::Kobo;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Agent, AgentEarning, EarningStatus},
    traits::MarketplaceError,
};

// States that count towards an agent's open-order load.
const OPEN_STATUSES: &str = "'Assigned','Preparing','ReadyForDelivery','OutForDelivery'";

/// The first agent in the market, in insertion order, that is active, not suspended, and below
/// their open-order ceiling. Deliberately not load-balanced: agent id order is the market's own
/// seniority convention.
pub async fn find_eligible_agent(market_id: i64, conn: &mut SqliteConnection) -> Result<Option<Agent>, sqlx::Error> {
    let sql = format!(
        r#"
            SELECT * FROM agents a
            WHERE a.market_id = $1
              AND a.is_active
              AND NOT a.is_suspended
              AND (
                  SELECT COUNT(*) FROM orders o
                  WHERE o.agent_id = a.id AND o.status IN ({OPEN_STATUSES})
              ) < a.max_active_orders
            ORDER BY a.id
            LIMIT 1;
        "#
    );
    sqlx::query_as(&sql).bind(market_id).fetch_optional(conn).await
}

pub async fn fetch_agent(agent_id: i64, conn: &mut SqliteConnection) -> Result<Option<Agent>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM agents WHERE id = $1").bind(agent_id).fetch_optional(conn).await
}

/// Records the pending commission for an assignment. One earning row per order, enforced by the
/// unique constraint.
pub async fn insert_pending_earning(
    agent_id: i64,
    order_id: i64,
    amount: Kobo,
    conn: &mut SqliteConnection,
) -> Result<(), MarketplaceError> {
    sqlx::query("INSERT INTO agent_earnings (agent_id, order_id, amount, status, created_at) VALUES ($1, $2, $3, $4, $5)")
        .bind(agent_id)
        .bind(order_id)
        .bind(amount)
        .bind(EarningStatus::Pending)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    debug!("📝️ Pending earning of {amount} recorded for agent {agent_id} on order id {order_id}");
    Ok(())
}

/// Flips the order's pending earnings to paid. Called inside the `Delivered` transaction.
pub async fn settle_earnings_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<u64, MarketplaceError> {
    let result = sqlx::query("UPDATE agent_earnings SET status = $1, paid_at = $2 WHERE order_id = $3 AND status = $4")
        .bind(EarningStatus::Paid)
        .bind(Utc::now())
        .bind(order_id)
        .bind(EarningStatus::Pending)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_earnings_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<AgentEarning>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM agent_earnings WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

/// The commission captured at assignment time: `commission_rate × subtotal`, rounded to the
/// nearest kobo.
pub fn commission_for(agent: &Agent, subtotal: Kobo) -> Kobo {
    #[allow(clippy::cast_possible_truncation)]
    Kobo::from((subtotal.value() as f64 * agent.commission_rate).round() as i64)
}
