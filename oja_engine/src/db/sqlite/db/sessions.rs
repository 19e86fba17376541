use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{CustomerSession, SessionStatus},
    traits::MarketplaceError,
};

pub async fn fetch_active_session(
    customer_phone: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<CustomerSession>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM customer_sessions WHERE customer_phone = $1 AND status = $2 ORDER BY id DESC LIMIT 1")
        .bind(customer_phone)
        .bind(SessionStatus::Active)
        .fetch_optional(conn)
        .await
}

/// Returns the customer's active session, creating one if none exists. Order intake calls this so
/// that every order belongs to exactly one active session.
pub async fn ensure_active_session(
    customer_phone: &str,
    conn: &mut SqliteConnection,
) -> Result<CustomerSession, MarketplaceError> {
    if let Some(session) = fetch_active_session(customer_phone, &mut *conn).await? {
        return Ok(session);
    }
    let session = sqlx::query_as(
        "INSERT INTO customer_sessions (customer_phone, status, started_at) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(customer_phone)
    .bind(SessionStatus::Active)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("📝️ New session started for customer {customer_phone}");
    Ok(session)
}

/// Completes the customer's active sessions. A no-op when the customer has none.
pub async fn complete_active_session(
    customer_phone: &str,
    conn: &mut SqliteConnection,
) -> Result<u64, MarketplaceError> {
    let result = sqlx::query(
        "UPDATE customer_sessions SET status = $1, completed_at = $2 WHERE customer_phone = $3 AND status = $4",
    )
    .bind(SessionStatus::Completed)
    .bind(Utc::now())
    .bind(customer_phone)
    .bind(SessionStatus::Active)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
