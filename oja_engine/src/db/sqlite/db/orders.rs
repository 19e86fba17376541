use chrono::Utc;
use log::{debug, trace};
use oja_common::Kobo;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderNo, OrderStatusLogEntry, OrderStatusType},
    oja_api::order_objects::OrderQueryFilter,
    traits::MarketplaceError,
};

/// Inserts a new order row with its totals already computed from `items`. This is not atomic on
/// its own: callers embed it in a transaction alongside [`insert_items`] and
/// [`insert_status_log`], passing `&mut *tx` as the connection argument.
pub async fn insert_order(
    order: NewOrder,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<Order, MarketplaceError> {
    if fetch_order_by_order_no(&order.order_no, conn).await?.is_some() {
        return Err(MarketplaceError::OrderAlreadyExists(order.order_no));
    }
    let subtotal: Kobo = items.iter().map(NewOrderItem::total_price).sum();
    let now = Utc::now();
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_no,
                customer_name,
                customer_phone,
                delivery_address,
                latitude,
                longitude,
                market_id,
                subtotal,
                delivery_fee,
                total_amount,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *;
        "#,
    )
    .bind(order.order_no)
    .bind(order.customer_name)
    .bind(order.customer_phone)
    .bind(order.delivery_address)
    .bind(order.latitude)
    .bind(order.longitude)
    .bind(order.market_id)
    .bind(subtotal)
    .bind(order.delivery_fee)
    .bind(subtotal + order.delivery_fee)
    .bind(OrderStatusType::Pending)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    debug!("📝️ Order {} inserted with id {}", inserted.order_no, inserted.id);
    Ok(inserted)
}

pub async fn insert_items(
    order_id: i64,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<(), MarketplaceError> {
    for item in items {
        sqlx::query(
            r#"
                INSERT INTO order_items (
                    order_id, market_product_id, product_name, measurement_scale, quantity, unit_price, total_price
                ) VALUES ($1, $2, $3, $4, $5, $6, $7);
            "#,
        )
        .bind(order_id)
        .bind(item.market_product_id)
        .bind(&item.product_name)
        .bind(&item.measurement_scale)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn delete_items(order_id: i64, conn: &mut SqliteConnection) -> Result<(), MarketplaceError> {
    sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id).execute(conn).await?;
    Ok(())
}

/// Recomputes `subtotal` and `total_amount` from the item rows. Runs in the same transaction as
/// the item mutation, so the totals invariant is never observable as violated.
pub async fn recompute_totals(order_id: i64, conn: &mut SqliteConnection) -> Result<Order, MarketplaceError> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                subtotal = (SELECT COALESCE(SUM(total_price), 0) FROM order_items WHERE order_id = $1),
                total_amount = (SELECT COALESCE(SUM(total_price), 0) FROM order_items WHERE order_id = $1)
                    + delivery_fee,
                updated_at = $2
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_no(
    order_no: &OrderNo,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_no = $1").bind(order_no.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE payment_reference = $1").bind(reference).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

pub async fn fetch_status_history(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderStatusLogEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_status_log WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

pub async fn insert_status_log(
    order_id: i64,
    status: OrderStatusType,
    message: &str,
    conn: &mut SqliteConnection,
) -> Result<(), MarketplaceError> {
    sqlx::query("INSERT INTO order_status_log (order_id, status, message, created_at) VALUES ($1, $2, $3, $4)")
        .bind(order_id)
        .bind(status)
        .bind(message)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}

/// The optimistic status transition. The `AND status = $from` guard means a racing transition
/// sees zero updated rows rather than clobbering the winner; callers translate that into a
/// conflict. The per-state timestamp columns are stamped as part of the same statement.
pub async fn guarded_status_update(
    order_no: &OrderNo,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, MarketplaceError> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                updated_at = $2,
                paid_at = CASE WHEN $1 = 'Paid' THEN $2 ELSE paid_at END,
                assigned_at = CASE WHEN $1 = 'Assigned' THEN $2 ELSE assigned_at END,
                delivered_at = CASE WHEN $1 = 'Delivered' THEN $2 ELSE delivered_at END
            WHERE order_no = $3 AND status = $4
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(Utc::now())
    .bind(order_no.as_str())
    .bind(from)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Like [`guarded_status_update`], but additionally stamps the assigned agent. Guarded on `Paid`.
pub async fn guarded_assign(
    order_no: &OrderNo,
    agent_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, MarketplaceError> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                agent_id = $2,
                assigned_at = $3,
                updated_at = $3
            WHERE order_no = $4 AND status = $5
            RETURNING *;
        "#,
    )
    .bind(OrderStatusType::Assigned)
    .bind(agent_id)
    .bind(Utc::now())
    .bind(order_no.as_str())
    .bind(OrderStatusType::Paid)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn set_payment_reference(
    order_no: &OrderNo,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Order, MarketplaceError> {
    let clash: Option<Order> = fetch_order_by_payment_reference(reference, &mut *conn).await?;
    if let Some(other) = clash {
        if other.order_no != *order_no {
            return Err(MarketplaceError::PaymentReferenceClash(reference.to_string()));
        }
    }
    let order: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payment_reference = $1, updated_at = $2 WHERE order_no = $3 RETURNING *",
    )
    .bind(reference)
    .bind(Utc::now())
    .bind(order_no.as_str())
    .fetch_optional(conn)
    .await?;
    order.ok_or_else(|| MarketplaceError::OrderNotFound(order_no.clone()))
}

pub async fn fetch_unassigned_paid_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE status = $1 AND agent_id IS NULL ORDER BY created_at")
        .bind(OrderStatusType::Paid)
        .fetch_all(conn)
        .await
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in ascending order.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_no) = query.order_no {
        where_clause.push("order_no = ");
        where_clause.push_bind_unseparated(order_no.0);
    }
    if let Some(phone) = query.customer_phone {
        where_clause.push("customer_phone = ");
        where_clause.push_bind_unseparated(phone);
    }
    if let Some(market_id) = query.market_id {
        where_clause.push("market_id = ");
        where_clause.push_bind_unseparated(market_id);
    }
    if let Some(agent_id) = query.agent_id {
        where_clause.push("agent_id = ");
        where_clause.push_bind_unseparated(agent_id);
    }
    if let Some(statuses) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let statuses = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}
