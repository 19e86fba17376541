//! Row-seeding helpers for integration tests. These write directly to the pool rather than going
//! through the public API, so tests can set up markets, agents and catalogs without a dedicated
//! admin surface.
//!
//! Every helper runs in an explicit transaction for the same reason as
//! [`set_payment_reference`](crate::SqliteDatabase): fetching the RETURNING row does not step the
//! statement to completion, and the write lock would otherwise be released asynchronously, racing
//! with whatever the test does next.
use oja_common::Kobo;
use sqlx::SqlitePool;

pub async fn seed_market(pool: &SqlitePool, name: &str, delivery_fee: Kobo) -> i64 {
    let mut tx = pool.begin().await.expect("Error starting seed transaction");
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO markets (name, address, delivery_fee) VALUES ($1, $2, $3) RETURNING id")
            .bind(name)
            .bind(format!("{name} main road"))
            .bind(delivery_fee)
            .fetch_one(&mut *tx)
            .await
            .expect("Error seeding market");
    tx.commit().await.expect("Error committing seed transaction");
    id
}

pub async fn seed_agent(pool: &SqlitePool, market_id: i64, name: &str, max_active_orders: i64) -> i64 {
    let mut tx = pool.begin().await.expect("Error starting seed transaction");
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO agents (market_id, name, phone, max_active_orders) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(market_id)
    .bind(name)
    .bind(format!("+23480{market_id}0{max_active_orders}"))
    .bind(max_active_orders)
    .fetch_one(&mut *tx)
    .await
    .expect("Error seeding agent");
    tx.commit().await.expect("Error committing seed transaction");
    id
}

pub async fn seed_product(pool: &SqlitePool, market_id: i64, base_name: &str) -> i64 {
    let mut tx = pool.begin().await.expect("Error starting seed transaction");
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO market_products (market_id, base_name) VALUES ($1, $2) RETURNING id")
            .bind(market_id)
            .bind(base_name)
            .fetch_one(&mut *tx)
            .await
            .expect("Error seeding product");
    tx.commit().await.expect("Error committing seed transaction");
    id
}

pub async fn seed_price(pool: &SqlitePool, product_id: i64, scale: &str, price: Kobo) {
    let mut tx = pool.begin().await.expect("Error starting seed transaction");
    sqlx::query("INSERT INTO product_prices (market_product_id, measurement_scale, price) VALUES ($1, $2, $3)")
        .bind(product_id)
        .bind(scale)
        .bind(price)
        .execute(&mut *tx)
        .await
        .expect("Error seeding price");
    tx.commit().await.expect("Error committing seed transaction");
}

/// A small market with one agent and a handful of staples, enough for most order-flow tests.
/// Returns `(market_id, agent_id)`.
pub async fn seed_basic_market(pool: &SqlitePool) -> (i64, i64) {
    let market_id = seed_market(pool, "Mile 12", Kobo::from_naira(500)).await;
    let agent_id = seed_agent(pool, market_id, "Ngozi", 5).await;
    let rice = seed_product(pool, market_id, "Rice").await;
    seed_price(pool, rice, "1kg", Kobo::from_naira(1_200)).await;
    seed_price(pool, rice, "5kg", Kobo::from_naira(5_500)).await;
    let beans = seed_product(pool, market_id, "Beans").await;
    seed_price(pool, beans, "paint", Kobo::from_naira(2_800)).await;
    let yam = seed_product(pool, market_id, "Yam").await;
    seed_price(pool, yam, "tuber", Kobo::from_naira(1_500)).await;
    (market_id, agent_id)
}
