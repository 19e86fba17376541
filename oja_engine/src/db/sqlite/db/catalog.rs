use sqlx::SqliteConnection;

use crate::db_types::{Market, MarketProduct, ProductPrice};

pub async fn fetch_market(market_id: i64, conn: &mut SqliteConnection) -> Result<Option<Market>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM markets WHERE id = $1").bind(market_id).fetch_optional(conn).await
}

/// Available catalog entries only, in insertion order. The resolver's tie-breaking depends on
/// the `ORDER BY id`.
pub async fn fetch_catalog_for_market(
    market_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<MarketProduct>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM market_products WHERE market_id = $1 AND is_available ORDER BY id")
        .bind(market_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_prices_for_product(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ProductPrice>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM product_prices WHERE market_product_id = $1 ORDER BY id")
        .bind(product_id)
        .fetch_all(conn)
        .await
}
