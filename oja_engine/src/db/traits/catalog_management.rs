use thiserror::Error;

use crate::db_types::{Market, MarketProduct, ProductPrice};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested market {0} does not exist")]
    MarketNotFound(i64),
    #[error("The search query is empty")]
    EmptyQuery,
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// Read-side queries over markets and their catalogs. The resolver walks
/// [`fetch_catalog_for_market`] in insertion order, which is what makes ties on score stable.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Fetches the market with the given id, or `None` if it does not exist.
    async fn fetch_market(&self, market_id: i64) -> Result<Option<Market>, CatalogError>;

    /// Fetches every *available* catalog entry for the market, ordered by insertion (`id`).
    async fn fetch_catalog_for_market(&self, market_id: i64) -> Result<Vec<MarketProduct>, CatalogError>;

    /// Fetches every priced variant for a catalog entry, ordered by insertion.
    async fn fetch_prices_for_product(&self, product_id: i64) -> Result<Vec<ProductPrice>, CatalogError>;
}
