use serde::{Deserialize, Serialize};

use crate::db_types::{MarketProduct, ProductPrice};

/// The winning catalog entry for a query, with the score that won it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedProduct {
    pub product: MarketProduct,
    pub score: f64,
}

/// The three-way outcome of resolving one cart line.
///
/// Callers must distinguish "product not found" from "product found but the requested measurement
/// scale is unavailable"; neither is an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "availability")]
pub enum ItemAvailability {
    /// The product matched and the requested (or default) scale carries an available price.
    Available { product: MarketProduct, price: ProductPrice, quantity: i64, score: f64 },
    /// The product matched, but the requested scale is missing, disabled or out of stock.
    ScaleUnavailable { product: MarketProduct, requested_scale: Option<String>, score: f64 },
    /// No catalog entry reached the acceptance threshold.
    NotFound { query: String },
}

impl ItemAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, ItemAvailability::Available { .. })
    }
}
