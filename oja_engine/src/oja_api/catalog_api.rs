use std::fmt::Debug;

use log::*;

use crate::{
    matching::{best_name_score, normalize, scale_key, CartLine, MatchConfig},
    oja_api::catalog_objects::{ItemAvailability, ResolvedProduct},
    traits::{CatalogError, CatalogManagement},
};

/// `CatalogApi` resolves free-text cart lines against a market's catalog.
///
/// Resolution is an O(n·m) linear scan over the market's available entries. There is no index
/// and no caching, which is fine at the tens-to-low-hundreds catalog sizes the markets run at.
pub struct CatalogApi<B> {
    db: B,
    config: MatchConfig,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B, config: MatchConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    /// Finds the single best-matching catalog entry for a free-text product name, or `None` when
    /// nothing reaches the acceptance threshold.
    ///
    /// Each entry is scored against both its custom display name and its base name, keeping the
    /// better of the two. Ties keep the first-encountered entry; enumeration is insertion order,
    /// so the result is stable, if arbitrary, under true ties.
    pub async fn resolve_product(
        &self,
        market_id: i64,
        query: &str,
    ) -> Result<Option<ResolvedProduct>, CatalogError> {
        let query = normalize(query);
        if query.is_empty() {
            return Err(CatalogError::EmptyQuery);
        }
        self.db.fetch_market(market_id).await?.ok_or(CatalogError::MarketNotFound(market_id))?;
        let catalog = self.db.fetch_catalog_for_market(market_id).await?;
        trace!("🛒️ Scoring \"{query}\" against {} catalog entries in market {market_id}", catalog.len());
        let mut best: Option<ResolvedProduct> = None;
        for product in catalog {
            let names = product.custom_name.iter().map(String::as_str).chain([product.base_name.as_str()]);
            let score = best_name_score(&query, names, &self.config);
            // Strictly-greater keeps the first-encountered entry on ties.
            if best.as_ref().map(|b| score > b.score).unwrap_or(true) {
                best = Some(ResolvedProduct { product, score });
            }
            if best.as_ref().map(|b| b.score >= 1.0).unwrap_or(false) {
                break;
            }
        }
        match best {
            Some(b) if b.score >= self.config.threshold => {
                debug!("🛒️ \"{query}\" resolved to \"{}\" at {:.3}", b.product.display_name(), b.score);
                Ok(Some(b))
            },
            Some(b) => {
                debug!("🛒️ No match for \"{query}\": best was \"{}\" at {:.3}", b.product.display_name(), b.score);
                Ok(None)
            },
            None => {
                debug!("🛒️ No match for \"{query}\": market {market_id} has an empty catalog");
                Ok(None)
            },
        }
    }

    /// Resolves one raw cart line ("2kg ric") to a three-way availability outcome: the matched
    /// product and its priced variant, a matched product whose requested scale is unavailable,
    /// or no match at all.
    pub async fn resolve_line(&self, market_id: i64, text: &str) -> Result<ItemAvailability, CatalogError> {
        let line = CartLine::parse(text);
        if line.query.is_empty() {
            return Err(CatalogError::EmptyQuery);
        }
        let resolved = match self.resolve_product(market_id, &line.query).await? {
            Some(resolved) => resolved,
            None => return Ok(ItemAvailability::NotFound { query: line.query }),
        };
        let prices = self.db.fetch_prices_for_product(resolved.product.id).await?;
        let price = match &line.scale {
            Some(scale) => {
                let wanted = scale_key(scale);
                prices.into_iter().find(|p| sellable(p) && scale_key(&p.measurement_scale) == wanted)
            },
            // No scale requested: the first sellable variant is the default.
            None => prices.into_iter().find(sellable),
        };
        match price {
            Some(price) => Ok(ItemAvailability::Available {
                product: resolved.product,
                price,
                quantity: line.quantity,
                score: resolved.score,
            }),
            None => Ok(ItemAvailability::ScaleUnavailable {
                product: resolved.product,
                requested_scale: line.scale,
                score: resolved.score,
            }),
        }
    }
}

fn sellable(price: &crate::db_types::ProductPrice) -> bool {
    price.is_available && price.stock_count != Some(0)
}
