pub mod cryptocompare;
pub mod types;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

/// Source of current fiat prices for an ordered set of assets.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Every requested asset must be present in the returned map on success.
    async fn fetch_prices(&self, assets: &[String], fiat: &str) -> Result<HashMap<String, f64>>;
}
