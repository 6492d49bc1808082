use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::types::{CryptoCompareErrorResponse, PriceMultiResponse};
use super::PriceSource;
use crate::error::{AppError, TrackerError};

pub struct CryptoCompareClient {
    http: reqwest::Client,
    base_url: String,
    exchange: Option<String>,
}

impl CryptoCompareClient {
    pub fn new(base_url: &str, exchange: Option<&str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::from)
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            exchange: exchange
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        })
    }

    fn query(&self, assets: &[String], fiat: &str) -> Vec<(&'static str, String)> {
        let mut q = vec![("fsyms", assets.join(",")), ("tsyms", fiat.to_string())];
        if let Some(e) = &self.exchange {
            q.push(("e", e.clone()));
        }
        q
    }
}

#[async_trait]
impl PriceSource for CryptoCompareClient {
    async fn fetch_prices(&self, assets: &[String], fiat: &str) -> Result<HashMap<String, f64>> {
        let url = format!("{}/data/pricemulti", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&self.query(assets, fiat))
            .send()
            .await
            .context("pricemulti request failed")?
            .error_for_status()
            .context("pricemulti returned error status")?;

        let body = resp.text().await.context("pricemulti body read failed")?;
        let prices = parse_price_multi(&body, assets, fiat)?;
        tracing::debug!(?prices, "Fetched prices");
        Ok(prices)
    }
}

/// Extract `fiat` prices for `assets` from a `pricemulti` body.
pub fn parse_price_multi(
    body: &str,
    assets: &[String],
    fiat: &str,
) -> Result<HashMap<String, f64>> {
    if let Ok(err) = serde_json::from_str::<CryptoCompareErrorResponse>(body) {
        if err.is_error() {
            return Err(TrackerError::PriceFeed(err.message).into());
        }
    }

    let parsed: PriceMultiResponse = serde_json::from_str(body)
        .map_err(AppError::from)
        .context("failed to parse pricemulti response")?;

    let mut out = HashMap::with_capacity(assets.len());
    for asset in assets {
        let price = parsed
            .get(asset)
            .and_then(|quotes| quotes.get(fiat))
            .copied()
            .ok_or_else(|| TrackerError::MissingPrice {
                asset: asset.clone(),
                fiat: fiat.to_string(),
            })?;
        if !price.is_finite() || price < 0.0 {
            return Err(TrackerError::InvalidPrice {
                asset: asset.clone(),
                price,
            }
            .into());
        }
        out.insert(asset.clone(), price);
    }
    Ok(out)
}
