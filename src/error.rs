use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the tracker core (history, delta, feed, ports).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("no price history for {asset}")]
    EmptyHistory { asset: String },

    #[error("asset {asset} is not tracked")]
    UnknownAsset { asset: String },

    #[error("newest {asset} price is zero, percent change is undefined")]
    DegenerateDelta { asset: String },

    #[error("price feed returned no {fiat} price for {asset}")]
    MissingPrice { asset: String, fiat: String },

    #[error("price feed returned an invalid price for {asset}: {price}")]
    InvalidPrice { asset: String, price: f64 },

    #[error("price feed error: {0}")]
    PriceFeed(String),

    #[error("hardware fault: {0}")]
    Hardware(String),
}
