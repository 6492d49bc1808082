use std::collections::HashMap;

use serde::Deserialize;

/// CryptoCompare `pricemulti` success body: `{"BTC": {"USD": 64012.5}, ...}`.
pub type PriceMultiResponse = HashMap<String, HashMap<String, f64>>;

/// CryptoCompare error body. Returned with HTTP 200, so it must be sniffed from the payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CryptoCompareErrorResponse {
    pub response: String,
    #[serde(default)]
    pub message: String,
}

impl CryptoCompareErrorResponse {
    pub fn is_error(&self) -> bool {
        self.response.eq_ignore_ascii_case("error")
    }
}
