use crate::core::{Fiat, PriceProvider, RateError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// `{ "<coin id>": { "<fiat>": <price> } }`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

pub struct CoinGeckoProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("cryptopanel/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn price_url(&self, coin_id: &str, fiat: Fiat) -> Result<reqwest::Url, RateError> {
        let endpoint = format!("{}/api/v3/simple/price", self.base_url);
        reqwest::Url::parse_with_params(
            &endpoint,
            &[("ids", coin_id), ("vs_currencies", fiat.code())],
        )
        .map_err(|e| RateError::Network(format!("неверный адрес API {endpoint}: {e}")))
    }
}

fn extract_price(
    mut response: SimplePriceResponse,
    coin_id: &str,
    fiat: Fiat,
) -> Result<f64, RateError> {
    let prices = response
        .remove(coin_id)
        .ok_or_else(|| RateError::NotFound(coin_id.to_string()))?;
    prices.get(fiat.code()).copied().ok_or_else(|| {
        RateError::MalformedResponse(format!("нет цены в {} для '{}'", fiat.label(), coin_id))
    })
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    #[instrument(skip(self))]
    async fn fetch_price(&self, coin_id: &str, fiat: Fiat) -> Result<f64, RateError> {
        let url = self.price_url(coin_id, fiat)?;
        debug!("Requesting price data from {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let response_text = response.text().await?;

        let data: SimplePriceResponse = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse price response"
                );
                return Err(e.into());
            }
        };

        let price = extract_price(data, coin_id, fiat)?;
        debug!("Successfully fetched price for {}: {}", coin_id, price);
        Ok(price)
    }
}
