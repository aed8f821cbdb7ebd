//! Pricing abstractions

use super::error::RateError;
use super::quote::Fiat;
use async_trait::async_trait;

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Looks up the current price of `coin_id` in `fiat`.
    ///
    /// `coin_id` must already be resolved to a canonical id.
    async fn fetch_price(&self, coin_id: &str, fiat: Fiat) -> Result<f64, RateError>;
}
