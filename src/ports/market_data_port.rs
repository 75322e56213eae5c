//! Market-data provider port.
//!
//! The only asynchronous boundary in the crate: implementations typically sit
//! on an HTTP client, which owns timeouts and cancellation.

use crate::domain::error::TradecoreError;
use crate::domain::ohlcv::{Candle, Quote};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Up to `limit` most recent candles, ascending by date.
    async fn fetch_candles(&self, symbol: &str, limit: usize)
        -> Result<Vec<Candle>, TradecoreError>;

    /// Latest traded price, if the provider has one.
    async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>, TradecoreError>;
}

#[async_trait]
impl<T: MarketDataProvider + ?Sized> MarketDataProvider for Arc<T> {
    async fn fetch_candles(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TradecoreError> {
        (**self).fetch_candles(symbol, limit).await
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>, TradecoreError> {
        (**self).latest_quote(symbol).await
    }
}
