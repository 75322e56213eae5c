#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tradecore::domain::error::TradecoreError;
pub use tradecore::domain::ohlcv::{Candle, Quote};
use tradecore::ports::market_data_port::MarketDataProvider;

pub struct MockProvider {
    pub candles: HashMap<String, Vec<Candle>>,
    pub quotes: HashMap<String, f64>,
    pub errors: HashMap<String, String>,
    pub fetches: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            candles: HashMap::new(),
            quotes: HashMap::new(),
            errors: HashMap::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.candles.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_quote(mut self, symbol: &str, price: f64) -> Self {
        self.quotes.insert(symbol.to_string(), price);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn fetch_candles(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TradecoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradecoreError::Provider {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        let candles = self.candles.get(symbol).cloned().unwrap_or_default();
        let skip = candles.len().saturating_sub(limit);
        Ok(candles[skip..].to_vec())
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Option<Quote>, TradecoreError> {
        Ok(self.quotes.get(symbol).map(|&price| Quote {
            symbol: symbol.to_string(),
            date: date(2024, 6, 1),
            price,
        }))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily candles from closes; open is the previous close, range is ±1.
pub fn candles_from_closes(closes: &[f64], volume: f64) -> Vec<Candle> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            date: start + Duration::days(i as i64),
            open: if i == 0 { close } else { closes[i - 1] },
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
        })
        .collect()
}

pub fn linear_closes(n: usize, start: f64, step: f64) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Rising series with alternating pullbacks: bullish trend, RSI near 57,
/// and a volume spike on the last bar so every signal filter passes.
pub fn emitting_candles(n: usize) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n)
        .map(|i| 100.0 + 0.3 * i as f64 + if i % 2 == 0 { 1.0 } else { -1.0 })
        .collect();
    let mut candles = candles_from_closes(&closes, 1_000.0);
    if let Some(last) = candles.last_mut() {
        last.volume = 5_000.0;
    }
    candles
}

pub fn write_csv(dir: &Path, symbol: &str, candles: &[Candle]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for c in candles {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            c.date, c.open, c.high, c.low, c.close, c.volume
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
