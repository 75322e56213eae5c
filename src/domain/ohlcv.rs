//! OHLCV candle representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Latest traded price reported by a market-data provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
}

pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

pub fn volumes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.volume).collect()
}

/// Simple close-to-close returns; a zero previous close yields 0.
pub fn daily_returns(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            if w[0].close != 0.0 {
                (w[1].close - w[0].close) / w[0].close
            } else {
                0.0
            }
        })
        .collect()
}

/// Index of the first candle whose date is not strictly after its predecessor.
pub fn first_unordered(candles: &[Candle]) -> Option<usize> {
    candles
        .windows(2)
        .position(|w| w[1].date <= w[0].date)
        .map(|i| i + 1)
}
