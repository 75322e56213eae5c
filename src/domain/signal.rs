//! Signal generation: turns one symbol's recent candles into at most one
//! trade scenario.
//!
//! The evaluation itself is the pure [`evaluate`]; [`SignalGenerator`] wraps it
//! with an injected market-data provider.

use crate::domain::error::TradecoreError;
use crate::domain::indicator::{atr, rsi, sma};
use crate::domain::ohlcv::{closes, Candle};
use crate::ports::market_data_port::MarketDataProvider;
use chrono::NaiveDate;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub rsi_period: usize,
    pub volume_period: usize,
    pub fast_trend_period: usize,
    pub slow_trend_period: usize,
    pub atr_period: usize,
    pub atr_stop_multiplier: f64,
    pub reward_risk_ratio: f64,
    /// RSI below this goes long.
    pub long_below_rsi: f64,
    /// RSI above this goes short.
    pub short_above_rsi: f64,
    pub min_relative_volume: f64,
    /// Relative SMA gap under which the trend is neutral.
    pub trend_tolerance: f64,
    /// Candles requested from the provider per evaluation.
    pub history_bars: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        SignalConfig {
            rsi_period: 14,
            volume_period: 20,
            fast_trend_period: 20,
            slow_trend_period: 50,
            atr_period: 14,
            atr_stop_multiplier: 2.0,
            reward_risk_ratio: 1.5,
            long_below_rsi: 40.0,
            short_above_rsi: 60.0,
            min_relative_volume: 1.5,
            trend_tolerance: 0.0,
            history_bars: 100,
        }
    }
}

impl SignalConfig {
    pub fn minimum_bars(&self) -> usize {
        self.slow_trend_period
            .max(self.fast_trend_period)
            .max(self.volume_period)
            .max(self.rsi_period + 1)
            .max(self.atr_period + 1)
    }
}

/// Indicator readings behind a signal decision.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalIndicators {
    pub rsi: f64,
    pub relative_volume: f64,
    pub trend: Trend,
    pub atr: f64,
    pub sma_fast: f64,
    pub sma_slow: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradingSignal {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub confidence: f64,
    pub timestamp: NaiveDate,
    pub indicators: SignalIndicators,
}

impl TradingSignal {
    pub fn risk_per_share(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs()
    }

    pub fn reward_per_share(&self) -> f64 {
        (self.take_profit - self.entry_price).abs()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalRejection {
    LowRelativeVolume { ratio: f64, minimum: f64 },
    NeutralTrend,
    RsiOutOfRange { rsi: f64 },
    InvalidPrice(f64),
}

impl fmt::Display for SignalRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalRejection::LowRelativeVolume { ratio, minimum } => {
                write!(f, "relative volume {ratio:.2} not above {minimum:.2}")
            }
            SignalRejection::NeutralTrend => write!(f, "trend is neutral"),
            SignalRejection::RsiOutOfRange { rsi } => {
                write!(f, "RSI {rsi:.1} outside (30, 70)")
            }
            SignalRejection::InvalidPrice(p) => write!(f, "invalid entry price {p}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    Emitted(TradingSignal),
    Rejected {
        symbol: String,
        reason: SignalRejection,
        indicators: SignalIndicators,
    },
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },
}

impl SignalOutcome {
    pub fn signal(&self) -> Option<&TradingSignal> {
        match self {
            SignalOutcome::Emitted(signal) => Some(signal),
            _ => None,
        }
    }

    pub fn into_signal(self) -> Option<TradingSignal> {
        match self {
            SignalOutcome::Emitted(signal) => Some(signal),
            _ => None,
        }
    }
}

/// Classify SMA(fast) against SMA(slow).
pub fn detect_trend(sma_fast: f64, sma_slow: f64, tolerance: f64) -> Trend {
    let gap = if sma_slow != 0.0 {
        (sma_fast - sma_slow) / sma_slow.abs()
    } else {
        sma_fast - sma_slow
    };
    if gap > tolerance {
        Trend::Bullish
    } else if gap < -tolerance {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Latest volume over the mean volume of the trailing window (latest included).
pub fn relative_volume(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }
    let window = &candles[candles.len() - period..];
    let average = window.iter().map(|c| c.volume).sum::<f64>() / period as f64;
    let latest = window[window.len() - 1].volume;
    Some(if average > 0.0 { latest / average } else { 0.0 })
}

/// Direction from RSI alone. Between the two thresholds this defaults to long.
pub fn direction_for_rsi(rsi: f64, config: &SignalConfig) -> Direction {
    if rsi < config.long_below_rsi {
        Direction::Long
    } else if rsi > config.short_above_rsi {
        Direction::Short
    } else {
        Direction::Long
    }
}

pub fn confidence(indicators: &SignalIndicators, min_relative_volume: f64) -> f64 {
    let mut score: f64 = 0.5;
    if indicators.rsi < 30.0 || indicators.rsi > 70.0 {
        score += 0.1;
    }
    if indicators.rsi < 20.0 || indicators.rsi > 80.0 {
        score += 0.1;
    }
    if indicators.relative_volume > min_relative_volume {
        score += 0.1;
    }
    if indicators.relative_volume > 3.0 {
        score += 0.1;
    }
    if indicators.trend != Trend::Neutral {
        score += 0.1;
    }
    score.min(0.9)
}

/// Evaluate one symbol. `latest_price` overrides the last close as the entry.
pub fn evaluate(
    symbol: &str,
    candles: &[Candle],
    latest_price: Option<f64>,
    config: &SignalConfig,
) -> SignalOutcome {
    let minimum = config.minimum_bars();
    let insufficient = || SignalOutcome::InsufficientData {
        symbol: symbol.to_string(),
        bars: candles.len(),
        minimum,
    };
    if candles.len() < minimum {
        return insufficient();
    }

    let close_values = closes(candles);
    let (Some(rsi), Some(sma_fast), Some(sma_slow), Some(atr), Some(rel_volume)) = (
        rsi(&close_values, config.rsi_period).last().copied(),
        sma(&close_values, config.fast_trend_period).last().copied(),
        sma(&close_values, config.slow_trend_period).last().copied(),
        atr(candles, config.atr_period).last().copied(),
        relative_volume(candles, config.volume_period),
    ) else {
        return insufficient();
    };

    let indicators = SignalIndicators {
        rsi,
        relative_volume: rel_volume,
        trend: detect_trend(sma_fast, sma_slow, config.trend_tolerance),
        atr,
        sma_fast,
        sma_slow,
    };

    let entry = latest_price.unwrap_or(candles[candles.len() - 1].close);
    let rejection = if !entry.is_finite() || entry <= 0.0 {
        Some(SignalRejection::InvalidPrice(entry))
    } else if indicators.relative_volume <= config.min_relative_volume {
        Some(SignalRejection::LowRelativeVolume {
            ratio: indicators.relative_volume,
            minimum: config.min_relative_volume,
        })
    } else if indicators.trend == Trend::Neutral {
        Some(SignalRejection::NeutralTrend)
    } else if indicators.rsi <= 30.0 || indicators.rsi >= 70.0 {
        Some(SignalRejection::RsiOutOfRange {
            rsi: indicators.rsi,
        })
    } else {
        None
    };

    if let Some(reason) = rejection {
        debug!(symbol, %reason, "signal rejected");
        return SignalOutcome::Rejected {
            symbol: symbol.to_string(),
            reason,
            indicators,
        };
    }

    let direction = direction_for_rsi(indicators.rsi, config);
    let stop_distance = indicators.atr * config.atr_stop_multiplier;
    let target_distance = stop_distance * config.reward_risk_ratio;
    let (stop_loss, take_profit) = match direction {
        Direction::Long => (entry - stop_distance, entry + target_distance),
        Direction::Short => (entry + stop_distance, entry - target_distance),
    };

    let signal = TradingSignal {
        symbol: symbol.to_string(),
        direction,
        entry_price: entry,
        stop_loss,
        take_profit,
        confidence: confidence(&indicators, config.min_relative_volume),
        timestamp: candles[candles.len() - 1].date,
        indicators,
    };
    debug!(
        symbol,
        direction = %signal.direction,
        confidence = signal.confidence,
        "signal emitted"
    );
    SignalOutcome::Emitted(signal)
}

/// Signal generator bound to a market-data provider.
pub struct SignalGenerator<P> {
    provider: P,
    config: SignalConfig,
}

impl<P: MarketDataProvider> SignalGenerator<P> {
    pub fn new(provider: P, config: SignalConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Fetch history and a quote for `symbol`, then evaluate it.
    ///
    /// Provider failures on the candle fetch are returned as errors; a failed
    /// quote lookup falls back to the last close.
    pub async fn generate(&self, symbol: &str) -> Result<SignalOutcome, TradecoreError> {
        let candles = self
            .provider
            .fetch_candles(symbol, self.config.history_bars)
            .await?;

        let latest_price = match self.provider.latest_quote(symbol).await {
            Ok(quote) => quote.map(|q| q.price),
            Err(e) => {
                warn!(symbol, error = %e, "quote unavailable, using last close");
                None
            }
        };

        Ok(evaluate(symbol, &candles, latest_price, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn candles_from(closes: &[f64], volumes: &[f64]) -> Vec<Candle> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| Candle {
                date: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume,
            })
            .collect()
    }

    /// Uptrend with shallow pullbacks so RSI stays inside (30, 70).
    fn choppy_uptrend(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 0.3 * i as f64 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect()
    }

    fn spike_volume(n: usize, spike: f64) -> Vec<f64> {
        let mut v = vec![1000.0; n];
        v[n - 1] = spike;
        v
    }

    #[test]
    fn strictly_increasing_series_is_bullish_and_overbought() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let values = rsi(&closes, 14);
        let fast = sma(&closes, 20);
        let slow = sma(&closes, 50);

        assert_eq!(
            detect_trend(*fast.last().unwrap(), *slow.last().unwrap(), 0.0),
            Trend::Bullish
        );
        assert!(*values.last().unwrap() > 70.0);
    }

    #[test]
    fn trend_classification() {
        assert_eq!(detect_trend(101.0, 100.0, 0.0), Trend::Bullish);
        assert_eq!(detect_trend(99.0, 100.0, 0.0), Trend::Bearish);
        assert_eq!(detect_trend(100.0, 100.0, 0.0), Trend::Neutral);
        assert_eq!(detect_trend(100.4, 100.0, 0.005), Trend::Neutral);
    }

    #[test]
    fn relative_volume_includes_latest_bar() {
        let candles = candles_from(&[10.0; 20], &spike_volume(20, 2900.0));
        // mean = (19 * 1000 + 2900) / 20 = 1095
        let ratio = relative_volume(&candles, 20).unwrap();
        assert!((ratio - 2900.0 / 1095.0).abs() < 1e-12);
        assert!(relative_volume(&candles, 21).is_none());
    }

    #[test]
    fn direction_rule() {
        let config = SignalConfig::default();
        assert_eq!(direction_for_rsi(35.0, &config), Direction::Long);
        assert_eq!(direction_for_rsi(65.0, &config), Direction::Short);
        assert_eq!(direction_for_rsi(50.0, &config), Direction::Long);
    }

    #[test]
    fn confidence_increments_and_cap() {
        let base = SignalIndicators {
            rsi: 50.0,
            relative_volume: 1.0,
            trend: Trend::Neutral,
            atr: 1.0,
            sma_fast: 1.0,
            sma_slow: 1.0,
        };
        assert!((confidence(&base, 1.5) - 0.5).abs() < 1e-12);

        let strong = SignalIndicators {
            relative_volume: 2.0,
            trend: Trend::Bullish,
            ..base.clone()
        };
        assert!((confidence(&strong, 1.5) - 0.7).abs() < 1e-12);

        let extreme = SignalIndicators {
            rsi: 10.0,
            relative_volume: 4.0,
            trend: Trend::Bearish,
            ..base
        };
        assert!((confidence(&extreme, 1.5) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn emits_long_signal_with_asymmetric_levels() {
        let n = 60;
        let candles = candles_from(&choppy_uptrend(n), &spike_volume(n, 2500.0));
        let outcome = evaluate("ACME", &candles, None, &SignalConfig::default());

        let signal = outcome.signal().expect("signal should be emitted");
        assert_eq!(signal.symbol, "ACME");
        assert_eq!(signal.timestamp, candles[n - 1].date);
        assert!((signal.entry_price - candles[n - 1].close).abs() < 1e-12);
        assert_eq!(signal.indicators.trend, Trend::Bullish);

        let atr = signal.indicators.atr;
        match signal.direction {
            Direction::Long => {
                assert!((signal.stop_loss - (signal.entry_price - 2.0 * atr)).abs() < 1e-9);
                assert!((signal.take_profit - (signal.entry_price + 3.0 * atr)).abs() < 1e-9);
            }
            Direction::Short => {
                assert!((signal.stop_loss - (signal.entry_price + 2.0 * atr)).abs() < 1e-9);
                assert!((signal.take_profit - (signal.entry_price - 3.0 * atr)).abs() < 1e-9);
            }
        }
        assert!((signal.reward_per_share() / signal.risk_per_share() - 1.5).abs() < 1e-9);
        assert!((0.0..=0.9).contains(&signal.confidence));
    }

    #[test]
    fn latest_quote_overrides_entry() {
        let n = 60;
        let candles = candles_from(&choppy_uptrend(n), &spike_volume(n, 2500.0));
        let outcome = evaluate("ACME", &candles, Some(120.0), &SignalConfig::default());
        assert!((outcome.signal().unwrap().entry_price - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_low_volume() {
        let n = 60;
        let candles = candles_from(&choppy_uptrend(n), &vec![1000.0; n]);
        match evaluate("ACME", &candles, None, &SignalConfig::default()) {
            SignalOutcome::Rejected { reason, .. } => {
                assert!(matches!(reason, SignalRejection::LowRelativeVolume { .. }))
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn rejects_overbought_rsi() {
        let n = 60;
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        let candles = candles_from(&closes, &spike_volume(n, 5000.0));
        match evaluate("ACME", &candles, None, &SignalConfig::default()) {
            SignalOutcome::Rejected { reason, indicators, .. } => {
                assert!(matches!(reason, SignalRejection::RsiOutOfRange { .. }));
                assert!(indicators.rsi >= 70.0);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn rejects_neutral_trend() {
        let n = 60;
        let closes: Vec<f64> = (0..n)
            .map(|i| if i % 2 == 0 { 101.0 } else { 99.0 })
            .collect();
        let candles = candles_from(&closes, &spike_volume(n, 5000.0));
        let config = SignalConfig {
            trend_tolerance: 0.01,
            ..SignalConfig::default()
        };
        match evaluate("ACME", &candles, None, &config) {
            SignalOutcome::Rejected { reason, .. } => {
                assert_eq!(reason, SignalRejection::NeutralTrend)
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn short_history_is_insufficient() {
        let candles = candles_from(&choppy_uptrend(30), &vec![1000.0; 30]);
        assert_eq!(
            evaluate("ACME", &candles, None, &SignalConfig::default()),
            SignalOutcome::InsufficientData {
                symbol: "ACME".into(),
                bars: 30,
                minimum: 50,
            }
        );
        assert!(matches!(
            evaluate("ACME", &[], None, &SignalConfig::default()),
            SignalOutcome::InsufficientData { bars: 0, .. }
        ));
    }

    #[test]
    fn invalid_quote_is_rejected() {
        let n = 60;
        let candles = candles_from(&choppy_uptrend(n), &spike_volume(n, 2500.0));
        match evaluate("ACME", &candles, Some(0.0), &SignalConfig::default()) {
            SignalOutcome::Rejected { reason, .. } => {
                assert_eq!(reason, SignalRejection::InvalidPrice(0.0))
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
