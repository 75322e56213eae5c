//! Asset screening and the blacklist.
//!
//! Checks run in a fixed order and stop at the first match: low volume, low
//! market cap, return volatility, pump-and-dump, manipulation.

use super::config::BlacklistCriteria;
use super::RiskManager;
use crate::domain::indicator::stddev::population_stddev;
use crate::domain::ohlcv::{daily_returns, Candle};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum BlacklistReason {
    AlreadyBlacklisted,
    LowVolume { average: f64, minimum: f64 },
    LowMarketCap { market_cap: f64, minimum: f64 },
    HighVolatility { volatility: f64, maximum: f64 },
    /// Rise starting at `start` followed by a sharp decline.
    PumpAndDump { start: usize },
    /// Volume spike with almost no price movement at `index`.
    Manipulation { index: usize },
    Manual(String),
}

impl fmt::Display for BlacklistReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlacklistReason::AlreadyBlacklisted => write!(f, "already blacklisted"),
            BlacklistReason::LowVolume { average, minimum } => {
                write!(f, "average volume {average:.0} below {minimum:.0}")
            }
            BlacklistReason::LowMarketCap { market_cap, minimum } => {
                write!(f, "market cap {market_cap:.0} below {minimum:.0}")
            }
            BlacklistReason::HighVolatility { volatility, maximum } => write!(
                f,
                "return volatility {:.1}% above {:.1}%",
                volatility * 100.0,
                maximum * 100.0
            ),
            BlacklistReason::PumpAndDump { start } => {
                write!(f, "pump-and-dump pattern starting at bar {start}")
            }
            BlacklistReason::Manipulation { index } => {
                write!(f, "suspected manipulation at bar {index}")
            }
            BlacklistReason::Manual(note) => write!(f, "manual: {note}"),
        }
    }
}

pub fn average_volume(candles: &[Candle]) -> f64 {
    if candles.is_empty() {
        return 0.0;
    }
    candles.iter().map(|c| c.volume).sum::<f64>() / candles.len() as f64
}

/// Population stddev of close-to-close returns.
pub fn return_volatility(candles: &[Candle]) -> f64 {
    population_stddev(&daily_returns(candles))
}

/// First bar where the close rises more than `rise` over `window` bars and
/// then falls more than `decline` from that peak within the next `window` bars.
pub fn detect_pump_and_dump(
    candles: &[Candle],
    rise: f64,
    decline: f64,
    window: usize,
) -> Option<usize> {
    if window == 0 {
        return None;
    }
    (0..candles.len()).find(|&start| {
        let peak = start + window;
        if peak >= candles.len() || candles[start].close <= 0.0 {
            return false;
        }
        let peak_close = candles[peak].close;
        if peak_close / candles[start].close - 1.0 <= rise {
            return false;
        }
        let end = (peak + window).min(candles.len() - 1);
        candles[peak + 1..=end]
            .iter()
            .any(|c| c.close / peak_close - 1.0 < -decline)
    })
}

/// First bar whose volume exceeds `volume_multiple` times the series average
/// while its close moved less than `max_move` from the previous close.
pub fn detect_manipulation(
    candles: &[Candle],
    volume_multiple: f64,
    max_move: f64,
) -> Option<usize> {
    let average = average_volume(candles);
    if average <= 0.0 {
        return None;
    }
    candles
        .windows(2)
        .position(|w| {
            let (prev, bar) = (&w[0], &w[1]);
            prev.close > 0.0
                && bar.volume > volume_multiple * average
                && ((bar.close - prev.close) / prev.close).abs() < max_move
        })
        .map(|i| i + 1)
}

/// Screen one asset's history. `market_cap` is skipped when unknown.
pub fn screen_asset(
    criteria: &BlacklistCriteria,
    candles: &[Candle],
    market_cap: Option<f64>,
) -> Option<BlacklistReason> {
    if criteria.low_liquidity {
        let average = average_volume(candles);
        if average < criteria.min_avg_volume {
            return Some(BlacklistReason::LowVolume {
                average,
                minimum: criteria.min_avg_volume,
            });
        }
        if let Some(cap) = market_cap.filter(|cap| *cap < criteria.min_market_cap) {
            return Some(BlacklistReason::LowMarketCap {
                market_cap: cap,
                minimum: criteria.min_market_cap,
            });
        }
    }

    if criteria.high_volatility {
        let volatility = return_volatility(candles);
        if volatility > criteria.max_return_volatility {
            return Some(BlacklistReason::HighVolatility {
                volatility,
                maximum: criteria.max_return_volatility,
            });
        }
    }

    if criteria.pump_and_dump {
        if let Some(start) = detect_pump_and_dump(
            candles,
            criteria.pump_rise,
            criteria.dump_decline,
            criteria.pattern_window,
        ) {
            return Some(BlacklistReason::PumpAndDump { start });
        }
    }

    if criteria.manipulation {
        if let Some(index) = detect_manipulation(
            candles,
            criteria.manipulation_volume_multiple,
            criteria.manipulation_max_move,
        ) {
            return Some(BlacklistReason::Manipulation { index });
        }
    }

    None
}

impl RiskManager {
    /// Screen `symbol` with the configured criteria, blacklisting it when flagged.
    pub fn evaluate_blacklist(
        &mut self,
        symbol: &str,
        candles: &[Candle],
        market_cap: Option<f64>,
    ) -> Option<BlacklistReason> {
        if self.is_blacklisted(symbol) {
            return Some(BlacklistReason::AlreadyBlacklisted);
        }
        let reason = screen_asset(&self.config.blacklist, candles, market_cap)?;
        warn!(symbol, %reason, "asset blacklisted");
        self.blacklisted.insert(symbol.to_string(), reason.clone());
        Some(reason)
    }

    pub fn blacklist(&mut self, symbol: &str, reason: BlacklistReason) {
        info!(symbol, %reason, "asset blacklisted");
        self.blacklisted.insert(symbol.to_string(), reason);
    }

    pub fn unblacklist(&mut self, symbol: &str) -> bool {
        self.blacklisted.remove(symbol).is_some()
    }

    pub fn is_blacklisted(&self, symbol: &str) -> bool {
        self.blacklisted.contains_key(symbol)
    }

    pub fn blacklist_reason(&self, symbol: &str) -> Option<&BlacklistReason> {
        self.blacklisted.get(symbol)
    }
}
