//! Strategy policies driving the backtester.
//!
//! A policy sees precomputed indicators by candle index and answers with an
//! optional buy or sell decision. Each built-in policy declares the indicators
//! it reads via `requirements()`.

use crate::domain::indicator::{IndicatorBundle, IndicatorKind, IndicatorRequirements};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy,
    Sell,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Buy => write!(f, "buy"),
            Decision::Sell => write!(f, "sell"),
        }
    }
}

pub trait StrategyPolicy {
    /// Decide at candle `index` using only values at or before `index`.
    fn decide(&self, index: usize, indicators: &IndicatorBundle) -> Option<Decision>;
}

impl<F> StrategyPolicy for F
where
    F: Fn(usize, &IndicatorBundle) -> Option<Decision>,
{
    fn decide(&self, index: usize, indicators: &IndicatorBundle) -> Option<Decision> {
        self(index, indicators)
    }
}

/// Buy when RSI drops below `oversold`, sell when it rises above `overbought`.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiReversion {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiReversion {
    fn default() -> Self {
        RsiReversion {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl RsiReversion {
    pub fn requirements(&self) -> IndicatorRequirements {
        IndicatorRequirements::new().with("rsi", IndicatorKind::Rsi(self.period))
    }
}

impl StrategyPolicy for RsiReversion {
    fn decide(&self, index: usize, indicators: &IndicatorBundle) -> Option<Decision> {
        let rsi = indicators.value_at("rsi", index)?;
        if rsi < self.oversold {
            Some(Decision::Buy)
        } else if rsi > self.overbought {
            Some(Decision::Sell)
        } else {
            None
        }
    }
}

/// Fast/slow SMA crossover.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageCross {
    pub fast: usize,
    pub slow: usize,
}

impl Default for MovingAverageCross {
    fn default() -> Self {
        MovingAverageCross { fast: 20, slow: 50 }
    }
}

impl MovingAverageCross {
    pub fn requirements(&self) -> IndicatorRequirements {
        IndicatorRequirements::new()
            .with("fast", IndicatorKind::Sma(self.fast))
            .with("slow", IndicatorKind::Sma(self.slow))
    }
}

/// Detect a sign change of `a - b` between `index - 1` and `index`.
fn crossing(
    indicators: &IndicatorBundle,
    a: &str,
    b: &str,
    index: usize,
) -> Option<Decision> {
    let prev = indicators.previous(a, index)? - indicators.previous(b, index)?;
    let curr = indicators.value_at(a, index)? - indicators.value_at(b, index)?;
    if prev <= 0.0 && curr > 0.0 {
        Some(Decision::Buy)
    } else if prev >= 0.0 && curr < 0.0 {
        Some(Decision::Sell)
    } else {
        None
    }
}

impl StrategyPolicy for MovingAverageCross {
    fn decide(&self, index: usize, indicators: &IndicatorBundle) -> Option<Decision> {
        crossing(indicators, "fast", "slow", index)
    }
}

/// MACD line crossing its signal line.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdCross {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdCross {
    fn default() -> Self {
        MacdCross {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl MacdCross {
    pub fn requirements(&self) -> IndicatorRequirements {
        IndicatorRequirements::new().with(
            "macd",
            IndicatorKind::Macd {
                fast: self.fast,
                slow: self.slow,
                signal: self.signal,
            },
        )
    }
}

impl StrategyPolicy for MacdCross {
    fn decide(&self, index: usize, indicators: &IndicatorBundle) -> Option<Decision> {
        crossing(indicators, "macd_macd", "macd_signal", index)
    }
}

/// Built-in policies selectable by name from the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinStrategy {
    RsiReversion(RsiReversion),
    MovingAverageCross(MovingAverageCross),
    MacdCross(MacdCross),
}

impl BuiltinStrategy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rsi" | "rsi-reversion" => Some(Self::RsiReversion(RsiReversion::default())),
            "sma" | "ma-cross" => Some(Self::MovingAverageCross(MovingAverageCross::default())),
            "macd" | "macd-cross" => Some(Self::MacdCross(MacdCross::default())),
            _ => None,
        }
    }

    pub fn requirements(&self) -> IndicatorRequirements {
        match self {
            Self::RsiReversion(p) => p.requirements(),
            Self::MovingAverageCross(p) => p.requirements(),
            Self::MacdCross(p) => p.requirements(),
        }
    }
}

impl StrategyPolicy for BuiltinStrategy {
    fn decide(&self, index: usize, indicators: &IndicatorBundle) -> Option<Decision> {
        match self {
            Self::RsiReversion(p) => p.decide(index, indicators),
            Self::MovingAverageCross(p) => p.decide(index, indicators),
            Self::MacdCross(p) => p.decide(index, indicators),
        }
    }
}

impl fmt::Display for BuiltinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RsiReversion(p) => {
                write!(f, "RSI reversion ({}, {}/{})", p.period, p.oversold, p.overbought)
            }
            Self::MovingAverageCross(p) => write!(f, "SMA cross ({}/{})", p.fast, p.slow),
            Self::MacdCross(p) => write!(f, "MACD cross ({},{},{})", p.fast, p.slow, p.signal),
        }
    }
}
