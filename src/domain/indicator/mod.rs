//! Technical indicator implementations.
//!
//! Every indicator is a pure function over a price slice or candle slice.
//! Results are tail-aligned to the input: a series of length `L` computed from
//! `N` candles covers candle indices `N - L .. N`. Under-supplied input yields
//! an empty `Vec` (single-line indicators) or `None` (multi-line indicators).
//!
//! This module also provides the registry used by the backtester:
//! - `IndicatorKind`: indicator identity + typed parameters (HashMap key)
//! - `IndicatorOutput`: the result shape for each kind
//! - `IndicatorRequirements`: logical name → kind declarations
//! - `IndicatorBundle`: precomputed, flattened, index-addressable series

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod ichimoku;
pub mod macd;
pub mod obv;
pub mod parabolic_sar;
pub mod pivot;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;

pub use adx::{adx, AdxSeries};
pub use atr::atr;
pub use bollinger::{bollinger, BollingerSeries};
pub use ema::ema;
pub use ichimoku::{ichimoku, IchimokuSeries};
pub use macd::{macd, MacdSeries};
pub use obv::obv;
pub use parabolic_sar::{parabolic_sar, SarSeries};
pub use pivot::{pivot_points, PivotSeries};
pub use rsi::rsi;
pub use sma::sma;
pub use stddev::stddev;
pub use stochastic::{stochastic, StochasticSeries};

use crate::domain::ohlcv::{closes, Candle};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    Obv,
    Pivot,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    ParabolicSar {
        step_x1000: u32,
        max_step_x1000: u32,
    },
    Ichimoku {
        conversion: usize,
        base: usize,
        span_b: usize,
    },
}

/// Result of computing one `IndicatorKind`.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorOutput {
    Line(Vec<f64>),
    Macd(MacdSeries),
    Bollinger(BollingerSeries),
    Adx(AdxSeries),
    Stochastic(StochasticSeries),
    Sar(SarSeries),
    Pivot(PivotSeries),
    Ichimoku(IchimokuSeries),
    Insufficient,
}

impl IndicatorKind {
    pub fn macd_default() -> Self {
        IndicatorKind::Macd {
            fast: macd::DEFAULT_FAST,
            slow: macd::DEFAULT_SLOW,
            signal: macd::DEFAULT_SIGNAL,
        }
    }

    pub fn bollinger_default() -> Self {
        IndicatorKind::Bollinger {
            period: bollinger::DEFAULT_PERIOD,
            stddev_mult_x100: 200,
        }
    }

    pub fn stochastic_default() -> Self {
        IndicatorKind::Stochastic {
            k_period: stochastic::DEFAULT_K_PERIOD,
            d_period: stochastic::DEFAULT_D_PERIOD,
        }
    }

    pub fn parabolic_sar_default() -> Self {
        IndicatorKind::ParabolicSar {
            step_x1000: 20,
            max_step_x1000: 200,
        }
    }

    pub fn ichimoku_default() -> Self {
        IndicatorKind::Ichimoku {
            conversion: ichimoku::DEFAULT_CONVERSION,
            base: ichimoku::DEFAULT_BASE,
            span_b: ichimoku::DEFAULT_SPAN_B,
        }
    }

    /// Number of candles needed before the first value exists.
    pub fn lookback(&self) -> usize {
        match self {
            IndicatorKind::Sma(p) | IndicatorKind::Ema(p) => *p,
            IndicatorKind::Rsi(p) | IndicatorKind::Atr(p) => p + 1,
            IndicatorKind::Adx(p) => 2 * p,
            IndicatorKind::Obv | IndicatorKind::Pivot => 1,
            IndicatorKind::Macd { slow, signal, .. } => (slow + signal).saturating_sub(1),
            IndicatorKind::Bollinger { period, .. } => *period,
            IndicatorKind::Stochastic { k_period, d_period } => {
                (k_period + d_period).saturating_sub(1)
            }
            IndicatorKind::ParabolicSar { .. } => 2,
            IndicatorKind::Ichimoku {
                conversion,
                base,
                span_b,
            } => *conversion.max(base).max(span_b),
        }
    }

    pub fn compute(&self, candles: &[Candle]) -> IndicatorOutput {
        let line = |values: Vec<f64>| {
            if values.is_empty() {
                IndicatorOutput::Insufficient
            } else {
                IndicatorOutput::Line(values)
            }
        };

        match self {
            IndicatorKind::Sma(p) => line(sma(&closes(candles), *p)),
            IndicatorKind::Ema(p) => line(ema(&closes(candles), *p)),
            IndicatorKind::Rsi(p) => line(rsi(&closes(candles), *p)),
            IndicatorKind::Atr(p) => line(atr(candles, *p)),
            IndicatorKind::Obv => line(obv(candles)),
            IndicatorKind::Adx(p) => adx(candles, *p)
                .map(IndicatorOutput::Adx)
                .unwrap_or(IndicatorOutput::Insufficient),
            IndicatorKind::Pivot => pivot_points(candles)
                .map(IndicatorOutput::Pivot)
                .unwrap_or(IndicatorOutput::Insufficient),
            IndicatorKind::Macd { fast, slow, signal } => {
                macd(&closes(candles), *fast, *slow, *signal)
                    .map(IndicatorOutput::Macd)
                    .unwrap_or(IndicatorOutput::Insufficient)
            }
            IndicatorKind::Bollinger {
                period,
                stddev_mult_x100,
            } => bollinger(&closes(candles), *period, *stddev_mult_x100 as f64 / 100.0)
                .map(IndicatorOutput::Bollinger)
                .unwrap_or(IndicatorOutput::Insufficient),
            IndicatorKind::Stochastic { k_period, d_period } => {
                stochastic(candles, *k_period, *d_period)
                    .map(IndicatorOutput::Stochastic)
                    .unwrap_or(IndicatorOutput::Insufficient)
            }
            IndicatorKind::ParabolicSar {
                step_x1000,
                max_step_x1000,
            } => parabolic_sar(
                candles,
                *step_x1000 as f64 / 1000.0,
                *max_step_x1000 as f64 / 1000.0,
            )
            .map(IndicatorOutput::Sar)
            .unwrap_or(IndicatorOutput::Insufficient),
            IndicatorKind::Ichimoku {
                conversion,
                base,
                span_b,
            } => ichimoku(candles, *conversion, *base, *span_b)
                .map(IndicatorOutput::Ichimoku)
                .unwrap_or(IndicatorOutput::Insufficient),
        }
    }
}

impl IndicatorOutput {
    /// Flatten into `(suffix, values)` pairs. Single-line outputs use an empty suffix.
    pub fn into_lines(self) -> Vec<(&'static str, Vec<f64>)> {
        match self {
            IndicatorOutput::Line(values) => vec![("", values)],
            IndicatorOutput::Macd(s) => vec![
                ("macd", s.macd),
                ("signal", s.signal),
                ("histogram", s.histogram),
            ],
            IndicatorOutput::Bollinger(s) => vec![
                ("upper", s.upper),
                ("middle", s.middle),
                ("lower", s.lower),
            ],
            IndicatorOutput::Adx(s) => vec![
                ("adx", s.adx),
                ("plus_di", s.plus_di),
                ("minus_di", s.minus_di),
            ],
            IndicatorOutput::Stochastic(s) => vec![("k", s.k), ("d", s.d)],
            IndicatorOutput::Sar(s) => {
                let trend = s
                    .rising
                    .iter()
                    .map(|&up| if up { 1.0 } else { -1.0 })
                    .collect();
                vec![("", s.sar), ("trend", trend)]
            }
            IndicatorOutput::Pivot(s) => vec![
                ("pivot", s.pivot),
                ("r1", s.r1),
                ("r2", s.r2),
                ("r3", s.r3),
                ("s1", s.s1),
                ("s2", s.s2),
                ("s3", s.s3),
            ],
            IndicatorOutput::Ichimoku(s) => vec![
                ("conversion", s.conversion),
                ("base", s.base),
                ("span_a", s.span_a),
                ("span_b", s.span_b),
                ("lagging", s.lagging),
            ],
            IndicatorOutput::Insufficient => Vec::new(),
        }
    }
}

/// Logical indicator names mapped to the kind that computes them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorRequirements {
    entries: BTreeMap<String, IndicatorKind>,
}

impl IndicatorRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, kind: IndicatorKind) -> Self {
        self.entries.insert(name.to_string(), kind);
        self
    }

    pub fn insert(&mut self, name: &str, kind: IndicatorKind) {
        self.entries.insert(name.to_string(), kind);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IndicatorKind)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_lookback(&self) -> usize {
        self.entries.values().map(IndicatorKind::lookback).max().unwrap_or(0)
    }

    /// Compute every requirement once and flatten multi-line results into
    /// `<name>_<line>` entries.
    pub fn compute(&self, candles: &[Candle]) -> IndicatorBundle {
        let mut bundle = IndicatorBundle::new(candles.len());
        for (name, kind) in &self.entries {
            for (suffix, values) in kind.compute(candles).into_lines() {
                let key = if suffix.is_empty() {
                    name.clone()
                } else {
                    format!("{name}_{suffix}")
                };
                bundle.insert(key, values);
            }
        }
        bundle
    }
}

/// Precomputed indicator series addressed by candle index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorBundle {
    candle_count: usize,
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorBundle {
    pub fn new(candle_count: usize) -> Self {
        Self {
            candle_count,
            series: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: String, values: Vec<f64>) {
        self.series.insert(name, values);
    }

    pub fn candle_count(&self) -> usize {
        self.candle_count
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    /// Value of `name` at candle `index`, or `None` during its warmup.
    pub fn value_at(&self, name: &str, index: usize) -> Option<f64> {
        let values = self.series.get(name)?;
        if index >= self.candle_count || values.len() > self.candle_count {
            return None;
        }
        let offset = self.candle_count - values.len();
        if index < offset {
            return None;
        }
        values.get(index - offset).copied()
    }

    /// Value of `name` at the candle before `index`.
    pub fn previous(&self, name: &str, index: usize) -> Option<f64> {
        index.checked_sub(1).and_then(|i| self.value_at(name, i))
    }

    /// Most recent value of `name`.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.series.get(name).and_then(|v| v.last().copied())
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma(period) => write!(f, "SMA({})", period),
            IndicatorKind::Ema(period) => write!(f, "EMA({})", period),
            IndicatorKind::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorKind::Atr(period) => write!(f, "ATR({})", period),
            IndicatorKind::Adx(period) => write!(f, "ADX({})", period),
            IndicatorKind::Obv => write!(f, "OBV"),
            IndicatorKind::Pivot => write!(f, "PIVOT"),
            IndicatorKind::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorKind::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorKind::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorKind::ParabolicSar {
                step_x1000,
                max_step_x1000,
            } => {
                let step = *step_x1000 as f64 / 1000.0;
                let max = *max_step_x1000 as f64 / 1000.0;
                write!(f, "PSAR({},{})", step, max)
            }
            IndicatorKind::Ichimoku {
                conversion,
                base,
                span_b,
            } => write!(f, "ICHIMOKU({},{},{})", conversion, base, span_b),
        }
    }
}
