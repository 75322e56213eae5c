//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow), aligned on the slow EMA's first value
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Each line is tail-aligned to the input: `macd` has N - slow + 1 values,
//! `signal` and `histogram` have N - slow - signal + 2.

use super::ema::ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(data: &[f64], fast: usize, slow: usize, signal_period: usize) -> Option<MacdSeries> {
    if fast == 0 || slow == 0 || signal_period == 0 || fast >= slow {
        return None;
    }

    let ema_fast = ema(data, fast);
    let ema_slow = ema(data, slow);
    if ema_slow.is_empty() {
        return None;
    }

    let offset = slow - fast;
    let macd_line: Vec<f64> = ema_slow
        .iter()
        .enumerate()
        .map(|(i, s)| ema_fast[i + offset] - s)
        .collect();

    let signal = ema(&macd_line, signal_period);
    if signal.is_empty() {
        return None;
    }

    let lag = macd_line.len() - signal.len();
    let histogram = signal
        .iter()
        .enumerate()
        .map(|(i, s)| macd_line[i + lag] - s)
        .collect();

    Some(MacdSeries {
        macd: macd_line,
        signal,
        histogram,
    })
}

pub fn macd_default(data: &[f64]) -> Option<MacdSeries> {
    macd(data, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
