//! Stochastic oscillator.
//!
//! %K = 100 * (close - lowest_low) / (highest_high - lowest_low) over k bars,
//! 0 when the window has no range. %D = SMA(%K, d).
//! `k` has N - k + 1 values, `d` has N - k - d + 2.

use super::sma::sma;
use crate::domain::ohlcv::Candle;

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn stochastic(candles: &[Candle], k_period: usize, d_period: usize) -> Option<StochasticSeries> {
    if k_period == 0 || d_period == 0 || candles.len() < k_period + d_period - 1 {
        return None;
    }

    let k: Vec<f64> = candles
        .windows(k_period)
        .map(|window| {
            let highest = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let lowest = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            let range = highest - lowest;
            let close = window[window.len() - 1].close;
            if range > 0.0 {
                100.0 * (close - lowest) / range
            } else {
                0.0
            }
        })
        .collect();

    let d = sma(&k, d_period);
    Some(StochasticSeries { k, d })
}
