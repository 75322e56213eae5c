//! Bollinger Bands.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the population standard deviation (divides by N, not N-1).
//! Default parameters: period=20, multiplier=2.0. Output length N - n + 1.

use super::sma::sma;
use super::stddev::stddev;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger(data: &[f64], period: usize, multiplier: f64) -> Option<BollingerSeries> {
    let middle = sma(data, period);
    if middle.is_empty() {
        return None;
    }
    // a negative multiplier would swap the bands
    let k = multiplier.abs();
    let deviations = stddev(data, period);

    let upper = middle
        .iter()
        .zip(&deviations)
        .map(|(m, sd)| m + k * sd)
        .collect();
    let lower = middle
        .iter()
        .zip(&deviations)
        .map(|(m, sd)| m - k * sd)
        .collect();

    Some(BollingerSeries {
        upper,
        middle,
        lower,
    })
}
