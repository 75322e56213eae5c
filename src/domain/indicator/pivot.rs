//! Classic (floor) pivot points.
//!
//! From each candle's high/low/close, the levels for the following period:
//! P = (H + L + C) / 3
//! R1 = 2P - L, S1 = 2P - H
//! R2 = P + (H - L), S2 = P - (H - L)
//! R3 = H + 2(P - L), S3 = L - 2(H - P)
//!
//! Output length equals the input length.

use crate::domain::ohlcv::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotLevels {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl PivotLevels {
    pub fn from_candle(candle: &Candle) -> Self {
        let (h, l, c) = (candle.high, candle.low, candle.close);
        let pivot = (h + l + c) / 3.0;
        PivotLevels {
            pivot,
            r1: 2.0 * pivot - l,
            r2: pivot + (h - l),
            r3: h + 2.0 * (pivot - l),
            s1: 2.0 * pivot - h,
            s2: pivot - (h - l),
            s3: l - 2.0 * (h - pivot),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotSeries {
    pub pivot: Vec<f64>,
    pub r1: Vec<f64>,
    pub r2: Vec<f64>,
    pub r3: Vec<f64>,
    pub s1: Vec<f64>,
    pub s2: Vec<f64>,
    pub s3: Vec<f64>,
}

pub fn pivot_points(candles: &[Candle]) -> Option<PivotSeries> {
    if candles.is_empty() {
        return None;
    }

    let levels: Vec<PivotLevels> = candles.iter().map(PivotLevels::from_candle).collect();
    let pick = |f: fn(&PivotLevels) -> f64| levels.iter().map(f).collect::<Vec<f64>>();

    Some(PivotSeries {
        pivot: pick(|l| l.pivot),
        r1: pick(|l| l.r1),
        r2: pick(|l| l.r2),
        r3: pick(|l| l.r3),
        s1: pick(|l| l.s1),
        s2: pick(|l| l.s2),
        s3: pick(|l| l.s3),
    })
}
