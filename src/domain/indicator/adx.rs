//! ADX, the Average Directional Index with the ±DI lines (Wilder).
//!
//! 1. +DM / -DM and TR from consecutive candles
//! 2. Wilder-smooth +DM, -DM and TR over n
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR), likewise -DI
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = Wilder-smoothed DX
//!
//! `plus_di`/`minus_di` have N - n values; `adx` has N - 2n + 1.

use super::atr::{true_ranges, wilder_smooth};
use crate::domain::ohlcv::Candle;

pub const DEFAULT_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct AdxSeries {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

pub fn adx(candles: &[Candle], period: usize) -> Option<AdxSeries> {
    if period == 0 || candles.len() < 2 * period {
        return None;
    }

    let mut plus_dm = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm = Vec::with_capacity(candles.len() - 1);
    for w in candles.windows(2) {
        let up = w[1].high - w[0].high;
        let down = w[0].low - w[1].low;
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
    }

    let smooth_tr = wilder_smooth(&true_ranges(candles), period);
    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);

    let mut plus_di = Vec::with_capacity(smooth_tr.len());
    let mut minus_di = Vec::with_capacity(smooth_tr.len());
    let mut dx = Vec::with_capacity(smooth_tr.len());

    for i in 0..smooth_tr.len() {
        let (pdi, mdi) = if smooth_tr[i] > 0.0 {
            (
                100.0 * smooth_plus[i] / smooth_tr[i],
                100.0 * smooth_minus[i] / smooth_tr[i],
            )
        } else {
            (0.0, 0.0)
        };
        let sum = pdi + mdi;
        dx.push(if sum > 0.0 {
            100.0 * (pdi - mdi).abs() / sum
        } else {
            0.0
        });
        plus_di.push(pdi);
        minus_di.push(mdi);
    }

    let adx = wilder_smooth(&dx, period);
    if adx.is_empty() {
        return None;
    }

    Some(AdxSeries {
        adx,
        plus_di,
        minus_di,
    })
}
