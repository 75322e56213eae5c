//! Parabolic SAR: Wilder's stop-and-reverse with an accelerating factor.
//!
//! Direction is seeded from the first two closes. Each bar:
//! SAR = SAR + AF * (EP - SAR), clamped so it never sits inside the two
//! previous bars' range; a penetration reverses the trend, resets AF and sets
//! SAR to the prior extreme point. AF grows by `step` on every new extreme,
//! capped at `max_step`.
//!
//! Output starts at the second candle: N - 1 values.

use crate::domain::ohlcv::Candle;

pub const DEFAULT_STEP: f64 = 0.02;
pub const DEFAULT_MAX_STEP: f64 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct SarSeries {
    pub sar: Vec<f64>,
    /// true while the SAR sits below price (uptrend).
    pub rising: Vec<bool>,
}

pub fn parabolic_sar(candles: &[Candle], step: f64, max_step: f64) -> Option<SarSeries> {
    if candles.len() < 2 || step <= 0.0 || max_step < step {
        return None;
    }

    let mut rising = candles[1].close >= candles[0].close;
    let mut af = step;
    let (mut sar, mut ep) = if rising {
        (candles[0].low, candles[1].high)
    } else {
        (candles[0].high, candles[1].low)
    };

    let mut out_sar = Vec::with_capacity(candles.len() - 1);
    let mut out_rising = Vec::with_capacity(candles.len() - 1);
    out_sar.push(sar);
    out_rising.push(rising);

    for i in 2..candles.len() {
        let bar = &candles[i];
        let mut next = sar + af * (ep - sar);

        if rising {
            next = next.min(candles[i - 1].low).min(candles[i - 2].low);
            if bar.low < next {
                rising = false;
                next = ep;
                ep = bar.low;
                af = step;
            } else if bar.high > ep {
                ep = bar.high;
                af = (af + step).min(max_step);
            }
        } else {
            next = next.max(candles[i - 1].high).max(candles[i - 2].high);
            if bar.high > next {
                rising = true;
                next = ep;
                ep = bar.high;
                af = step;
            } else if bar.low < ep {
                ep = bar.low;
                af = (af + step).min(max_step);
            }
        }

        sar = next;
        out_sar.push(sar);
        out_rising.push(rising);
    }

    Some(SarSeries {
        sar: out_sar,
        rising: out_rising,
    })
}
