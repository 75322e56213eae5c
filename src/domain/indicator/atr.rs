//! ATR (Average True Range) and the Wilder smoothing it shares with ADX.
//!
//! TR[i] = max(high - low, |high - prev_close|, |low - prev_close|) for i >= 1.
//! ATR seed = mean of the first n TRs, then ATR = (prev * (n-1) + TR) / n.
//! Needs n + 1 candles; output length is N - n.

use crate::domain::ohlcv::Candle;

pub const DEFAULT_PERIOD: usize = 14;

/// True range of every candle after the first.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| w[1].true_range(w[0].close))
        .collect()
}

/// Wilder smoothing: SMA seed over the first `period` values, then
/// `avg = (prev * (period - 1) + x) / period`. Output length is len - period + 1.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut avg = values[..period].iter().sum::<f64>() / period as f64;
    out.push(avg);
    for &x in &values[period..] {
        avg = (avg * (period - 1) as f64 + x) / period as f64;
        out.push(avg);
    }
    out
}

pub fn atr(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() <= period {
        return Vec::new();
    }
    wilder_smooth(&true_ranges(candles), period)
}
