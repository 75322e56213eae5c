//! OBV (On-Balance Volume).
//!
//! OBV[0] = 0
//! If close[i] > close[i-1]: OBV[i] = OBV[i-1] + volume[i]
//! If close[i] < close[i-1]: OBV[i] = OBV[i-1] - volume[i]
//! Otherwise OBV[i] = OBV[i-1]
//!
//! No warmup; output length equals the input length.

use crate::domain::ohlcv::Candle;

pub fn obv(candles: &[Candle]) -> Vec<f64> {
    let mut values = Vec::with_capacity(candles.len());
    let mut total = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        if i > 0 {
            let prev = candles[i - 1].close;
            if candle.close > prev {
                total += candle.volume;
            } else if candle.close < prev {
                total -= candle.volume;
            }
        }
        values.push(total);
    }

    values
}
