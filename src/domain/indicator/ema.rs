//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the first SMA(n), then EMA[i] = x[i]*k + EMA[i-1]*(1-k).
//! Output length is N - n + 1; the first value is the seed.

pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(data.len() - period + 1);
    let mut current = data[..period].iter().sum::<f64>() / period as f64;
    values.push(current);

    for &x in &data[period..] {
        current = x * k + current * (1.0 - k);
        values.push(current);
    }

    values
}
