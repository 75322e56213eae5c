//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(data[i..i+n]); output length is N - n + 1.

pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }

    let mut values = Vec::with_capacity(data.len() - period + 1);
    let mut sum: f64 = data[..period].iter().sum();
    values.push(sum / period as f64);

    for i in period..data.len() {
        sum += data[i] - data[i - period];
        values.push(sum / period as f64);
    }

    values
}
