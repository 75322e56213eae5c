//! Rolling population standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((x - mean)^2) / n) over each n-wide window.

pub fn stddev(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }

    data.windows(period).map(population_stddev).collect()
}

/// Population standard deviation of a slice; 0 for an empty slice.
pub fn population_stddev(window: &[f64]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
