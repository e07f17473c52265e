//! Forecasting and ranking engine: feature derivation, price projection, growth metrics and
//! market-wide aggregation. Everything here is a pure computation over borrowed data.

pub mod features;
pub mod growth;
pub mod projector;
pub mod ranking;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
