pub mod correlation;
pub mod risk;

pub use correlation::{build_matrix, correlation, CorrelationPair, RiskImpact};
pub use risk::{max_drawdown, portfolio_volatility, stress_test, StressScenario};

/// Period-over-period simple returns. A non-positive base price yields a 0
/// return for that period.
pub fn period_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Population variance; 0 for an empty slice.
pub(crate) fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_are_simple_and_guarded() {
        let r = period_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.10).abs() < 1e-12);
        assert!((r[1] + 0.10).abs() < 1e-12);
        assert_eq!(period_returns(&[0.0, 5.0]), vec![0.0]);
        assert!(period_returns(&[5.0]).is_empty());
    }

    #[test]
    fn variance_is_population() {
        assert_eq!(population_variance(&[1.0, 3.0]), 1.0);
        assert_eq!(population_variance(&[]), 0.0);
    }
}
