use crate::analytics::correlation::correlation;
use crate::analytics::{period_returns, population_variance};
use crate::domain::security::Security;
use serde::{Deserialize, Serialize};

/// Annualisation-free portfolio volatility in percent.
///
/// `weights` are fractions aligned with `securities`; a missing weight counts
/// as 0. Securities with fewer than three closes contribute nothing.
pub fn portfolio_volatility(securities: &[&Security], weights: &[f64]) -> f64 {
    let sigmas: Vec<Option<f64>> = securities
        .iter()
        .map(|s| {
            s.has_price_history()
                .then(|| population_variance(&period_returns(&s.historical_prices)).sqrt())
        })
        .collect();
    let weight = |i: usize| weights.get(i).copied().unwrap_or(0.0);

    let mut total = 0.0;
    for (i, sigma_i) in sigmas.iter().enumerate() {
        let Some(sigma_i) = sigma_i else { continue };
        total += weight(i).powi(2) * sigma_i.powi(2);
        for (k, sigma_k) in sigmas.iter().enumerate().skip(i + 1) {
            let Some(sigma_k) = sigma_k else { continue };
            let rho = correlation(securities[i], securities[k]);
            total += 2.0 * weight(i) * weight(k) * rho * sigma_i * sigma_k;
        }
    }
    total.max(0.0).sqrt() * 100.0
}

/// Largest peak-to-trough fall, in percent of the peak.
pub fn max_drawdown(prices: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &price in prices {
        peak = peak.max(price);
        if peak > 0.0 {
            worst = worst.max((peak - price) / peak);
        }
    }
    worst * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressScenario {
    MarketCrash,
    InflationSpike,
    TechBubble,
}

impl StressScenario {
    pub const ALL: [StressScenario; 3] = [
        StressScenario::MarketCrash,
        StressScenario::InflationSpike,
        StressScenario::TechBubble,
    ];

    /// Fraction of value retained under the scenario.
    pub fn retained(self) -> f64 {
        match self {
            StressScenario::MarketCrash => 0.75,
            StressScenario::InflationSpike => 0.88,
            StressScenario::TechBubble => 0.60,
        }
    }
}

pub fn stress_test(portfolio_value: f64, scenario: StressScenario) -> f64 {
    portfolio_value * scenario.retained()
}
