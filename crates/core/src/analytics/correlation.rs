use crate::analytics::period_returns;
use crate::domain::security::Security;
use crate::policy::{CORRELATION_INCREASES_ABOVE, CORRELATION_REDUCES_BELOW, MIN_HISTORY_POINTS};
use crate::scoring::normalize::round2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskImpact {
    Reduces,
    Increases,
    Neutral,
}

impl RiskImpact {
    pub fn for_correlation(correlation: f64) -> Self {
        if correlation < CORRELATION_REDUCES_BELOW {
            RiskImpact::Reduces
        } else if correlation > CORRELATION_INCREASES_ABOVE {
            RiskImpact::Increases
        } else {
            RiskImpact::Neutral
        }
    }
}

/// Unordered pair of symbols with their return correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub stock_a: String,
    pub stock_b: String,
    pub correlation: f64,
    pub risk_impact: RiskImpact,
}

impl CorrelationPair {
    pub fn involves(&self, symbol: &str) -> bool {
        self.stock_a == symbol || self.stock_b == symbol
    }
}

/// Pearson correlation of period returns, two decimals.
///
/// Series are aligned by index and truncated to the shorter one. Returns 0
/// with fewer than three usable prices or when either side has no variance.
pub fn correlation_of(prices_a: &[f64], prices_b: &[f64]) -> f64 {
    let n = prices_a.len().min(prices_b.len());
    if n < MIN_HISTORY_POINTS {
        return 0.0;
    }

    let returns_a = period_returns(&prices_a[..n]);
    let returns_b = period_returns(&prices_b[..n]);
    let len = returns_a.len() as f64;
    let mean_a = returns_a.iter().sum::<f64>() / len;
    let mean_b = returns_b.iter().sum::<f64>() / len;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (ra, rb) in returns_a.iter().zip(&returns_b) {
        let da = ra - mean_a;
        let db = rb - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if !(denom.is_finite() && denom > 0.0) {
        return 0.0;
    }
    let r = cov / denom;
    if r.is_finite() {
        round2(r.clamp(-1.0, 1.0))
    } else {
        0.0
    }
}

pub fn correlation(a: &Security, b: &Security) -> f64 {
    correlation_of(&a.historical_prices, &b.historical_prices)
}

/// Every unordered pair of distinct securities, strongest relationship first.
/// Equal magnitudes keep input order.
pub fn build_matrix<'a>(securities: impl IntoIterator<Item = &'a Security>) -> Vec<CorrelationPair> {
    let securities: Vec<&Security> = securities.into_iter().collect();
    let mut pairs = Vec::with_capacity(securities.len() * securities.len().saturating_sub(1) / 2);
    for (i, a) in securities.iter().enumerate() {
        for b in &securities[i + 1..] {
            let correlation = correlation(a, b);
            pairs.push(CorrelationPair {
                stock_a: a.symbol.clone(),
                stock_b: b.symbol.clone(),
                correlation,
                risk_impact: RiskImpact::for_correlation(correlation),
            });
        }
    }
    pairs.sort_by(|x, y| y.correlation.abs().total_cmp(&x.correlation.abs()));
    pairs
}

/// Square matrix for display, with a unit diagonal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationGrid {
    pub symbols: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

pub fn correlation_grid<'a>(securities: impl IntoIterator<Item = &'a Security>) -> CorrelationGrid {
    let securities: Vec<&Security> = securities.into_iter().collect();
    let values = securities
        .iter()
        .enumerate()
        .map(|(i, a)| {
            securities
                .iter()
                .enumerate()
                .map(|(j, b)| if i == j { 1.0 } else { correlation(a, b) })
                .collect()
        })
        .collect();
    CorrelationGrid {
        symbols: securities.iter().map(|s| s.symbol.clone()).collect(),
        values,
    }
}
