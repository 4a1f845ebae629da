pub mod factors;
pub mod normalize;

use crate::domain::security::Security;
use crate::domain::universe::Universe;
use crate::policy::{Factor, FactorWeights, FACTOR_WEIGHTS};
use normalize::round1;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Eight factor sub-scores, their weighted composite and the reasons
/// collected along the way (factor order preserved).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub fundamental: f64,
    pub growth: f64,
    pub risk: f64,
    pub valuation: f64,
    pub liquidity: f64,
    pub stability: f64,
    pub volatility: f64,
    pub capital_efficiency: f64,
    pub composite: f64,
    pub reasoning: Vec<String>,
    pub factor_weights: FactorWeights,
}

impl ScoreBreakdown {
    pub fn factor(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Fundamental => self.fundamental,
            Factor::Growth => self.growth,
            Factor::Risk => self.risk,
            Factor::Valuation => self.valuation,
            Factor::Liquidity => self.liquidity,
            Factor::Stability => self.stability,
            Factor::Volatility => self.volatility,
            Factor::CapitalEfficiency => self.capital_efficiency,
        }
    }

    /// Sub-scores in composite order.
    pub fn factors(&self) -> [(Factor, f64); 8] {
        Factor::ALL.map(|f| (f, self.factor(f)))
    }
}

/// Weighted blend of the sub-scores, rounded to one decimal.
pub fn composite(sub_scores: &[(Factor, f64); 8], weights: &FactorWeights) -> f64 {
    round1(
        sub_scores
            .iter()
            .map(|(factor, score)| score * weights.weight(*factor))
            .sum(),
    )
}

pub fn score_security(security: &Security) -> ScoreBreakdown {
    let parts = [
        (Factor::Fundamental, factors::fundamental(security)),
        (Factor::Growth, factors::growth(security)),
        (Factor::Risk, factors::risk(security)),
        (Factor::Valuation, factors::valuation(security)),
        (Factor::Liquidity, factors::liquidity(security)),
        (Factor::Stability, factors::stability(security)),
        (Factor::Volatility, factors::volatility(security)),
        (Factor::CapitalEfficiency, factors::capital_efficiency(security)),
    ];

    let sub_scores = parts.each_ref().map(|(factor, out)| (*factor, out.score));
    let composite = composite(&sub_scores, &FACTOR_WEIGHTS);

    let mut reasoning = Vec::new();
    for (_, out) in &parts {
        reasoning.extend(out.reasons.iter().cloned());
    }

    ScoreBreakdown {
        fundamental: sub_scores[0].1,
        growth: sub_scores[1].1,
        risk: sub_scores[2].1,
        valuation: sub_scores[3].1,
        liquidity: sub_scores[4].1,
        stability: sub_scores[5].1,
        volatility: sub_scores[6].1,
        capital_efficiency: sub_scores[7].1,
        composite,
        reasoning,
        factor_weights: FACTOR_WEIGHTS,
    }
}

/// A security paired with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSecurity {
    pub security: Security,
    pub score: ScoreBreakdown,
}

impl ScoredSecurity {
    pub fn new(security: Security) -> Self {
        let score = score_security(&security);
        Self { security, score }
    }

    pub fn symbol(&self) -> &str {
        &self.security.symbol
    }
}

/// Scores the whole universe, best composite first, ties by symbol.
pub fn score_universe(universe: &Universe) -> Vec<ScoredSecurity> {
    let mut scored: Vec<ScoredSecurity> = universe.iter().cloned().map(ScoredSecurity::new).collect();
    sort_by_score(&mut scored);
    scored
}

pub(crate) fn sort_by_score<T: Borrow<ScoredSecurity>>(scored: &mut [T]) {
    scored.sort_by(|a, b| {
        let (a, b) = (a.borrow(), b.borrow());
        b.score
            .composite
            .total_cmp(&a.score.composite)
            .then_with(|| a.security.symbol.cmp(&b.security.symbol))
    });
}
