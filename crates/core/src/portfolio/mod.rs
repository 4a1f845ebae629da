//! Portfolio construction: eligibility, selection, weighting and the
//! per-position and portfolio-level figures shown to investors.

pub mod allocator;
pub mod insights;
pub mod rebalance;

use crate::analytics::portfolio_volatility;
use crate::domain::investor::{Horizon, InvestorContext, RiskProfile};
use crate::domain::security::{CapTier, Security};
use crate::domain::universe::Universe;
use crate::scoring::normalize::round1;
use crate::scoring::{score_universe, ScoreBreakdown, ScoredSecurity};
use allocator::{allocate, filter_by_risk, Allocation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecommendation {
    pub security: Security,
    pub score: ScoreBreakdown,
    pub allocated_capital: f64,
    pub allocated_percentage: f64,
    pub expected_return: f64,
    pub risk_rating: RiskProfile,
    pub confidence_score: f64,
    pub rationale: String,
    pub key_strengths: Vec<String>,
    pub key_risks: Vec<String>,
}

impl StockRecommendation {
    pub fn symbol(&self) -> &str {
        &self.security.symbol
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CapAllocation {
    pub large: f64,
    pub mid: f64,
    pub small: f64,
}

impl CapAllocation {
    fn slot(&mut self, tier: CapTier) -> &mut f64 {
        match tier {
            CapTier::Large => &mut self.large,
            CapTier::Mid => &mut self.mid,
            CapTier::Small => &mut self.small,
        }
    }
}

/// Allocation for one investor context.
///
/// `allocated_percentage` values sum to at most 100. Weight trimmed by the
/// per-position cap is not redistributed; it shows up as
/// `unallocated_percentage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAllocation {
    pub total_capital: f64,
    pub investment_duration: Horizon,
    pub risk_profile: RiskProfile,
    pub recommendations: Vec<StockRecommendation>,
    /// Sector to percent of the allocated total.
    pub sector_allocation: BTreeMap<String, f64>,
    pub cap_allocation: CapAllocation,
    pub expected_portfolio_return: f64,
    pub portfolio_risk_score: f64,
    pub confidence_index: f64,
    pub diversification_score: f64,
    pub portfolio_volatility: f64,
    pub unallocated_percentage: f64,
}

impl PortfolioAllocation {
    pub fn sector_count(&self) -> usize {
        self.sector_allocation.len()
    }

    pub fn holds(&self, symbol: &str) -> bool {
        self.recommendations.iter().any(|r| r.symbol() == symbol)
    }
}

/// Scores `universe` and builds the portfolio.
pub fn recommend(universe: &Universe, ctx: &InvestorContext) -> PortfolioAllocation {
    build_portfolio(&score_universe(universe), ctx)
}

pub fn build_portfolio(scored: &[ScoredSecurity], ctx: &InvestorContext) -> PortfolioAllocation {
    let eligible = filter_by_risk(scored, ctx);
    let allocations = allocate(eligible, ctx);

    let securities: Vec<&Security> = allocations.iter().map(|a| &a.scored.security).collect();
    let weights: Vec<f64> = allocations.iter().map(|a| a.weight).collect();
    let volatility = round1(portfolio_volatility(&securities, &weights));

    let recommendations: Vec<StockRecommendation> =
        allocations.into_iter().map(|a| enrich(a, ctx)).collect();
    let allocation = aggregate(recommendations, volatility, ctx);

    info!(
        risk_profile = %ctx.risk_profile,
        horizon = %ctx.horizon,
        universe_len = scored.len(),
        positions = allocation.recommendations.len(),
        unallocated = allocation.unallocated_percentage,
        "portfolio built"
    );
    allocation
}

fn enrich(allocation: Allocation<'_>, ctx: &InvestorContext) -> StockRecommendation {
    let Allocation {
        scored,
        percentage,
        capital,
        ..
    } = allocation;
    let estimate = insights::estimate_returns(&scored.score, ctx.risk_profile, ctx.horizon);
    StockRecommendation {
        security: scored.security.clone(),
        score: scored.score.clone(),
        allocated_capital: capital,
        allocated_percentage: percentage,
        expected_return: estimate.expected_return,
        risk_rating: insights::risk_rating(scored.score.risk),
        confidence_score: estimate.confidence,
        rationale: insights::rationale(&scored.security, &scored.score),
        key_strengths: insights::key_strengths(&scored.security),
        key_risks: insights::key_risks(&scored.security),
    }
}

fn aggregate(
    recommendations: Vec<StockRecommendation>,
    portfolio_volatility: f64,
    ctx: &InvestorContext,
) -> PortfolioAllocation {
    let total: f64 = recommendations.iter().map(|r| r.allocated_percentage).sum();

    let mut sectors: BTreeMap<String, f64> = BTreeMap::new();
    let mut caps = CapAllocation::default();
    for r in &recommendations {
        *sectors.entry(r.security.sector.clone()).or_insert(0.0) += r.allocated_percentage;
        *caps.slot(r.security.cap_tier) += r.allocated_percentage;
    }

    let weighted = |value: fn(&StockRecommendation) -> f64| {
        if total > 0.0 {
            round1(
                recommendations
                    .iter()
                    .map(|r| value(r) * r.allocated_percentage)
                    .sum::<f64>()
                    / total,
            )
        } else {
            0.0
        }
    };
    let expected_portfolio_return = weighted(|r| r.expected_return);
    let portfolio_risk_score = weighted(|r| r.score.risk);
    let confidence_index = weighted(|r| r.confidence_score);

    let diversification_score = if total > 0.0 {
        for pct in sectors.values_mut() {
            *pct = round1(*pct / total * 100.0);
        }
        for tier in CapTier::ALL {
            let slot = caps.slot(tier);
            *slot = round1(*slot / total * 100.0);
        }
        let max_sector = sectors.values().copied().fold(0.0, f64::max);
        round1((sectors.len() as f64 * 12.0 + (100.0 - max_sector)).min(100.0))
    } else {
        0.0
    };

    PortfolioAllocation {
        total_capital: ctx.capital,
        investment_duration: ctx.horizon,
        risk_profile: ctx.risk_profile,
        recommendations,
        sector_allocation: sectors,
        cap_allocation: caps,
        expected_portfolio_return,
        portfolio_risk_score,
        confidence_index,
        diversification_score,
        portfolio_volatility: if total > 0.0 { portfolio_volatility } else { 0.0 },
        unallocated_percentage: round1((100.0 - total).max(0.0)),
    }
}
