//! Advisory report derived from a built portfolio and the ranked universe.

use crate::domain::investor::{Horizon, RiskProfile};
use crate::portfolio::PortfolioAllocation;
use crate::scoring::normalize::round1;
use crate::scoring::ScoredSecurity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Universe leaders checked for absence from the portfolio.
const TOP_PICKS: usize = 3;
const REVIEW_BELOW_COMPOSITE: f64 = 45.0;
const CONFIDENCE_TARGET: f64 = 65.0;
const CONFIDENCE_PARTIAL: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Aligned,
    Partial,
    Misaligned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    Bullish,
    Neutral,
    Bearish,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPhase {
    pub phase: String,
    pub percentage: f64,
    pub amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryAction {
    pub action: String,
    pub reason: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonStrategy {
    pub horizon: String,
    pub strategy: String,
    pub expected_outcome: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentCheck {
    pub metric: String,
    pub current: f64,
    pub target: f64,
    pub status: Alignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCondition {
    pub factor: String,
    pub status: MarketStatus,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryReport {
    pub investment_strategy: String,
    pub capital_deployment_plan: Vec<DeploymentPhase>,
    pub risk_adjusted_recommendations: Vec<AdvisoryAction>,
    pub time_based_strategy: Vec<HorizonStrategy>,
    pub portfolio_alignment: Vec<AlignmentCheck>,
    pub market_condition_analysis: Vec<MarketCondition>,
    pub financial_objective_alignment: f64,
}

/// Per-profile portfolio targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentTargets {
    pub diversification: f64,
    pub risk_score: f64,
    pub expected_return: f64,
    pub max_single_allocation: f64,
}

pub fn alignment_targets(profile: RiskProfile) -> AlignmentTargets {
    match profile {
        RiskProfile::Conservative => AlignmentTargets {
            diversification: 70.0,
            risk_score: 60.0,
            expected_return: 12.0,
            max_single_allocation: 15.0,
        },
        RiskProfile::Moderate => AlignmentTargets {
            diversification: 60.0,
            risk_score: 50.0,
            expected_return: 16.0,
            max_single_allocation: 12.0,
        },
        RiskProfile::Aggressive => AlignmentTargets {
            diversification: 50.0,
            risk_score: 35.0,
            expected_return: 22.0,
            max_single_allocation: 10.0,
        },
    }
}

fn strategy_label(profile: RiskProfile) -> (&'static str, &'static str) {
    match profile {
        RiskProfile::Conservative => ("Capital Preservation with Moderate Growth", "defensive"),
        RiskProfile::Moderate => ("Balanced Growth with Risk Management", "balanced"),
        RiskProfile::Aggressive => ("Aggressive Growth Maximization", "growth-oriented"),
    }
}

pub fn deployment_plan(capital: f64, profile: RiskProfile) -> Vec<DeploymentPhase> {
    let phases: [(&str, f64, &str); 3] = match profile {
        RiskProfile::Conservative => [
            (
                "Phase 1 — Core Allocation (Immediate)",
                50.0,
                "Deploy 50% into top-rated large-cap stocks with strong dividends and low beta.",
            ),
            (
                "Phase 2 — Gradual Entry (Month 1-2)",
                30.0,
                "Allocate 30% into value picks with P/E below sector average. Use systematic investment approach.",
            ),
            (
                "Phase 3 — Tactical Reserve (Month 3+)",
                20.0,
                "Hold 20% as tactical reserve for market dips or new opportunities.",
            ),
        ],
        RiskProfile::Moderate => [
            (
                "Phase 1 — Foundation (Immediate)",
                40.0,
                "Deploy 40% into balanced large and mid-cap stocks with composite scores above 60.",
            ),
            (
                "Phase 2 — Growth Tilt (Week 2-4)",
                35.0,
                "Allocate 35% into growth-oriented picks with revenue CAGR above 15% and strong fundamentals.",
            ),
            (
                "Phase 3 — Opportunistic (Month 2+)",
                25.0,
                "Reserve 25% for tactical opportunities identified during market fluctuations.",
            ),
        ],
        RiskProfile::Aggressive => [
            (
                "Phase 1 — Growth Core (Immediate)",
                40.0,
                "Deploy 40% into high-growth mid-cap and small-cap leaders with strong composite scores.",
            ),
            (
                "Phase 2 — Momentum Play (Week 2-3)",
                35.0,
                "Allocate 35% to momentum stocks with strong recent price action and institutional buying.",
            ),
            (
                "Phase 3 — Alpha Bets (Month 1+)",
                25.0,
                "Allocate 25% to high-conviction picks with potential for outsized returns.",
            ),
        ],
    };
    phases
        .into_iter()
        .map(|(phase, percentage, description)| DeploymentPhase {
            phase: phase.to_string(),
            percentage,
            amount: (capital * percentage / 100.0).round(),
            description: description.to_string(),
        })
        .collect()
}

pub fn risk_adjusted_actions(
    portfolio: &PortfolioAllocation,
    ranked: &[ScoredSecurity],
) -> Vec<AdvisoryAction> {
    let mut out = Vec::new();
    let mut push = |action: String, reason: String, priority: Priority| {
        out.push(AdvisoryAction {
            action,
            reason,
            priority,
        })
    };

    if portfolio.diversification_score < 60.0 {
        push(
            "Increase sector diversification".to_string(),
            format!(
                "Diversification score {}/100 is below optimal. Add exposure to underrepresented sectors.",
                portfolio.diversification_score
            ),
            Priority::High,
        );
    }
    if portfolio.portfolio_risk_score < 40.0 {
        push(
            "Add defensive positions".to_string(),
            "Portfolio risk score indicates elevated exposure. Consider adding large-cap dividend stocks."
                .to_string(),
            Priority::High,
        );
    }
    if portfolio.expected_portfolio_return < 10.0 {
        push(
            "Enhance growth exposure".to_string(),
            "Expected portfolio return below 10%. Consider adding stocks with higher growth scores."
                .to_string(),
            Priority::Medium,
        );
    }

    let held: HashSet<&str> = portfolio
        .recommendations
        .iter()
        .map(|r| r.symbol())
        .collect();
    for top in ranked.iter().take(TOP_PICKS) {
        if held.contains(top.symbol()) {
            continue;
        }
        let edge = if top.score.fundamental > top.score.growth {
            "fundamentals"
        } else {
            "growth"
        };
        push(
            format!("Consider adding {}", top.symbol()),
            format!(
                "Score {}/100 — ranks in top {TOP_PICKS} but not in current portfolio. Strong {edge}.",
                top.score.composite
            ),
            Priority::Medium,
        );
    }

    for r in &portfolio.recommendations {
        if r.score.composite < REVIEW_BELOW_COMPOSITE {
            push(
                format!("Review {} position", r.symbol()),
                format!(
                    "Score declined to {}/100. Consider reducing allocation if fundamentals deteriorate further.",
                    r.score.composite
                ),
                Priority::Low,
            );
        }
    }
    out
}

pub fn time_based_strategy(horizon: Horizon) -> Vec<HorizonStrategy> {
    let rows: [(&str, &str, &str); 3] = match horizon {
        Horizon::Short => [
            (
                "0-3 months",
                "Momentum & Value",
                "Target 8-12% returns from undervalued stocks with positive momentum",
            ),
            (
                "3-6 months",
                "Tactical Rebalancing",
                "Lock gains on 15%+ movers, rotate into new opportunities",
            ),
            (
                "6-12 months",
                "Exit Planning",
                "Systematic exit with trailing stop-loss at 10% from peak",
            ),
        ],
        Horizon::Medium => [
            (
                "0-6 months",
                "Build & Optimize",
                "Deploy capital across diversified portfolio. Establish baseline allocation.",
            ),
            (
                "6-18 months",
                "Active Management",
                "Quarterly rebalancing based on score changes. Target 14-18% returns.",
            ),
            (
                "18-36 months",
                "Growth Harvesting",
                "Harvest partial gains, reinvest dividends, optimize tax efficiency.",
            ),
        ],
        Horizon::Long => [
            (
                "0-1 year",
                "Accumulation Phase",
                "Build core positions in quality compounders. Target 15+ stocks.",
            ),
            (
                "1-3 years",
                "Growth Compounding",
                "Let winners run, prune underperformers below score 40. Target 18-22% CAGR.",
            ),
            (
                "3-5+ years",
                "Wealth Creation",
                "Long-term compounding with annual rebalancing. Target 2-3x capital appreciation.",
            ),
        ],
    };
    rows.into_iter()
        .map(|(horizon, strategy, outcome)| HorizonStrategy {
            horizon: horizon.to_string(),
            strategy: strategy.to_string(),
            expected_outcome: outcome.to_string(),
        })
        .collect()
}

/// Higher is better: full marks at target, partial within 80% of it.
fn at_least(current: f64, target: f64) -> Alignment {
    if current >= target {
        Alignment::Aligned
    } else if current >= target * 0.8 {
        Alignment::Partial
    } else {
        Alignment::Misaligned
    }
}

pub fn portfolio_alignment(portfolio: &PortfolioAllocation) -> Vec<AlignmentCheck> {
    let t = alignment_targets(portfolio.risk_profile);
    let max_alloc = portfolio
        .recommendations
        .iter()
        .map(|r| r.allocated_percentage)
        .fold(0.0, f64::max);

    let check = |metric: &str, current: f64, target: f64, status: Alignment| AlignmentCheck {
        metric: metric.to_string(),
        current,
        target,
        status,
    };
    let concentration = if max_alloc <= t.max_single_allocation {
        Alignment::Aligned
    } else if max_alloc <= t.max_single_allocation * 1.2 {
        Alignment::Partial
    } else {
        Alignment::Misaligned
    };
    let confidence = if portfolio.confidence_index >= CONFIDENCE_TARGET {
        Alignment::Aligned
    } else if portfolio.confidence_index >= CONFIDENCE_PARTIAL {
        Alignment::Partial
    } else {
        Alignment::Misaligned
    };

    vec![
        check(
            "Diversification",
            portfolio.diversification_score,
            t.diversification,
            at_least(portfolio.diversification_score, t.diversification),
        ),
        check(
            "Risk Score",
            portfolio.portfolio_risk_score,
            t.risk_score,
            at_least(portfolio.portfolio_risk_score, t.risk_score),
        ),
        check(
            "Expected Return",
            portfolio.expected_portfolio_return,
            t.expected_return,
            at_least(portfolio.expected_portfolio_return, t.expected_return),
        ),
        check(
            "Concentration",
            max_alloc,
            t.max_single_allocation,
            concentration,
        ),
        check(
            "Confidence Index",
            portfolio.confidence_index,
            CONFIDENCE_TARGET,
            confidence,
        ),
    ]
}

/// Universe-wide averages read as market conditions. Empty for an empty universe.
pub fn market_conditions(ranked: &[ScoredSecurity]) -> Vec<MarketCondition> {
    if ranked.is_empty() {
        return Vec::new();
    }
    let n = ranked.len() as f64;
    let mean = |value: fn(&ScoredSecurity) -> f64| ranked.iter().map(value).sum::<f64>() / n;
    let score = mean(|s| s.score.composite);
    let growth = mean(|s| s.security.financials.revenue_growth);
    let beta = mean(|s| s.security.price.beta);
    let pe = mean(|s| s.security.price.pe);

    let condition = |factor: &str, status: MarketStatus, impact: String| MarketCondition {
        factor: factor.to_string(),
        status,
        impact,
    };
    vec![
        condition(
            "Market Sentiment",
            if score > 55.0 {
                MarketStatus::Bullish
            } else if score > 42.0 {
                MarketStatus::Neutral
            } else {
                MarketStatus::Bearish
            },
            format!(
                "Average score across {} stocks: {score:.1}/100. {}",
                ranked.len(),
                if score > 55.0 {
                    "Broad market strength supports equity allocation."
                } else {
                    "Cautious positioning recommended."
                }
            ),
        ),
        condition(
            "Growth Outlook",
            if growth > 12.0 {
                MarketStatus::Bullish
            } else if growth > 5.0 {
                MarketStatus::Neutral
            } else {
                MarketStatus::Bearish
            },
            format!(
                "Average revenue growth: {growth:.1}%. {}",
                if growth > 12.0 {
                    "Corporate earnings trajectory positive."
                } else {
                    "Growth moderation expected."
                }
            ),
        ),
        condition(
            "Market Volatility",
            if beta > 1.15 {
                MarketStatus::Bearish
            } else if beta > 0.85 {
                MarketStatus::Neutral
            } else {
                MarketStatus::Bullish
            },
            format!(
                "Average market beta: {beta:.2}. {}",
                if beta < 1.0 {
                    "Lower-than-market volatility environment."
                } else {
                    "Standard market volatility."
                }
            ),
        ),
        condition(
            "Valuations",
            if pe < 22.0 {
                MarketStatus::Bullish
            } else if pe < 35.0 {
                MarketStatus::Neutral
            } else {
                MarketStatus::Bearish
            },
            format!(
                "Average P/E ratio: {pe:.1}. {}",
                if pe < 25.0 {
                    "Valuations reasonable — supports entry."
                } else {
                    "Elevated valuations — selectivity important."
                }
            ),
        ),
    ]
}

pub fn financial_objective_alignment(portfolio: &PortfolioAllocation) -> f64 {
    round1(
        portfolio.confidence_index * 0.3
            + portfolio.diversification_score * 0.3
            + (portfolio.expected_portfolio_return * 5.0).min(100.0) * 0.4,
    )
}

/// `ranked` is the scored universe, best first.
pub fn advise(portfolio: &PortfolioAllocation, ranked: &[ScoredSecurity]) -> AdvisoryReport {
    let (label, approach) = strategy_label(portfolio.risk_profile);
    let investment_strategy = format!(
        "Strategy: {label} | Capital: ₹{:.1}L | Duration: {}-term | Risk Profile: {}. \
         The advisory engine recommends a {approach} approach with systematic capital \
         deployment across {} positions spanning {} sectors.",
        portfolio.total_capital / 100_000.0,
        portfolio.investment_duration,
        portfolio.risk_profile,
        portfolio.recommendations.len(),
        portfolio.sector_count()
    );

    AdvisoryReport {
        investment_strategy,
        capital_deployment_plan: deployment_plan(portfolio.total_capital, portfolio.risk_profile),
        risk_adjusted_recommendations: risk_adjusted_actions(portfolio, ranked),
        time_based_strategy: time_based_strategy(portfolio.investment_duration),
        portfolio_alignment: portfolio_alignment(portfolio),
        market_condition_analysis: market_conditions(ranked),
        financial_objective_alignment: financial_objective_alignment(portfolio),
    }
}
