//! INVEST / DO NOT INVEST verdicts for one security in an investor context.
//!
//! Every metric here is a fixed blend of already computed sub-scores, so a
//! decision is a pure function of `(ScoreBreakdown, InvestorContext)` plus the
//! optional portfolio being added to.

use crate::domain::investor::{Horizon, InvestorContext, RiskProfile};
use crate::domain::security::Security;
use crate::domain::universe::Universe;
use crate::policy::{Grade, DECISION_WEIGHTS, INVEST_THRESHOLD};
use crate::portfolio::PortfolioAllocation;
use crate::scoring::normalize::round1;
use crate::scoring::{score_security, ScoreBreakdown};
use serde::{Deserialize, Serialize};

const BASE_CONFIDENCE: f64 = 30.0;
const MAX_CONFIDENCE: f64 = 95.0;
const CONSISTENCY_BONUS: f64 = 10.0;
const CONFIDENCE_PER_REASON: f64 = 1.5;

const SMALL_CAPITAL: f64 = 100_000.0;
const LARGE_CAPITAL: f64 = 1_000_000.0;
const SCALE_ADJUSTMENT: f64 = 5.0;

pub const RISK_WARNING_MARKER: &str = "⚠";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Invest,
    DoNotInvest,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Invest => "INVEST",
            Verdict::DoNotInvest => "DO NOT INVEST",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentDecision {
    pub verdict: Verdict,
    pub confidence: f64,
    pub risk_justification: Vec<String>,
    pub return_potential: f64,
    pub time_horizon_suitability: f64,
    pub capital_efficiency: f64,
    pub portfolio_fit: f64,
    pub decision_score: f64,
    pub grade: Grade,
    pub summary: String,
}

impl InvestmentDecision {
    pub fn is_invest(&self) -> bool {
        self.verdict == Verdict::Invest
    }
}

/// Weights for growth, stability, valuation and volatility by horizon.
fn horizon_weights(horizon: Horizon) -> [f64; 4] {
    match horizon {
        Horizon::Long => [0.4, 0.15, 0.2, 0.15],
        Horizon::Medium => [0.25, 0.25, 0.3, 0.15],
        Horizon::Short => [0.1, 0.4, 0.3, 0.3],
    }
}

pub fn time_horizon_suitability(score: &ScoreBreakdown, horizon: Horizon) -> f64 {
    let [growth, stability, valuation, volatility] = horizon_weights(horizon);
    round1(
        score.growth * growth
            + score.stability * stability
            + score.valuation * valuation
            + score.volatility * volatility,
    )
}

pub fn return_potential(score: &ScoreBreakdown, horizon: Horizon) -> f64 {
    let base = score.growth * 0.35
        + score.fundamental * 0.25
        + score.valuation * 0.2
        + score.capital_efficiency * 0.2;
    round1((base * horizon.return_potential_multiplier()).min(100.0))
}

/// Small tickets favour liquid names; large tickets favour strong fundamentals.
pub fn capital_efficiency(score: &ScoreBreakdown, capital: f64) -> f64 {
    let base = score.capital_efficiency * 0.4
        + score.liquidity * 0.25
        + score.fundamental * 0.2
        + score.stability * 0.15;

    let adjustment = if capital < SMALL_CAPITAL {
        if score.liquidity > 60.0 {
            SCALE_ADJUSTMENT
        } else {
            -SCALE_ADJUSTMENT
        }
    } else if capital > LARGE_CAPITAL {
        if score.fundamental > 60.0 {
            SCALE_ADJUSTMENT
        } else {
            -SCALE_ADJUSTMENT
        }
    } else {
        0.0
    };
    round1((base + adjustment).clamp(0.0, 100.0))
}

pub fn portfolio_fit(
    score: &ScoreBreakdown,
    risk_profile: RiskProfile,
    existing: Option<&PortfolioAllocation>,
) -> f64 {
    let mut fit = 50.0;
    match risk_profile {
        RiskProfile::Conservative => {
            fit += tiered(score.risk, &[(60.0, 20.0), (40.0, 10.0)], -10.0);
            fit += tiered(score.volatility, &[(60.0, 10.0)], -5.0);
            fit += tiered(score.stability, &[(55.0, 10.0)], -5.0);
        }
        RiskProfile::Moderate => {
            fit += tiered(score.composite, &[(55.0, 15.0), (40.0, 5.0)], -5.0);
            fit += tiered(score.growth, &[(50.0, 10.0)], 0.0);
        }
        RiskProfile::Aggressive => {
            fit += tiered(score.growth, &[(55.0, 20.0), (35.0, 10.0)], -5.0);
            fit += tiered(score.capital_efficiency, &[(50.0, 10.0)], 0.0);
        }
    }
    if let Some(portfolio) = existing {
        fit += if portfolio.sector_count() > 4 { 5.0 } else { -5.0 };
    }
    round1(fit.clamp(0.0, 100.0))
}

/// First `(floor, points)` the value strictly exceeds, else `otherwise`.
fn tiered(value: f64, steps: &[(f64, f64)], otherwise: f64) -> f64 {
    steps
        .iter()
        .find(|(floor, _)| value > *floor)
        .map(|(_, points)| *points)
        .unwrap_or(otherwise)
}

pub fn confidence(score: &ScoreBreakdown, horizon: Horizon) -> f64 {
    let consistency = if score.fundamental.min(score.growth).min(score.risk) > 40.0 {
        CONSISTENCY_BONUS
    } else {
        0.0
    };
    let horizon_bonus = match horizon {
        Horizon::Long => 8.0,
        Horizon::Medium => 4.0,
        Horizon::Short => 0.0,
    };
    let data_quality = score.reasoning.len() as f64 * CONFIDENCE_PER_REASON;
    round1(
        (BASE_CONFIDENCE + score.composite * 0.4 + consistency + horizon_bonus + data_quality)
            .min(MAX_CONFIDENCE),
    )
}

pub fn risk_justification(score: &ScoreBreakdown, risk_profile: RiskProfile) -> Vec<String> {
    let mut out = Vec::new();

    out.push(
        if score.risk > 65.0 {
            "Low financial risk profile — strong balance sheet and stable holdings"
        } else if score.risk > 45.0 {
            "Moderate risk profile — acceptable for balanced investors"
        } else {
            "Elevated risk exposure — suitable only for aggressive investors"
        }
        .to_string(),
    );
    out.push(
        if score.volatility > 60.0 {
            "Price volatility within acceptable range"
        } else {
            "Higher price volatility — expect wider price swings"
        }
        .to_string(),
    );
    out.push(
        if score.stability > 55.0 {
            "Market stability indicators positive — consistent performance trend"
        } else {
            "Market stability concerns — inconsistent price action"
        }
        .to_string(),
    );

    if risk_profile == RiskProfile::Conservative && score.risk < 50.0 {
        out.push(format!(
            "{RISK_WARNING_MARKER} Risk level exceeds conservative profile tolerance"
        ));
    }
    if risk_profile == RiskProfile::Aggressive && score.risk > 70.0 {
        out.push("Risk level well within aggressive profile comfort zone".to_string());
    }
    if score.fundamental > 60.0 {
        out.push("Strong fundamental backing reduces downside risk".to_string());
    }
    if score.capital_efficiency > 55.0 {
        out.push("Efficient capital deployment supports sustained returns".to_string());
    }
    out
}

fn is_concern(line: &str) -> bool {
    line.contains(RISK_WARNING_MARKER) || line.contains("concern") || line.contains("Elevated")
}

/// Truncates to one decimal. Band floors are whole numbers, so the truncated
/// score lands in the same grade band as the unrounded one.
fn floor1(value: f64) -> f64 {
    (value * 10.0).floor() / 10.0
}

/// Decides on an already scored security.
///
/// Verdict and grade come from the unrounded decision score; the published
/// `decision_score` is truncated to one decimal and never crosses a band floor.
pub fn decide(
    security: &Security,
    score: &ScoreBreakdown,
    ctx: &InvestorContext,
    existing: Option<&PortfolioAllocation>,
) -> InvestmentDecision {
    let confidence = confidence(score, ctx.horizon);
    let return_potential = return_potential(score, ctx.horizon);
    let time_horizon_suitability = time_horizon_suitability(score, ctx.horizon);
    let capital_efficiency = capital_efficiency(score, ctx.capital);
    let portfolio_fit = portfolio_fit(score, ctx.risk_profile, existing);
    let risk_justification = risk_justification(score, ctx.risk_profile);

    let w = &DECISION_WEIGHTS;
    let raw = score.composite * w.composite
        + return_potential * w.return_potential
        + time_horizon_suitability * w.time_horizon
        + capital_efficiency * w.capital_efficiency
        + portfolio_fit * w.portfolio_fit
        + confidence * w.confidence;

    let verdict = if raw >= INVEST_THRESHOLD {
        Verdict::Invest
    } else {
        Verdict::DoNotInvest
    };
    let grade = Grade::for_score(raw);
    let decision_score = floor1(raw);

    let summary = match verdict {
        Verdict::Invest => format!(
            "{} ({}) receives an INVEST recommendation with {confidence}% confidence. \
             The stock scores {}/100 across 8 factors, with a {grade} grade. \
             Expected return potential: {return_potential}/100. \
             Time-horizon fit: {time_horizon_suitability}/100 for {}-term investing.",
            security.name, security.symbol, score.composite, ctx.horizon
        ),
        Verdict::DoNotInvest => {
            let concerns: Vec<&str> = risk_justification
                .iter()
                .map(String::as_str)
                .filter(|line| is_concern(line))
                .collect();
            let concerns = if concerns.is_empty() {
                "Insufficient risk-adjusted return potential".to_string()
            } else {
                concerns.join("; ")
            };
            format!(
                "{} ({}) receives a DO NOT INVEST recommendation. \
                 The stock's composite score of {}/100 and decision score of {decision_score:.1} \
                 fall below the investment threshold. Key concerns: {concerns}.",
                security.name, security.symbol, score.composite
            )
        }
    };

    InvestmentDecision {
        verdict,
        confidence,
        risk_justification,
        return_potential,
        time_horizon_suitability,
        capital_efficiency,
        portfolio_fit,
        decision_score,
        grade,
        summary,
    }
}

/// Scores and decides in one step.
pub fn decide_security(
    security: &Security,
    ctx: &InvestorContext,
    existing: Option<&PortfolioAllocation>,
) -> (ScoreBreakdown, InvestmentDecision) {
    let score = score_security(security);
    let decision = decide(security, &score, ctx, existing);
    (score, decision)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDecision {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub composite: f64,
    pub decision: InvestmentDecision,
}

/// Decides every security: INVEST first, then by confidence, ties by symbol.
pub fn decide_batch(universe: &Universe, ctx: &InvestorContext) -> Vec<RankedDecision> {
    let mut out: Vec<RankedDecision> = universe
        .iter()
        .map(|security| {
            let (score, decision) = decide_security(security, ctx, None);
            RankedDecision {
                symbol: security.symbol.clone(),
                name: security.name.clone(),
                sector: security.sector.clone(),
                composite: score.composite,
                decision,
            }
        })
        .collect();
    out.sort_by(|a, b| {
        b.decision
            .is_invest()
            .cmp(&a.decision.is_invest())
            .then_with(|| b.decision.confidence.total_cmp(&a.decision.confidence))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    out
}
