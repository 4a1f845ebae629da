//! Traceable breakdown of a decision, rebuilt from already computed values.
//!
//! Nothing here scores or decides; every number is read from the
//! `ScoreBreakdown` and `InvestmentDecision` it is given.

use crate::decision::{InvestmentDecision, Verdict};
use crate::domain::security::Security;
use crate::policy::Factor;
use crate::scoring::normalize::round2;
use crate::scoring::ScoreBreakdown;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields carried by a `Security` record (financial, price and ownership).
const METRICS_PER_SECURITY: usize = 37;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: Factor,
    pub label: String,
    pub score: f64,
    pub weight: f64,
    /// `score * weight`, two decimals.
    pub contribution: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub metric: String,
    pub value: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStep {
    pub step: String,
    pub input: String,
    pub output: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainableResult {
    pub symbol: String,
    pub verdict: Verdict,
    pub logical_reasoning: Vec<String>,
    pub financial_justification: Vec<String>,
    pub score_breakdown: Vec<FactorContribution>,
    pub risk_explanation: Vec<String>,
    pub return_rationale: Vec<String>,
    pub forecast_reasoning: Vec<String>,
    pub data_transparency: Vec<DataPoint>,
    pub audit_trail: Vec<AuditStep>,
    pub generated_at: DateTime<Utc>,
}

pub fn strength_level(score: f64) -> &'static str {
    if score >= 70.0 {
        "strong"
    } else if score >= 50.0 {
        "moderate"
    } else if score >= 30.0 {
        "weak"
    } else {
        "very weak"
    }
}

/// `1234567.0` -> `"1,234,567"`; fractional parts are dropped.
fn thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

fn signed(value: f64) -> String {
    if value > 0.0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

fn contributions(score: &ScoreBreakdown) -> Vec<FactorContribution> {
    score
        .factors()
        .into_iter()
        .map(|(factor, value)| {
            let weight = score.factor_weights.weight(factor);
            FactorContribution {
                factor,
                label: factor.label().to_string(),
                score: value,
                weight,
                contribution: round2(value * weight),
                explanation: format!(
                    "{} scored {value:.1}/100 ({}). This factor contributes {:.0}% to the composite score.",
                    factor.label(),
                    strength_level(value),
                    weight * 100.0
                ),
            }
        })
        .collect()
}

fn logical_reasoning(
    s: &Security,
    score: &ScoreBreakdown,
    decision: &InvestmentDecision,
    factors: usize,
) -> Vec<String> {
    vec![
        format!(
            "{} operates in the {} sector with a market capitalization of ₹{:.0} billion.",
            s.name,
            s.sector,
            s.market_cap / 100.0
        ),
        format!("The engine evaluated {factors} independent factors using weighted analysis."),
        format!(
            "Composite score: {}/100 ({} grade).",
            score.composite, decision.grade
        ),
        match decision.verdict {
            Verdict::Invest => format!(
                "The stock meets the investment threshold with {}% confidence.",
                decision.confidence
            ),
            Verdict::DoNotInvest => "The stock falls below the investment threshold — \
                                     risk-adjusted returns insufficient."
                .to_string(),
        },
        format!(
            "Capital efficiency rating: {}/100 — {} capital utilization expected.",
            decision.capital_efficiency,
            if decision.capital_efficiency > 60.0 {
                "efficient"
            } else {
                "below optimal"
            }
        ),
    ]
}

fn financial_justification(s: &Security) -> Vec<String> {
    let f = &s.financials;
    vec![
        format!(
            "Revenue: ₹{} Cr with {}% YoY growth",
            thousands(f.revenue),
            signed(f.revenue_growth)
        ),
        format!(
            "Net Profit Margin: {}% — {}",
            f.net_profit_margin,
            if f.net_profit_margin > 15.0 {
                "above industry benchmark"
            } else if f.net_profit_margin > 8.0 {
                "within acceptable range"
            } else {
                "below desired threshold"
            }
        ),
        format!(
            "ROE: {}% / ROCE: {}% — {}",
            f.roe,
            f.roce,
            if f.roe > 18.0 {
                "demonstrates strong equity returns"
            } else {
                "moderate equity efficiency"
            }
        ),
        format!(
            "Debt-to-Equity: {:.2} — {}",
            f.debt_to_equity,
            if f.debt_to_equity < 0.5 {
                "conservative leverage"
            } else if f.debt_to_equity < 1.5 {
                "moderate leverage"
            } else {
                "high leverage risk"
            }
        ),
        format!(
            "EPS Growth: {}% — {}",
            signed(f.eps_growth),
            if f.eps_growth > 15.0 {
                "strong earnings momentum"
            } else {
                "moderate earnings performance"
            }
        ),
        format!(
            "Free Cash Flow: ₹{} Cr — {}",
            thousands(f.free_cash_flow),
            if f.free_cash_flow > 0.0 {
                "positive cash generation"
            } else {
                "negative cash flow concern"
            }
        ),
    ]
}

fn risk_explanation(s: &Security) -> Vec<String> {
    let p = &s.price;
    let h = &s.holdings;
    vec![
        format!(
            "Market Beta: {:.2} — {}",
            p.beta,
            if p.beta < 0.8 {
                "lower systematic risk than market"
            } else if p.beta < 1.2 {
                "market-average risk"
            } else {
                "higher systematic risk"
            }
        ),
        format!(
            "Promoter Holding: {}% — {}",
            h.promoter,
            if h.promoter > 50.0 {
                "strong promoter confidence"
            } else {
                "moderate promoter stake"
            }
        ),
        format!(
            "Pledged Shares: {}% — {}",
            h.pledged,
            if h.pledged == 0.0 {
                "no shares pledged"
            } else if h.pledged < 5.0 {
                "minimal pledge risk"
            } else {
                "significant pledge risk"
            }
        ),
        format!(
            "52-Week Range: ₹{:.0} – ₹{:.0} (current: ₹{:.0})",
            p.week_low_52, p.week_high_52, p.current_price
        ),
        format!(
            "P/E Ratio: {:.1} — {}",
            p.pe,
            if p.pe < 20.0 {
                "value territory"
            } else if p.pe < 40.0 {
                "fairly valued"
            } else {
                "premium valuation"
            }
        ),
    ]
}

fn return_rationale(s: &Security, decision: &InvestmentDecision) -> Vec<String> {
    let f = &s.financials;
    vec![
        format!("Return potential score: {}/100", decision.return_potential),
        format!(
            "Based on {}% 3-year revenue CAGR and {}% profit CAGR",
            f.revenue_cagr_3y, f.profit_cagr_3y
        ),
        format!(
            "Growth trajectory {} relative to historical trend",
            if f.revenue_growth > f.revenue_cagr_3y {
                "accelerating"
            } else {
                "stable"
            }
        ),
        format!(
            "Dividend yield of {}% provides {} income component",
            f.dividend_yield,
            if f.dividend_yield > 2.0 {
                "meaningful"
            } else {
                "modest"
            }
        ),
        if decision.time_horizon_suitability > 60.0 {
            "Strong alignment with chosen investment time horizon".to_string()
        } else {
            "Moderate alignment with chosen time horizon — consider adjusting duration".to_string()
        },
    ]
}

fn forecast_reasoning(score: &ScoreBreakdown, decision: &InvestmentDecision) -> Vec<String> {
    vec![
        format!(
            "Model projects {} outlook based on multi-factor analysis",
            match decision.verdict {
                Verdict::Invest => "positive",
                Verdict::DoNotInvest => "uncertain",
            }
        ),
        format!(
            "Growth score of {}/100 indicates {} future growth potential",
            score.growth,
            if score.growth > 60.0 {
                "strong"
            } else if score.growth > 40.0 {
                "moderate"
            } else {
                "limited"
            }
        ),
        format!(
            "Market stability score of {}/100 suggests {} forward performance",
            score.stability,
            if score.stability > 60.0 {
                "consistent"
            } else {
                "volatile"
            }
        ),
        format!(
            "Capital efficiency of {}/100 supports {} wealth compounding",
            score.capital_efficiency,
            if score.capital_efficiency > 55.0 {
                "efficient"
            } else {
                "suboptimal"
            }
        ),
    ]
}

fn data_transparency(s: &Security, score: &ScoreBreakdown) -> Vec<DataPoint> {
    let f = &s.financials;
    let p = &s.price;
    let point = |metric: &str, value: String, source: &str| DataPoint {
        metric: metric.to_string(),
        value,
        source: source.to_string(),
    };
    vec![
        point(
            "Revenue",
            format!("₹{} Cr", thousands(f.revenue)),
            "Company Financials (Annual Report)",
        ),
        point(
            "Net Profit",
            format!("₹{} Cr", thousands(f.net_profit)),
            "Company Financials (P&L Statement)",
        ),
        point(
            "Current Price",
            format!("₹{:.2}", p.current_price),
            "Universe snapshot (last close)",
        ),
        point("P/E Ratio", format!("{:.1}", p.pe), "Calculated: Price / EPS"),
        point(
            "Market Cap",
            format!("₹{} Cr", thousands(s.market_cap)),
            "Exchange Data",
        ),
        point(
            "Promoter Holding",
            format!("{}%", s.holdings.promoter),
            "SEBI Quarterly Filings",
        ),
        point(
            "Beta",
            format!("{:.2}", p.beta),
            "52-Week Regression vs Nifty 50",
        ),
        point(
            "Composite Score",
            format!("{}/100", score.composite),
            "8-Factor Scoring Model",
        ),
    ]
}

fn audit_trail(
    s: &Security,
    score: &ScoreBreakdown,
    decision: &InvestmentDecision,
    at: DateTime<Utc>,
) -> Vec<AuditStep> {
    let step = |step: &str, input: String, output: String| AuditStep {
        step: step.to_string(),
        input,
        output,
        timestamp: at,
    };
    let scores: Vec<String> = score
        .factors()
        .iter()
        .map(|(_, v)| format!("{v:.0}"))
        .collect();
    let weights: Vec<String> = Factor::ALL
        .iter()
        .map(|f| score.factor_weights.weight(*f).to_string())
        .collect();

    vec![
        step(
            "Data Ingestion",
            format!("{} financial data", s.symbol),
            format!(
                "{METRICS_PER_SECURITY} metrics and {} historical closes loaded",
                s.historical_prices.len()
            ),
        ),
        step(
            "Factor Computation",
            "8 scoring factors".to_string(),
            format!("Scores: [{}]", scores.join(", ")),
        ),
        step(
            "Weight Application",
            format!("Weights: [{}]", weights.join(", ")),
            format!("Composite: {}", score.composite),
        ),
        step(
            "Risk Assessment",
            "Risk profile analysis".to_string(),
            format!("Risk score: {}/100", score.risk),
        ),
        step(
            "Decision Computation",
            "Composite + Portfolio Fit + Confidence".to_string(),
            format!(
                "{} (decision score {}, {}% confidence)",
                decision.verdict, decision.decision_score, decision.confidence
            ),
        ),
        step(
            "Grade Assignment",
            "Decision score".to_string(),
            format!("Grade: {}", decision.grade),
        ),
    ]
}

/// Builds the explanation for a decision. `generated_at` stamps every audit
/// step so identical inputs give identical output.
pub fn explain(
    security: &Security,
    score: &ScoreBreakdown,
    decision: &InvestmentDecision,
    generated_at: DateTime<Utc>,
) -> ExplainableResult {
    let score_breakdown = contributions(score);
    ExplainableResult {
        symbol: security.symbol.clone(),
        verdict: decision.verdict,
        logical_reasoning: logical_reasoning(security, score, decision, score_breakdown.len()),
        financial_justification: financial_justification(security),
        risk_explanation: risk_explanation(security),
        return_rationale: return_rationale(security, decision),
        forecast_reasoning: forecast_reasoning(score, decision),
        data_transparency: data_transparency(security, score),
        audit_trail: audit_trail(security, score, decision, generated_at),
        score_breakdown,
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::decide_security;
    use crate::domain::investor::{Horizon, InvestorContext, RiskProfile};
    use crate::testing::{quality_compounder, SecurityBuilder};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 30, 0).unwrap()
    }

    fn explained(s: &Security) -> (ScoreBreakdown, InvestmentDecision, ExplainableResult) {
        let ctx = InvestorContext::new(1_000_000.0, Horizon::Medium, RiskProfile::Conservative);
        let (score, decision) = decide_security(s, &ctx, None);
        let result = explain(s, &score, &decision, at());
        (score, decision, result)
    }

    #[test]
    fn contributions_add_up_to_composite() {
        let (score, _, result) = explained(&quality_compounder());
        assert_eq!(result.score_breakdown.len(), 8);
        let total: f64 = result.score_breakdown.iter().map(|c| c.contribution).sum();
        assert!((total - score.composite).abs() < 0.1, "{total} vs {}", score.composite);
        assert_eq!(result.score_breakdown[0].label, "Financial Strength");
        assert!(result.score_breakdown[0]
            .explanation
            .ends_with("contributes 20% to the composite score."));
    }

    #[test]
    fn narrative_agrees_with_decision() {
        let (_, decision, result) = explained(&quality_compounder());
        assert_eq!(result.verdict, decision.verdict);
        assert!(result.logical_reasoning[3].contains(&format!("{}% confidence", decision.confidence)));
        assert!(result.forecast_reasoning[0].contains("positive"));
        let last = result.audit_trail.last().map(|s| s.output.clone());
        assert_eq!(last, Some(format!("Grade: {}", decision.grade)));
    }

    #[test]
    fn audit_trail_is_ordered_and_stamped() {
        let (_, _, result) = explained(&SecurityBuilder::new("A").build());
        let steps: Vec<&str> = result.audit_trail.iter().map(|s| s.step.as_str()).collect();
        assert_eq!(
            steps,
            vec![
                "Data Ingestion",
                "Factor Computation",
                "Weight Application",
                "Risk Assessment",
                "Decision Computation",
                "Grade Assignment"
            ]
        );
        assert!(result.audit_trail.iter().all(|s| s.timestamp == at()));
        assert_eq!(result.data_transparency.len(), 8);
    }

    #[test]
    fn explanation_is_reproducible() {
        let s = quality_compounder();
        assert_eq!(explained(&s).2, explained(&s).2);
    }

    #[test]
    fn formats_thousands_and_signs() {
        assert_eq!(thousands(1_234_567.0), "1,234,567");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(-4_000.4), "-4,000");
        assert_eq!(signed(12.5), "+12.5");
        assert_eq!(signed(-3.0), "-3");
        assert_eq!(strength_level(70.0), "strong");
        assert_eq!(strength_level(29.9), "very weak");
    }
}
