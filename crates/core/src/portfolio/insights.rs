use crate::domain::investor::{Horizon, RiskProfile};
use crate::domain::security::Security;
use crate::scoring::normalize::round1;
use crate::scoring::ScoreBreakdown;
use serde::{Deserialize, Serialize};

const MAX_STRENGTHS: usize = 4;
const MAX_RISKS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnEstimate {
    /// Percent over the horizon.
    pub expected_return: f64,
    pub confidence: f64,
}

pub fn estimate_returns(
    score: &ScoreBreakdown,
    risk_profile: RiskProfile,
    horizon: Horizon,
) -> ReturnEstimate {
    let base = score.composite / 100.0 * 25.0;
    let mut bonus = 0.0;
    if score.capital_efficiency > 60.0 {
        bonus += 2.0;
    }
    if score.stability > 60.0 {
        bonus += 1.5;
    }
    let expected_return = round1(
        base * horizon.expected_return_multiplier() * risk_profile.policy().return_adjustment
            + bonus,
    );

    let horizon_bonus = match horizon {
        Horizon::Long => 10.0,
        Horizon::Medium => 5.0,
        Horizon::Short => 0.0,
    };
    let stability_bonus = if score.stability > 55.0 { 5.0 } else { 0.0 };
    let confidence =
        round1((35.0 + score.composite * 0.4 + horizon_bonus + stability_bonus).min(95.0));

    ReturnEstimate {
        expected_return,
        confidence,
    }
}

/// Profile an investor would need to hold this name comfortably.
pub fn risk_rating(risk_score: f64) -> RiskProfile {
    if risk_score > 65.0 {
        RiskProfile::Conservative
    } else if risk_score > 45.0 {
        RiskProfile::Moderate
    } else {
        RiskProfile::Aggressive
    }
}

pub fn key_strengths(s: &Security) -> Vec<String> {
    let f = &s.financials;
    let mut out = Vec::new();
    if f.roe > 18.0 {
        out.push(format!("High ROE of {}%", f.roe));
    }
    if f.roce > 18.0 {
        out.push(format!("Strong ROCE of {}%", f.roce));
    }
    if f.revenue_growth > 15.0 {
        out.push(format!("Revenue growing at {}%", f.revenue_growth));
    }
    if f.net_profit_margin > 15.0 {
        out.push(format!("{}% net profit margin", f.net_profit_margin));
    }
    if f.debt_to_equity < 0.5 {
        out.push("Very low debt".to_string());
    }
    if s.holdings.promoter > 50.0 {
        out.push(format!("{}% promoter confidence", s.holdings.promoter));
    }
    if f.free_cash_flow > 0.0 {
        out.push("Positive free cash flow".to_string());
    }
    out.truncate(MAX_STRENGTHS);
    out
}

pub fn key_risks(s: &Security) -> Vec<String> {
    let f = &s.financials;
    let mut out = Vec::new();
    if f.debt_to_equity > 1.5 {
        out.push(format!("High debt-to-equity of {}", f.debt_to_equity));
    }
    if s.price.pe > 50.0 {
        out.push(format!("Elevated P/E of {}", s.price.pe));
    }
    if s.price.beta > 1.3 {
        out.push("Higher market volatility".to_string());
    }
    if s.holdings.pledged > 5.0 {
        out.push(format!("{}% shares pledged", s.holdings.pledged));
    }
    if f.net_profit_margin < 5.0 {
        out.push("Thin profit margins".to_string());
    }
    if out.is_empty() {
        out.push("Sector cyclicality risk".to_string());
    }
    out.truncate(MAX_RISKS);
    out
}

pub fn rationale(s: &Security, score: &ScoreBreakdown) -> String {
    let mut parts = Vec::new();
    if score.fundamental > 60.0 {
        parts.push(format!("strong fundamentals (score: {})", score.fundamental));
    }
    if score.growth > 50.0 {
        parts.push(format!("solid growth trajectory (score: {})", score.growth));
    }
    if score.risk > 55.0 {
        parts.push(format!("favorable risk profile (score: {})", score.risk));
    }
    if score.valuation > 50.0 {
        parts.push(format!("reasonable valuation (score: {})", score.valuation));
    }
    if score.stability > 55.0 {
        parts.push(format!("stable market behavior (score: {})", score.stability));
    }
    if score.capital_efficiency > 55.0 {
        parts.push(format!(
            "efficient capital use (score: {})",
            score.capital_efficiency
        ));
    }
    let traits = if parts.is_empty() {
        "a mixed factor profile".to_string()
    } else {
        parts.join(", ")
    };
    format!(
        "{} demonstrates {traits} with a composite score of {}/100. \
         The company operates in the {} sector with ₹{:.0}B market cap.",
        s.name,
        score.composite,
        s.sector,
        s.market_cap / 100.0
    )
}
