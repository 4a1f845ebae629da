//! The eight factor scorers. Each is a weighted blend of normalised metrics
//! plus reasons appended when a metric crosses a qualitative threshold.

use crate::analytics::{period_returns, population_variance};
use crate::domain::security::Security;
use crate::policy::NEUTRAL_SCORE;
use crate::scoring::normalize::{normalize, round1};
use serde::{Deserialize, Serialize};

pub const STABILITY_INSUFFICIENT_DATA: &str = "Insufficient data: price history too short for stability analysis";
pub const VOLATILITY_INSUFFICIENT_DATA: &str = "Insufficient data: price history too short for volatility analysis";

/// Used in place of the operating-leverage proxy when margin or growth is not positive.
const NEUTRAL_OPERATING_LEVERAGE: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub score: f64,
    pub reasons: Vec<String>,
}

impl FactorScore {
    fn new(raw: f64, reasons: Vec<String>) -> Self {
        Self {
            score: round1(raw.clamp(0.0, 100.0)),
            reasons,
        }
    }

    fn neutral(reason: &str) -> Self {
        Self {
            score: NEUTRAL_SCORE,
            reasons: vec![reason.to_string()],
        }
    }
}

pub fn fundamental(s: &Security) -> FactorScore {
    let f = &s.financials;
    let roe = normalize(f.roe, 0.0, 35.0, false);
    let roce = normalize(f.roce, 0.0, 30.0, false);
    let margin = normalize(f.net_profit_margin, 0.0, 30.0, false);
    let coverage = normalize(f.interest_coverage.min(20.0), 0.0, 20.0, false);
    let turnover = normalize(f.asset_turnover, 0.0, 2.0, false);
    let score = roe * 0.3 + roce * 0.25 + margin * 0.2 + coverage * 0.15 + turnover * 0.1;

    let mut reasons = Vec::new();
    if f.roe > 20.0 {
        reasons.push(format!("Strong ROE of {:.1}%", f.roe));
    }
    if f.roce > 20.0 {
        reasons.push(format!("Excellent ROCE of {:.1}%", f.roce));
    }
    if f.net_profit_margin > 15.0 {
        reasons.push(format!("Healthy profit margin of {:.1}%", f.net_profit_margin));
    }
    if f.interest_coverage > 5.0 {
        reasons.push("Comfortable interest coverage".to_string());
    }
    FactorScore::new(score, reasons)
}

pub fn growth(s: &Security) -> FactorScore {
    let f = &s.financials;
    let revenue = normalize(f.revenue_growth, -10.0, 40.0, false);
    let eps = normalize(f.eps_growth, -20.0, 50.0, false);
    let revenue_cagr = normalize(f.revenue_cagr_3y, 0.0, 35.0, false);
    let profit_cagr = normalize(f.profit_cagr_3y, 0.0, 40.0, false);
    let score = revenue * 0.25 + eps * 0.3 + revenue_cagr * 0.25 + profit_cagr * 0.2;

    let mut reasons = Vec::new();
    if f.revenue_growth > 15.0 {
        reasons.push(format!("Strong revenue growth of {:.1}%", f.revenue_growth));
    }
    if f.eps_growth > 20.0 {
        reasons.push(format!("Impressive EPS growth of {:.1}%", f.eps_growth));
    }
    if f.revenue_cagr_3y > 20.0 {
        reasons.push(format!("3Y revenue CAGR of {:.1}%", f.revenue_cagr_3y));
    }
    FactorScore::new(score, reasons)
}

/// Higher means safer.
pub fn risk(s: &Security) -> FactorScore {
    let f = &s.financials;
    let p = &s.price;
    let h = &s.holdings;
    let leverage = normalize(f.debt_to_equity, 0.0, 3.0, true);
    let beta = normalize(p.beta, 0.0, 2.0, true);
    let promoter = normalize(h.promoter, 0.0, 75.0, false);
    let pledge = normalize(h.pledged, 0.0, 30.0, true);
    let fii = normalize(h.fii, 0.0, 50.0, false);
    let score = leverage * 0.25 + beta * 0.2 + promoter * 0.25 + pledge * 0.15 + fii * 0.15;

    let mut reasons = Vec::new();
    if f.debt_to_equity < 0.5 {
        reasons.push("Low debt-to-equity ratio".to_string());
    }
    if h.promoter > 50.0 {
        reasons.push(format!("High promoter holding of {}%", h.promoter));
    }
    if h.pledged == 0.0 {
        reasons.push("Zero pledged shares".to_string());
    }
    if p.beta < 1.0 {
        reasons.push("Lower market volatility".to_string());
    }
    FactorScore::new(score, reasons)
}

/// Higher means a more attractive entry price.
pub fn valuation(s: &Security) -> FactorScore {
    let p = &s.price;
    let pe = normalize(p.pe, 5.0, 100.0, true);
    let pb = normalize(p.pb, 0.5, 20.0, true);
    let peg = normalize(p.peg_ratio, 0.0, 4.0, true);
    let below_high = s.discount_from_high();
    let discount = normalize(below_high, 0.0, 30.0, false);
    let score = pe * 0.35 + pb * 0.25 + peg * 0.25 + discount * 0.15;

    let mut reasons = Vec::new();
    if p.pe < 20.0 {
        reasons.push(format!("Attractive P/E of {:.1}", p.pe));
    }
    if p.peg_ratio < 1.5 {
        reasons.push(format!("Favorable PEG ratio of {:.2}", p.peg_ratio));
    }
    if below_high > 10.0 {
        reasons.push(format!("{below_high:.0}% below 52-week high"));
    }
    FactorScore::new(score, reasons)
}

pub fn liquidity(s: &Security) -> FactorScore {
    let p = &s.price;
    let volume = normalize(p.avg_volume.log10(), 4.0, 8.0, false);
    let market_cap = normalize(p.market_cap_value.log10(), 3.0, 7.0, false);
    let float = normalize(p.free_float, 10.0, 80.0, false);
    let score = volume * 0.4 + market_cap * 0.35 + float * 0.25;

    let mut reasons = Vec::new();
    if p.avg_volume > 5_000_000.0 {
        reasons.push("High trading volume".to_string());
    }
    if p.free_float > 50.0 {
        reasons.push("Good free float availability".to_string());
    }
    FactorScore::new(score, reasons)
}

pub fn stability(s: &Security) -> FactorScore {
    if !s.has_price_history() {
        return FactorScore::neutral(STABILITY_INSUFFICIENT_DATA);
    }
    let prices = &s.historical_prices;

    let up_periods = prices.windows(2).filter(|w| w[1] >= w[0]).count();
    let trend_consistency = up_periods as f64 / (prices.len() - 1) as f64 * 100.0;

    let lo = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let recovery = if hi > lo {
        ((s.price.current_price - lo) / (hi - lo) * 100.0).clamp(0.0, 100.0)
    } else {
        NEUTRAL_SCORE
    };

    let institutional = s.institutional_holding();
    let institutional_score = normalize(institutional, 0.0, 60.0, false);

    let score = trend_consistency * 0.35 + recovery * 0.35 + institutional_score * 0.3;

    let mut reasons = Vec::new();
    if trend_consistency > 65.0 {
        reasons.push(format!(
            "Strong trend consistency ({trend_consistency:.0}% up periods)"
        ));
    }
    if recovery > 70.0 {
        reasons.push("Strong price recovery from lows".to_string());
    }
    if institutional > 35.0 {
        reasons.push(format!(
            "High institutional backing ({institutional:.1}%)"
        ));
    }
    FactorScore::new(score, reasons)
}

/// Higher means calmer price action.
pub fn volatility(s: &Security) -> FactorScore {
    if !s.has_price_history() {
        return FactorScore::neutral(VOLATILITY_INSUFFICIENT_DATA);
    }
    let prices = &s.historical_prices;

    // Population standard deviation of period returns, in percent, not annualised.
    let std_dev = population_variance(&period_returns(prices)).sqrt() * 100.0;

    let vol_score = normalize(std_dev, 0.0, 15.0, true);
    let beta_score = normalize(s.price.beta, 0.3, 2.0, true);
    let range_width = s.range_width_52w();
    let range_score = normalize(range_width, 0.0, 80.0, true);

    let score = vol_score * 0.4 + beta_score * 0.35 + range_score * 0.25;

    let mut reasons = Vec::new();
    if std_dev < 5.0 {
        reasons.push(format!("Low periodic volatility ({std_dev:.1}%)"));
    }
    if s.price.beta < 0.9 {
        reasons.push(format!("Low beta of {:.2}", s.price.beta));
    }
    if range_width < 30.0 {
        reasons.push("Narrow 52-week trading range".to_string());
    }
    FactorScore::new(score, reasons)
}

pub fn capital_efficiency(s: &Security) -> FactorScore {
    let f = &s.financials;

    let roa = if f.total_assets > 0.0 {
        f.net_profit / f.total_assets * 100.0
    } else {
        0.0
    };
    let roa_score = normalize(roa, 0.0, 20.0, false);

    let turnover_score = normalize(f.asset_turnover, 0.0, 2.0, false);

    let fcf_ratio = if f.revenue > 0.0 {
        f.free_cash_flow / f.revenue * 100.0
    } else {
        0.0
    };
    let fcf_score = normalize(fcf_ratio, -5.0, 25.0, false);

    let equity_return = if f.total_equity > 0.0 {
        f.net_profit / f.total_equity * 100.0
    } else {
        0.0
    };
    let equity_score = normalize(equity_return, 0.0, 30.0, false);

    let operating_leverage = if f.operating_margin > 0.0 && f.revenue_growth > 0.0 {
        normalize(f.operating_margin / f.revenue_growth * 10.0, 0.0, 30.0, false)
    } else {
        NEUTRAL_OPERATING_LEVERAGE
    };

    let score = roa_score * 0.25
        + turnover_score * 0.2
        + fcf_score * 0.2
        + equity_score * 0.2
        + operating_leverage * 0.15;

    let mut reasons = Vec::new();
    if roa > 10.0 {
        reasons.push(format!("Strong ROA of {roa:.1}%"));
    }
    if fcf_ratio > 10.0 {
        reasons.push(format!("Healthy FCF/Revenue ratio of {fcf_ratio:.1}%"));
    }
    if f.asset_turnover > 1.0 {
        reasons.push(format!(
            "Efficient asset utilization ({:.2}x)",
            f.asset_turnover
        ));
    }
    FactorScore::new(score, reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{trending_history, SecurityBuilder};

    #[test]
    fn fundamental_rewards_high_returns_on_capital() {
        let strong = SecurityBuilder::new("A")
            .financials(|f| {
                f.roe = 25.0;
                f.roce = 22.0;
                f.net_profit_margin = 20.0;
            })
            .build();
        let out = fundamental(&strong);
        assert!(out.reasons.iter().any(|r| r == "Strong ROE of 25.0%"));
        assert!(out.reasons.iter().any(|r| r == "Excellent ROCE of 22.0%"));

        let weak = SecurityBuilder::new("B")
            .financials(|f| {
                f.roe = 2.0;
                f.roce = 3.0;
                f.net_profit_margin = 1.0;
                f.interest_coverage = 1.0;
            })
            .build();
        assert!(fundamental(&weak).score < out.score);
        assert!(fundamental(&weak).reasons.is_empty());
    }

    #[test]
    fn fundamental_matches_hand_computed_blend() {
        let s = SecurityBuilder::new("A")
            .financials(|f| {
                f.roe = 17.5; // 50
                f.roce = 15.0; // 50
                f.net_profit_margin = 15.0; // 50
                f.interest_coverage = 40.0; // capped at 20 -> 100
                f.asset_turnover = 1.0; // 50
            })
            .build();
        // 50*0.3 + 50*0.25 + 50*0.2 + 100*0.15 + 50*0.1
        assert_eq!(fundamental(&s).score, 57.5);
    }

    #[test]
    fn risk_inverts_leverage_and_beta() {
        let safe = SecurityBuilder::new("A")
            .financials(|f| f.debt_to_equity = 0.0)
            .price(|p| p.beta = 0.0)
            .holdings(|h| {
                h.promoter = 75.0;
                h.pledged = 0.0;
                h.fii = 50.0;
            })
            .build();
        assert_eq!(risk(&safe).score, 100.0);

        let risky = SecurityBuilder::new("B")
            .financials(|f| f.debt_to_equity = 3.0)
            .price(|p| p.beta = 2.0)
            .holdings(|h| {
                h.promoter = 0.0;
                h.pledged = 30.0;
                h.fii = 0.0;
            })
            .build();
        assert_eq!(risk(&risky).score, 0.0);
    }

    #[test]
    fn valuation_guards_zero_high() {
        let s = SecurityBuilder::new("A").range_52w(0.0, 0.0).build();
        let out = valuation(&s);
        assert!(out.score.is_finite());
        assert!(!out.reasons.iter().any(|r| r.contains("below 52-week high")));
    }

    #[test]
    fn liquidity_handles_zero_volume() {
        let s = SecurityBuilder::new("A")
            .price(|p| {
                p.avg_volume = 0.0;
                p.market_cap_value = 0.0;
                p.free_float = 0.0;
            })
            .build();
        assert_eq!(liquidity(&s).score, 0.0);
    }

    #[test]
    fn short_history_is_neutral() {
        let s = SecurityBuilder::new("A").history(&[100.0, 105.0]).build();
        let st = stability(&s);
        let vo = volatility(&s);
        assert_eq!(st.score, 50.0);
        assert_eq!(vo.score, 50.0);
        assert_eq!(st.reasons, vec![STABILITY_INSUFFICIENT_DATA.to_string()]);
        assert_eq!(vo.reasons, vec![VOLATILITY_INSUFFICIENT_DATA.to_string()]);
        assert!(!s.has_price_history());

        let three = SecurityBuilder::new("B").history(&[100.0, 105.0, 103.0]).build();
        assert!(three.has_price_history());
        assert_ne!(stability(&three).reasons, vec![STABILITY_INSUFFICIENT_DATA.to_string()]);
        assert_ne!(volatility(&three).reasons, vec![VOLATILITY_INSUFFICIENT_DATA.to_string()]);
    }

    #[test]
    fn steady_uptrend_is_stable_and_calm() {
        let s = SecurityBuilder::new("A")
            .history(&trending_history(10, 0.05))
            .holdings(|h| {
                h.fii = 30.0;
                h.dii = 30.0;
            })
            .build();
        // trend 100, recovery 100, institutional 60 -> 100
        assert_eq!(stability(&s).score, 100.0);

        let v = volatility(&s);
        assert!(v.reasons.iter().any(|r| r.starts_with("Low periodic volatility (0.0%")));
        assert!(v.score > 60.0);
    }

    #[test]
    fn stability_recovery_is_bounded_when_price_leaves_history_band() {
        let s = SecurityBuilder::new("A")
            .history(&[100.0, 90.0, 95.0, 92.0])
            .current_price(500.0)
            .build();
        let out = stability(&s);
        assert!((0.0..=100.0).contains(&out.score));
    }

    #[test]
    fn flat_history_uses_neutral_recovery() {
        let s = SecurityBuilder::new("A")
            .history(&[100.0, 100.0, 100.0])
            .holdings(|h| {
                h.fii = 0.0;
                h.dii = 0.0;
            })
            .build();
        // trend 100 (non-negative changes count), recovery 50, institutional 0
        assert_eq!(stability(&s).score, 52.5);
    }

    #[test]
    fn capital_efficiency_neutral_leverage_when_growth_not_positive() {
        let base = SecurityBuilder::new("A")
            .financials(|f| {
                f.total_assets = 0.0;
                f.revenue = 0.0;
                f.total_equity = 0.0;
                f.asset_turnover = 0.0;
                f.revenue_growth = -5.0;
            })
            .build();
        // Only the neutral leverage term and fcf (ratio 0 -> 16.67) contribute.
        let expected = round1(normalize(0.0, -5.0, 25.0, false) * 0.2 + 30.0 * 0.15);
        assert_eq!(capital_efficiency(&base).score, expected);
    }
}
