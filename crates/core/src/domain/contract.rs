use crate::domain::security::Security;
use crate::domain::universe::Universe;
use anyhow::{ensure, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Wire format of the external universe provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseSnapshot {
    pub as_of_date: NaiveDate,
    pub securities: Vec<Security>,
}

impl UniverseSnapshot {
    pub fn validate_and_into_universe(
        self,
        expected_as_of_date: Option<NaiveDate>,
    ) -> anyhow::Result<Universe> {
        if let Some(expected) = expected_as_of_date {
            ensure!(
                self.as_of_date == expected,
                "universe as_of_date mismatch: expected {expected}, got {}",
                self.as_of_date
            );
        }

        ensure!(
            !self.securities.is_empty(),
            "universe snapshot must contain at least one security"
        );

        let mut seen = BTreeSet::<String>::new();
        let mut securities = Vec::with_capacity(self.securities.len());
        for security in self.securities {
            let symbol = security.symbol.clone();
            securities.push(
                validate_security(security, &mut seen)
                    .with_context(|| format!("invalid security {symbol:?}"))?,
            );
        }

        Ok(Universe::new(securities))
    }
}

pub fn parse_snapshot(
    text: &str,
    expected_as_of_date: Option<NaiveDate>,
) -> anyhow::Result<Universe> {
    let parsed = serde_json::from_str::<UniverseSnapshot>(text)
        .context("universe JSON does not match the snapshot schema")?;
    parsed.validate_and_into_universe(expected_as_of_date)
}

fn validate_security(
    mut security: Security,
    seen: &mut BTreeSet<String>,
) -> anyhow::Result<Security> {
    security.symbol = security.symbol.trim().to_string();
    ensure!(!security.symbol.is_empty(), "symbol must be non-empty");
    ensure!(
        seen.insert(security.symbol.clone()),
        "duplicate symbol: {}",
        security.symbol
    );

    security.name = security.name.trim().to_string();
    ensure!(!security.name.is_empty(), "name must be non-empty");
    security.sector = security.sector.trim().to_string();
    ensure!(!security.sector.is_empty(), "sector must be non-empty");

    let f = &security.financials;
    let p = &security.price;
    let h = &security.holdings;
    let numeric = [
        ("market_cap", security.market_cap),
        ("revenue", f.revenue),
        ("revenue_growth", f.revenue_growth),
        ("net_profit", f.net_profit),
        ("net_profit_margin", f.net_profit_margin),
        ("ebitda", f.ebitda),
        ("operating_margin", f.operating_margin),
        ("total_debt", f.total_debt),
        ("total_equity", f.total_equity),
        ("total_assets", f.total_assets),
        ("free_cash_flow", f.free_cash_flow),
        ("eps", f.eps),
        ("eps_growth", f.eps_growth),
        ("dividend_yield", f.dividend_yield),
        ("book_value", f.book_value),
        ("roe", f.roe),
        ("roce", f.roce),
        ("debt_to_equity", f.debt_to_equity),
        ("interest_coverage", f.interest_coverage),
        ("current_ratio", f.current_ratio),
        ("asset_turnover", f.asset_turnover),
        ("revenue_cagr_3y", f.revenue_cagr_3y),
        ("profit_cagr_3y", f.profit_cagr_3y),
        ("current_price", p.current_price),
        ("week_high_52", p.week_high_52),
        ("week_low_52", p.week_low_52),
        ("pe", p.pe),
        ("pb", p.pb),
        ("peg_ratio", p.peg_ratio),
        ("beta", p.beta),
        ("avg_volume", p.avg_volume),
        ("market_cap_value", p.market_cap_value),
        ("free_float", p.free_float),
        ("promoter", h.promoter),
        ("fii", h.fii),
        ("dii", h.dii),
        ("public", h.public),
        ("pledged", h.pledged),
    ];
    for (field, value) in numeric {
        ensure!(value.is_finite(), "{field} must be finite (got {value})");
    }

    ensure!(
        p.current_price > 0.0,
        "current_price must be positive (got {})",
        p.current_price
    );
    ensure!(
        p.week_low_52 > 0.0 && p.week_high_52 >= p.week_low_52,
        "52-week range must satisfy 0 < low <= high (got {}..{})",
        p.week_low_52,
        p.week_high_52
    );
    ensure!(
        security
            .historical_prices
            .iter()
            .all(|v| v.is_finite() && *v > 0.0),
        "historical prices must be finite and positive"
    );

    Ok(security)
}
