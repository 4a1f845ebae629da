use serde::{Deserialize, Serialize};
use std::fmt;

/// Market-capitalisation bucket used for portfolio diversification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapTier {
    Large,
    Mid,
    Small,
}

impl CapTier {
    pub const ALL: [CapTier; 3] = [CapTier::Large, CapTier::Mid, CapTier::Small];

    pub fn as_str(self) -> &'static str {
        match self {
            CapTier::Large => "large",
            CapTier::Mid => "mid",
            CapTier::Small => "small",
        }
    }
}

impl fmt::Display for CapTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable per-evaluation snapshot of one listed security.
///
/// Percentages are plain numbers (12.5 means 12.5%). Currency amounts share
/// one crore-scale unit per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    #[serde(default)]
    pub industry: String,
    /// Market capitalisation in crore.
    pub market_cap: f64,
    pub cap_tier: CapTier,
    pub financials: Financials,
    pub price: PriceMetrics,
    pub holdings: Holdings,
    /// Closing prices ordered oldest to newest.
    #[serde(default)]
    pub historical_prices: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub revenue: f64,
    pub revenue_growth: f64,
    pub net_profit: f64,
    pub net_profit_margin: f64,
    pub ebitda: f64,
    pub operating_margin: f64,
    pub total_debt: f64,
    pub total_equity: f64,
    pub total_assets: f64,
    pub free_cash_flow: f64,
    pub eps: f64,
    pub eps_growth: f64,
    pub dividend_yield: f64,
    pub book_value: f64,
    pub roe: f64,
    pub roce: f64,
    pub debt_to_equity: f64,
    pub interest_coverage: f64,
    pub current_ratio: f64,
    pub asset_turnover: f64,
    pub revenue_cagr_3y: f64,
    pub profit_cagr_3y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceMetrics {
    pub current_price: f64,
    pub week_high_52: f64,
    pub week_low_52: f64,
    pub pe: f64,
    pub pb: f64,
    pub peg_ratio: f64,
    pub beta: f64,
    pub avg_volume: f64,
    pub market_cap_value: f64,
    pub free_float: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    pub promoter: f64,
    pub fii: f64,
    pub dii: f64,
    pub public: f64,
    pub pledged: f64,
}

impl Security {
    /// Price history is usable for trend, volatility and correlation work.
    pub fn has_price_history(&self) -> bool {
        self.historical_prices.len() >= crate::policy::MIN_HISTORY_POINTS
    }

    /// Percentage below the 52-week high; 0 when the high is not positive.
    pub fn discount_from_high(&self) -> f64 {
        let p = &self.price;
        if p.week_high_52 > 0.0 {
            (p.week_high_52 - p.current_price) / p.week_high_52 * 100.0
        } else {
            0.0
        }
    }

    /// Width of the 52-week range relative to the low, in percent.
    pub fn range_width_52w(&self) -> f64 {
        let p = &self.price;
        if p.week_low_52 > 0.0 {
            (p.week_high_52 - p.week_low_52) / p.week_low_52 * 100.0
        } else {
            0.0
        }
    }

    pub fn institutional_holding(&self) -> f64 {
        self.holdings.fii + self.holdings.dii
    }
}
