//! Fixture builder shared by unit tests.

use crate::domain::security::{CapTier, Financials, Holdings, PriceMetrics, Security};
use std::f64::consts::PI;

/// Prices whose period returns are mutually uncorrelated across distinct
/// `pattern` values (discrete Fourier basis over 12 periods).
pub fn orthogonal_history(pattern: usize) -> Vec<f64> {
    let periods = 12;
    let k = pattern % 11;
    let mut prices = Vec::with_capacity(periods + 1);
    let mut price = 100.0;
    prices.push(price);
    for i in 0..periods {
        let phase = 2.0 * PI * i as f64 / periods as f64;
        let wave = match k {
            0..=4 => (phase * (k + 1) as f64).sin(),
            5..=9 => (phase * (k - 4) as f64).cos(),
            _ => (phase * 6.0).cos(),
        };
        price *= 1.0 + 0.005 + 0.02 * wave;
        prices.push(price);
    }
    prices
}

/// Constant-rate growth series of `len` points starting at 100.
pub fn trending_history(len: usize, rate: f64) -> Vec<f64> {
    let mut prices = Vec::with_capacity(len);
    let mut price = 100.0;
    for _ in 0..len {
        prices.push(price);
        price *= 1.0 + rate;
    }
    prices
}

pub struct SecurityBuilder {
    security: Security,
    explicit_price: bool,
    explicit_range: bool,
}

impl SecurityBuilder {
    pub fn new(symbol: &str) -> Self {
        let pattern = symbol.bytes().map(usize::from).sum::<usize>();
        let security = Security {
            symbol: symbol.to_string(),
            name: format!("{} Ltd", symbol.trim()),
            sector: "Technology".to_string(),
            industry: "IT Services".to_string(),
            market_cap: 250_000.0,
            cap_tier: CapTier::Large,
            financials: Financials {
                revenue: 50_000.0,
                revenue_growth: 12.0,
                net_profit: 6_000.0,
                net_profit_margin: 12.0,
                ebitda: 9_000.0,
                operating_margin: 18.0,
                total_debt: 10_000.0,
                total_equity: 30_000.0,
                total_assets: 60_000.0,
                free_cash_flow: 4_000.0,
                eps: 50.0,
                eps_growth: 14.0,
                dividend_yield: 1.2,
                book_value: 300.0,
                roe: 18.0,
                roce: 17.0,
                debt_to_equity: 0.4,
                interest_coverage: 8.0,
                current_ratio: 1.5,
                asset_turnover: 0.9,
                revenue_cagr_3y: 12.0,
                profit_cagr_3y: 14.0,
            },
            price: PriceMetrics {
                current_price: 100.0,
                week_high_52: 110.0,
                week_low_52: 90.0,
                pe: 25.0,
                pb: 4.0,
                peg_ratio: 1.5,
                beta: 1.0,
                avg_volume: 2_000_000.0,
                market_cap_value: 250_000.0,
                free_float: 45.0,
            },
            holdings: Holdings {
                promoter: 50.0,
                fii: 20.0,
                dii: 15.0,
                public: 15.0,
                pledged: 0.0,
            },
            historical_prices: orthogonal_history(pattern),
        };
        Self {
            security,
            explicit_price: false,
            explicit_range: false,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.security.name = name.to_string();
        self
    }

    pub fn sector(mut self, sector: &str) -> Self {
        self.security.sector = sector.to_string();
        self
    }

    pub fn tier(mut self, tier: CapTier) -> Self {
        self.security.cap_tier = tier;
        self
    }

    pub fn pattern(mut self, pattern: usize) -> Self {
        self.security.historical_prices = orthogonal_history(pattern);
        self
    }

    pub fn history(mut self, prices: &[f64]) -> Self {
        self.security.historical_prices = prices.to_vec();
        self
    }

    pub fn current_price(mut self, price: f64) -> Self {
        self.security.price.current_price = price;
        self.explicit_price = true;
        self
    }

    pub fn range_52w(mut self, low: f64, high: f64) -> Self {
        self.security.price.week_low_52 = low;
        self.security.price.week_high_52 = high;
        self.explicit_range = true;
        self
    }

    pub fn financials(mut self, f: impl FnOnce(&mut Financials)) -> Self {
        f(&mut self.security.financials);
        self
    }

    pub fn price(mut self, f: impl FnOnce(&mut PriceMetrics)) -> Self {
        f(&mut self.security.price);
        self
    }

    pub fn holdings(mut self, f: impl FnOnce(&mut Holdings)) -> Self {
        f(&mut self.security.holdings);
        self
    }

    /// Unless set explicitly, the current price tracks the last historical
    /// close and the 52-week band brackets the history.
    pub fn build(mut self) -> Security {
        let prices = &self.security.historical_prices;
        if !prices.is_empty() {
            let last = prices[prices.len() - 1];
            let lo = prices.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if !self.explicit_price {
                self.security.price.current_price = last;
            }
            if !self.explicit_range {
                self.security.price.week_low_52 = lo * 0.95;
                self.security.price.week_high_52 = hi * 1.05;
            }
        }
        self.security
    }
}

/// Profitable, lightly levered large cap in a steady 5% uptrend.
pub fn quality_compounder() -> Security {
    SecurityBuilder::new("QUAL")
        .name("Quality Compounders Ltd")
        .financials(|f| {
            f.roe = 25.0;
            f.roce = 22.0;
            f.net_profit_margin = 20.0;
            f.debt_to_equity = 0.3;
            f.revenue_growth = 18.0;
            f.eps_growth = 22.0;
            f.revenue_cagr_3y = 17.0;
            f.profit_cagr_3y = 20.0;
            f.interest_coverage = 15.0;
            f.net_profit = 10_000.0;
            f.free_cash_flow = 7_000.0;
        })
        .price(|p| {
            p.beta = 0.7;
            p.pe = 18.0;
            p.peg_ratio = 1.0;
        })
        .holdings(|h| h.promoter = 55.0)
        .history(&trending_history(10, 0.05))
        .build()
}
