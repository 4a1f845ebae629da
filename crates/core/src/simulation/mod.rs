//! Market simulation for demo surfaces. Randomness comes from the caller's
//! `Rng` so a seeded generator reproduces a run; no scoring, decision or
//! allocation path depends on this module.

use crate::scoring::normalize::round2;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TICK_VOLATILITY: f64 = 0.003;
/// Midpoint below 0.5 gives the walk a slight upward drift.
const WALK_MIDPOINT: f64 = 0.48;
const SPREAD: f64 = 0.001;
const DAY_RANGE: f64 = 0.02;

/// Annual growth rates for the conservative, balanced and aggressive paths.
pub const PROJECTION_RATES: [f64; 3] = [0.06, 0.10, 0.15];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTick {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub timestamp: DateTime<Utc>,
    pub bid: f64,
    pub ask: f64,
    pub day_high: f64,
    pub day_low: f64,
}

pub fn random_walk<R: Rng + ?Sized>(rng: &mut R, base: f64, volatility: f64) -> f64 {
    let change = (rng.gen::<f64>() - WALK_MIDPOINT) * volatility * base;
    round2(base + change)
}

pub fn generate_tick<R: Rng + ?Sized>(
    rng: &mut R,
    symbol: &str,
    last_price: f64,
    at: DateTime<Utc>,
) -> MarketTick {
    let price = random_walk(rng, last_price, TICK_VOLATILITY);
    let change = round2(price - last_price);
    let change_percent = if last_price > 0.0 {
        round2(change / last_price * 100.0)
    } else {
        0.0
    };
    let spread = last_price * SPREAD;
    MarketTick {
        symbol: symbol.to_string(),
        price,
        change,
        change_percent,
        volume: rng.gen_range(100_000..600_000),
        timestamp: at,
        bid: round2(price - spread / 2.0),
        ask: round2(price + spread / 2.0),
        day_high: round2(price * (1.0 + rng.gen::<f64>() * DAY_RANGE)),
        day_low: round2(price * (1.0 - rng.gen::<f64>() * DAY_RANGE)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketBreadth {
    pub advances: usize,
    pub declines: usize,
    pub unchanged: usize,
}

pub fn market_breadth(ticks: &[MarketTick]) -> MarketBreadth {
    let mut breadth = MarketBreadth::default();
    for t in ticks {
        if t.change > 0.0 {
            breadth.advances += 1;
        } else if t.change < 0.0 {
            breadth.declines += 1;
        } else {
            breadth.unchanged += 1;
        }
    }
    breadth
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMovers {
    pub gainers: Vec<MarketTick>,
    pub losers: Vec<MarketTick>,
}

/// Best `n` by change percent, and worst `n` starting from the worst.
pub fn top_movers(ticks: &[MarketTick], n: usize) -> TopMovers {
    let mut sorted = ticks.to_vec();
    sorted.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
    let gainers = sorted.iter().take(n).cloned().collect();
    let losers = sorted.iter().rev().take(n).cloned().collect();
    TopMovers { gainers, losers }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingValue {
    pub symbol: String,
    pub value: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveValuation {
    pub total_value: f64,
    pub day_gain_loss: f64,
    pub day_gain_loss_percent: f64,
    pub holdings: Vec<HoldingValue>,
}

/// Values holdings at `current_prices` against `base_prices`. A symbol with
/// no current price is worth 0; one with no base price is its own base.
pub fn live_portfolio_value(
    holdings: &[Holding],
    current_prices: &HashMap<String, f64>,
    base_prices: &HashMap<String, f64>,
) -> LiveValuation {
    let mut total_value = 0.0;
    let mut cost_basis = 0.0;
    let mut values = Vec::with_capacity(holdings.len());

    for h in holdings {
        let current = current_prices.get(&h.symbol).copied().unwrap_or(0.0);
        let base = base_prices
            .get(&h.symbol)
            .copied()
            .filter(|p| *p > 0.0)
            .unwrap_or(current);
        let value = current * h.quantity;
        total_value += value;
        cost_basis += base * h.quantity;
        values.push(HoldingValue {
            symbol: h.symbol.clone(),
            value,
            change_percent: if base > 0.0 {
                round2((current - base) / base * 100.0)
            } else {
                0.0
            },
        });
    }

    let day_gain_loss = round2(total_value - cost_basis);
    LiveValuation {
        total_value,
        day_gain_loss,
        day_gain_loss_percent: if cost_basis > 0.0 {
            round2(day_gain_loss / cost_basis * 100.0)
        } else {
            0.0
        },
        holdings: values,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub year: i32,
    pub conservative: f64,
    pub balanced: f64,
    pub aggressive: f64,
}

/// Compound mean paths for `years` years, one point per year including the start.
pub fn project_growth(capital: f64, years: u32, start_year: i32) -> Vec<GrowthPoint> {
    let [c, b, a] = PROJECTION_RATES;
    (0..=years)
        .map(|i| {
            let n = i as i32;
            GrowthPoint {
                year: start_year + n,
                conservative: (capital * (1.0 + c).powi(n)).round(),
                balanced: (capital * (1.0 + b).powi(n)).round(),
                aggressive: (capital * (1.0 + a).powi(n)).round(),
            }
        })
        .collect()
}
