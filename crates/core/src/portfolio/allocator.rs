//! Risk-budgeted selection and weighting.
//!
//! Stages run strictly in order: eligibility, tier bucketing, sector cap,
//! correlation pruning, weighting. Each stage only sees the survivors of the
//! previous one.

use crate::analytics::build_matrix;
use crate::domain::investor::InvestorContext;
use crate::domain::security::CapTier;
use crate::policy::{MAX_PER_SECTOR, PRUNE_CORRELATION, PRUNE_MIN_POSITIONS};
use crate::scoring::{sort_by_score, ScoredSecurity};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// One accepted position before enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<'a> {
    pub scored: &'a ScoredSecurity,
    /// Fraction of capital, already capped.
    pub weight: f64,
    /// `weight` in percent, floored to one decimal.
    pub percentage: f64,
    pub capital: f64,
}

/// Drops securities the investor's policy does not allow.
pub fn filter_by_risk<'a>(
    scored: &'a [ScoredSecurity],
    ctx: &InvestorContext,
) -> Vec<&'a ScoredSecurity> {
    let policy = ctx.risk_profile.policy();
    let horizon_screen = ctx.horizon.screen();

    scored
        .iter()
        .filter(|s| s.score.composite >= policy.min_composite)
        .filter(|s| match &policy.screen {
            Some(screen) => {
                s.security.financials.debt_to_equity < screen.max_debt_to_equity
                    && s.security.price.beta < screen.max_beta
                    && s.score.volatility > screen.min_volatility_score
            }
            None => true,
        })
        .filter(|s| match horizon_screen {
            Some(screen) => {
                s.security.price.avg_volume > screen.min_avg_volume
                    && s.score.stability > screen.min_stability_score
            }
            None => true,
        })
        .collect()
}

/// Selects and weights positions from an eligible set.
pub fn allocate<'a>(
    mut eligible: Vec<&'a ScoredSecurity>,
    ctx: &InvestorContext,
) -> Vec<Allocation<'a>> {
    let policy = ctx.risk_profile.policy();
    sort_by_score(&mut eligible);

    let mut selected = select_by_tier(&eligible, policy.max_positions, |tier| {
        policy.tier_targets.fraction(tier)
    });
    sort_by_score(&mut selected);
    debug!(
        eligible = eligible.len(),
        tier_selected = selected.len(),
        "tier bucketing done"
    );

    let capped = cap_sectors(selected, policy.max_positions);
    debug!(sector_capped = capped.len(), "sector cap applied");

    let kept = prune_correlated(capped);

    let total_score: f64 = kept.iter().map(|s| s.score.composite).sum();
    kept.into_iter()
        .map(|scored| {
            let weight = if total_score > 0.0 {
                (scored.score.composite / total_score).min(policy.max_position_weight)
            } else {
                0.0
            };
            Allocation {
                scored,
                weight,
                percentage: floor_percent(weight),
                capital: (ctx.capital * weight).round(),
            }
        })
        .collect()
}

fn select_by_tier<'a>(
    ranked: &[&'a ScoredSecurity],
    max_positions: usize,
    fraction: impl Fn(CapTier) -> f64,
) -> Vec<&'a ScoredSecurity> {
    let mut selected = Vec::new();
    for tier in CapTier::ALL {
        let target = (max_positions as f64 * fraction(tier)).round() as usize;
        selected.extend(
            ranked
                .iter()
                .copied()
                .filter(|s| s.security.cap_tier == tier)
                .take(target),
        );
    }
    selected
}

fn cap_sectors<'a>(
    ranked: Vec<&'a ScoredSecurity>,
    max_positions: usize,
) -> Vec<&'a ScoredSecurity> {
    let mut per_sector: HashMap<&'a str, usize> = HashMap::new();
    ranked
        .into_iter()
        .filter(|s| {
            let s: &'a ScoredSecurity = *s;
            let count = per_sector.entry(s.security.sector.as_str()).or_insert(0);
            *count += 1;
            *count <= MAX_PER_SECTOR
        })
        .take(max_positions)
        .collect()
}

/// Marks the weaker member of every highly correlated pair and removes all
/// marked securities at once. Equal scores drop the greater symbol.
fn prune_correlated<'a>(kept: Vec<&'a ScoredSecurity>) -> Vec<&'a ScoredSecurity> {
    if kept.len() <= PRUNE_MIN_POSITIONS {
        return kept;
    }

    let by_symbol: HashMap<&'a str, &'a ScoredSecurity> =
        kept.iter().map(|&s| (s.symbol(), s)).collect();
    let mut remove: BTreeSet<String> = BTreeSet::new();
    for pair in build_matrix(kept.iter().map(|s| &s.security)) {
        if pair.correlation <= PRUNE_CORRELATION {
            continue;
        }
        let (Some(a), Some(b)) = (
            by_symbol.get(pair.stock_a.as_str()),
            by_symbol.get(pair.stock_b.as_str()),
        ) else {
            continue;
        };
        let loser = match a.score.composite.total_cmp(&b.score.composite) {
            Ordering::Greater => &pair.stock_b,
            Ordering::Less => &pair.stock_a,
            Ordering::Equal => (&pair.stock_a).max(&pair.stock_b),
        };
        remove.insert(loser.clone());
    }

    if !remove.is_empty() {
        debug!(pruned = ?remove, "correlation pruning");
    }
    kept.into_iter()
        .filter(|s| !remove.contains(s.symbol()))
        .collect()
}

/// Floors to one decimal so the rounded percentages never sum past the
/// unrounded weights.
fn floor_percent(weight: f64) -> f64 {
    ((weight * 1000.0) + 1e-9).floor() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::investor::{Horizon, RiskProfile};
    use crate::domain::security::Security;
    use crate::testing::SecurityBuilder;

    fn scored(securities: Vec<Security>) -> Vec<ScoredSecurity> {
        securities.into_iter().map(ScoredSecurity::new).collect()
    }

    fn symbols(allocations: &[Allocation<'_>]) -> Vec<String> {
        let mut out: Vec<String> = allocations
            .iter()
            .map(|a| a.scored.symbol().to_string())
            .collect();
        out.sort();
        out
    }

    fn ctx(profile: RiskProfile, horizon: Horizon) -> InvestorContext {
        InvestorContext::new(1_000_000.0, horizon, profile)
    }

    #[test]
    fn conservative_screen_drops_leverage_and_beta() {
        let universe = scored(vec![
            SecurityBuilder::new("A").pattern(0).build(),
            SecurityBuilder::new("B")
                .pattern(1)
                .financials(|f| f.debt_to_equity = 2.0)
                .build(),
            SecurityBuilder::new("C").pattern(2).price(|p| p.beta = 1.5).build(),
        ]);
        let kept = filter_by_risk(&universe, &ctx(RiskProfile::Conservative, Horizon::Medium));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].symbol(), "A");

        let kept = filter_by_risk(&universe, &ctx(RiskProfile::Aggressive, Horizon::Medium));
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn short_horizon_requires_liquidity() {
        let universe = scored(vec![
            SecurityBuilder::new("A").pattern(0).build(),
            SecurityBuilder::new("D")
                .pattern(1)
                .price(|p| p.avg_volume = 500_000.0)
                .build(),
        ]);
        let short = filter_by_risk(&universe, &ctx(RiskProfile::Moderate, Horizon::Short));
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].symbol(), "A");
        let medium = filter_by_risk(&universe, &ctx(RiskProfile::Moderate, Horizon::Medium));
        assert_eq!(medium.len(), 2);
    }

    #[test]
    fn tier_targets_bound_each_bucket() {
        let universe = scored(vec![
            SecurityBuilder::new("L1").sector("S1").pattern(0).build(),
            SecurityBuilder::new("L2").sector("S2").pattern(1).build(),
            SecurityBuilder::new("M1")
                .sector("S3")
                .tier(CapTier::Mid)
                .pattern(2)
                .financials(|f| f.roe = 30.0)
                .build(),
            SecurityBuilder::new("M2")
                .sector("S4")
                .tier(CapTier::Mid)
                .pattern(3)
                .financials(|f| f.roe = 30.0)
                .build(),
            SecurityBuilder::new("M3")
                .sector("S5")
                .tier(CapTier::Mid)
                .pattern(4)
                .financials(|f| f.roe = 12.0)
                .build(),
            SecurityBuilder::new("SM1")
                .sector("S6")
                .tier(CapTier::Small)
                .pattern(5)
                .build(),
        ]);
        let c = ctx(RiskProfile::Conservative, Horizon::Medium);
        // conservative: round(8 * 0.20) = 2 mid, round(8 * 0.05) = 0 small
        let out = allocate(filter_by_risk(&universe, &c), &c);
        assert_eq!(symbols(&out), vec!["L1", "L2", "M1", "M2"]);
    }

    #[test]
    fn sector_cap_keeps_three_per_sector() {
        let mut securities: Vec<Security> = (0..5)
            .map(|i| {
                SecurityBuilder::new(&format!("T{i}"))
                    .sector("Technology")
                    .pattern(i)
                    .build()
            })
            .collect();
        securities.push(SecurityBuilder::new("E").sector("Energy").pattern(5).build());
        let universe = scored(securities);
        let c = ctx(RiskProfile::Moderate, Horizon::Medium);
        let out = allocate(filter_by_risk(&universe, &c), &c);
        let tech = out
            .iter()
            .filter(|a| a.scored.security.sector == "Technology")
            .count();
        assert_eq!(tech, 3);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn correlated_pair_loses_weaker_member() {
        let universe = scored(vec![
            SecurityBuilder::new("P1")
                .sector("S1")
                .pattern(0)
                .financials(|f| f.roe = 30.0)
                .build(),
            SecurityBuilder::new("P2").sector("S2").pattern(0).build(),
            SecurityBuilder::new("Q1").sector("S3").pattern(1).build(),
            SecurityBuilder::new("Q2").sector("S4").pattern(2).build(),
            SecurityBuilder::new("Q3").sector("S5").pattern(3).build(),
        ]);
        let c = ctx(RiskProfile::Moderate, Horizon::Medium);
        let out = allocate(filter_by_risk(&universe, &c), &c);
        assert_eq!(symbols(&out), vec!["P1", "Q1", "Q2", "Q3"]);
    }

    #[test]
    fn equal_scores_drop_greater_symbol() {
        let universe = scored(vec![
            SecurityBuilder::new("TIEB").sector("S1").pattern(0).build(),
            SecurityBuilder::new("TIEA").sector("S2").pattern(0).build(),
            SecurityBuilder::new("Q1").sector("S3").pattern(1).build(),
            SecurityBuilder::new("Q2").sector("S4").pattern(2).build(),
        ]);
        let c = ctx(RiskProfile::Moderate, Horizon::Medium);
        let out = allocate(filter_by_risk(&universe, &c), &c);
        assert_eq!(symbols(&out), vec!["Q1", "Q2", "TIEA"]);
    }

    #[test]
    fn small_sets_are_not_pruned() {
        let universe = scored(vec![
            SecurityBuilder::new("A").sector("S1").pattern(0).build(),
            SecurityBuilder::new("B").sector("S2").pattern(0).build(),
            SecurityBuilder::new("C").sector("S3").pattern(1).build(),
        ]);
        let c = ctx(RiskProfile::Moderate, Horizon::Medium);
        assert_eq!(allocate(filter_by_risk(&universe, &c), &c).len(), 3);
    }

    #[test]
    fn weights_are_capped_and_floored() {
        let universe = scored(
            (0..11)
                .map(|i| {
                    SecurityBuilder::new(&format!("S{i:02}"))
                        .sector(&format!("Sector{i}"))
                        .tier(CapTier::ALL[i % 3])
                        .pattern(i)
                        .build()
                })
                .collect(),
        );
        let c = ctx(RiskProfile::Aggressive, Horizon::Long);
        let out = allocate(filter_by_risk(&universe, &c), &c);
        assert_eq!(out.len(), 11);
        let sum: f64 = out.iter().map(|a| a.percentage).sum();
        assert!(sum <= 100.0);
        for a in &out {
            assert!(a.weight <= 0.10);
            assert!(a.percentage <= a.weight * 100.0 + 1e-9);
            assert_eq!(a.capital, (1_000_000.0 * a.weight).round());
        }
    }

    #[test]
    fn nothing_eligible_allocates_nothing() {
        let c = ctx(RiskProfile::Conservative, Horizon::Short);
        assert!(allocate(Vec::new(), &c).is_empty());
        assert_eq!(floor_percent(0.0), 0.0);
        assert_eq!(floor_percent(0.12), 12.0);
        assert_eq!(floor_percent(0.0666), 6.6);
    }
}
