//! Policy tables: factor weights, risk-profile rules and grade bands.
//!
//! These are the tunable knobs of the engine. Algorithms read them from here
//! instead of carrying inline literals, and tests assert on them directly.

use crate::domain::investor::{Horizon, RiskProfile};
use crate::domain::security::CapTier;
use serde::{Deserialize, Serialize};

/// Minimum number of historical closes for trend, volatility and correlation work.
pub const MIN_HISTORY_POINTS: usize = 3;

/// Neutral sub-score used when price history is too short.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// The eight scoring dimensions, in composite order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Fundamental,
    Growth,
    Risk,
    Valuation,
    Liquidity,
    Stability,
    Volatility,
    CapitalEfficiency,
}

impl Factor {
    pub const ALL: [Factor; 8] = [
        Factor::Fundamental,
        Factor::Growth,
        Factor::Risk,
        Factor::Valuation,
        Factor::Liquidity,
        Factor::Stability,
        Factor::Volatility,
        Factor::CapitalEfficiency,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Factor::Fundamental => "fundamental",
            Factor::Growth => "growth",
            Factor::Risk => "risk",
            Factor::Valuation => "valuation",
            Factor::Liquidity => "liquidity",
            Factor::Stability => "stability",
            Factor::Volatility => "volatility",
            Factor::CapitalEfficiency => "capital_efficiency",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Factor::Fundamental => "Financial Strength",
            Factor::Growth => "Growth Potential",
            Factor::Risk => "Risk Exposure",
            Factor::Valuation => "Valuation Attractiveness",
            Factor::Liquidity => "Market Liquidity",
            Factor::Stability => "Market Stability",
            Factor::Volatility => "Volatility Profile",
            Factor::CapitalEfficiency => "Capital Efficiency",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub fundamental: f64,
    pub growth: f64,
    pub risk: f64,
    pub valuation: f64,
    pub liquidity: f64,
    pub stability: f64,
    pub volatility: f64,
    pub capital_efficiency: f64,
}

pub const FACTOR_WEIGHTS: FactorWeights = FactorWeights {
    fundamental: 0.20,
    growth: 0.15,
    risk: 0.15,
    valuation: 0.10,
    liquidity: 0.08,
    stability: 0.12,
    volatility: 0.10,
    capital_efficiency: 0.10,
};

impl FactorWeights {
    pub fn weight(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Fundamental => self.fundamental,
            Factor::Growth => self.growth,
            Factor::Risk => self.risk,
            Factor::Valuation => self.valuation,
            Factor::Liquidity => self.liquidity,
            Factor::Stability => self.stability,
            Factor::Volatility => self.volatility,
            Factor::CapitalEfficiency => self.capital_efficiency,
        }
    }

    pub fn total(&self) -> f64 {
        Factor::ALL.iter().map(|f| self.weight(*f)).sum()
    }
}

/// Target share of positions per capitalisation tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierTargets {
    pub large: f64,
    pub mid: f64,
    pub small: f64,
}

impl TierTargets {
    pub fn fraction(&self, tier: CapTier) -> f64 {
        match tier {
            CapTier::Large => self.large,
            CapTier::Mid => self.mid,
            CapTier::Small => self.small,
        }
    }
}

/// Eligibility and sizing rules for one risk profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    pub min_composite: f64,
    pub max_positions: usize,
    pub tier_targets: TierTargets,
    /// Ceiling on a single position's weight, as a fraction of capital.
    pub max_position_weight: f64,
    /// Extra balance-sheet and volatility screen.
    pub screen: Option<RiskScreen>,
    /// Return multiplier used by expected-return estimation.
    pub return_adjustment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskScreen {
    pub max_debt_to_equity: f64,
    pub max_beta: f64,
    pub min_volatility_score: f64,
}

pub const CONSERVATIVE: RiskPolicy = RiskPolicy {
    min_composite: 55.0,
    max_positions: 8,
    tier_targets: TierTargets {
        large: 0.75,
        mid: 0.20,
        small: 0.05,
    },
    max_position_weight: 0.15,
    screen: Some(RiskScreen {
        max_debt_to_equity: 1.5,
        max_beta: 1.3,
        min_volatility_score: 35.0,
    }),
    return_adjustment: 0.7,
};

pub const MODERATE: RiskPolicy = RiskPolicy {
    min_composite: 45.0,
    max_positions: 12,
    tier_targets: TierTargets {
        large: 0.55,
        mid: 0.30,
        small: 0.15,
    },
    max_position_weight: 0.12,
    screen: None,
    return_adjustment: 1.0,
};

pub const AGGRESSIVE: RiskPolicy = RiskPolicy {
    min_composite: 35.0,
    max_positions: 15,
    tier_targets: TierTargets {
        large: 0.30,
        mid: 0.35,
        small: 0.35,
    },
    max_position_weight: 0.10,
    screen: None,
    return_adjustment: 1.3,
};

impl RiskProfile {
    pub fn policy(self) -> &'static RiskPolicy {
        match self {
            RiskProfile::Conservative => &CONSERVATIVE,
            RiskProfile::Moderate => &MODERATE,
            RiskProfile::Aggressive => &AGGRESSIVE,
        }
    }
}

/// Liquidity and stability screen applied to short-horizon portfolios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonScreen {
    pub min_avg_volume: f64,
    pub min_stability_score: f64,
}

pub const SHORT_HORIZON_SCREEN: HorizonScreen = HorizonScreen {
    min_avg_volume: 1_000_000.0,
    min_stability_score: 30.0,
};

impl Horizon {
    pub fn screen(self) -> Option<&'static HorizonScreen> {
        match self {
            Horizon::Short => Some(&SHORT_HORIZON_SCREEN),
            Horizon::Medium | Horizon::Long => None,
        }
    }

    /// Scales decision-level return potential.
    pub fn return_potential_multiplier(self) -> f64 {
        match self {
            Horizon::Short => 0.75,
            Horizon::Medium => 1.0,
            Horizon::Long => 1.3,
        }
    }

    /// Scales per-position expected return in portfolios.
    pub fn expected_return_multiplier(self) -> f64 {
        match self {
            Horizon::Short => 0.8,
            Horizon::Medium => 1.0,
            Horizon::Long => 1.3,
        }
    }
}

pub const MAX_PER_SECTOR: usize = 3;

/// Correlation pruning kicks in only above this many positions.
pub const PRUNE_MIN_POSITIONS: usize = 3;
pub const PRUNE_CORRELATION: f64 = 0.85;

pub const CORRELATION_REDUCES_BELOW: f64 = -0.2;
pub const CORRELATION_INCREASES_ABOVE: f64 = 0.7;

/// Decision score at or above which the verdict is INVEST.
pub const INVEST_THRESHOLD: f64 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionWeights {
    pub composite: f64,
    pub return_potential: f64,
    pub time_horizon: f64,
    pub capital_efficiency: f64,
    pub portfolio_fit: f64,
    pub confidence: f64,
}

pub const DECISION_WEIGHTS: DecisionWeights = DecisionWeights {
    composite: 0.30,
    return_potential: 0.20,
    time_horizon: 0.15,
    capital_efficiency: 0.15,
    portfolio_fit: 0.10,
    confidence: 0.10,
};

impl DecisionWeights {
    pub fn total(&self) -> f64 {
        self.composite
            + self.return_potential
            + self.time_horizon
            + self.capital_efficiency
            + self.portfolio_fit
            + self.confidence
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    F,
    D,
    C,
    B,
    #[serde(rename = "B+")]
    BPlus,
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// First band whose floor the score reaches, scanning downwards.
    pub fn for_score(score: f64) -> Grade {
        GRADE_BANDS
            .iter()
            .find(|(floor, _)| score >= *floor)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::F)
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const GRADE_BANDS: [(f64, Grade); 7] = [
    (85.0, Grade::APlus),
    (72.0, Grade::A),
    (60.0, Grade::BPlus),
    (48.0, Grade::B),
    (35.0, Grade::C),
    (20.0, Grade::D),
    (0.0, Grade::F),
];
