use serde::{Deserialize, Serialize};

/// Percentage points a position may drift before a signal fires.
pub const DEFAULT_DRIFT_TOLERANCE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDrift {
    pub symbol: String,
    pub current_allocation: f64,
    pub target_allocation: f64,
    pub current_price: f64,
}

impl PositionDrift {
    fn drift(&self) -> f64 {
        self.current_allocation - self.target_allocation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceSignal {
    pub stock_symbol: String,
    pub current_allocation: f64,
    pub target_allocation: f64,
    pub action: RebalanceAction,
    pub quantity: u64,
    pub reason: String,
}

/// Signals for positions drifting more than `tolerance` points, largest drift first.
pub fn rebalance_signals(positions: &[PositionDrift], tolerance: f64) -> Vec<RebalanceSignal> {
    let mut drifting: Vec<&PositionDrift> = positions
        .iter()
        .filter(|p| p.drift().abs() > tolerance)
        .collect();
    drifting.sort_by(|a, b| b.drift().abs().total_cmp(&a.drift().abs()));

    drifting
        .into_iter()
        .map(|p| {
            let drift = p.drift();
            let quantity = if p.current_price > 0.0 {
                (-drift * 100.0 / p.current_price).round().abs() as u64
            } else {
                0
            };
            let (action, reason) = if drift > 0.0 {
                (
                    RebalanceAction::Sell,
                    format!(
                        "Over-allocated by {drift:.1}% — reduce to maintain target balance"
                    ),
                )
            } else {
                (
                    RebalanceAction::Buy,
                    format!(
                        "Under-allocated by {:.1}% — increase to meet target allocation",
                        -drift
                    ),
                )
            };
            RebalanceSignal {
                stock_symbol: p.symbol.clone(),
                current_allocation: p.current_allocation,
                target_allocation: p.target_allocation,
                action,
                quantity,
                reason,
            }
        })
        .collect()
}
