//! Allocation rule table
//!
//! Fixed base weights per risk tier. Pure, no configuration.

use crate::allocation::weights::WeightTable;
use crate::models::{AssetClass, RiskTier};

/// Base weights for a risk tier, in the order lines are emitted
pub fn base_weights(risk_tier: RiskTier) -> WeightTable {
    use AssetClass::*;

    let entries: &[(AssetClass, f64)] = match risk_tier {
        RiskTier::Low => &[(Debt, 0.70), (Gold, 0.20), (EquityFunds, 0.10)],
        RiskTier::Medium => &[
            (EquityFunds, 0.40),
            (Debt, 0.40),
            (DirectEquity, 0.10),
            (Gold, 0.10),
        ],
        RiskTier::High => &[
            (DirectEquity, 0.40),
            (EquityFunds, 0.30),
            (Debt, 0.20),
            (Gold, 0.10),
        ],
    };

    WeightTable::from_entries(entries.iter().copied())
}

/// Human-readable annual return band quoted with a plan
pub fn return_band(risk_tier: RiskTier) -> &'static str {
    match risk_tier {
        RiskTier::Low => "6–8% p.a.",
        RiskTier::Medium => "9–12% p.a.",
        RiskTier::High => "12–15% p.a.",
    }
}
