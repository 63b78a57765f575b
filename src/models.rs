//! Core data models for the portfolio advisor

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AdvisorError;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }
}

impl FromStr for RiskTier {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskTier::Low),
            "medium" => Ok(RiskTier::Medium),
            "high" => Ok(RiskTier::High),
            _ => Err(AdvisorError::UnknownRiskTier(s.to_string())),
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Investment bucket a weight and a catalog are keyed by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AssetClass {
    #[serde(rename = "Direct Equity")]
    DirectEquity,
    #[serde(rename = "Equity Funds")]
    EquityFunds,
    #[serde(rename = "Debt Instruments")]
    Debt,
    #[serde(rename = "Gold")]
    Gold,
}

impl AssetClass {
    pub const ALL: [AssetClass; 4] = [
        AssetClass::DirectEquity,
        AssetClass::EquityFunds,
        AssetClass::Debt,
        AssetClass::Gold,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            AssetClass::DirectEquity => "Direct Equity",
            AssetClass::EquityFunds => "Equity Funds",
            AssetClass::Debt => "Debt Instruments",
            AssetClass::Gold => "Gold",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

//
// ================= Intake =================
//

/// A completed, validated intake; the only input the allocation engine accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeRequest {
    pub capital: u64,
    pub monthly_contribution: u64,
    pub risk_tier: RiskTier,
    pub preferred_tags: Vec<String>,
}

//
// ================= Plan =================
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub details: String,
}

impl Instrument {
    pub fn new(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub asset_class: AssetClass,
    pub amount: u64,
    /// Fraction of the total (0.4 means 40%)
    pub percentage: f64,
    pub recommendations: Vec<Instrument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub risk_profile: RiskTier,
    pub projected_return_estimate: String,
    #[serde(rename = "lump_sum_allocation")]
    pub lump_sum: Vec<AllocationLine>,
    #[serde(rename = "monthly_sip_allocation")]
    pub recurring: Vec<AllocationLine>,
}

impl AllocationPlan {
    pub fn lump_sum_total(&self) -> u64 {
        self.lump_sum.iter().map(|line| line.amount).sum()
    }

    pub fn recurring_total(&self) -> u64 {
        self.recurring.iter().map(|line| line.amount).sum()
    }
}
