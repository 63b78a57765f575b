//! Plan verification
//!
//! Rules-based invariant checks run over every generated plan.
//! A failed rule means an engine bug, not bad user input: it is logged and
//! asserted on in tests, never surfaced to the user.

use crate::allocation::weights::WeightTable;
use crate::models::{AllocationPlan, IntakeRequest};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Trait for plan invariants
pub trait PlanRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn verify(
        &self,
        intake: &IntakeRequest,
        weights: &WeightTable,
        plan: &AllocationPlan,
    ) -> RuleCheck;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub passed: bool,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedCheck {
    pub rule_name: String,
    pub passed: bool,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verified: bool,
    pub checks: Vec<NamedCheck>,
}

impl VerificationReport {
    pub fn failures(&self) -> impl Iterator<Item = &NamedCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Verification engine that runs every registered rule
pub struct PlanVerifier {
    rules: Vec<Box<dyn PlanRule>>,
}

impl PlanVerifier {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Box<dyn PlanRule>) {
        self.rules.push(rule);
    }

    pub fn verify(
        &self,
        intake: &IntakeRequest,
        weights: &WeightTable,
        plan: &AllocationPlan,
    ) -> VerificationReport {
        let checks: Vec<NamedCheck> = self
            .rules
            .iter()
            .map(|rule| {
                let result = rule.verify(intake, weights, plan);
                if !result.passed {
                    error!(rule = rule.name(), details = %result.details, "Plan invariant violated");
                }
                NamedCheck {
                    rule_name: rule.name().to_string(),
                    passed: result.passed,
                    details: result.details,
                }
            })
            .collect();

        let verified = checks.iter().all(|c| c.passed);

        info!(
            rule_count = self.rules.len(),
            verified = verified,
            "Plan verification completed"
        );

        VerificationReport { verified, checks }
    }
}

impl Default for PlanVerifier {
    fn default() -> Self {
        Self::new()
    }
}

//
// ========== Plan Rules ==========
//

/// Final weights sum to 1.0, unless every weight is zero
pub struct WeightsSumToOneRule;

impl PlanRule for WeightsSumToOneRule {
    fn name(&self) -> &'static str {
        "weights_sum_to_one"
    }

    fn verify(&self, _intake: &IntakeRequest, weights: &WeightTable, _plan: &AllocationPlan) -> RuleCheck {
        let sum = weights.sum();
        if weights.iter().all(|(_, w)| w == 0.0) {
            return RuleCheck {
                passed: true,
                details: "All-zero weight table left unnormalized".to_string(),
            };
        }

        RuleCheck {
            passed: (sum - 1.0).abs() < WEIGHT_TOLERANCE,
            details: format!("Weight sum: {:.12}", sum),
        }
    }
}

/// Floored lump-sum lines never exceed the capital
pub struct LumpSumWithinCapitalRule;

impl PlanRule for LumpSumWithinCapitalRule {
    fn name(&self) -> &'static str {
        "lump_sum_within_capital"
    }

    fn verify(&self, intake: &IntakeRequest, _weights: &WeightTable, plan: &AllocationPlan) -> RuleCheck {
        let total = plan.lump_sum_total();
        RuleCheck {
            passed: total <= intake.capital,
            details: format!("Lump sum {} of capital {}", total, intake.capital),
        }
    }
}

/// Recurring lines never exceed the monthly contribution
pub struct RecurringWithinContributionRule;

impl PlanRule for RecurringWithinContributionRule {
    fn name(&self) -> &'static str {
        "recurring_within_contribution"
    }

    fn verify(&self, intake: &IntakeRequest, _weights: &WeightTable, plan: &AllocationPlan) -> RuleCheck {
        let total = plan.recurring_total();
        RuleCheck {
            passed: total <= intake.monthly_contribution,
            details: format!(
                "Recurring {} of monthly contribution {}",
                total, intake.monthly_contribution
            ),
        }
    }
}

/// Every recurring line carries a positive amount
pub struct RecurringLinesPositiveRule;

impl PlanRule for RecurringLinesPositiveRule {
    fn name(&self) -> &'static str {
        "recurring_lines_positive"
    }

    fn verify(&self, _intake: &IntakeRequest, _weights: &WeightTable, plan: &AllocationPlan) -> RuleCheck {
        let zero_lines = plan.recurring.iter().filter(|l| l.amount == 0).count();
        RuleCheck {
            passed: zero_lines == 0,
            details: format!("Zero-amount recurring lines: {}", zero_lines),
        }
    }
}

/// Create a verifier with the standard plan invariants
pub fn create_default_plan_verifier() -> PlanVerifier {
    let mut verifier = PlanVerifier::new();
    verifier.add_rule(Box::new(WeightsSumToOneRule));
    verifier.add_rule(Box::new(LumpSumWithinCapitalRule));
    verifier.add_rule(Box::new(RecurringWithinContributionRule));
    verifier.add_rule(Box::new(RecurringLinesPositiveRule));
    verifier
}

//
// ================= Tests =================
//
