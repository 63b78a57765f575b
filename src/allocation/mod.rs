//! Allocation engine
//!
//! Deterministic pipeline from a completed intake to a plan:
//! RULE TABLE → BOOST/NORMALIZE → SAMPLE → BUILD → VERIFY
//!
//! Everything here is pure computation over immutable inputs and is safe to
//! share across concurrent turns.

pub mod plan;
pub mod rules;
pub mod sampler;
pub mod weights;

pub use rules::{base_weights, return_band};
pub use sampler::{RandomSampler, Recommender};
pub use weights::{adjust, WeightTable};

use crate::catalog::InstrumentCatalog;
use crate::models::{AllocationPlan, IntakeRequest};
use crate::verification::{create_default_plan_verifier, PlanVerifier};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AllocationEngine {
    catalog: Arc<InstrumentCatalog>,
    recommender: Arc<dyn Recommender>,
    verifier: PlanVerifier,
}

impl AllocationEngine {
    pub fn new(catalog: Arc<InstrumentCatalog>, recommender: Arc<dyn Recommender>) -> Self {
        Self {
            catalog,
            recommender,
            verifier: create_default_plan_verifier(),
        }
    }

    /// Final, preference-adjusted weights for an intake
    pub fn final_weights(&self, intake: &IntakeRequest) -> WeightTable {
        adjust(&base_weights(intake.risk_tier), &intake.preferred_tags)
    }

    pub fn generate(&self, intake: &IntakeRequest) -> AllocationPlan {
        let weights = self.final_weights(intake);
        let plan = plan::build(intake, &weights, &self.catalog, self.recommender.as_ref());

        let report = self.verifier.verify(intake, &weights, &plan);
        if !report.verified {
            warn!(
                failed = report.failures().count(),
                "Plan generated with invariant violations"
            );
        }

        info!(
            risk_tier = %intake.risk_tier,
            lump_sum_lines = plan.lump_sum.len(),
            recurring_lines = plan.recurring.len(),
            lump_sum_total = plan.lump_sum_total(),
            "Allocation plan generated"
        );

        plan
    }
}
