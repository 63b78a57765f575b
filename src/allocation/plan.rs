//! Plan builder
//!
//! Turns final weights and the intake's money amounts into lump-sum and
//! recurring allocation lines. Amounts are floored; the rounding remainder is
//! not redistributed, so line totals may fall short of the inputs.

use crate::allocation::rules::return_band;
use crate::allocation::sampler::Recommender;
use crate::allocation::weights::WeightTable;
use crate::catalog::InstrumentCatalog;
use crate::models::{AllocationLine, AllocationPlan, IntakeRequest};

/// `floor(total * weight)`, capped at `total`
pub fn floor_amount(total: u64, weight: f64) -> u64 {
    ((total as f64 * weight).floor() as u64).min(total)
}

/// Floored amount per weight. Float error on large totals can push the sum a
/// few units past `total`; the overshoot is taken back from the largest lines.
/// A shortfall is left as is.
pub fn floor_amounts(total: u64, weights: &WeightTable) -> Vec<u64> {
    let mut amounts: Vec<u64> = weights.iter().map(|(_, weight)| floor_amount(total, weight)).collect();

    let mut excess = amounts.iter().sum::<u64>().saturating_sub(total);
    while excess > 0 {
        let Some(largest) = amounts.iter_mut().max() else {
            break;
        };
        let cut = excess.min(*largest);
        if cut == 0 {
            break;
        }
        *largest -= cut;
        excess -= cut;
    }
    amounts
}

pub fn build(
    intake: &IntakeRequest,
    weights: &WeightTable,
    catalog: &InstrumentCatalog,
    recommender: &dyn Recommender,
) -> AllocationPlan {
    let lump_sum_amounts = floor_amounts(intake.capital, weights);
    let recurring_amounts = floor_amounts(intake.monthly_contribution, weights);

    let mut lump_sum = Vec::with_capacity(weights.len());
    let mut recurring = Vec::with_capacity(weights.len());

    for (i, (asset_class, weight)) in weights.iter().enumerate() {
        // One draw per class, shared by both lines
        let recommendations = recommender.recommend(asset_class, catalog);

        if recurring_amounts[i] > 0 {
            recurring.push(AllocationLine {
                asset_class,
                amount: recurring_amounts[i],
                percentage: weight,
                recommendations: recommendations.clone(),
            });
        }

        lump_sum.push(AllocationLine {
            asset_class,
            amount: lump_sum_amounts[i],
            percentage: weight,
            recommendations,
        });
    }

    AllocationPlan {
        risk_profile: intake.risk_tier,
        projected_return_estimate: return_band(intake.risk_tier).to_string(),
        lump_sum,
        recurring,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::rules::base_weights;
    use crate::allocation::weights::adjust;
    use crate::models::{AssetClass, Instrument, RiskTier};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic recommender: first two instruments, counting calls
    struct FirstTwo {
        calls: AtomicUsize,
    }

    impl Recommender for FirstTwo {
        fn recommend(&self, asset_class: AssetClass, catalog: &InstrumentCatalog) -> Vec<Instrument> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            catalog.instruments(asset_class).iter().take(2).cloned().collect()
        }
    }

    fn first_two() -> FirstTwo {
        FirstTwo {
            calls: AtomicUsize::new(0),
        }
    }

    fn intake(capital: u64, monthly: u64, tier: RiskTier, tags: &[&str]) -> IntakeRequest {
        IntakeRequest {
            capital,
            monthly_contribution: monthly,
            risk_tier: tier,
            preferred_tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_scenario_medium_with_stocks() {
        let req = intake(100_000, 10_000, RiskTier::Medium, &["stocks"]);
        let weights = adjust(&base_weights(req.risk_tier), &req.preferred_tags);
        let recommender = first_two();
        let plan = build(&req, &weights, &InstrumentCatalog::builtin(), &recommender);

        assert_eq!(plan.risk_profile, RiskTier::Medium);
        assert_eq!(plan.projected_return_estimate, "9–12% p.a.");
        assert_eq!(plan.lump_sum.len(), 4);

        let direct = plan
            .lump_sum
            .iter()
            .find(|l| l.asset_class == AssetClass::DirectEquity)
            .unwrap();
        assert!((direct.percentage - 0.11765).abs() < 1e-4);
        // 100000 * 0.1176470588... floors to 11764
        assert_eq!(direct.amount, 11_764);

        assert_eq!(recommender.calls.load(Ordering::SeqCst), 4);
        assert!(plan.lump_sum_total() <= req.capital);
        assert!(plan.recurring_total() <= req.monthly_contribution);
    }

    #[test]
    fn test_lines_follow_table_order_and_share_recommendations() {
        let req = intake(50_000, 5_000, RiskTier::High, &[]);
        let weights = adjust(&base_weights(req.risk_tier), &req.preferred_tags);
        let plan = build(&req, &weights, &InstrumentCatalog::builtin(), &first_two());

        let order: Vec<_> = plan.lump_sum.iter().map(|l| l.asset_class).collect();
        assert_eq!(
            order,
            vec![
                AssetClass::DirectEquity,
                AssetClass::EquityFunds,
                AssetClass::Debt,
                AssetClass::Gold
            ]
        );
        for (lump, sip) in plan.lump_sum.iter().zip(plan.recurring.iter()) {
            assert_eq!(lump.asset_class, sip.asset_class);
            assert_eq!(lump.recommendations, sip.recommendations);
            assert!(lump.recommendations.len() <= 2);
        }
    }

    #[test]
    fn test_zero_monthly_contribution_omits_recurring_lines() {
        let req = intake(10_000, 0, RiskTier::Low, &["gold"]);
        let weights = adjust(&base_weights(req.risk_tier), &req.preferred_tags);
        let plan = build(&req, &weights, &InstrumentCatalog::builtin(), &first_two());

        assert_eq!(plan.lump_sum.len(), 3);
        assert!(plan.recurring.is_empty());
    }

    #[test]
    fn test_tiny_amounts_keep_zero_lump_sum_lines() {
        // Gold at ~10% of 5 floors to 0 but the lump-sum line stays
        let req = intake(5, 5, RiskTier::Medium, &[]);
        let weights = adjust(&base_weights(req.risk_tier), &req.preferred_tags);
        let plan = build(&req, &weights, &InstrumentCatalog::builtin(), &first_two());

        assert_eq!(plan.lump_sum.len(), 4);
        let gold = plan
            .lump_sum
            .iter()
            .find(|l| l.asset_class == AssetClass::Gold)
            .unwrap();
        assert_eq!(gold.amount, 0);
        assert!(plan.recurring.iter().all(|l| l.amount > 0));
        assert!(plan.recurring.len() < plan.lump_sum.len());
    }

    #[test]
    fn test_lump_sum_never_exceeds_capital() {
        let recommender = first_two();
        let catalog = InstrumentCatalog::empty();
        for tier in RiskTier::ALL {
            for capital in [0u64, 1, 7, 99, 1_001, 33_333, 100_000, 9_876_543] {
                let req = intake(capital, capital / 3, tier, &["stocks", "gold"]);
                let weights = adjust(&base_weights(tier), &req.preferred_tags);
                let plan = build(&req, &weights, &catalog, &recommender);
                assert!(plan.lump_sum_total() <= capital);
                assert!(plan.recurring.iter().all(|l| l.amount > 0));
            }
        }
    }

    #[test]
    fn test_lump_sum_bound_holds_at_the_largest_accepted_capital() {
        let recommender = first_two();
        let catalog = InstrumentCatalog::empty();
        let top = crate::intake::coerce::MAX_AMOUNT;
        let tag_sets: [&[&str]; 3] = [&[], &["stocks", "gold"], &["bonds", "debt funds", "mutual funds"]];

        for tier in RiskTier::ALL {
            for tags in tag_sets {
                for capital in (top - 200)..=top {
                    let req = intake(capital, capital, tier, tags);
                    let weights = adjust(&base_weights(tier), &req.preferred_tags);
                    let plan = build(&req, &weights, &catalog, &recommender);
                    assert!(plan.lump_sum_total() <= capital, "{:?} {:?} {}", tier, tags, capital);
                    assert!(plan.recurring_total() <= capital);
                }
            }
        }
    }

    #[test]
    fn test_floor_amounts_takes_overshoot_from_largest_line() {
        // Above 2^53 the cast rounds 9007199254740995 up to ...996
        let total = 9_007_199_254_740_995u64;
        let weights = WeightTable::from_entries(vec![(AssetClass::Debt, 0.75), (AssetClass::Gold, 0.25)]);
        let amounts = floor_amounts(total, &weights);
        assert!(amounts.iter().sum::<u64>() <= total);
        assert!(floor_amount(total, 1.0) <= total);

        let small = floor_amounts(10, &weights);
        assert_eq!(small, vec![7, 2]);
    }

    #[test]
    fn test_empty_catalog_still_builds_plan() {
        let catalog = InstrumentCatalog::builtin().with_instruments(AssetClass::Gold, vec![]);
        let req = intake(100_000, 10_000, RiskTier::Medium, &[]);
        let weights = adjust(&base_weights(req.risk_tier), &req.preferred_tags);
        let plan = build(&req, &weights, &catalog, &first_two());

        let gold = plan
            .lump_sum
            .iter()
            .find(|l| l.asset_class == AssetClass::Gold)
            .unwrap();
        assert!(gold.recommendations.is_empty());
        assert!(gold.amount > 0);
    }
}
