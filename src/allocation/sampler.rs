//! Recommendation sampler
//!
//! Draws a bounded, non-repeating subset of instruments per asset class.
//! The randomness source sits behind [`Recommender`] so tests can pin it.

use crate::catalog::InstrumentCatalog;
use crate::models::{AssetClass, Instrument};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Instruments recommended per asset class
pub const DEFAULT_RECOMMENDATIONS: usize = 2;

/// Picks the instruments shown next to an allocation line
pub trait Recommender: Send + Sync {
    fn recommend(&self, asset_class: AssetClass, catalog: &InstrumentCatalog) -> Vec<Instrument>;
}

/// Up to `k` distinct instruments drawn without replacement.
/// Undersized catalogs return everything they have; empty ones return nothing.
pub fn sample<R: Rng + ?Sized>(instruments: &[Instrument], k: usize, rng: &mut R) -> Vec<Instrument> {
    instruments.choose_multiple(rng, k).cloned().collect()
}

/// Random recommender. Each call gets its own RNG, either fresh from entropy
/// or derived from a fixed seed and the asset class.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    seed: Option<u64>,
}

impl RandomSampler {
    pub fn new() -> Self {
        Self { seed: None }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng_for(&self, asset_class: AssetClass) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ class_salt(asset_class)),
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Recommender for RandomSampler {
    fn recommend(&self, asset_class: AssetClass, catalog: &InstrumentCatalog) -> Vec<Instrument> {
        let mut rng = self.rng_for(asset_class);
        sample(catalog.instruments(asset_class), DEFAULT_RECOMMENDATIONS, &mut rng)
    }
}

fn class_salt(asset_class: AssetClass) -> u64 {
    match asset_class {
        AssetClass::DirectEquity => 0x9e37_79b9_7f4a_7c15,
        AssetClass::EquityFunds => 0xbf58_476d_1ce4_e5b9,
        AssetClass::Debt => 0x94d0_49bb_1331_11eb,
        AssetClass::Gold => 0x2545_f491_4f6c_dd1d,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn instruments(n: usize) -> Vec<Instrument> {
        (0..n)
            .map(|i| Instrument::new(format!("Fund {}", i), "test"))
            .collect()
    }

    #[test]
    fn test_sample_is_bounded_and_distinct() {
        let pool = instruments(6);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let picked = sample(&pool, 2, &mut rng);
            assert_eq!(picked.len(), 2);
            let names: HashSet<_> = picked.iter().map(|i| i.name.clone()).collect();
            assert_eq!(names.len(), 2);
            assert!(picked.iter().all(|i| pool.contains(i)));
        }
    }

    #[test]
    fn test_undersized_and_empty_catalogs() {
        let mut rng = StdRng::seed_from_u64(1);
        let single = instruments(1);
        assert_eq!(sample(&single, 2, &mut rng), single);
        assert!(sample(&[], 2, &mut rng).is_empty());
    }

    #[test]
    fn test_seeded_sampler_is_reproducible() {
        let catalog = InstrumentCatalog::empty().with_instruments(AssetClass::Gold, instruments(10));

        let first = RandomSampler::seeded(42).recommend(AssetClass::Gold, &catalog);
        let second = RandomSampler::seeded(42).recommend(AssetClass::Gold, &catalog);
        assert_eq!(first, second);
        assert_eq!(first.len(), DEFAULT_RECOMMENDATIONS);
    }

    #[test]
    fn test_empty_class_yields_no_recommendations() {
        let catalog = InstrumentCatalog::empty();
        assert!(RandomSampler::new().recommend(AssetClass::Debt, &catalog).is_empty());
    }
}
