//! Weight tables, preference boosts and renormalization

use crate::models::AssetClass;
use tracing::debug;

/// Multiplier applied to a class the user asked for
pub const BOOST_FACTOR: f64 = 1.20;

/// Preference token → asset class it boosts
const PREFERENCE_MAP: &[(&str, AssetClass)] = &[
    ("stocks", AssetClass::DirectEquity),
    ("mutual funds", AssetClass::EquityFunds),
    ("bonds", AssetClass::Debt),
    ("debt funds", AssetClass::Debt),
    ("gold", AssetClass::Gold),
];

/// Resolve a free-text preference (case-insensitive, trimmed)
pub fn preference_to_asset_class(token: &str) -> Option<AssetClass> {
    let normalized = token.trim().to_lowercase();
    PREFERENCE_MAP
        .iter()
        .find(|(pref, _)| *pref == normalized)
        .map(|(_, class)| *class)
}

/// Ordered asset class → weight mapping. Insertion order is preserved and
/// drives the order of allocation lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeightTable {
    entries: Vec<(AssetClass, f64)>,
}

impl WeightTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (AssetClass, f64)>) -> Self {
        let mut table = Self::default();
        for (class, weight) in entries {
            table.set(class, weight);
        }
        table
    }

    /// Insert or overwrite; an existing class keeps its position
    pub fn set(&mut self, asset_class: AssetClass, weight: f64) {
        match self.entries.iter_mut().find(|(c, _)| *c == asset_class) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((asset_class, weight)),
        }
    }

    pub fn get(&self, asset_class: AssetClass) -> Option<f64> {
        self.entries
            .iter()
            .find(|(c, _)| *c == asset_class)
            .map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetClass, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn classes(&self) -> impl Iterator<Item = AssetClass> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rescale so the weights sum to 1.0. An all-zero table comes back as-is.
    pub fn normalized(&self) -> WeightTable {
        let total = self.sum();
        if total == 0.0 {
            return self.clone();
        }

        WeightTable {
            entries: self
                .entries
                .iter()
                .map(|(class, weight)| (*class, weight / total))
                .collect(),
        }
    }
}

/// Boost every class named by a preference, then renormalize.
///
/// Tokens that map to nothing, or to a class absent from the table, are
/// ignored. Each token boosts once, so two tokens mapping to the same class
/// compound.
pub fn adjust(base: &WeightTable, preferred_tags: &[String]) -> WeightTable {
    let mut adjusted = base.clone();

    for tag in preferred_tags {
        let Some(asset_class) = preference_to_asset_class(tag) else {
            continue;
        };
        if let Some(weight) = adjusted.get(asset_class) {
            debug!(preference = %tag, asset_class = %asset_class, "Boosting preferred asset class");
            adjusted.set(asset_class, weight * BOOST_FACTOR);
        }
    }

    adjusted.normalized()
}
