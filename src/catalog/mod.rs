//! Instrument catalog
//!
//! Static per-asset-class lists of instruments the sampler draws from.
//! Read-only once loaded. A missing or malformed source file degrades to an
//! empty list for that class, never to an error.

use crate::models::{AssetClass, Instrument};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const MISSING_NAME: &str = "N/A";
const MISSING_DETAILS: &str = "No details available.";

/// Bundled catalog sources, compiled into the binary
const BUILTIN_SOURCES: [(AssetClass, &str); 4] = [
    (AssetClass::DirectEquity, include_str!("../../data/direct_equity.json")),
    (AssetClass::EquityFunds, include_str!("../../data/equity_funds.json")),
    (AssetClass::Debt, include_str!("../../data/debt_instruments.json")),
    (AssetClass::Gold, include_str!("../../data/gold_instruments.json")),
];

/// File name holding the catalog for an asset class
pub fn catalog_file_name(asset_class: AssetClass) -> &'static str {
    match asset_class {
        AssetClass::DirectEquity => "direct_equity.json",
        AssetClass::EquityFunds => "equity_funds.json",
        AssetClass::Debt => "debt_instruments.json",
        AssetClass::Gold => "gold_instruments.json",
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstrumentCatalog {
    by_class: HashMap<AssetClass, Vec<Instrument>>,
}

impl InstrumentCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog built from the bundled `data/*.json` files
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for (asset_class, source) in BUILTIN_SOURCES {
            catalog
                .by_class
                .insert(asset_class, parse_catalog(asset_class, source));
        }
        catalog
    }

    /// Load every asset class from `<dir>/<class file>.json`
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut catalog = Self::empty();

        for asset_class in AssetClass::ALL {
            let path = dir.join(catalog_file_name(asset_class));
            let instruments = match fs::read_to_string(&path) {
                Ok(source) => parse_catalog(asset_class, &source),
                Err(e) => {
                    warn!(
                        asset_class = %asset_class,
                        path = %path.display(),
                        "Catalog file unreadable, using empty list: {}",
                        e
                    );
                    Vec::new()
                }
            };
            catalog.by_class.insert(asset_class, instruments);
        }

        info!(
            dir = %dir.display(),
            instruments = catalog.len(),
            "Instrument catalog loaded"
        );
        catalog
    }

    /// Replace the instruments of one class
    pub fn with_instruments(mut self, asset_class: AssetClass, instruments: Vec<Instrument>) -> Self {
        self.by_class.insert(asset_class, instruments);
        self
    }

    pub fn instruments(&self, asset_class: AssetClass) -> &[Instrument] {
        self.by_class
            .get(&asset_class)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of instruments across all classes
    pub fn len(&self) -> usize {
        self.by_class.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse one catalog source. Anything but a JSON array yields an empty list.
fn parse_catalog(asset_class: AssetClass, source: &str) -> Vec<Instrument> {
    let entries: Vec<Value> = match serde_json::from_str(source) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                asset_class = %asset_class,
                "Catalog source malformed, using empty list: {}",
                e
            );
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(|entry| {
            let Some(obj) = entry.as_object() else {
                debug!(asset_class = %asset_class, "Skipping non-object catalog entry");
                return None;
            };

            let name = obj
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(MISSING_NAME);
            let details = obj
                .get("details")
                .and_then(Value::as_str)
                .or_else(|| obj.get("category").and_then(Value::as_str))
                .unwrap_or(MISSING_DETAILS);

            Some(Instrument::new(name, details))
        })
        .collect()
}
