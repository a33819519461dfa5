//! Symmetry-normalized price catalog for one material.
//!
//! Producers quote the same physical stock in either orientation and may
//! repeat offers across responses. The catalog folds every offer onto the
//! `(min(w, h), max(w, h))` key and keeps the cheapest cost per key, so the
//! solver only ever sees one canonical price per stock rectangle.

use hashbrown::HashMap;

use crate::{PriceEntry, PriceList, INFINITE_COST};

/// Aggregated, deduplicated price table for a single material.
///
/// The catalog is a value type: the broker merges producer responses into it
/// under its catalog lock and hands read-only snapshots to workers.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    prices: HashMap<(u32, u32), f64>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a single price list.
    pub fn from_price_list(list: &PriceList) -> Self {
        let mut catalog = Self::new();
        catalog.merge(list);
        catalog
    }

    /// Merge a producer's price list into the catalog.
    ///
    /// Entries with a zero dimension are skipped. For each surviving entry
    /// the normalized key keeps the minimum cost across the union of the
    /// existing table and the incoming list.
    pub fn merge(&mut self, list: &PriceList) {
        for entry in &list.entries {
            if entry.width == 0 || entry.height == 0 {
                continue;
            }
            let key = entry.normalized_key();
            match self.prices.get_mut(&key) {
                Some(cost) => {
                    if entry.unit_cost < *cost {
                        *cost = entry.unit_cost;
                    }
                }
                None => {
                    self.prices.insert(key, entry.unit_cost);
                }
            }
        }
    }

    /// Cheapest direct purchase cost for a `w × h` rectangle, in either
    /// orientation. [`INFINITE_COST`] when no producer stocks it.
    #[inline]
    pub fn base_cost(&self, width: u32, height: u32) -> f64 {
        let key = (width.min(height), width.max(height));
        self.prices.get(&key).copied().unwrap_or(INFINITE_COST)
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// The normalized entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = PriceEntry> + '_ {
        self.prices
            .iter()
            .map(|(&(w, h), &cost)| PriceEntry::new(w, h, cost))
    }
}
