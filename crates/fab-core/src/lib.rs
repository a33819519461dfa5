//! # fab-core: Welding Brokerage Domain Model
//!
//! Provides the shared data model for the welding-cost brokerage: materials,
//! producer price lists, symmetry-normalized catalogs, and customer order
//! batches.
//!
//! ## Model
//!
//! - A **material** is a kind of stock identified by a nonzero integer id.
//! - Producers publish **price lists**: purchasable stock rectangles with a
//!   unit cost. A `(w, h)` rectangle and its `(h, w)` rotation are the same
//!   stock, so lists are folded into a [`Catalog`] keyed by
//!   `(min(w, h), max(w, h))`, keeping the cheapest offer per key.
//! - Customers submit **order batches**: a material plus the rectangles they
//!   want produced. Each [`OrderItem`] carries a weld-strength coefficient
//!   and receives its computed cost in place.
//!
//! Producers and customers themselves are external actors. They are modeled
//! as the small capability traits [`Producer`] and [`Customer`] and handed to
//! the broker as trait objects.
//!
//! ## Impossibility sentinel
//!
//! A rectangle that cannot be produced from a catalog costs
//! [`INFINITE_COST`], a large finite `f64`. Costs are only ever compared
//! with strict `<`, so the sentinel needs no special casing in the solver.

use serde::{Deserialize, Serialize};

pub mod actors;
pub mod catalog;

pub use actors::{Customer, Producer, ProducerKey};
pub use catalog::Catalog;

/// Cost sentinel for rectangles that cannot be produced.
///
/// Finite so that ordinary `<` comparisons stay well-defined; any real
/// production plan is cheaper.
pub const INFINITE_COST: f64 = f64::MAX;

/// Identifier of a stock material.
///
/// Zero is reserved as "no material": price lists carrying it are rejected
/// at the broker boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(u32);

impl MaterialId {
    #[inline]
    pub fn new(value: u32) -> Self {
        MaterialId(value)
    }
    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }
    /// True for the reserved zero id.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// One purchasable stock rectangle offered by a producer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// Stock width, strictly positive.
    pub width: u32,
    /// Stock height, strictly positive.
    pub height: u32,
    /// Cost of one such rectangle.
    pub unit_cost: f64,
}

impl PriceEntry {
    pub fn new(width: u32, height: u32, unit_cost: f64) -> Self {
        Self {
            width,
            height,
            unit_cost,
        }
    }

    /// Orientation-independent catalog key: `(min, max)` of the dimensions.
    #[inline]
    pub fn normalized_key(&self) -> (u32, u32) {
        (
            self.width.min(self.height),
            self.width.max(self.height),
        )
    }
}

/// A producer's price list for one material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceList {
    pub material: MaterialId,
    pub entries: Vec<PriceEntry>,
}

impl PriceList {
    pub fn new(material: MaterialId) -> Self {
        Self {
            material,
            entries: Vec::new(),
        }
    }

    pub fn with_entries(material: MaterialId, entries: Vec<PriceEntry>) -> Self {
        Self { material, entries }
    }

    /// Append one offer.
    pub fn add(&mut self, width: u32, height: u32, unit_cost: f64) -> &mut Self {
        self.entries.push(PriceEntry::new(width, height, unit_cost));
        self
    }
}

/// One rectangle a customer wants produced.
///
/// `cost` is an output slot: it starts at [`INFINITE_COST`] and is filled by
/// the solver when the batch passes through the broker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Target width, strictly positive.
    pub width: u32,
    /// Target height, strictly positive.
    pub height: u32,
    /// Cost coefficient per unit of weld length.
    pub weld_strength: f64,
    /// Computed production cost; [`INFINITE_COST`] when unsolved or
    /// unproducible.
    pub cost: f64,
}

impl OrderItem {
    pub fn new(width: u32, height: u32, weld_strength: f64) -> Self {
        Self {
            width,
            height,
            weld_strength,
            cost: INFINITE_COST,
        }
    }

    /// True once a finite production cost has been computed.
    #[inline]
    pub fn is_solved(&self) -> bool {
        self.cost < INFINITE_COST
    }
}

/// A customer's order batch: one material, many target rectangles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBatch {
    pub material: MaterialId,
    pub items: Vec<OrderItem>,
}

impl OrderBatch {
    pub fn new(material: MaterialId) -> Self {
        Self {
            material,
            items: Vec::new(),
        }
    }

    pub fn with_items(material: MaterialId, items: Vec<OrderItem>) -> Self {
        Self { material, items }
    }

    pub fn add(&mut self, width: u32, height: u32, weld_strength: f64) -> &mut Self {
        self.items.push(OrderItem::new(width, height, weld_strength));
        self
    }
}
