//! Memoized evaluation of the guillotine cut/weld recurrence.

use fab_core::{Catalog, OrderBatch, PriceList, INFINITE_COST};

/// Minimum cost of producing a `width × height` rectangle from `catalog`
/// with the given weld-strength coefficient.
///
/// Returns [`INFINITE_COST`] when the rectangle cannot be produced, in
/// particular for zero dimensions or an empty catalog.
pub fn optimal_cost(catalog: &Catalog, width: u32, height: u32, weld_strength: f64) -> f64 {
    if width == 0 || height == 0 {
        return INFINITE_COST;
    }
    let mut memo = Memo::new(width, height, weld_strength);
    memo.solve(catalog, width, height)
}

/// Fill the cost of every item in `batch` against `catalog`.
pub fn solve_batch(catalog: &Catalog, batch: &mut OrderBatch) {
    for item in &mut batch.items {
        item.cost = optimal_cost(catalog, item.width, item.height, item.weld_strength);
    }
}

/// Synchronous single-batch helper: solve `batch` directly against one
/// producer's price list, without going through a broker.
pub fn seq_solve(price_list: &PriceList, batch: &mut OrderBatch) {
    let catalog = Catalog::from_price_list(price_list);
    solve_batch(&catalog, batch);
}

/// Per-solve memo table over sub-rectangles of the target.
///
/// `table[w * (h_max + 1) + h]` holds `C(w, h)` once the matching `visited`
/// flag is set; a computed [`INFINITE_COST`] is a valid cached value, which
/// is why the flags are kept separately.
struct Memo {
    h_max: u32,
    weld: f64,
    table: Vec<f64>,
    visited: Vec<bool>,
}

impl Memo {
    fn new(w_max: u32, h_max: u32, weld: f64) -> Self {
        let cells = (w_max as usize + 1) * (h_max as usize + 1);
        Self {
            h_max,
            weld,
            table: vec![INFINITE_COST; cells],
            visited: vec![false; cells],
        }
    }

    #[inline]
    fn index(&self, w: u32, h: u32) -> usize {
        w as usize * (self.h_max as usize + 1) + h as usize
    }

    fn solve(&mut self, catalog: &Catalog, w: u32, h: u32) -> f64 {
        if w == 0 || h == 0 {
            return INFINITE_COST;
        }
        let idx = self.index(w, h);
        if self.visited[idx] {
            return self.table[idx];
        }

        let mut best = catalog.base_cost(w, h);

        // Vertical cuts: both halves share the full height, weld runs along h.
        for x in 1..w {
            let left = self.solve(catalog, x, h);
            let right = self.solve(catalog, w - x, h);
            if left < INFINITE_COST && right < INFINITE_COST {
                let candidate = left + right + self.weld * f64::from(h);
                if candidate < best {
                    best = candidate;
                }
            }
        }

        // Horizontal cuts: both halves share the full width, weld runs along w.
        for y in 1..h {
            let bottom = self.solve(catalog, w, y);
            let top = self.solve(catalog, w, h - y);
            if bottom < INFINITE_COST && top < INFINITE_COST {
                let candidate = bottom + top + self.weld * f64::from(w);
                if candidate < best {
                    best = candidate;
                }
            }
        }

        self.table[idx] = best;
        self.visited[idx] = true;
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fab_core::{MaterialId, PriceEntry};

    fn catalog(entries: &[(u32, u32, f64)]) -> Catalog {
        Catalog::from_price_list(&PriceList::with_entries(
            MaterialId::new(1),
            entries
                .iter()
                .map(|&(w, h, c)| PriceEntry::new(w, h, c))
                .collect(),
        ))
    }

    #[test]
    fn zero_dimension_is_unproducible() {
        let c = catalog(&[(1, 1, 1.0)]);
        assert_eq!(optimal_cost(&c, 0, 5, 1.0), INFINITE_COST);
        assert_eq!(optimal_cost(&c, 5, 0, 1.0), INFINITE_COST);
    }

    #[test]
    fn direct_purchase_beats_welding() {
        // 1x1 target with a 1x1 offer needs no welds at all.
        let c = catalog(&[(1, 1, 1.0)]);
        assert_eq!(optimal_cost(&c, 1, 1, 100.0), 1.0);
    }

    #[test]
    fn rotated_stock_is_usable() {
        // Only a 1x2 offer exists; the 2x1 target uses it via symmetry.
        let c = catalog(&[(1, 2, 3.0)]);
        assert_eq!(optimal_cost(&c, 2, 1, 1.0), 3.0);
    }

    #[test]
    fn seq_solve_fills_every_item() {
        let list = PriceList::with_entries(
            MaterialId::new(1),
            vec![PriceEntry::new(1, 1, 1.0)],
        );
        let mut batch = OrderBatch::new(MaterialId::new(1));
        batch.add(1, 1, 0.0).add(2, 1, 0.5).add(3, 7, 100.0);

        seq_solve(&list, &mut batch);

        assert_eq!(batch.items[0].cost, 1.0);
        assert_eq!(batch.items[1].cost, 2.5);
        assert!(batch.items[2].is_solved());
    }
}
