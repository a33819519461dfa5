//! Value and monotonicity checks for the cut-cost recurrence.

use fab_algo::optimal_cost;
use fab_core::{Catalog, MaterialId, PriceEntry, PriceList, INFINITE_COST};

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
fn unit_square_costs_its_base_price() {
    let c = catalog(&[(1, 1, 1.0)]);
    assert_eq!(optimal_cost(&c, 1, 1, 7.0), 1.0);
}

#[test]
fn two_by_one_is_two_squares_plus_one_weld() {
    let c = catalog(&[(1, 1, 1.0)]);
    // Two 1x1 pieces welded along the shared height-1 edge.
    assert_eq!(optimal_cost(&c, 2, 1, 0.5), 2.5);
}

#[test]
fn two_by_two_picks_the_cheapest_composition() {
    let c = catalog(&[(2, 2, 10.0), (1, 2, 2.0), (1, 1, 1.5)]);
    // Direct purchase: 10.
    // Two 1x2 strips + one length-2 weld: 2 + 2 + 2 = 6.
    // Four 1x1 squares: 1.5 * 4 + three welds = 6 + 4 = 10.
    assert_eq!(optimal_cost(&c, 2, 2, 1.0), 6.0);
}

#[test]
fn empty_catalog_is_unproducible() {
    let c = Catalog::new();
    assert_eq!(optimal_cost(&c, 1, 1, 0.0), INFINITE_COST);
    assert_eq!(optimal_cost(&c, 4, 9, 2.0), INFINITE_COST);
}

#[test]
fn missing_small_stock_is_not_synthesized() {
    // Stock only exists at 2x2; a 3x3 target cannot be assembled because no
    // 1-wide strips exist.
    let c = catalog(&[(2, 2, 1.0)]);
    assert_eq!(optimal_cost(&c, 3, 3, 0.1), INFINITE_COST);
}

#[test]
fn raising_a_base_price_never_lowers_the_cost() {
    let base = catalog(&[(2, 2, 10.0), (1, 2, 2.0), (1, 1, 1.5)]);
    let reference = optimal_cost(&base, 2, 2, 1.0);

    for bumped in [
        catalog(&[(2, 2, 11.0), (1, 2, 2.0), (1, 1, 1.5)]),
        catalog(&[(2, 2, 10.0), (1, 2, 2.7), (1, 1, 1.5)]),
        catalog(&[(2, 2, 10.0), (1, 2, 2.0), (1, 1, 9.0)]),
    ] {
        assert!(optimal_cost(&bumped, 2, 2, 1.0) >= reference);
    }
}

#[test]
fn raising_weld_strength_never_lowers_the_cost() {
    let c = catalog(&[(1, 2, 2.0), (1, 1, 1.5)]);
    let mut previous = 0.0;
    for weld in [0.0, 0.5, 1.0, 4.0, 50.0] {
        let cost = optimal_cost(&c, 2, 2, weld);
        assert!(cost >= previous);
        previous = cost;
    }
}

#[test]
fn welding_is_skipped_when_direct_purchase_wins() {
    // With an expensive weld the 2x2 sheet beats any composition.
    let c = catalog(&[(2, 2, 5.0), (1, 1, 1.0)]);
    assert_eq!(optimal_cost(&c, 2, 2, 100.0), 5.0);
}

#[test]
fn wide_targets_assemble_from_strips() {
    // 5x1 from five 1x1 squares: 5 * 1.0 + 4 welds * 0.25 * 1 = 6.0.
    let c = catalog(&[(1, 1, 1.0)]);
    assert_eq!(optimal_cost(&c, 5, 1, 0.25), 6.0);
}
