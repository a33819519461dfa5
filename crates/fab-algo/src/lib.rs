//! # fab-algo: Optimal Cut Planning
//!
//! Computes the minimum cost of producing a target rectangle from a material
//! catalog by buying stock rectangles and welding them together along full
//! edges (guillotine composition).
//!
//! ## Recurrence
//!
//! For a catalog `base(w, h)` of direct purchase costs and a weld-strength
//! coefficient `s`:
//!
//! ```text
//! C(w, h) = min( base(w, h),
//!                min over 1 ≤ x < w of C(x, h) + C(w−x, h) + s·h,
//!                min over 1 ≤ y < h of C(w, y) + C(w, h−y) + s·w )
//! C(0, ·) = C(·, 0) = INFINITE_COST
//! ```
//!
//! A vertical weld joins two pieces sharing the full height `h`, a horizontal
//! weld joins two pieces sharing the full width `w`; the weld cost is the
//! coefficient times the shared edge length.
//!
//! Each solve memoizes into one flat `(W+1) × (H+1)` table keyed by the exact
//! `(w, h)` pair. The recurrence is **not** symmetric in `(w, h)` because the
//! split axes differ, so orientations are never folded here; rotation
//! symmetry is already captured by the catalog's normalized keys.

mod cut_cost;

pub use cut_cost::{optimal_cost, seq_solve, solve_batch};
