//! # fab-broker: Multi-Threaded Welding-Cost Brokerage
//!
//! Fans customer order batches out to stock producers, aggregates their
//! price lists into per-material catalogs, computes optimal cut plans on a
//! worker pool, and fans solved batches back to the customers.
//!
//! ## Pipeline
//!
//! ```text
//! customer ──receiver──▶ parking lot ──quorum──▶ order queue
//!                                                    │ workers (N)
//!                                                    ▼
//! customer ◀──dispatcher──────────────── completion queue
//! ```
//!
//! One **receiver** thread per customer pulls demand and solicits every
//! registered producer once per material. Producer responses land in
//! [`Broker::add_price_list`], possibly from arbitrary threads; when the
//! last registered producer has answered for a material, that material's
//! parked batches migrate to the order queue. **Workers** solve batches
//! against a catalog snapshot and a single **dispatcher** delivers results,
//! exactly once per pulled batch.
//!
//! ## Locking
//!
//! One mutex (the catalog book) covers catalogs, quorum state, and the
//! parking lot; the two queues have their own mutex + condvar each, and the
//! solicited set its own mutex. Migration takes the book lock before the
//! order-queue lock, and no code path acquires them in the reverse order.
//! Solving never happens under a shared lock.
//!
//! ## Shutdown
//!
//! [`Broker::stop`] is a cooperative drain, not an abort: receivers finish
//! when their customers run out of demand, the broker then waits until
//! every solicited material has reached quorum, and only then shuts the
//! queues down. A registered producer that never answers keeps `stop`
//! waiting forever: every solicited material must be answered.

mod broker;
mod quorum;

pub use broker::{Broker, BrokerConfig};

// Synchronous single-batch entry point, re-exported next to the broker it
// bypasses.
pub use fab_algo::seq_solve;
