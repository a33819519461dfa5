//! Capability traits for the external actors the broker talks to.
//!
//! Producers and customers are supplied by the embedding application; the
//! broker only ever sees them through these traits. Both sides may be called
//! from broker-owned threads, hence the `Send + Sync` bounds.

use std::sync::Arc;

use crate::{MaterialId, OrderBatch};

/// A stock producer.
///
/// `send_price_list` is a fire-and-forget solicitation: the producer replies
/// later, possibly from its own thread, by calling the broker's
/// price-list intake with the same material id.
pub trait Producer: Send + Sync {
    fn send_price_list(&self, material: MaterialId);
}

/// A customer feeding demand into the broker.
pub trait Customer: Send + Sync {
    /// Block until the customer has another batch to place.
    ///
    /// `None` means the demand stream is finished; the broker's receiver
    /// thread for this customer then terminates.
    fn wait_for_demand(&self) -> Option<OrderBatch>;

    /// Deliver a solved batch back to the customer. Called exactly once per
    /// pulled batch, from the broker's dispatcher thread.
    fn completed(&self, batch: OrderBatch);
}

/// Identity key for a registered producer handle.
///
/// Quorum tracking needs set membership over producers ("has this producer
/// already answered for this material?"). Producer handles are `Arc` trait
/// objects registered before the broker starts and kept alive for the whole
/// run, so the `Arc` data pointer is a stable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProducerKey(usize);

impl ProducerKey {
    pub fn of(producer: &Arc<dyn Producer>) -> Self {
        ProducerKey(Arc::as_ptr(producer) as *const () as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;
    impl Producer for Silent {
        fn send_price_list(&self, _material: MaterialId) {}
    }

    #[test]
    fn producer_keys_distinguish_handles() {
        let a: Arc<dyn Producer> = Arc::new(Silent);
        let b: Arc<dyn Producer> = Arc::new(Silent);

        assert_eq!(ProducerKey::of(&a), ProducerKey::of(&a.clone()));
        assert_ne!(ProducerKey::of(&a), ProducerKey::of(&b));
    }
}
