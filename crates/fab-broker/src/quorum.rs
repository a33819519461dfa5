//! Per-material producer response tracking.

use std::collections::HashSet;

use fab_core::ProducerKey;

/// Response state of one material.
///
/// The producer total is frozen when the first response arrives: producers
/// register before the broker starts, so the count can only be stale if a
/// response raced registration, which the lifecycle forbids. `answered` is
/// terminal: once every counted producer has responded the material stays
/// answered for the rest of the broker's life.
#[derive(Debug)]
pub(crate) struct MaterialState {
    total_producers: usize,
    responders: HashSet<ProducerKey>,
    answered: bool,
}

impl MaterialState {
    /// State after the first response for a material.
    pub fn first_response(total_producers: usize, responder: ProducerKey) -> Self {
        let mut responders = HashSet::new();
        responders.insert(responder);
        Self {
            total_producers,
            answered: total_producers <= 1,
            responders,
        }
    }

    /// Count a follow-up response. Each producer counts at most once.
    /// Returns true exactly when this response completes the quorum.
    pub fn record_response(&mut self, responder: ProducerKey) -> bool {
        if self.answered || !self.responders.insert(responder) {
            return false;
        }
        if self.responders.len() >= self.total_producers {
            self.answered = true;
            return true;
        }
        false
    }

    #[inline]
    pub fn answered(&self) -> bool {
        self.answered
    }
}
