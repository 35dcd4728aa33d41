// src/crawl/gate.rs
// =============================================================================
// The admission gate: a counting limit on how much crawl work runs at once.
//
// One gate is shared by every seed worker, so the limit is global, not
// per-seed. Depending on the configured scope a slot is held either for a
// worker's entire run or only around a single fetch (see GateScope).
//
// Rust concepts:
// - Arc: Shared ownership of the semaphore across tasks
// - RAII guards: The slot is released when the permit is dropped
// =============================================================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::MirrorError;

/// What a gate slot bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateScope {
    /// A slot is held for a seed worker's whole run: the limit bounds
    /// concurrently active seeds.
    #[default]
    Seed,
    /// A slot is held only while one request is in flight: the limit bounds
    /// concurrent HTTP requests across all seeds.
    Fetch,
}

// Counting gate shared by all workers
//
// Cloning the gate is cheap and every clone draws from the same slots.
// tokio's semaphore queues waiters in FIFO order, which gives us the
// eventual-progress guarantee for free.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    slots: Arc<Semaphore>,
}

// A granted slot. Dropping it (or calling release) hands the slot back.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    /// Creates a gate admitting at most `limit` holders at a time.
    ///
    /// A limit of zero would block every caller forever, so it is rejected.
    pub fn new(limit: usize) -> Result<Self, MirrorError> {
        if limit == 0 || limit > Semaphore::MAX_PERMITS {
            return Err(MirrorError::InvalidConcurrency(limit));
        }

        Ok(Self {
            slots: Arc::new(Semaphore::new(limit)),
        })
    }

    /// Waits until fewer than `limit` holders are active, then grants a slot.
    pub async fn acquire(&self) -> Result<GatePermit, MirrorError> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| MirrorError::GateClosed)?;

        Ok(GatePermit { _permit: permit })
    }

    #[cfg(test)]
    pub(crate) fn available(&self) -> usize {
        self.slots.available_permits()
    }
}

impl GatePermit {
    /// Returns the slot, waking one waiter if any.
    pub fn release(self) {
        drop(self);
    }
}
