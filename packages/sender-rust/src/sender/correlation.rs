//! Rendezvous between in-flight sends and their segment completions.
//!
//! The sender inserts an aggregator before dispatch and removes it after the
//! wait; completions only look entries up. A completion that arrives after
//! removal misses the lookup and is dropped, so late callbacks never race a
//! delete.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use smsgate_core::RequestId;

use super::aggregator::PartAggregator;
use super::error::SendError;

/// Concurrent map from request id to the aggregator of its in-flight send.
///
/// Backed by a sharded `DashMap`, so operations on distinct ids do not
/// contend on a single lock.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    pending: DashMap<RequestId, Arc<PartAggregator>>,
}

impl CorrelationTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Registers the aggregator of a new send.
    ///
    /// # Errors
    ///
    /// Returns `SendError::DuplicateRequest` if `request_id` is already in
    /// flight. The existing entry is left untouched.
    pub fn put(
        &self,
        request_id: RequestId,
        aggregator: Arc<PartAggregator>,
    ) -> Result<(), SendError> {
        match self.pending.entry(request_id) {
            Entry::Occupied(occupied) => Err(SendError::DuplicateRequest {
                request_id: occupied.key().clone(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(aggregator);
                Ok(())
            }
        }
    }

    /// Looks up the aggregator of an in-flight send.
    ///
    /// The shard guard is released before returning, so callers may lock the
    /// aggregator without holding any table lock.
    #[must_use]
    pub fn get(&self, request_id: &RequestId) -> Option<Arc<PartAggregator>> {
        self.pending.get(request_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Removes the entry of a finished send, returning its aggregator.
    pub fn remove(&self, request_id: &RequestId) -> Option<Arc<PartAggregator>> {
        self.pending.remove(request_id).map(|(_, aggregator)| aggregator)
    }

    #[must_use]
    pub fn contains(&self, request_id: &RequestId) -> bool {
        self.pending.contains_key(request_id)
    }

    /// Number of sends currently in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
