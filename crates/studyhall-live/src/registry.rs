//! Duplicate-target registry for live subscriptions.
//!
//! Owned by the application's composition root and passed by reference to
//! every surface that opens feeds or presence channels. Claiming a target
//! that is already live fails fast instead of silently layering a second
//! subscription over the first.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use studyhall_common::LiveError;

use crate::feed::FieldFilter;

/// Registry of live subscription targets.
///
/// Cheap to clone; clones share the same underlying set.
#[derive(Clone, Default, Debug)]
pub struct LiveRegistry {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a change-feed target. Fails if an identical `(collection,
    /// filter)` pair is already live.
    pub fn claim_feed(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> Result<TargetClaim, LiveError> {
        self.claim(feed_key(collection, filter))
    }

    /// Claim a presence channel by name. Fails if the channel is already
    /// live.
    pub fn claim_channel(&self, channel: &str) -> Result<TargetClaim, LiveError> {
        self.claim(format!("channel:{channel}"))
    }

    /// Number of currently live targets.
    pub fn live_count(&self) -> usize {
        lock_set(&self.inner).len()
    }

    fn claim(&self, key: String) -> Result<TargetClaim, LiveError> {
        let mut set = lock_set(&self.inner);
        if !set.insert(key.clone()) {
            return Err(LiveError::DuplicateTarget(key));
        }
        drop(set);
        Ok(TargetClaim {
            key,
            registry: Arc::clone(&self.inner),
        })
    }
}

pub(crate) fn feed_key(collection: &str, filter: Option<&FieldFilter>) -> String {
    match filter {
        Some(f) => format!("feed:{collection}[{}]", f.to_expr()),
        None => format!("feed:{collection}"),
    }
}

/// Recover the set even if a panicking thread poisoned the lock; the set
/// itself is always left consistent.
fn lock_set(inner: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// RAII claim on a subscription target; releases the target when dropped.
#[derive(Debug)]
pub struct TargetClaim {
    key: String,
    registry: Arc<Mutex<HashSet<String>>>,
}

impl TargetClaim {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for TargetClaim {
    fn drop(&mut self) {
        lock_set(&self.registry).remove(&self.key);
    }
}
