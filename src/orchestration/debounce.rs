//! # Debounce Gate
//!
//! Delays keyed actions by a quiet window. Scheduling an action for a key that
//! already has one pending cancels the pending action (last writer wins); a
//! cancelled action is dropped without ever being polled.

use dashmap::DashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct PendingAction {
    generation: u64,
    token: CancellationToken,
}

/// Per-key delayed execution with supersession
#[derive(Debug)]
pub struct DebounceGate<K>
where
    K: Eq + Hash,
{
    pending: Arc<DashMap<K, PendingAction>>,
    next_generation: AtomicU64,
}

impl<K> Default for DebounceGate<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }
}

impl<K> DebounceGate<K>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay` unless another action is scheduled for
    /// `key` first.
    ///
    /// The returned task resolves to `true` if the action ran and `false` if
    /// it was superseded or cancelled.
    pub fn schedule<F>(&self, key: K, delay: Duration, action: F) -> JoinHandle<bool>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let previous = self.pending.insert(
            key.clone(),
            PendingAction {
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
            debug!(key = %key, "Superseded pending debounced action");
        }

        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    return false;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            // Claim the slot; a superseding schedule that raced the timer wins
            if pending
                .remove_if(&key, |_, action| action.generation == generation)
                .is_none()
            {
                return false;
            }

            action.await;
            true
        })
    }

    /// Cancel the pending action for `key`, if any
    pub fn cancel(&self, key: &K) -> bool {
        match self.pending.remove(key) {
            Some((_, action)) => {
                action.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending action
    pub fn cancel_all(&self) -> usize {
        let keys: Vec<K> = self.pending.iter().map(|entry| entry.key().clone()).collect();
        keys.iter().filter(|key| self.cancel(key)).count()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
