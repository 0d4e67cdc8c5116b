//! # Keyed Instance Registry
//!
//! Process-wide mapping from [`ResourceKey`] to its [`OrchestratorInstance`].
//!
//! ## Key Features
//!
//! - **Atomic resolve-or-create**: the insert-if-absent runs under the map
//!   shard lock, so concurrent resolves of one key never build two instances
//! - **Independent keys**: distinct keys share no mutable state
//! - **No eviction**: instances live until [`InstanceRegistry::teardown`]
//!
//! ## Usage
//!
//! ```rust
//! use export_orchestrator::models::ResourceKey;
//! use export_orchestrator::registry::InstanceRegistry;
//! use std::sync::Arc;
//!
//! let registry = InstanceRegistry::new();
//! let a = registry.resolve(&ResourceKey::dashboard(42));
//! let b = registry.resolve(&ResourceKey::dashboard(42));
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::models::ResourceKey;
use crate::state_machine::OrchestratorInstance;

/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total_instances: usize,
    pub in_progress: usize,
}

/// Owner of every per-resource orchestrator instance
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: DashMap<ResourceKey, Arc<OrchestratorInstance>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the instance for `key`, creating an `Idle` one on first use
    pub fn resolve(&self, key: &ResourceKey) -> Arc<OrchestratorInstance> {
        if let Some(existing) = self.instances.get(key) {
            return Arc::clone(existing.value());
        }

        let entry = self.instances.entry(key.clone()).or_insert_with(|| {
            debug!(resource = %key, "Creating orchestrator instance");
            Arc::new(OrchestratorInstance::new(key.clone()))
        });
        Arc::clone(entry.value())
    }

    /// Look up an instance without creating one
    pub fn get(&self, key: &ResourceKey) -> Option<Arc<OrchestratorInstance>> {
        self.instances.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn keys(&self) -> Vec<ResourceKey> {
        self.instances.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let in_progress = self
            .instances
            .iter()
            .filter(|entry| entry.value().in_progress())
            .count();
        RegistryStats {
            total_instances: self.instances.len(),
            in_progress,
        }
    }

    /// Drop every instance; later resolves start from fresh `Idle` state
    pub fn teardown(&self) {
        let count = self.instances.len();
        self.instances.clear();
        debug!(instances = count, "Instance registry torn down");
    }
}
