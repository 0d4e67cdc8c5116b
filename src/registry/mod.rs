//! # Registry Infrastructure
//!
//! Registries owning long-lived orchestration state.
//!
//! ## Available Registries
//!
//! - **InstanceRegistry**: one export state instance per resource key
//!
//! ```text
//! Registry Infrastructure
//! └── InstanceRegistry    (ResourceKey -> OrchestratorInstance)
//! ```

pub mod instance_registry;

// Re-export main types for easy access
pub use instance_registry::{InstanceRegistry, RegistryStats};
