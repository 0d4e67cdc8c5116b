//! Resource Identity
//!
//! A [`ResourceKey`] names the exportable resource an export request targets.
//! Two requests with equal keys share one orchestrator instance; unequal keys
//! never share state. Keys can only be built through validating constructors,
//! so holding a `ResourceKey` means the identity is well-formed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ExportError, Result};

/// Closed set of resource kinds the backend can export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Dashboard,
    Insight,
}

impl ResourceKind {
    /// Plural path segment used by resource-scoped endpoints
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboards",
            Self::Insight => "insights",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dashboard => write!(f, "dashboard"),
            Self::Insight => write!(f, "insight"),
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dashboard" => Ok(Self::Dashboard),
            "insight" => Ok(Self::Insight),
            _ => Err(ExportError::invalid_key(format!("unknown resource kind: {s}"))),
        }
    }
}

/// The two shapes a resource identity can take
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceIdentity {
    /// Container/item id pair; at least one must be present
    Ids {
        dashboard_id: Option<u64>,
        insight_id: Option<u64>,
    },
    /// Kind plus non-empty identifier
    Resource { kind: ResourceKind, id: String },
}

/// Validated identity of an exportable resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ResourceIdentity", into = "ResourceIdentity")]
pub struct ResourceKey {
    identity: ResourceIdentity,
}

impl ResourceKey {
    /// Build a key from optional dashboard and insight ids
    pub fn from_ids(dashboard_id: Option<u64>, insight_id: Option<u64>) -> Result<Self> {
        if dashboard_id.is_none() && insight_id.is_none() {
            return Err(ExportError::invalid_key(
                "at least one of dashboard_id or insight_id is required",
            ));
        }
        Ok(Self {
            identity: ResourceIdentity::Ids {
                dashboard_id,
                insight_id,
            },
        })
    }

    /// Build a key from a resource kind and identifier
    pub fn resource(kind: ResourceKind, id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ExportError::invalid_key(format!(
                "{kind} identifier must not be empty"
            )));
        }
        if id == "." || id == ".." {
            return Err(ExportError::invalid_key(format!(
                "{kind} identifier must not be a relative path"
            )));
        }
        Ok(Self {
            identity: ResourceIdentity::Resource { kind, id },
        })
    }

    /// Key for a whole dashboard
    pub fn dashboard(dashboard_id: u64) -> Self {
        Self {
            identity: ResourceIdentity::Ids {
                dashboard_id: Some(dashboard_id),
                insight_id: None,
            },
        }
    }

    /// Key for a single insight
    pub fn insight(insight_id: u64) -> Self {
        Self {
            identity: ResourceIdentity::Ids {
                dashboard_id: None,
                insight_id: Some(insight_id),
            },
        }
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    /// The single resource an export of this key produces.
    ///
    /// For an id pair the item (insight) wins over its container (dashboard).
    pub fn target(&self) -> (ResourceKind, String) {
        match &self.identity {
            ResourceIdentity::Ids {
                insight_id: Some(insight_id),
                ..
            } => (ResourceKind::Insight, insight_id.to_string()),
            ResourceIdentity::Ids {
                dashboard_id: Some(dashboard_id),
                ..
            } => (ResourceKind::Dashboard, dashboard_id.to_string()),
            ResourceIdentity::Ids { .. } => {
                unreachable!("ResourceKey constructors reject an empty id pair")
            }
            ResourceIdentity::Resource { kind, id } => (*kind, id.clone()),
        }
    }
}

impl TryFrom<ResourceIdentity> for ResourceKey {
    type Error = ExportError;

    fn try_from(identity: ResourceIdentity) -> Result<Self> {
        match identity {
            ResourceIdentity::Ids {
                dashboard_id,
                insight_id,
            } => Self::from_ids(dashboard_id, insight_id),
            ResourceIdentity::Resource { kind, id } => Self::resource(kind, id),
        }
    }
}

impl From<ResourceKey> for ResourceIdentity {
    fn from(key: ResourceKey) -> Self {
        key.identity
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn id_or_none(id: &Option<u64>) -> String {
            id.map(|v| v.to_string())
                .unwrap_or_else(|| "none".to_string())
        }

        match &self.identity {
            ResourceIdentity::Ids {
                dashboard_id,
                insight_id,
            } => write!(
                f,
                "dash:{}::insight:{}",
                id_or_none(dashboard_id),
                id_or_none(insight_id)
            ),
            ResourceIdentity::Resource { kind, id } => write!(f, "{kind}:{id}"),
        }
    }
}
