//! Hierarchical storage namespace abstraction
//!
//! Containers are folder-like nodes addressed by (parent, name). Concrete
//! clients hide the vendor API; they must exclude trashed/deleted containers
//! from lookups.

use crate::error::ReconcileError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolved identity of a container in the remote namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerRef {
    /// Opaque id assigned by the namespace.
    pub id: String,
    pub name: String,
    /// Creation time, when the namespace exposes one. Used to break ties
    /// between same-named siblings.
    pub created_at: Option<DateTime<Utc>>,
}

impl ContainerRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: None,
        }
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Capability interface for the storage target.
#[async_trait]
pub trait NamespaceClient: Send + Sync {
    /// Verify credentials before a run starts.
    async fn check_ready(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// All live containers named exactly `name` directly under `parent`
    /// (the namespace root when `None`).
    async fn find_containers(
        &self,
        parent: Option<&ContainerRef>,
        name: &str,
    ) -> Result<Vec<ContainerRef>, ReconcileError>;

    /// Create a container named `name` under `parent`.
    async fn create_container(
        &self,
        parent: Option<&ContainerRef>,
        name: &str,
    ) -> Result<ContainerRef, ReconcileError>;

    /// Store `bytes` as a file named `name` inside `container`.
    async fn write_artifact(
        &self,
        container: &ContainerRef,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), ReconcileError>;
}
