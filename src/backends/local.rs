//! Directory-backed storage namespace

use super::{is_plain_name, required_path};
use crate::abstractions::{ContainerRef, NamespaceClient};
use crate::config::CredentialBlock;
use crate::error::{CredentialsError, ReconcileError};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Containers are directories under `root`; a container id is its path
/// relative to the root, `/`-separated.
#[derive(Debug, Clone)]
pub struct LocalNamespace {
    root: PathBuf,
}

impl LocalNamespace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage block: `{"root": "<dir>"}`.
    pub fn from_credentials(block: &CredentialBlock) -> Result<Self, CredentialsError> {
        Ok(Self::new(required_path(block, "storage", "root")?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir_of(&self, container: Option<&ContainerRef>) -> PathBuf {
        match container {
            Some(c) => c.id.split('/').fold(self.root.clone(), |p, s| p.join(s)),
            None => self.root.clone(),
        }
    }

    fn child_id(parent: Option<&ContainerRef>, name: &str) -> String {
        match parent {
            Some(p) => format!("{}/{name}", p.id),
            None => name.to_string(),
        }
    }
}

fn io_error(context: &str, err: io::Error) -> ReconcileError {
    let message = format!("{context}: {err}");
    match err.kind() {
        io::ErrorKind::PermissionDenied => ReconcileError::unauthorized(message),
        io::ErrorKind::NotFound => ReconcileError::unavailable(message),
        _ => ReconcileError::transport(message),
    }
}

fn check_name(name: &str) -> Result<(), ReconcileError> {
    if is_plain_name(name) {
        Ok(())
    } else {
        Err(ReconcileError::transport(format!("invalid name '{name}'")))
    }
}

#[async_trait]
impl NamespaceClient for LocalNamespace {
    async fn check_ready(&self) -> Result<()> {
        let metadata = tokio::fs::metadata(&self.root)
            .await
            .with_context(|| format!("storage root {} is not accessible", self.root.display()))?;
        if !metadata.is_dir() {
            bail!("storage root {} is not a directory", self.root.display());
        }
        Ok(())
    }

    async fn find_containers(
        &self,
        parent: Option<&ContainerRef>,
        name: &str,
    ) -> Result<Vec<ContainerRef>, ReconcileError> {
        check_name(name)?;
        let path = self.dir_of(parent).join(name);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() => {
                let created_at = metadata
                    .created()
                    .or_else(|_| metadata.modified())
                    .ok()
                    .map(DateTime::<Utc>::from);
                let mut container = ContainerRef::new(Self::child_id(parent, name), name);
                container.created_at = created_at;
                Ok(vec![container])
            }
            Ok(_) => Ok(Vec::new()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(io_error(&format!("lookup of {}", path.display()), err)),
        }
    }

    async fn create_container(
        &self,
        parent: Option<&ContainerRef>,
        name: &str,
    ) -> Result<ContainerRef, ReconcileError> {
        check_name(name)?;
        let path = self.dir_of(parent).join(name);
        tokio::fs::create_dir(&path)
            .await
            .map_err(|e| io_error(&format!("create {}", path.display()), e))?;
        debug!("Created directory {}", path.display());
        Ok(ContainerRef::new(Self::child_id(parent, name), name).created_at(Utc::now()))
    }

    async fn write_artifact(
        &self,
        container: &ContainerRef,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), ReconcileError> {
        check_name(name)?;
        let path = self.dir_of(Some(container)).join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| io_error(&format!("write {}", path.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_then_find() {
        let temp = TempDir::new().unwrap();
        let namespace = LocalNamespace::new(temp.path());

        assert!(namespace.find_containers(None, "Finance").await.unwrap().is_empty());
        let created = namespace.create_container(None, "Finance").await.unwrap();
        assert_eq!(created.id, "Finance");

        let nested = namespace.create_container(Some(&created), "Revenue").await.unwrap();
        assert_eq!(nested.id, "Finance/Revenue");
        assert!(temp.path().join("Finance").join("Revenue").is_dir());

        let found = namespace.find_containers(Some(&created), "Revenue").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "Finance/Revenue");
        assert!(found[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_write_artifact_places_file() {
        let temp = TempDir::new().unwrap();
        let namespace = LocalNamespace::new(temp.path());
        let container = namespace.create_container(None, "D").await.unwrap();

        namespace
            .write_artifact(&container, "A.B.C.json", b"[]")
            .await
            .unwrap();
        assert_eq!(std::fs::read(temp.path().join("D/A.B.C.json")).unwrap(), b"[]");
    }

    #[tokio::test]
    async fn test_files_are_not_containers() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Finance"), "not a folder").unwrap();
        let namespace = LocalNamespace::new(temp.path());
        assert!(namespace.find_containers(None, "Finance").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let temp = TempDir::new().unwrap();
        let namespace = LocalNamespace::new(temp.path());
        assert!(namespace.create_container(None, "..").await.is_err());
        assert!(namespace.find_containers(None, "a/b").await.is_err());
    }

    #[tokio::test]
    async fn test_check_ready_requires_root() {
        let temp = TempDir::new().unwrap();
        assert!(LocalNamespace::new(temp.path()).check_ready().await.is_ok());
        assert!(LocalNamespace::new(temp.path().join("missing"))
            .check_ready()
            .await
            .is_err());
    }

    #[test]
    fn test_from_credentials_requires_root() {
        let block = CredentialBlock::new(json!({"folder_id": "abc"}));
        assert!(LocalNamespace::from_credentials(&block).is_err());

        let block = CredentialBlock::new(json!({"root": "/srv/artifacts"}));
        let namespace = LocalNamespace::from_credentials(&block).unwrap();
        assert_eq!(namespace.root(), Path::new("/srv/artifacts"));
    }
}
