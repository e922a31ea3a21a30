//! Artifact-presence index probe

use super::{is_plain_name, required_path};
use crate::abstractions::{IndexClient, IndexContext};
use crate::config::CredentialBlock;
use crate::error::CredentialsError;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Treats an artifact as indexed once `{root}/{location...}/{tag}.json`
/// exists.
#[derive(Debug, Clone)]
pub struct ArtifactIndex {
    root: PathBuf,
}

impl ArtifactIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Index block: `{"root": "<dir>"}`.
    pub fn from_credentials(block: &CredentialBlock) -> Result<Self, CredentialsError> {
        Ok(Self::new(required_path(block, "index", "root")?))
    }

    fn artifact_path(&self, context: &IndexContext, tag: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for segment in &context.location {
            if !is_plain_name(segment) {
                bail!("invalid location segment '{segment}'");
            }
            path.push(segment);
        }
        path.push(format!("{tag}.json"));
        Ok(path)
    }
}

#[async_trait]
impl IndexClient for ArtifactIndex {
    async fn check_ready(&self) -> Result<()> {
        let metadata = tokio::fs::metadata(&self.root)
            .await
            .with_context(|| format!("index root {} is not accessible", self.root.display()))?;
        if !metadata.is_dir() {
            bail!("index root {} is not a directory", self.root.display());
        }
        Ok(())
    }

    async fn probe_indexed(&self, context: &IndexContext, tag: &str) -> Result<bool> {
        let path = self.artifact_path(context, tag)?;
        tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("failed to probe {}", path.display()))
    }
}
