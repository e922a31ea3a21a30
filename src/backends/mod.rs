//! Local collaborator backends
//!
//! Directory-backed implementations of the three collaborator traits, so the
//! binary can run end to end without vendor APIs:
//!
//! - [`LocalNamespace`]: containers are directories under a root
//! - [`FixtureSource`]: result sets are JSON files named after their tag
//! - [`ArtifactIndex`]: an artifact counts as indexed once its file exists

pub mod fixtures;
pub mod index;
pub mod local;

pub use fixtures::FixtureSource;
pub use index::ArtifactIndex;
pub use local::LocalNamespace;

use crate::abstractions::Collaborators;
use crate::config::{CredentialBlock, Credentials};
use crate::error::CredentialsError;
use std::path::PathBuf;
use std::sync::Arc;

/// Wire the local backends from a credentials document.
pub fn local_collaborators(credentials: &Credentials) -> Result<Collaborators, CredentialsError> {
    Ok(Collaborators::new(
        Arc::new(LocalNamespace::from_credentials(&credentials.storage)?),
        Arc::new(FixtureSource::from_credentials(&credentials.source)?),
        Arc::new(ArtifactIndex::from_credentials(&credentials.index)?),
    ))
}

/// A required path entry of a credential block.
fn required_path(
    block: &CredentialBlock,
    name: &str,
    key: &str,
) -> Result<PathBuf, CredentialsError> {
    block
        .get_str(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| CredentialsError::Malformed {
            message: format!("{name} block has no '{key}' entry"),
        })
}

/// Reject names that would escape their parent directory.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
