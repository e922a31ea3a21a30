//! Testing utilities and fixtures
//!
//! Mocks for the three collaborator traits plus builders for project
//! documents and tables, shared by unit and integration tests.

pub mod fixtures;
pub mod mocks;

pub use fixtures::{table, ProjectBuilder};
pub use mocks::{MockExtraction, MockIndex, MockNamespace};

use crate::abstractions::Collaborators;
use std::sync::Arc;

/// Mock collaborators kept alongside the trait objects handed to a run, so
/// tests can inspect them afterwards.
pub struct TestCollaborators {
    pub namespace: Arc<MockNamespace>,
    pub extraction: Arc<MockExtraction>,
    pub index: Arc<MockIndex>,
}

impl TestCollaborators {
    pub fn new(namespace: MockNamespace, extraction: MockExtraction, index: MockIndex) -> Self {
        Self {
            namespace: Arc::new(namespace),
            extraction: Arc::new(extraction),
            index: Arc::new(index),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.namespace.clone(),
            self.extraction.clone(),
            self.index.clone(),
        )
    }
}
