//! Abstraction layers for external collaborators
//!
//! The core never talks to a vendor API directly. It depends on three narrow
//! capability traits, so runs can be driven by local backends or mocks.

pub mod extraction;
pub mod index;
pub mod namespace;

pub use extraction::{ExtractionClient, TabularResult};
pub use index::{IndexClient, IndexContext};
pub use namespace::{ContainerRef, NamespaceClient};

use std::sync::Arc;

/// The collaborators a run is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub namespace: Arc<dyn NamespaceClient>,
    pub extraction: Arc<dyn ExtractionClient>,
    pub index: Arc<dyn IndexClient>,
}

impl Collaborators {
    pub fn new(
        namespace: Arc<dyn NamespaceClient>,
        extraction: Arc<dyn ExtractionClient>,
        index: Arc<dyn IndexClient>,
    ) -> Self {
        Self {
            namespace,
            extraction,
            index,
        }
    }
}
