//! Mock implementations of the collaborator traits
//!
//! Each mock is configured with builder-style methods and records the calls it
//! receives, so tests can assert on both outcomes and interactions.

pub mod extraction;
pub mod index;
pub mod namespace;

pub use extraction::MockExtraction;
pub use index::MockIndex;
pub use namespace::{MockNamespace, WrittenArtifact};
