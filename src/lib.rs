//! # tagsync
//!
//! Walks a project → workbook → dashboard → sheet hierarchy, mirrors it as a
//! folder tree in a storage namespace, extracts each tagged sheet's latest
//! result set with configured columns redacted, and confirms the downstream
//! knowledge index picked the artifact up.
//!
//! ## Usage
//!
//! ```bash
//! tagsync run project.json --credentials credentials.json [--audit audit.csv]
//! ```
//!
//! ## Modules
//!
//! - `abstractions` - Capability traits for the source, namespace and index collaborators
//! - `backends` - Directory-backed collaborators for local runs
//! - `cancel` - Cooperative cancellation signal
//! - `config` - Project document, credentials and run settings
//! - `error` - Error types with stable codes
//! - `extract` - Tabular model, masking and artifact serialization
//! - `instructions` - Index instruction text and metadata
//! - `orchestrator` - Run traversal, failure propagation and status events
//! - `reconcile` - Get-or-create of containers with a run-scoped cache
//! - `report` - Run report and audit export
//! - `verify` - Index-sync verification with retry and backoff
//! - `testing` - Mock collaborators and fixtures
pub mod abstractions;
pub mod backends;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod instructions;
pub mod orchestrator;
pub mod reconcile;
pub mod report;
pub mod verify;

pub mod testing;

pub use orchestrator::Orchestrator;
pub use report::RunReport;
