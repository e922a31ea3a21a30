//! Configuration inputs of a run
//!
//! - [`ProjectConfig`]: the validated project → workbook → dashboard → sheet graph
//! - [`Credentials`]: opaque capability blocks for the three collaborators
//! - [`RunSettings`]: retry, lookback and concurrency tuning

pub mod credentials;
pub mod project;
pub mod settings;

pub use credentials::{CredentialBlock, Credentials};
pub use project::{Dashboard, IndexProfile, ProjectConfig, Workbook};
pub use settings::{
    default_settings_path, BackoffKind, ExecutionSettings, ExtractionSettings, RunSettings,
    VerificationSettings,
};
