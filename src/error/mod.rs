//! Error taxonomy for a pipeline run
//!
//! Every error carries a stable numeric code (see [`ErrorCode`]) so that
//! audit rows and CLI output can be grepped independently of message wording.
//! Only [`ConfigError`], [`CredentialsError`] and [`RunError`] abort a run;
//! the remaining types are recorded per node and never escalate.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// Failure to load or validate the project document or run settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("[E{:04}] Malformed project document: {message}", ErrorCode::CONFIG_MALFORMED)]
    MalformedDocument { message: String },

    #[error(
        "[E{:04}] Duplicate sheet tag '{tag}' in dashboard '{dashboard}' of workbook '{workbook}'",
        ErrorCode::CONFIG_DUPLICATE_SHEET_TAG
    )]
    DuplicateSheetTag {
        workbook: String,
        dashboard: String,
        tag: String,
    },

    #[error("[E{:04}] Failed to read {}: {source}", ErrorCode::CONFIG_IO, .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[E{:04}] Invalid run settings: {message}", ErrorCode::CONFIG_SETTINGS)]
    Settings { message: String },
}

impl ConfigError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::MalformedDocument { .. } => ErrorCode::CONFIG_MALFORMED,
            Self::DuplicateSheetTag { .. } => ErrorCode::CONFIG_DUPLICATE_SHEET_TAG,
            Self::Io { .. } => ErrorCode::CONFIG_IO,
            Self::Settings { .. } => ErrorCode::CONFIG_SETTINGS,
        }
    }
}

/// Failure to load the credentials document.
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("[E{:04}] Malformed credentials document: {message}", ErrorCode::CREDENTIALS_MALFORMED)]
    Malformed { message: String },

    #[error(
        "[E{:04}] Credentials document has no '{block}' block",
        ErrorCode::CREDENTIALS_MISSING_BLOCK
    )]
    MissingBlock { block: &'static str },
}

impl CredentialsError {
    pub fn code(&self) -> u16 {
        match self {
            Self::Malformed { .. } => ErrorCode::CREDENTIALS_MALFORMED,
            Self::MissingBlock { .. } => ErrorCode::CREDENTIALS_MISSING_BLOCK,
        }
    }
}

/// Failure while ensuring a container exists.
///
/// Any variant causes the affected subtree to be skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("[E{:04}] Unauthorized: {message}", ErrorCode::RECONCILE_UNAUTHORIZED)]
    Unauthorized { message: String },

    #[error("[E{:04}] Namespace unavailable: {message}", ErrorCode::RECONCILE_UNAVAILABLE)]
    Unavailable { message: String },

    #[error("[E{:04}] Transport failure: {message}", ErrorCode::RECONCILE_TRANSPORT)]
    Transport { message: String },
}

impl ReconcileError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Whether a caller-level retry policy may reasonably try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::Unavailable { .. })
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => ErrorCode::RECONCILE_UNAUTHORIZED,
            Self::Unavailable { .. } => ErrorCode::RECONCILE_UNAVAILABLE,
            Self::Transport { .. } => ErrorCode::RECONCILE_TRANSPORT,
        }
    }
}

/// Failure to produce an artifact for one sheet. Never retried.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(
        "[E{:04}] No successful result set found for tag '{tag}'",
        ErrorCode::EXTRACT_NO_RESULT
    )]
    NoResultFound { tag: String },

    #[error("[E{:04}] Source failed for tag '{tag}': {message}", ErrorCode::EXTRACT_SOURCE)]
    Source { tag: String, message: String },

    #[error(
        "[E{code:04}] Failed to serialize table: {0}",
        code = ErrorCode::EXTRACT_SERIALIZATION
    )]
    Serialization(#[from] serde_json::Error),
}

impl ExtractError {
    pub fn source_failure(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            tag: tag.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::NoResultFound { .. } => ErrorCode::EXTRACT_NO_RESULT,
            Self::Source { .. } => ErrorCode::EXTRACT_SOURCE,
            Self::Serialization(_) => ErrorCode::EXTRACT_SERIALIZATION,
        }
    }
}

/// Failure to write an extracted artifact into its container.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "[E{:04}] Failed to write '{name}' into '{container}': {message}",
    ErrorCode::PLACEMENT_FAILED
)]
pub struct PlacementError {
    pub container: String,
    pub name: String,
    pub message: String,
}

/// Verification ended without the index confirming the artifact.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("[E{:04}] {message}", ErrorCode::VERIFY_EXHAUSTED)]
    Exhausted { message: String },

    #[error("[E{:04}] {message}", ErrorCode::VERIFY_CANCELLED)]
    Cancelled { message: String },
}

impl VerificationError {
    pub fn code(&self) -> u16 {
        match self {
            Self::Exhausted { .. } => ErrorCode::VERIFY_EXHAUSTED,
            Self::Cancelled { .. } => ErrorCode::VERIFY_CANCELLED,
        }
    }
}

/// The three collaborators a run depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    Source,
    Namespace,
    Index,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Source => "source",
            Self::Namespace => "namespace",
            Self::Index => "index",
        };
        f.write_str(name)
    }
}

/// A collaborator could not be authorized or initialized.
#[derive(Error, Debug)]
#[error("[E{code:04}] Failed to initialize {collaborator} collaborator: {message}")]
pub struct InitializationError {
    pub collaborator: Collaborator,
    pub code: u16,
    pub message: String,
}

impl InitializationError {
    pub fn new(collaborator: Collaborator, message: impl Into<String>) -> Self {
        let code = match collaborator {
            Collaborator::Source => ErrorCode::INIT_SOURCE,
            Collaborator::Namespace => ErrorCode::INIT_NAMESPACE,
            Collaborator::Index => ErrorCode::INIT_INDEX,
        };
        Self {
            collaborator,
            code,
            message: message.into(),
        }
    }
}

/// Failure to render index instructions for a dashboard.
#[derive(Error, Debug)]
pub enum InstructionsError {
    #[error(
        "[E{:04}] Dashboard '{dashboard}' not found",
        ErrorCode::INSTRUCTIONS_UNKNOWN_DASHBOARD
    )]
    UnknownDashboard { dashboard: String },

    #[error(
        "[E{:04}] Dashboard '{dashboard}' has no index profile",
        ErrorCode::INSTRUCTIONS_NO_PROFILE
    )]
    NoProfile { dashboard: String },

    #[error("[E{:04}] Template rendering failed: {source}", ErrorCode::INSTRUCTIONS_TEMPLATE)]
    Template {
        #[from]
        source: tera::Error,
    },
}

/// Errors that abort a run before any work starts.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Initialization(#[from] InitializationError),
}
