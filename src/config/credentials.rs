//! Credentials document
//!
//! Three independent capability blocks, each handed unchanged to the
//! initializer of the collaborator it authorizes. The core never inspects or
//! persists them.

use crate::error::CredentialsError;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Opaque credential bundle for one collaborator.
#[derive(Clone, PartialEq)]
pub struct CredentialBlock(Value);

impl CredentialBlock {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Look up a string entry, for initializers that need one.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl fmt::Debug for CredentialBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialBlock(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub source: CredentialBlock,
    pub storage: CredentialBlock,
    pub index: CredentialBlock,
}

#[derive(Deserialize)]
struct RawCredentials {
    #[serde(default, alias = "snowflake")]
    source: Option<Value>,
    #[serde(default, alias = "google_drive")]
    storage: Option<Value>,
    #[serde(default, alias = "gemini")]
    index: Option<Value>,
}

impl Credentials {
    pub fn parse(raw: &str) -> Result<Self, CredentialsError> {
        let doc: RawCredentials =
            serde_json::from_str(raw).map_err(|e| CredentialsError::Malformed {
                message: e.to_string(),
            })?;

        let block = |value: Option<Value>, name: &'static str| {
            value
                .filter(|v| !v.is_null())
                .map(CredentialBlock::new)
                .ok_or(CredentialsError::MissingBlock { block: name })
        };

        Ok(Self {
            source: block(doc.source, "source")?,
            storage: block(doc.storage, "storage")?,
            index: block(doc.index, "index")?,
        })
    }

    pub async fn load(path: &Path) -> Result<Self, CredentialsError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| CredentialsError::Malformed {
                    message: format!("{}: {e}", path.display()),
                })?;
        Self::parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_block_names_accepted() {
        let raw = r#"{
            "snowflake": {"account": "acme"},
            "google_drive": {"root": "/tmp/drive"},
            "gemini": {"api_key": "secret"}
        }"#;
        let creds = Credentials::parse(raw).unwrap();
        assert_eq!(creds.storage.get_str("root"), Some("/tmp/drive"));
        assert_eq!(creds.index.get_str("api_key"), Some("secret"));
    }

    #[test]
    fn test_missing_block_reported_by_name() {
        let raw = r#"{"source": {}, "storage": {}}"#;
        let err = Credentials::parse(raw).unwrap_err();
        assert!(matches!(err, CredentialsError::MissingBlock { block: "index" }));
    }

    #[test]
    fn test_debug_output_is_redacted() {
        let raw = r#"{"source": {"password": "hunter2"}, "storage": {}, "index": {}}"#;
        let creds = Credentials::parse(raw).unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
