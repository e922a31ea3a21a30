//! Fixture-directory tabular source
//!
//! Each tag is a file `<tag>.json` holding one recorded execution or an array
//! of them:
//!
//! ```json
//! {"status": "SUCCESS", "completed_at": "2024-05-01T10:00:00Z",
//!  "query_id": "01a2", "columns": ["NAME"], "rows": [["Jo"]]}
//! ```

use super::{is_plain_name, required_path};
use crate::abstractions::{ExtractionClient, TabularResult};
use crate::config::CredentialBlock;
use crate::error::{CredentialsError, ExtractError};
use crate::extract::Table;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const SUCCESS_STATUS: &str = "SUCCESS";

#[derive(Debug, Clone, Deserialize)]
struct RecordedRun {
    status: String,
    completed_at: DateTime<Utc>,
    #[serde(default)]
    query_id: Option<String>,
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Many(Vec<RecordedRun>),
    One(RecordedRun),
}

#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Source block: `{"fixtures": "<dir>"}`.
    pub fn from_credentials(block: &CredentialBlock) -> Result<Self, CredentialsError> {
        Ok(Self::new(required_path(block, "source", "fixtures")?))
    }
}

/// Latest successful run that completed at or after `cutoff`.
fn latest_successful(runs: Vec<RecordedRun>, cutoff: Option<DateTime<Utc>>) -> Option<RecordedRun> {
    runs.into_iter()
        .filter(|run| run.status.eq_ignore_ascii_case(SUCCESS_STATUS))
        .filter(|run| cutoff.map_or(true, |c| run.completed_at >= c))
        .max_by_key(|run| run.completed_at)
}

#[async_trait]
impl ExtractionClient for FixtureSource {
    async fn check_ready(&self) -> Result<()> {
        let metadata = tokio::fs::metadata(&self.dir)
            .await
            .with_context(|| {
                format!("fixture directory {} is not accessible", self.dir.display())
            })?;
        if !metadata.is_dir() {
            bail!("fixture path {} is not a directory", self.dir.display());
        }
        Ok(())
    }

    async fn latest_successful_result(
        &self,
        tag: &str,
        lookback: Duration,
    ) -> std::result::Result<Option<TabularResult>, ExtractError> {
        if !is_plain_name(tag) {
            return Err(ExtractError::source_failure(tag, "tag is not a valid file name"));
        }
        let path = self.dir.join(format!("{tag}.json"));
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No fixture for '{}' at {}", tag, path.display());
                return Ok(None);
            }
            Err(err) => {
                return Err(ExtractError::source_failure(
                    tag,
                    format!("failed to read {}: {err}", path.display()),
                ))
            }
        };

        let runs = match serde_json::from_str::<FixtureFile>(&content) {
            Ok(FixtureFile::Many(runs)) => runs,
            Ok(FixtureFile::One(run)) => vec![run],
            Err(err) => {
                return Err(ExtractError::source_failure(
                    tag,
                    format!("invalid fixture {}: {err}", path.display()),
                ))
            }
        };

        let cutoff = chrono::Duration::from_std(lookback)
            .ok()
            .and_then(|window| Utc::now().checked_sub_signed(window));
        let Some(run) = latest_successful(runs, cutoff) else {
            return Ok(None);
        };

        let table = Table::new(run.columns, run.rows)
            .map_err(|e| ExtractError::source_failure(tag, e.to_string()))?;
        Ok(Some(TabularResult {
            query_id: run
                .query_id
                .unwrap_or_else(|| format!("fixture-{}", run.completed_at.timestamp())),
            completed_at: run.completed_at,
            table,
        }))
    }
}
