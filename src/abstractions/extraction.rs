//! Tabular source abstraction
//!
//! The source system tags each report query with a sheet identifier; the
//! client resolves the most recent successful execution of a tag and
//! materializes its result set.

use crate::error::ExtractError;
use crate::extract::Table;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// One materialized result set.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularResult {
    /// Source-side identifier of the execution that produced the rows.
    pub query_id: String,
    pub completed_at: DateTime<Utc>,
    pub table: Table,
}

#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Verify credentials before a run starts.
    async fn check_ready(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Latest successful result tagged `tag` that completed within
    /// `lookback` of now, or `None` when there is none.
    async fn latest_successful_result(
        &self,
        tag: &str,
        lookback: Duration,
    ) -> Result<Option<TabularResult>, ExtractError>;
}
