//! Extraction and masking
//!
//! Resolves the latest successful result set for a sheet tag, redacts the
//! configured columns and serializes the table to its canonical record form.
//! No remote write happens here; placement is the orchestrator's step.

pub mod table;

pub use table::{Table, TableError, REDACTION_MARKER};

use crate::abstractions::ExtractionClient;
use crate::error::ExtractError;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A masked, serialized result set ready to be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArtifact {
    pub sheet_tag: String,
    pub query_id: String,
    pub row_count: usize,
    /// Masked columns that the result set actually had, in column order.
    pub masked_columns_applied: Vec<String>,
    pub payload: Vec<u8>,
}

impl ExtractedArtifact {
    /// File name of the artifact inside its dashboard container.
    pub fn file_name(&self) -> String {
        artifact_name(&self.sheet_tag)
    }
}

pub fn artifact_name(sheet_tag: &str) -> String {
    format!("{sheet_tag}.json")
}

/// Mask `table` in place and serialize it.
pub fn mask_and_serialize(
    table: &mut Table,
    mask_columns: &[String],
) -> Result<(Vec<String>, Vec<u8>), ExtractError> {
    let applied = table.mask(mask_columns);
    let payload = table.to_records_json()?;
    Ok((applied, payload))
}

pub struct Extractor {
    client: Arc<dyn ExtractionClient>,
    lookback: Duration,
}

impl Extractor {
    pub fn new(client: Arc<dyn ExtractionClient>, lookback: Duration) -> Self {
        Self { client, lookback }
    }

    pub async fn extract_and_mask(
        &self,
        sheet_tag: &str,
        mask_columns: &[String],
    ) -> Result<ExtractedArtifact, ExtractError> {
        let result = self
            .client
            .latest_successful_result(sheet_tag, self.lookback)
            .await?
            .ok_or_else(|| ExtractError::NoResultFound {
                tag: sheet_tag.to_string(),
            })?;

        debug!(
            "Resolved '{}' to query {} ({} rows)",
            sheet_tag,
            result.query_id,
            result.table.row_count()
        );

        let mut table = result.table;
        let (masked_columns_applied, payload) = mask_and_serialize(&mut table, mask_columns)?;

        Ok(ExtractedArtifact {
            sheet_tag: sheet_tag.to_string(),
            query_id: result.query_id,
            row_count: table.row_count(),
            masked_columns_applied,
            payload,
        })
    }
}
