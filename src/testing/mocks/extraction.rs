//! Mock tabular source

use crate::abstractions::{ExtractionClient, TabularResult};
use crate::error::ExtractError;
use crate::extract::Table;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves a fixed table per tag; unknown tags have no recent result.
pub struct MockExtraction {
    results: HashMap<String, std::result::Result<Table, String>>,
    lookbacks: Arc<Mutex<Vec<Duration>>>,
    requested: Arc<Mutex<Vec<String>>>,
    not_ready: Option<String>,
}

impl Default for MockExtraction {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtraction {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
            lookbacks: Arc::new(Mutex::new(Vec::new())),
            requested: Arc::new(Mutex::new(Vec::new())),
            not_ready: None,
        }
    }

    pub fn with_result(mut self, tag: &str, table: Table) -> Self {
        self.results.insert(tag.to_string(), Ok(table));
        self
    }

    pub fn with_failure(mut self, tag: &str, message: &str) -> Self {
        self.results.insert(tag.to_string(), Err(message.to_string()));
        self
    }

    pub fn not_ready(mut self, message: &str) -> Self {
        self.not_ready = Some(message.to_string());
        self
    }

    /// Lookback windows passed to each request, in call order.
    pub fn lookbacks(&self) -> Vec<Duration> {
        self.lookbacks.lock().unwrap().clone()
    }

    pub fn requested_tags(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionClient for MockExtraction {
    async fn check_ready(&self) -> Result<()> {
        match &self.not_ready {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }

    async fn latest_successful_result(
        &self,
        tag: &str,
        lookback: Duration,
    ) -> std::result::Result<Option<TabularResult>, ExtractError> {
        self.lookbacks.lock().unwrap().push(lookback);
        self.requested.lock().unwrap().push(tag.to_string());

        match self.results.get(tag) {
            None => Ok(None),
            Some(Err(message)) => Err(ExtractError::source_failure(tag, message.clone())),
            Some(Ok(table)) => Ok(Some(TabularResult {
                query_id: format!("mock-query-{tag}"),
                completed_at: Utc::now(),
                table: table.clone(),
            })),
        }
    }
}
