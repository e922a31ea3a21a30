//! Common test utilities and helpers

#![allow(dead_code)]

use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Settings that keep CLI runs fast: no backoff between probes.
pub const FAST_SETTINGS: &str = r#"
[verification]
max_attempts = 3
initial_delay = "0s"
max_delay = "0s"
"#;

/// Builder for an on-disk workspace: project document, credentials, fixture
/// directory, storage root and settings file.
pub struct WorkspaceBuilder {
    temp_dir: TempDir,
    project: Value,
    fixtures: Vec<(String, Value)>,
    separate_index_root: bool,
    settings: String,
}

impl WorkspaceBuilder {
    pub fn new(project: Value) -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            project,
            fixtures: Vec::new(),
            separate_index_root: false,
            settings: FAST_SETTINGS.to_string(),
        })
    }

    /// A recorded successful run for `tag`, completed now.
    pub fn with_fixture(mut self, tag: &str, columns: &[&str], rows: Value) -> Self {
        self.fixtures.push((
            tag.to_string(),
            json!({
                "status": "SUCCESS",
                "completed_at": chrono::Utc::now().to_rfc3339(),
                "query_id": format!("q-{tag}"),
                "columns": columns,
                "rows": rows,
            }),
        ));
        self
    }

    /// Point the index at an empty directory so nothing is ever indexed.
    pub fn with_empty_index(mut self) -> Self {
        self.separate_index_root = true;
        self
    }

    pub fn with_settings(mut self, settings: &str) -> Self {
        self.settings = settings.to_string();
        self
    }

    pub fn build(self) -> Result<Workspace> {
        let root = self.temp_dir.path();
        let fixtures = root.join("fixtures");
        let storage = root.join("storage");
        let index = if self.separate_index_root {
            root.join("index")
        } else {
            storage.clone()
        };
        fs::create_dir_all(&fixtures)?;
        fs::create_dir_all(&storage)?;
        fs::create_dir_all(&index)?;

        for (tag, run) in &self.fixtures {
            fs::write(fixtures.join(format!("{tag}.json")), run.to_string())?;
        }

        let project = root.join("project.json");
        fs::write(&project, serde_json::to_string_pretty(&self.project)?)?;

        let credentials = root.join("credentials.json");
        fs::write(
            &credentials,
            json!({
                "snowflake": {"fixtures": fixtures},
                "google_drive": {"root": storage},
                "gemini": {"root": index},
            })
            .to_string(),
        )?;

        let settings = root.join("settings.toml");
        fs::write(&settings, &self.settings)?;

        Ok(Workspace {
            temp_dir: self.temp_dir,
            project,
            credentials,
            settings,
            storage,
        })
    }
}

pub struct Workspace {
    temp_dir: TempDir,
    pub project: PathBuf,
    pub credentials: PathBuf,
    pub settings: PathBuf,
    pub storage: PathBuf,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Read a file placed under the storage root.
    pub fn stored(&self, relative: &str) -> Result<String> {
        Ok(fs::read_to_string(self.storage.join(relative))?)
    }
}

/// The single-sheet project used throughout the end-to-end tests.
pub fn finance_project() -> Value {
    json!({
        "projectName": "Finance",
        "governanceStandard": "ISO-27001",
        "workbooks": [{
            "workbook_name": "Revenue",
            "owner": "finance-ops",
            "dashboards": [{
                "dashboard_name": "Quarterly",
                "mask_columns": ["EMAIL"],
                "sheets": ["A.B.C"],
                "gem_config": {
                    "gem_name": "Revenue Analyst",
                    "system_persona": "Senior revenue analyst",
                    "insight_focus": ["growth"]
                }
            }]
        }]
    })
}
