//! Knowledge-index abstraction

use crate::config::{Dashboard, ProjectConfig, Workbook};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What the index is asked about: which index, and where the artifact lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexContext {
    pub index_name: String,
    /// Display path, `"{project} > {dashboard}"`.
    pub path: String,
    /// Container names from the project down to the dashboard.
    pub location: Vec<String>,
    pub persona: Option<String>,
    pub insight_focus: Vec<String>,
}

impl IndexContext {
    pub fn for_dashboard(
        project: &ProjectConfig,
        workbook: &Workbook,
        dashboard: &Dashboard,
    ) -> Self {
        let profile = dashboard.index_profile.as_ref();
        Self {
            index_name: profile
                .map(|p| p.index_name.clone())
                .unwrap_or_else(|| dashboard.name.clone()),
            path: format!("{} > {}", project.name, dashboard.name),
            location: vec![
                project.name.clone(),
                workbook.name.clone(),
                dashboard.name.clone(),
            ],
            persona: profile
                .map(|p| p.system_persona.clone())
                .filter(|p| !p.is_empty()),
            insight_focus: profile.map(|p| p.insight_focus.clone()).unwrap_or_default(),
        }
    }
}

#[async_trait]
pub trait IndexClient: Send + Sync {
    /// Verify credentials before a run starts.
    async fn check_ready(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether the artifact for `tag` is visible in the index yet.
    async fn probe_indexed(&self, context: &IndexContext, tag: &str) -> anyhow::Result<bool>;
}
