//! Index instructions and metadata
//!
//! Each dashboard with an index profile gets a system prompt describing who
//! the index speaks as, which directory it reads, and which fields it must
//! treat as redacted.

use crate::config::{Dashboard, ProjectConfig, Workbook};
use crate::error::InstructionsError;
use crate::extract::REDACTION_MARKER;
use serde::Serialize;
use tera::{Context, Tera};

const INSTRUCTIONS_TEMPLATE: &str = "instructions";
const DEFAULT_INDEX_NAME: &str = "Unnamed index";
const DEFAULT_PERSONA: &str = "General Analyst";
const DEFAULT_UPDATE_FREQUENCY: &str = "On-Demand";
const PERSONA_SUMMARY_CHARS: usize = 50;

const TEMPLATE: &str = r#"### SYSTEM PROMPT FOR: {{ index_name }}

**Identity:** {{ persona }}

**Knowledge Access:** You have read-access to files in the '{{ dashboard }}' directory.
Focus your insights on: {{ insight_focus | join(sep=", ") }}

**Security & Privacy ({{ governance }}):**
{% if mask_columns %}The following fields are MASKED ({{ marker }}): {{ mask_columns | join(sep=", ") }}.
{% else %}No fields are masked for this dashboard.
{% endif %}- Do not attempt to reverse-engineer masked data.
- If a user asks for PII, state that it is redacted per governance standards.
"#;

/// One row of the index overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexMetadata {
    pub index_name: String,
    pub dashboard: String,
    /// `{project}/{workbook}/{dashboard}`
    pub index_path: String,
    pub persona_summary: String,
    pub update_frequency: String,
}

/// Renders instruction text from the built-in template.
pub struct InstructionRenderer {
    tera: Tera,
}

impl InstructionRenderer {
    pub fn new() -> Result<Self, InstructionsError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(INSTRUCTIONS_TEMPLATE, TEMPLATE)?;
        Ok(Self { tera })
    }

    /// Instruction text for the dashboard named `dashboard`.
    pub fn render(
        &self,
        config: &ProjectConfig,
        dashboard: &str,
    ) -> Result<String, InstructionsError> {
        let (_, found) = config
            .find_dashboard(dashboard)
            .ok_or_else(|| InstructionsError::UnknownDashboard {
                dashboard: dashboard.to_string(),
            })?;
        self.render_dashboard(config, found)
    }

    /// Instruction text for every dashboard that has an index profile, in
    /// document order.
    pub fn render_all(
        &self,
        config: &ProjectConfig,
    ) -> Result<Vec<(String, String)>, InstructionsError> {
        config
            .workbooks
            .iter()
            .flat_map(|wb| &wb.dashboards)
            .filter(|db| db.index_profile.is_some())
            .map(|db| Ok((db.name.clone(), self.render_dashboard(config, db)?)))
            .collect()
    }

    fn render_dashboard(
        &self,
        config: &ProjectConfig,
        dashboard: &Dashboard,
    ) -> Result<String, InstructionsError> {
        let profile = dashboard
            .index_profile
            .as_ref()
            .ok_or_else(|| InstructionsError::NoProfile {
                dashboard: dashboard.name.clone(),
            })?;

        let governance = if config.governance_standard.is_empty() {
            "governance standards"
        } else {
            config.governance_standard.as_str()
        };

        let mut context = Context::new();
        context.insert("index_name", &profile.index_name);
        context.insert("persona", &profile.system_persona);
        context.insert("dashboard", &dashboard.name);
        context.insert("insight_focus", &profile.insight_focus);
        context.insert("governance", governance);
        context.insert("marker", REDACTION_MARKER);
        context.insert("mask_columns", &dashboard.mask_columns);

        Ok(self.tera.render(INSTRUCTIONS_TEMPLATE, &context)?)
    }
}

/// Instruction text for one dashboard.
pub fn render_instructions(
    config: &ProjectConfig,
    dashboard: &str,
) -> Result<String, InstructionsError> {
    InstructionRenderer::new()?.render(config, dashboard)
}

/// Overview of every dashboard's index, in document order.
pub fn index_metadata(config: &ProjectConfig) -> Vec<IndexMetadata> {
    config
        .workbooks
        .iter()
        .flat_map(|wb| wb.dashboards.iter().map(move |db| (wb, db)))
        .map(|(wb, db)| metadata_row(config, wb, db))
        .collect()
}

fn metadata_row(
    config: &ProjectConfig,
    workbook: &Workbook,
    dashboard: &Dashboard,
) -> IndexMetadata {
    let profile = dashboard.index_profile.as_ref();
    let persona = profile
        .map(|p| p.system_persona.as_str())
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PERSONA);

    IndexMetadata {
        index_name: profile
            .map(|p| p.index_name.clone())
            .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
        dashboard: dashboard.name.clone(),
        index_path: format!("{}/{}/{}", config.name, workbook.name, dashboard.name),
        persona_summary: summarize(persona),
        update_frequency: profile
            .map(|p| p.update_frequency.clone())
            .unwrap_or_else(|| DEFAULT_UPDATE_FREQUENCY.to_string()),
    }
}

fn summarize(text: &str) -> String {
    if text.chars().count() <= PERSONA_SUMMARY_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(PERSONA_SUMMARY_CHARS).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ProjectConfig {
        ProjectConfig::from_value(json!({
            "projectName": "Finance",
            "governanceStandard": "ISO-27001",
            "workbooks": [{
                "workbook_name": "Revenue",
                "dashboards": [
                    {
                        "dashboard_name": "Quarterly",
                        "sheets": ["A.B.C"],
                        "mask_columns": ["EMAIL", "PHONE"],
                        "gem_config": {
                            "gem_name": "Revenue Analyst",
                            "system_persona": "You are a senior analyst specialized in Tableau report data.",
                            "insight_focus": ["growth", "churn"],
                            "update_frequency": "Daily"
                        }
                    },
                    {"dashboard_name": "Raw", "sheets": ["X"]}
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_render_includes_every_section() {
        let text = render_instructions(&config(), "Quarterly").unwrap();
        assert!(text.starts_with("### SYSTEM PROMPT FOR: Revenue Analyst"));
        assert!(text.contains("**Identity:** You are a senior analyst"));
        assert!(text.contains("files in the 'Quarterly' directory"));
        assert!(text.contains("Focus your insights on: growth, churn"));
        assert!(text.contains("**Security & Privacy (ISO-27001):**"));
        assert!(text.contains("The following fields are MASKED (***): EMAIL, PHONE."));
        assert!(text.contains("Do not attempt to reverse-engineer masked data."));
    }

    #[test]
    fn test_render_rejects_unknown_or_unprofiled_dashboard() {
        let config = config();
        assert!(matches!(
            render_instructions(&config, "Missing"),
            Err(InstructionsError::UnknownDashboard { .. })
        ));
        assert!(matches!(
            render_instructions(&config, "Raw"),
            Err(InstructionsError::NoProfile { .. })
        ));
    }

    #[test]
    fn test_render_all_skips_dashboards_without_profile() {
        let rendered = InstructionRenderer::new().unwrap().render_all(&config()).unwrap();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].0, "Quarterly");
    }

    #[test]
    fn test_metadata_rows() {
        let rows = index_metadata(&config());
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].index_name, "Revenue Analyst");
        assert_eq!(rows[0].index_path, "Finance/Revenue/Quarterly");
        assert_eq!(
            rows[0].persona_summary,
            "You are a senior analyst specialized in Tableau re..."
        );
        assert_eq!(rows[0].update_frequency, "Daily");

        assert_eq!(rows[1].index_name, "Unnamed index");
        assert_eq!(rows[1].persona_summary, "General Analyst");
        assert_eq!(rows[1].update_frequency, "On-Demand");
    }
}
