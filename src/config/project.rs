//! Project hierarchy document
//!
//! The document is deserialized into loosely-shaped raw structs first and then
//! validated once into the [`ProjectConfig`] graph. Nothing downstream looks
//! at raw keys again.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const DEFAULT_RETENTION_DAYS: u32 = 90;
const DEFAULT_UPDATE_FREQUENCY: &str = "On-Demand";

/// Root of the hierarchy: project → workbook → dashboard → sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub name: String,
    pub governance_standard: String,
    pub data_retention_days: u32,
    pub workbooks: Vec<Workbook>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
    pub name: String,
    pub owner: Option<String>,
    pub dashboards: Vec<Dashboard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub name: String,
    pub description: Option<String>,
    /// Columns to redact, deduplicated, in document order.
    pub mask_columns: Vec<String>,
    pub index_profile: Option<IndexProfile>,
    /// Sheet tags, unique within the dashboard, in document order.
    pub sheets: Vec<String>,
}

/// Parameters of the downstream knowledge index for one dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexProfile {
    pub index_name: String,
    pub system_persona: String,
    pub insight_focus: Vec<String>,
    pub update_frequency: String,
}

impl ProjectConfig {
    /// Parse and validate a JSON project document.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let doc: RawProject =
            serde_json::from_str(raw).map_err(|e| ConfigError::malformed(e.to_string()))?;
        doc.validate()
    }

    /// Validate an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let doc: RawProject =
            serde_json::from_value(value).map_err(|e| ConfigError::malformed(e.to_string()))?;
        doc.validate()
    }

    /// Read and validate a project document from disk.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&content)
    }

    pub fn sheet_count(&self) -> usize {
        self.workbooks
            .iter()
            .flat_map(|wb| &wb.dashboards)
            .map(|db| db.sheets.len())
            .sum()
    }

    pub fn dashboard_count(&self) -> usize {
        self.workbooks.iter().map(|wb| wb.dashboards.len()).sum()
    }

    /// Find a dashboard by name, returning it with its workbook.
    pub fn find_dashboard(&self, name: &str) -> Option<(&Workbook, &Dashboard)> {
        self.workbooks.iter().find_map(|wb| {
            wb.dashboards
                .iter()
                .find(|db| db.name == name)
                .map(|db| (wb, db))
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawProject {
    #[serde(alias = "projectName")]
    project_name: String,
    #[serde(default, alias = "governanceStandard")]
    governance_standard: Option<String>,
    #[serde(default)]
    data_retention_days: Option<u32>,
    #[serde(default)]
    workbooks: Vec<RawWorkbook>,
}

#[derive(Debug, Deserialize)]
struct RawWorkbook {
    workbook_name: String,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    dashboards: Vec<RawDashboard>,
}

#[derive(Debug, Deserialize)]
struct RawDashboard {
    dashboard_name: String,
    #[serde(default)]
    description: Option<String>,
    sheets: Vec<String>,
    #[serde(default)]
    mask_columns: Vec<String>,
    #[serde(default)]
    gem_config: Option<RawIndexProfile>,
}

#[derive(Debug, Deserialize)]
struct RawIndexProfile {
    gem_name: String,
    #[serde(default)]
    system_persona: String,
    #[serde(default)]
    insight_focus: Vec<String>,
    #[serde(default)]
    update_frequency: Option<String>,
}

impl RawProject {
    fn validate(self) -> Result<ProjectConfig, ConfigError> {
        let name = require_name(self.project_name, "projectName")?;

        let mut seen_workbooks = HashSet::new();
        let mut workbooks = Vec::with_capacity(self.workbooks.len());
        for (i, raw) in self.workbooks.into_iter().enumerate() {
            let workbook = raw.validate(i)?;
            if !seen_workbooks.insert(workbook.name.clone()) {
                return Err(ConfigError::malformed(format!(
                    "workbook '{}' appears more than once",
                    workbook.name
                )));
            }
            workbooks.push(workbook);
        }

        Ok(ProjectConfig {
            name,
            governance_standard: self.governance_standard.unwrap_or_default(),
            data_retention_days: self.data_retention_days.unwrap_or(DEFAULT_RETENTION_DAYS),
            workbooks,
        })
    }
}

impl RawWorkbook {
    fn validate(self, index: usize) -> Result<Workbook, ConfigError> {
        let name = require_name(self.workbook_name, &format!("workbooks[{index}].workbook_name"))?;

        let mut seen_dashboards = HashSet::new();
        let mut dashboards = Vec::with_capacity(self.dashboards.len());
        for (j, raw) in self.dashboards.into_iter().enumerate() {
            let dashboard = raw.validate(&name, index, j)?;
            if !seen_dashboards.insert(dashboard.name.clone()) {
                return Err(ConfigError::malformed(format!(
                    "dashboard '{}' appears more than once in workbook '{name}'",
                    dashboard.name
                )));
            }
            dashboards.push(dashboard);
        }

        Ok(Workbook {
            name,
            owner: self.owner.filter(|o| !o.trim().is_empty()),
            dashboards,
        })
    }
}

impl RawDashboard {
    fn validate(
        self,
        workbook: &str,
        wb_index: usize,
        index: usize,
    ) -> Result<Dashboard, ConfigError> {
        let path = format!("workbooks[{wb_index}].dashboards[{index}]");
        let name = require_name(self.dashboard_name, &format!("{path}.dashboard_name"))?;

        let mut seen = HashSet::new();
        let mut sheets = Vec::with_capacity(self.sheets.len());
        for (k, tag) in self.sheets.into_iter().enumerate() {
            let tag = require_name(tag, &format!("{path}.sheets[{k}]"))?;
            if !seen.insert(tag.clone()) {
                return Err(ConfigError::DuplicateSheetTag {
                    workbook: workbook.to_string(),
                    dashboard: name,
                    tag,
                });
            }
            sheets.push(tag);
        }

        let mut mask_columns: Vec<String> = Vec::with_capacity(self.mask_columns.len());
        for column in self.mask_columns {
            if !mask_columns.contains(&column) {
                mask_columns.push(column);
            }
        }

        let index_profile = match self.gem_config {
            Some(raw) => Some(IndexProfile {
                index_name: require_name(raw.gem_name, &format!("{path}.gem_config.gem_name"))?,
                system_persona: raw.system_persona,
                insight_focus: raw.insight_focus,
                update_frequency: raw
                    .update_frequency
                    .unwrap_or_else(|| DEFAULT_UPDATE_FREQUENCY.to_string()),
            }),
            None => None,
        };

        Ok(Dashboard {
            name,
            description: self.description,
            mask_columns,
            index_profile,
            sheets,
        })
    }
}

fn require_name(value: String, field: &str) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::malformed(format!("{field} must not be empty")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "project_name": "Finance_Global",
            "governance_standard": "ISO-27001-Compliance",
            "workbooks": [{
                "workbook_name": "Executive_Q1_Review",
                "owner": "finance_ops_team",
                "dashboards": [{
                    "dashboard_name": "Revenue_Tracking",
                    "description": "Finalized revenue",
                    "sheets": ["FIN.REV.NA", "FIN.REV.EU"],
                    "mask_columns": ["CUSTOMER_NAME", "EMAIL", "EMAIL"],
                    "gem_config": {
                        "gem_name": "Revenue Analyst Gem",
                        "system_persona": "You are a senior analyst.",
                        "insight_focus": ["YoY Growth", "Outlier Detection"]
                    }
                }]
            }]
        })
    }

    #[test]
    fn test_parse_full_document() {
        let config = ProjectConfig::from_value(sample()).unwrap();
        assert_eq!(config.name, "Finance_Global");
        assert_eq!(config.governance_standard, "ISO-27001-Compliance");
        assert_eq!(config.data_retention_days, 90);
        assert_eq!(config.sheet_count(), 2);

        let dashboard = &config.workbooks[0].dashboards[0];
        assert_eq!(dashboard.mask_columns, vec!["CUSTOMER_NAME", "EMAIL"]);
        let profile = dashboard.index_profile.as_ref().unwrap();
        assert_eq!(profile.index_name, "Revenue Analyst Gem");
        assert_eq!(profile.update_frequency, "On-Demand");
    }

    #[test]
    fn test_camel_case_root_keys_accepted() {
        let raw = r#"{"projectName": "P", "governanceStandard": "G", "workbooks": []}"#;
        let config = ProjectConfig::parse(raw).unwrap();
        assert_eq!(config.name, "P");
        assert_eq!(config.governance_standard, "G");
        assert!(config.workbooks.is_empty());
    }

    #[test]
    fn test_optional_fields_default() {
        let raw = json!({
            "project_name": "P",
            "workbooks": [{
                "workbook_name": "W",
                "dashboards": [{"dashboard_name": "D", "sheets": []}]
            }]
        });
        let config = ProjectConfig::from_value(raw).unwrap();
        let dashboard = &config.workbooks[0].dashboards[0];
        assert!(dashboard.mask_columns.is_empty());
        assert!(dashboard.index_profile.is_none());
        assert!(config.workbooks[0].owner.is_none());
        assert_eq!(config.sheet_count(), 0);
    }

    #[test]
    fn test_missing_project_name_is_malformed() {
        let err = ProjectConfig::parse(r#"{"workbooks": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDocument { .. }));
    }

    #[test]
    fn test_empty_names_are_malformed() {
        let err = ProjectConfig::parse(r#"{"project_name": "  "}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDocument { .. }));

        let raw = json!({
            "project_name": "P",
            "workbooks": [{
                "workbook_name": "W",
                "dashboards": [{"dashboard_name": "", "sheets": []}]
            }]
        });
        let err = ProjectConfig::from_value(raw).unwrap_err();
        assert!(err.to_string().contains("dashboard_name"));
    }

    #[test]
    fn test_sheets_must_be_array() {
        let raw = json!({
            "project_name": "P",
            "workbooks": [{
                "workbook_name": "W",
                "dashboards": [{"dashboard_name": "D", "sheets": "A"}]
            }]
        });
        let err = ProjectConfig::from_value(raw).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDocument { .. }));

        let raw = json!({
            "project_name": "P",
            "workbooks": [{"workbook_name": "W", "dashboards": [{"dashboard_name": "D"}]}]
        });
        assert!(ProjectConfig::from_value(raw).is_err());
    }

    #[test]
    fn test_duplicate_sheet_tag_rejected() {
        let raw = json!({
            "project_name": "P",
            "workbooks": [{
                "workbook_name": "W",
                "dashboards": [{"dashboard_name": "D", "sheets": ["A.B.C", "X", "A.B.C"]}]
            }]
        });
        match ProjectConfig::from_value(raw).unwrap_err() {
            ConfigError::DuplicateSheetTag {
                workbook,
                dashboard,
                tag,
            } => {
                assert_eq!(workbook, "W");
                assert_eq!(dashboard, "D");
                assert_eq!(tag, "A.B.C");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_same_tag_under_different_dashboards_allowed() {
        let raw = json!({
            "project_name": "P",
            "workbooks": [{
                "workbook_name": "W",
                "dashboards": [
                    {"dashboard_name": "D1", "sheets": ["A"]},
                    {"dashboard_name": "D2", "sheets": ["A"]}
                ]
            }]
        });
        assert!(ProjectConfig::from_value(raw).is_ok());
    }

    #[test]
    fn test_duplicate_sibling_containers_rejected() {
        let raw = json!({
            "project_name": "P",
            "workbooks": [
                {"workbook_name": "W", "dashboards": []},
                {"workbook_name": "W", "dashboards": []}
            ]
        });
        let err = ProjectConfig::from_value(raw).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedDocument { .. }));
    }

    #[test]
    fn test_find_dashboard() {
        let config = ProjectConfig::from_value(sample()).unwrap();
        let (wb, db) = config.find_dashboard("Revenue_Tracking").unwrap();
        assert_eq!(wb.name, "Executive_Q1_Review");
        assert_eq!(db.sheets.len(), 2);
        assert!(config.find_dashboard("missing").is_none());
    }
}
