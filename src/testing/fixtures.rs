//! Test data builders

use crate::config::ProjectConfig;
use crate::error::ConfigError;
use crate::extract::Table;
use serde_json::{json, Value};

/// Builds a project document the way a user would write it.
pub struct ProjectBuilder {
    name: String,
    governance_standard: Option<String>,
    workbooks: Vec<Value>,
}

impl ProjectBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            governance_standard: None,
            workbooks: Vec::new(),
        }
    }

    pub fn governance_standard(mut self, standard: &str) -> Self {
        self.governance_standard = Some(standard.to_string());
        self
    }

    /// Add a workbook with no dashboards.
    pub fn workbook(mut self, name: &str, owner: Option<&str>) -> Self {
        let mut workbook = json!({"workbook_name": name, "dashboards": []});
        if let Some(owner) = owner {
            workbook["owner"] = json!(owner);
        }
        self.workbooks.push(workbook);
        self
    }

    /// Add a dashboard to the most recently added workbook.
    pub fn dashboard(mut self, name: &str, sheets: &[&str], mask_columns: &[&str]) -> Self {
        if self.workbooks.is_empty() {
            self = self.workbook("Workbook", None);
        }
        if let Some(Value::Array(dashboards)) = self
            .workbooks
            .last_mut()
            .and_then(|w| w.get_mut("dashboards"))
        {
            dashboards.push(json!({
                "dashboard_name": name,
                "sheets": sheets,
                "mask_columns": mask_columns,
            }));
        }
        self
    }

    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "project_name": self.name,
            "workbooks": self.workbooks,
        });
        if let Some(standard) = &self.governance_standard {
            value["governance_standard"] = json!(standard);
        }
        value
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    pub fn build(&self) -> Result<ProjectConfig, ConfigError> {
        ProjectConfig::from_value(self.to_value())
    }
}

/// A table from string columns and JSON rows.
///
/// # Panics
/// When a row does not match the column count.
pub fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
    Table::new(columns.iter().map(|c| c.to_string()).collect(), rows)
        .unwrap_or_else(|e| panic!("invalid fixture table: {e}"))
}
