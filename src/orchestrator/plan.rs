//! Planned task graph, for previews before anything runs

use crate::config::ProjectConfig;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedTask {
    EnsureProject { project: String },
    EnsureWorkbook { workbook: String, owner: Option<String> },
    EnsureDashboard { workbook: String, dashboard: String },
    ExtractAndMask {
        dashboard: String,
        sheet_tag: String,
        mask_columns: Vec<String>,
    },
    VerifySync {
        dashboard: String,
        sheet_tag: String,
        index_name: String,
    },
}

impl PlannedTask {
    /// Nesting depth for indented display.
    pub fn depth(&self) -> usize {
        match self {
            PlannedTask::EnsureProject { .. } => 0,
            PlannedTask::EnsureWorkbook { .. } => 1,
            PlannedTask::EnsureDashboard { .. } => 2,
            PlannedTask::ExtractAndMask { .. } | PlannedTask::VerifySync { .. } => 3,
        }
    }
}

impl fmt::Display for PlannedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedTask::EnsureProject { project } => {
                write!(f, "Ensure project folder '{project}'")
            }
            PlannedTask::EnsureWorkbook { workbook, owner } => {
                write!(f, "Ensure workbook folder '{workbook}'")?;
                if let Some(owner) = owner {
                    write!(f, " (owner: {owner})")?;
                }
                Ok(())
            }
            PlannedTask::EnsureDashboard { dashboard, .. } => {
                write!(f, "Ensure dashboard folder '{dashboard}'")
            }
            PlannedTask::ExtractAndMask {
                sheet_tag,
                mask_columns,
                ..
            } => {
                write!(f, "Extract & mask '{sheet_tag}'")?;
                if !mask_columns.is_empty() {
                    write!(f, " [mask: {}]", mask_columns.join(", "))?;
                }
                Ok(())
            }
            PlannedTask::VerifySync {
                sheet_tag,
                index_name,
                ..
            } => write!(f, "Verify sync of '{sheet_tag}' in '{index_name}'"),
        }
    }
}

/// Tasks in the exact order a sequential run performs them.
pub fn plan(config: &ProjectConfig) -> Vec<PlannedTask> {
    let mut tasks = vec![PlannedTask::EnsureProject {
        project: config.name.clone(),
    }];

    for workbook in &config.workbooks {
        tasks.push(PlannedTask::EnsureWorkbook {
            workbook: workbook.name.clone(),
            owner: workbook.owner.clone(),
        });
        for dashboard in &workbook.dashboards {
            tasks.push(PlannedTask::EnsureDashboard {
                workbook: workbook.name.clone(),
                dashboard: dashboard.name.clone(),
            });
            let index_name = dashboard
                .index_profile
                .as_ref()
                .map(|p| p.index_name.clone())
                .unwrap_or_else(|| dashboard.name.clone());
            for tag in &dashboard.sheets {
                tasks.push(PlannedTask::ExtractAndMask {
                    dashboard: dashboard.name.clone(),
                    sheet_tag: tag.clone(),
                    mask_columns: dashboard.mask_columns.clone(),
                });
                tasks.push(PlannedTask::VerifySync {
                    dashboard: dashboard.name.clone(),
                    sheet_tag: tag.clone(),
                    index_name: index_name.clone(),
                });
            }
        }
    }

    tasks
}
