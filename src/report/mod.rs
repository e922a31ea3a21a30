//! Run report
//!
//! One record per configured sheet, appended in traversal order. A record is
//! only created once its sheet reached a terminal state, so every entry is
//! written exactly once. The report is read-only once the run returns it.

pub mod audit;

pub use audit::{write_audit_csv, AuditRow};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// Not yet terminal; never present in a finished report.
    Pending,
    Verified,
    Exhausted,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SheetAction {
    PipelineSuccess,
    SyncExhausted,
    ExtractFailed,
    WriteFailed,
    Skipped,
    Cancelled,
}

/// State of the dashboard container a sheet is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FolderStatus {
    Created,
    Exists,
    Failed,
    /// An ancestor container failed, so this one was never attempted.
    NotReached,
}

macro_rules! screaming_display {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $(Self::$variant => $text,)+
                })
            }
        }
    };
}

screaming_display!(SyncStatus {
    Pending => "PENDING",
    Verified => "VERIFIED",
    Exhausted => "EXHAUSTED",
    Failed => "FAILED",
    Skipped => "SKIPPED",
});

screaming_display!(SheetAction {
    PipelineSuccess => "PIPELINE_SUCCESS",
    SyncExhausted => "SYNC_EXHAUSTED",
    ExtractFailed => "EXTRACT_FAILED",
    WriteFailed => "WRITE_FAILED",
    Skipped => "SKIPPED",
    Cancelled => "CANCELLED",
});

screaming_display!(FolderStatus {
    Created => "CREATED",
    Exists => "EXISTS",
    Failed => "FAILED",
    NotReached => "NOT_REACHED",
});

/// Terminal status of one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRecord {
    pub timestamp: DateTime<Utc>,
    pub workbook: String,
    pub dashboard: String,
    pub sheet_tag: String,
    pub owner: Option<String>,
    pub action: SheetAction,
    pub folder_status: FolderStatus,
    pub extracted: bool,
    pub masked_columns: Vec<String>,
    pub row_count: usize,
    pub sync_status: SyncStatus,
    pub attempts: u32,
    /// Error or verifier message explaining a non-verified status.
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    pub verified: usize,
    pub exhausted: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// One row of the project/workbook/dashboard rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyRow {
    pub project: String,
    pub workbook: String,
    pub dashboard: String,
    pub total_files: usize,
    pub masked_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub project: String,
    pub governance_standard: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Informational notes, such as ambiguous container names.
    pub notes: Vec<String>,
    records: Vec<SheetRecord>,
}

impl RunReport {
    pub fn new(project: impl Into<String>, governance_standard: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            project: project.into(),
            governance_standard: governance_standard.into(),
            started_at: Utc::now(),
            finished_at: None,
            notes: Vec::new(),
            records: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: SheetRecord) {
        debug_assert_ne!(record.sync_status, SyncStatus::Pending);
        self.records.push(record);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn records(&self) -> &[SheetRecord] {
        &self.records
    }

    pub fn record(&self, dashboard: &str, sheet_tag: &str) -> Option<&SheetRecord> {
        self.records
            .iter()
            .find(|r| r.dashboard == dashboard && r.sheet_tag == sheet_tag)
    }

    /// A run succeeds iff every sheet reached `Verified`.
    pub fn succeeded(&self) -> bool {
        self.records
            .iter()
            .all(|r| r.sync_status == SyncStatus::Verified)
    }

    pub fn counts(&self) -> ReportCounts {
        let mut counts = ReportCounts::default();
        for record in &self.records {
            match record.sync_status {
                SyncStatus::Verified => counts.verified += 1,
                SyncStatus::Exhausted => counts.exhausted += 1,
                SyncStatus::Failed => counts.failed += 1,
                SyncStatus::Skipped => counts.skipped += 1,
                SyncStatus::Pending => {}
            }
        }
        counts
    }

    pub fn total_rows(&self) -> usize {
        self.records.iter().map(|r| r.row_count).sum()
    }

    /// Files placed and columns masked per dashboard, in traversal order.
    pub fn hierarchy(&self) -> Vec<HierarchyRow> {
        let mut rows: Vec<HierarchyRow> = Vec::new();
        for record in &self.records {
            let position = rows
                .iter()
                .position(|r| r.workbook == record.workbook && r.dashboard == record.dashboard);
            let row = match position {
                Some(i) => &mut rows[i],
                None => {
                    rows.push(HierarchyRow {
                        project: self.project.clone(),
                        workbook: record.workbook.clone(),
                        dashboard: record.dashboard.clone(),
                        total_files: 0,
                        masked_columns: Vec::new(),
                    });
                    let last = rows.len() - 1;
                    &mut rows[last]
                }
            };
            if record.extracted && record.action != SheetAction::WriteFailed {
                row.total_files += 1;
            }
            for column in &record.masked_columns {
                if !row.masked_columns.contains(column) {
                    row.masked_columns.push(column.clone());
                }
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn record(dashboard: &str, tag: &str, status: SyncStatus) -> SheetRecord {
        SheetRecord {
            timestamp: Utc::now(),
            workbook: "W".to_string(),
            dashboard: dashboard.to_string(),
            sheet_tag: tag.to_string(),
            owner: None,
            action: match status {
                SyncStatus::Verified => SheetAction::PipelineSuccess,
                SyncStatus::Exhausted => SheetAction::SyncExhausted,
                SyncStatus::Failed => SheetAction::ExtractFailed,
                _ => SheetAction::Skipped,
            },
            folder_status: FolderStatus::Exists,
            extracted: matches!(status, SyncStatus::Verified | SyncStatus::Exhausted),
            masked_columns: vec!["EMAIL".to_string()],
            row_count: 10,
            sync_status: status,
            attempts: 1,
            detail: None,
        }
    }

    #[test]
    fn test_success_requires_every_sheet_verified() {
        let mut report = RunReport::new("P", "ISO");
        report.push(record("D", "A", SyncStatus::Verified));
        assert!(report.succeeded());

        report.push(record("D", "B", SyncStatus::Exhausted));
        assert!(!report.succeeded());
    }

    #[test]
    fn test_counts_and_rows() {
        let mut report = RunReport::new("P", "ISO");
        report.push(record("D", "A", SyncStatus::Verified));
        report.push(record("D", "B", SyncStatus::Failed));
        report.push(record("E", "C", SyncStatus::Skipped));

        let counts = report.counts();
        assert_eq!(counts.verified, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(report.total_rows(), 30);
        assert_eq!(report.record("D", "B").unwrap().sync_status, SyncStatus::Failed);
    }

    #[test]
    fn test_hierarchy_rollup() {
        let mut report = RunReport::new("P", "ISO");
        report.push(record("D", "A", SyncStatus::Verified));
        report.push(record("D", "B", SyncStatus::Exhausted));
        report.push(record("E", "C", SyncStatus::Skipped));

        let rows = report.hierarchy();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].dashboard, "D");
        assert_eq!(rows[0].total_files, 2);
        assert_eq!(rows[0].masked_columns, vec!["EMAIL"]);
        assert_eq!(rows[1].total_files, 0);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SyncStatus::Exhausted.to_string(), "EXHAUSTED");
        assert_eq!(SheetAction::PipelineSuccess.to_string(), "PIPELINE_SUCCESS");
        assert_eq!(FolderStatus::NotReached.to_string(), "NOT_REACHED");
    }
}
