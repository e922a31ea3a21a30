//! Flat audit-log export of a run report

use super::{RunReport, SheetRecord};
use serde::Serialize;
use std::io::Write;

/// One CSV row per sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRow {
    pub timestamp: String,
    pub workbook: String,
    pub dashboard: String,
    pub sheet_tag: String,
    pub action: String,
    pub folder_status: String,
    pub masked_columns: String,
    pub row_count: usize,
    pub sync_status: String,
    pub owner: String,
}

impl From<&SheetRecord> for AuditRow {
    fn from(record: &SheetRecord) -> Self {
        Self {
            timestamp: record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            workbook: record.workbook.clone(),
            dashboard: record.dashboard.clone(),
            sheet_tag: record.sheet_tag.clone(),
            action: record.action.to_string(),
            folder_status: record.folder_status.to_string(),
            masked_columns: if record.masked_columns.is_empty() {
                "NONE".to_string()
            } else {
                record.masked_columns.join(", ")
            },
            row_count: record.row_count,
            sync_status: record.sync_status.to_string(),
            owner: record.owner.clone().unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

impl RunReport {
    pub fn audit_rows(&self) -> Vec<AuditRow> {
        self.records().iter().map(AuditRow::from).collect()
    }
}

/// Write the report as CSV with a header row.
pub fn write_audit_csv<W: Write>(report: &RunReport, writer: W) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in report.audit_rows() {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::record;
    use crate::report::SyncStatus;

    #[test]
    fn test_audit_row_formatting() {
        let mut rec = record("D", "A.B.C", SyncStatus::Verified);
        rec.masked_columns = vec!["CUSTOMER_NAME".into(), "EMAIL".into()];
        let row = AuditRow::from(&rec);
        assert_eq!(row.action, "PIPELINE_SUCCESS");
        assert_eq!(row.folder_status, "EXISTS");
        assert_eq!(row.masked_columns, "CUSTOMER_NAME, EMAIL");
        assert_eq!(row.sync_status, "VERIFIED");
        assert_eq!(row.owner, "N/A");
    }

    #[test]
    fn test_empty_mask_reported_as_none() {
        let mut rec = record("D", "A", SyncStatus::Skipped);
        rec.masked_columns.clear();
        assert_eq!(AuditRow::from(&rec).masked_columns, "NONE");
    }

    #[test]
    fn test_csv_header_and_rows() {
        let mut report = RunReport::new("P", "ISO");
        report.push(record("D", "A", SyncStatus::Verified));
        report.push(record("D", "B", SyncStatus::Exhausted));

        let mut buffer = Vec::new();
        write_audit_csv(&report, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "timestamp,workbook,dashboard,sheetTag,action,folderStatus,maskedColumns,rowCount,syncStatus,owner"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains(",B,SYNC_EXHAUSTED,EXISTS,EMAIL,10,EXHAUSTED,N/A"));
    }
}
