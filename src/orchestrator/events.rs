//! Status events emitted while a run progresses
//!
//! Within one workbook branch, events arrive in document order. With
//! `max_concurrent_workbooks > 1`, events of different branches interleave.

use crate::report::{ReportCounts, SheetRecord};
use crate::verify::{ProbeAttempt, ProbeOutcome};
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLevel {
    Project,
    Workbook,
    Dashboard,
}

impl fmt::Display for NodeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeLevel::Project => f.write_str("project"),
            NodeLevel::Workbook => f.write_str("workbook"),
            NodeLevel::Dashboard => f.write_str("dashboard"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        project: String,
        sheets: usize,
    },
    ContainerResolved {
        level: NodeLevel,
        path: Vec<String>,
        created: bool,
        note: Option<String>,
    },
    /// A container failed, so every sheet below it is skipped.
    SubtreeSkipped {
        level: NodeLevel,
        path: Vec<String>,
        sheets: usize,
        reason: String,
    },
    SheetExtracted {
        dashboard: String,
        sheet_tag: String,
        row_count: usize,
        masked_columns: Vec<String>,
    },
    ArtifactPlaced {
        dashboard: String,
        sheet_tag: String,
        file_name: String,
    },
    ProbeAttempted {
        dashboard: String,
        sheet_tag: String,
        attempt: ProbeAttempt,
    },
    SheetFinished(Box<SheetRecord>),
    RunFinished {
        succeeded: bool,
        counts: ReportCounts,
    },
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::RunStarted {
                project, sheets, ..
            } => write!(f, "Run started for '{project}' ({sheets} sheets)"),
            RunEvent::ContainerResolved {
                level,
                path,
                created,
                note,
            } => {
                let status = if *created { "CREATED" } else { "EXISTS" };
                write!(f, "Folder {level} '{}': {status}", path.join("/"))?;
                if let Some(note) = note {
                    write!(f, " ({note})")?;
                }
                Ok(())
            }
            RunEvent::SubtreeSkipped {
                level,
                path,
                sheets,
                reason,
            } => write!(
                f,
                "Folder {level} '{}' failed, skipping {sheets} sheet(s): {reason}",
                path.join("/")
            ),
            RunEvent::SheetExtracted {
                sheet_tag,
                row_count,
                masked_columns,
                ..
            } => {
                write!(f, "  Extracted '{sheet_tag}' ({row_count} rows")?;
                if !masked_columns.is_empty() {
                    write!(f, ", masked {}", masked_columns.join(", "))?;
                }
                f.write_str(")")
            }
            RunEvent::ArtifactPlaced { file_name, .. } => write!(f, "  Uploaded '{file_name}'"),
            RunEvent::ProbeAttempted {
                sheet_tag, attempt, ..
            } => {
                let outcome = match &attempt.outcome {
                    ProbeOutcome::Indexed => "indexed".to_string(),
                    ProbeOutcome::NotYetIndexed => "not yet indexed".to_string(),
                    ProbeOutcome::Error(e) => format!("error: {e}"),
                };
                write!(
                    f,
                    "  Verify '{sheet_tag}' attempt {}/{}: {outcome}",
                    attempt.attempt, attempt.max_attempts
                )
            }
            RunEvent::SheetFinished(record) => write!(
                f,
                "  {} '{}': {}",
                record.action, record.sheet_tag, record.sync_status
            ),
            RunEvent::RunFinished { succeeded, counts } => write!(
                f,
                "Run {}: {} verified, {} exhausted, {} failed, {} skipped",
                if *succeeded { "succeeded" } else { "finished with issues" },
                counts.verified,
                counts.exhausted,
                counts.failed,
                counts.skipped
            ),
        }
    }
}

/// Optional destination for [`RunEvent`]s. Sending never blocks and a
/// dropped receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<RunEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<RunEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
