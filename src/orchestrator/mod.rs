//! Run orchestration
//!
//! Walks the project graph depth-first in document order:
//! project container, then per workbook its container, then per dashboard
//! its container, then per sheet extract → place → verify.
//!
//! Failure propagation:
//! - a container failure skips every sheet below it, siblings continue
//! - an extraction or placement failure fails that sheet only
//! - verification exhaustion is recorded and the run carries on
//! - only collaborator initialization failure aborts the run, before any work

pub mod events;
pub mod plan;

pub use events::{EventSink, NodeLevel, RunEvent};
pub use plan::{plan, PlannedTask};

use crate::abstractions::{Collaborators, ContainerRef, IndexContext};
use crate::cancel::CancelSignal;
use crate::config::{Dashboard, ProjectConfig, RunSettings, Workbook};
use crate::error::{Collaborator, InitializationError, ReconcileError, RunError};
use crate::extract::Extractor;
use crate::reconcile::{Ensured, FolderReconciler, Outcome};
use crate::report::{FolderStatus, RunReport, SheetAction, SheetRecord, SyncStatus};
use crate::verify::IndexSyncVerifier;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub struct Orchestrator {
    collaborators: Collaborators,
    settings: RunSettings,
    events: EventSink,
    cancel: CancelSignal,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, settings: RunSettings) -> Self {
        Self {
            collaborators,
            settings,
            events: EventSink::disabled(),
            cancel: CancelSignal::new(),
        }
    }

    pub fn with_events(mut self, tx: mpsc::UnboundedSender<RunEvent>) -> Self {
        self.events = EventSink::new(tx);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Execute one run over `config`.
    ///
    /// Returns `Err` only when a collaborator fails to initialize; every
    /// per-node failure is recorded in the report instead.
    pub async fn run(&self, config: ProjectConfig) -> Result<RunReport, RunError> {
        self.initialize().await.map_err(|e| {
            error!("{}", e);
            e
        })?;

        let mut report = RunReport::new(&config.name, &config.governance_standard);
        info!(
            "Starting run {} for '{}' ({} sheets)",
            report.run_id,
            config.name,
            config.sheet_count()
        );
        self.events.emit(RunEvent::RunStarted {
            run_id: report.run_id,
            project: config.name.clone(),
            sheets: config.sheet_count(),
        });

        let run = Run {
            config: &config,
            reconciler: FolderReconciler::new(self.collaborators.namespace.clone()),
            extractor: Extractor::new(
                self.collaborators.extraction.clone(),
                self.settings.extraction.lookback,
            ),
            verifier: IndexSyncVerifier::new(
                self.collaborators.index.clone(),
                self.settings.verification.max_attempts,
                self.settings.backoff_policy(),
                self.cancel.clone(),
            ),
            collaborators: &self.collaborators,
            events: &self.events,
            cancel: &self.cancel,
            concurrency: self.settings.execution.max_concurrent_workbooks.max(1),
        };
        let branch = run.execute().await;

        for record in branch.records {
            report.push(record);
        }
        report.notes.extend(branch.notes);
        report.finish();

        let counts = report.counts();
        info!(
            "Run {} finished: {} verified, {} exhausted, {} failed, {} skipped",
            report.run_id, counts.verified, counts.exhausted, counts.failed, counts.skipped
        );
        self.events.emit(RunEvent::RunFinished {
            succeeded: report.succeeded(),
            counts,
        });
        Ok(report)
    }

    async fn initialize(&self) -> Result<(), InitializationError> {
        self.collaborators
            .extraction
            .check_ready()
            .await
            .map_err(|e| InitializationError::new(Collaborator::Source, format!("{e:#}")))?;
        self.collaborators
            .namespace
            .check_ready()
            .await
            .map_err(|e| InitializationError::new(Collaborator::Namespace, format!("{e:#}")))?;
        self.collaborators
            .index
            .check_ready()
            .await
            .map_err(|e| InitializationError::new(Collaborator::Index, format!("{e:#}")))?;
        Ok(())
    }
}

/// Records and notes produced by one branch of the tree.
#[derive(Default)]
struct Branch {
    records: Vec<SheetRecord>,
    notes: Vec<String>,
}

impl Branch {
    fn absorb(&mut self, other: Branch) {
        self.records.extend(other.records);
        self.notes.extend(other.notes);
    }
}

/// State scoped to a single run.
struct Run<'a> {
    config: &'a ProjectConfig,
    reconciler: FolderReconciler,
    extractor: Extractor,
    verifier: IndexSyncVerifier,
    collaborators: &'a Collaborators,
    events: &'a EventSink,
    cancel: &'a CancelSignal,
    concurrency: usize,
}

impl Run<'_> {
    async fn execute(&self) -> Branch {
        let mut branch = Branch::default();
        let path = vec![self.config.name.clone()];

        if self.cancel.is_cancelled() {
            for workbook in &self.config.workbooks {
                branch.records.extend(self.skip_workbook(workbook, FolderStatus::NotReached, None));
            }
            return branch;
        }

        let project = match self
            .ensure(None, NodeLevel::Project, &path, self.config.sheet_count(), &mut branch.notes)
            .await
        {
            Ok(ensured) => ensured.container,
            Err(err) => {
                let reason = err.to_string();
                for workbook in &self.config.workbooks {
                    branch.records.extend(self.skip_workbook(
                        workbook,
                        FolderStatus::NotReached,
                        Some(&reason),
                    ));
                }
                return branch;
            }
        };

        let workbooks: Vec<Branch> = stream::iter(
            self.config
                .workbooks
                .iter()
                .map(|workbook| self.run_workbook(&project, workbook)),
        )
        .buffered(self.concurrency)
        .collect()
        .await;

        for workbook in workbooks {
            branch.absorb(workbook);
        }
        branch
    }

    async fn run_workbook(&self, project: &ContainerRef, workbook: &Workbook) -> Branch {
        let mut branch = Branch::default();
        if self.cancel.is_cancelled() {
            branch.records = self.skip_workbook(workbook, FolderStatus::NotReached, None);
            return branch;
        }

        let path = vec![self.config.name.clone(), workbook.name.clone()];
        let sheets = workbook.dashboards.iter().map(|d| d.sheets.len()).sum();
        let container = match self
            .ensure(Some(project), NodeLevel::Workbook, &path, sheets, &mut branch.notes)
            .await
        {
            Ok(ensured) => ensured.container,
            Err(err) => {
                branch.records =
                    self.skip_workbook(workbook, FolderStatus::NotReached, Some(&err.to_string()));
                return branch;
            }
        };

        for dashboard in &workbook.dashboards {
            let records = self
                .run_dashboard(&container, workbook, dashboard, &mut branch.notes)
                .await;
            branch.records.extend(records);
        }
        branch
    }

    async fn run_dashboard(
        &self,
        parent: &ContainerRef,
        workbook: &Workbook,
        dashboard: &Dashboard,
        notes: &mut Vec<String>,
    ) -> Vec<SheetRecord> {
        if self.cancel.is_cancelled() {
            return self.skip_dashboard(workbook, dashboard, FolderStatus::NotReached, None);
        }

        let path = vec![
            self.config.name.clone(),
            workbook.name.clone(),
            dashboard.name.clone(),
        ];
        let ensured = match self
            .ensure(Some(parent), NodeLevel::Dashboard, &path, dashboard.sheets.len(), notes)
            .await
        {
            Ok(ensured) => ensured,
            Err(err) => {
                return self.skip_dashboard(
                    workbook,
                    dashboard,
                    FolderStatus::Failed,
                    Some(&err.to_string()),
                );
            }
        };
        let folder_status = match ensured.outcome {
            Outcome::Created => FolderStatus::Created,
            Outcome::AlreadyExists => FolderStatus::Exists,
        };

        let context = IndexContext::for_dashboard(self.config, workbook, dashboard);
        let mut records = Vec::with_capacity(dashboard.sheets.len());
        for tag in &dashboard.sheets {
            let record = if self.cancel.is_cancelled() {
                self.skipped(workbook, dashboard, tag, folder_status, None)
            } else {
                self.run_sheet(
                    &ensured.container,
                    folder_status,
                    &context,
                    workbook,
                    dashboard,
                    tag,
                )
                .await
            };
            records.push(record);
        }
        records
    }

    async fn run_sheet(
        &self,
        container: &ContainerRef,
        folder_status: FolderStatus,
        context: &IndexContext,
        workbook: &Workbook,
        dashboard: &Dashboard,
        tag: &str,
    ) -> SheetRecord {
        let mut record = SheetRecord {
            timestamp: Utc::now(),
            workbook: workbook.name.clone(),
            dashboard: dashboard.name.clone(),
            sheet_tag: tag.to_string(),
            owner: workbook.owner.clone(),
            action: SheetAction::ExtractFailed,
            folder_status,
            extracted: false,
            masked_columns: Vec::new(),
            row_count: 0,
            sync_status: SyncStatus::Failed,
            attempts: 0,
            detail: None,
        };

        let artifact = match self.extractor.extract_and_mask(tag, &dashboard.mask_columns).await {
            Ok(artifact) => artifact,
            Err(err) => {
                warn!(code = err.code(), "Extraction of '{}' failed: {}", tag, err);
                record.detail = Some(err.to_string());
                return self.finish(record);
            }
        };
        record.extracted = true;
        record.row_count = artifact.row_count;
        record.masked_columns = artifact.masked_columns_applied.clone();
        self.events.emit(RunEvent::SheetExtracted {
            dashboard: dashboard.name.clone(),
            sheet_tag: tag.to_string(),
            row_count: artifact.row_count,
            masked_columns: artifact.masked_columns_applied.clone(),
        });

        let file_name = artifact.file_name();
        if let Err(err) = self
            .collaborators
            .namespace
            .write_artifact(container, &file_name, &artifact.payload)
            .await
        {
            let err = crate::error::PlacementError {
                container: container.name.clone(),
                name: file_name,
                message: err.to_string(),
            };
            warn!("{}", err);
            record.action = SheetAction::WriteFailed;
            record.detail = Some(err.to_string());
            return self.finish(record);
        }
        info!("Placed '{}' in '{}'", file_name, container.name);
        self.events.emit(RunEvent::ArtifactPlaced {
            dashboard: dashboard.name.clone(),
            sheet_tag: tag.to_string(),
            file_name,
        });

        let result = self
            .verifier
            .verify_observed(context, tag, |attempt| {
                self.events.emit(RunEvent::ProbeAttempted {
                    dashboard: dashboard.name.clone(),
                    sheet_tag: tag.to_string(),
                    attempt: attempt.clone(),
                })
            })
            .await;

        record.attempts = result.attempts_used;
        match result.error() {
            None => {
                record.action = SheetAction::PipelineSuccess;
                record.sync_status = SyncStatus::Verified;
            }
            Some(err) => {
                record.action = if result.was_cancelled() {
                    SheetAction::Cancelled
                } else {
                    SheetAction::SyncExhausted
                };
                record.sync_status = SyncStatus::Exhausted;
                record.detail = Some(err.to_string());
            }
        }
        self.finish(record)
    }

    async fn ensure(
        &self,
        parent: Option<&ContainerRef>,
        level: NodeLevel,
        path: &[String],
        sheets: usize,
        notes: &mut Vec<String>,
    ) -> Result<Ensured, ReconcileError> {
        let name = path.last().map(String::as_str).unwrap_or_default();
        match self.reconciler.ensure(parent, name).await {
            Ok(ensured) => {
                let note = ensured.note();
                if let Some(note) = &note {
                    notes.push(format!("{}: {note}", path.join("/")));
                }
                self.events.emit(RunEvent::ContainerResolved {
                    level,
                    path: path.to_vec(),
                    created: ensured.outcome == Outcome::Created,
                    note,
                });
                Ok(ensured)
            }
            Err(err) => {
                warn!(
                    code = err.code(),
                    "Failed to ensure {} folder '{}', skipping {} sheet(s): {}",
                    level,
                    path.join("/"),
                    sheets,
                    err
                );
                self.events.emit(RunEvent::SubtreeSkipped {
                    level,
                    path: path.to_vec(),
                    sheets,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn skip_workbook(
        &self,
        workbook: &Workbook,
        folder_status: FolderStatus,
        reason: Option<&str>,
    ) -> Vec<SheetRecord> {
        workbook
            .dashboards
            .iter()
            .flat_map(|dashboard| self.skip_dashboard(workbook, dashboard, folder_status, reason))
            .collect()
    }

    fn skip_dashboard(
        &self,
        workbook: &Workbook,
        dashboard: &Dashboard,
        folder_status: FolderStatus,
        reason: Option<&str>,
    ) -> Vec<SheetRecord> {
        dashboard
            .sheets
            .iter()
            .map(|tag| self.skipped(workbook, dashboard, tag, folder_status, reason))
            .collect()
    }

    /// Terminal record for a sheet that was never attempted. `None` reason
    /// means the run was cancelled before reaching it.
    fn skipped(
        &self,
        workbook: &Workbook,
        dashboard: &Dashboard,
        tag: &str,
        folder_status: FolderStatus,
        reason: Option<&str>,
    ) -> SheetRecord {
        let (action, detail) = match reason {
            Some(reason) => (SheetAction::Skipped, reason.to_string()),
            None => (SheetAction::Cancelled, "run cancelled".to_string()),
        };
        self.finish(SheetRecord {
            timestamp: Utc::now(),
            workbook: workbook.name.clone(),
            dashboard: dashboard.name.clone(),
            sheet_tag: tag.to_string(),
            owner: workbook.owner.clone(),
            action,
            folder_status,
            extracted: false,
            masked_columns: Vec::new(),
            row_count: 0,
            sync_status: SyncStatus::Skipped,
            attempts: 0,
            detail: Some(detail),
        })
    }

    fn finish(&self, record: SheetRecord) -> SheetRecord {
        info!(
            "{} '{}' in '{}': {}",
            record.action, record.sheet_tag, record.dashboard, record.sync_status
        );
        self.events.emit(RunEvent::SheetFinished(Box::new(record.clone())));
        record
    }
}
