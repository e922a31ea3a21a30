//! Command routing and handlers

use super::args::Commands;
use crate::backends::local_collaborators;
use crate::cancel::CancelSignal;
use crate::config::{Credentials, ProjectConfig, RunSettings};
use crate::instructions::{index_metadata, InstructionRenderer};
use crate::orchestrator::{plan, Orchestrator};
use crate::report::{write_audit_csv, RunReport};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// How a successfully executed command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Completed,
    /// A run finished but some sheets were not verified.
    Unverified,
}

impl CommandStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            CommandStatus::Completed => 0,
            CommandStatus::Unverified => 2,
        }
    }
}

/// Execute a parsed command. `cancel` is only observed by `run`.
pub async fn execute_command(command: Commands, cancel: CancelSignal) -> Result<CommandStatus> {
    match command {
        Commands::Validate { config } => run_validate(&config).await,
        Commands::Plan { config } => run_plan(&config).await,
        Commands::Run {
            config,
            credentials,
            settings,
            audit,
            report,
        } => {
            run_sync(
                &config,
                &credentials,
                settings.as_deref(),
                audit.as_deref(),
                report.as_deref(),
                cancel,
            )
            .await
        }
        Commands::Instructions { config, dashboard } => {
            run_instructions(&config, dashboard.as_deref()).await
        }
        Commands::Metadata { config, json } => run_metadata(&config, json).await,
    }
}

async fn load_project(path: &Path) -> Result<ProjectConfig> {
    ProjectConfig::load(path)
        .await
        .with_context(|| format!("Invalid project document {}", path.display()))
}

async fn run_validate(path: &Path) -> Result<CommandStatus> {
    let config = load_project(path).await?;
    println!(
        "Project '{}' is valid: {} workbook(s), {} dashboard(s), {} sheet(s)",
        config.name,
        config.workbooks.len(),
        config.dashboard_count(),
        config.sheet_count()
    );
    Ok(CommandStatus::Completed)
}

async fn run_plan(path: &Path) -> Result<CommandStatus> {
    let config = load_project(path).await?;
    if !config.governance_standard.is_empty() {
        println!("Governance: {}", config.governance_standard);
    }
    println!("Data retention: {} days", config.data_retention_days);
    for task in plan(&config) {
        println!("{}{}", "  ".repeat(task.depth()), task);
    }
    Ok(CommandStatus::Completed)
}

async fn run_sync(
    config_path: &Path,
    credentials_path: &Path,
    settings_path: Option<&Path>,
    audit_path: Option<&Path>,
    report_path: Option<&Path>,
    cancel: CancelSignal,
) -> Result<CommandStatus> {
    let config = load_project(config_path).await?;
    let credentials = Credentials::load(credentials_path)
        .await
        .with_context(|| format!("Invalid credentials document {}", credentials_path.display()))?;
    let settings = RunSettings::resolve(settings_path)
        .await
        .context("Invalid run settings")?;
    debug!("Resolved settings: {:?}", settings);

    let collaborators =
        local_collaborators(&credentials).context("Failed to configure collaborators")?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{event}");
        }
    });

    let orchestrator = Orchestrator::new(collaborators, settings)
        .with_events(tx)
        .with_cancel(cancel);
    let outcome = orchestrator.run(config).await;
    // Dropping the orchestrator closes the event channel so the printer drains.
    drop(orchestrator);
    printer.await.context("Event printer failed")?;
    let report = outcome.context("Run aborted")?;

    print_summary(&report);

    if let Some(path) = audit_path {
        let mut buffer = Vec::new();
        write_audit_csv(&report, &mut buffer).context("Failed to render audit log")?;
        tokio::fs::write(path, buffer)
            .await
            .with_context(|| format!("Failed to write audit log {}", path.display()))?;
        info!("Audit log written to {}", path.display());
    }
    if let Some(path) = report_path {
        let json = serde_json::to_vec_pretty(&report).context("Failed to serialize report")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(if report.succeeded() {
        CommandStatus::Completed
    } else {
        CommandStatus::Unverified
    })
}

fn print_summary(report: &RunReport) {
    println!();
    println!("Hierarchy:");
    for row in report.hierarchy() {
        let masked = if row.masked_columns.is_empty() {
            "NONE".to_string()
        } else {
            row.masked_columns.join(", ")
        };
        println!(
            "  {}/{}/{}: {} file(s), masked: {}",
            row.project, row.workbook, row.dashboard, row.total_files, masked
        );
    }
    for note in &report.notes {
        println!("Note: {note}");
    }
    println!("Rows extracted: {}", report.total_rows());
}

async fn run_instructions(path: &Path, dashboard: Option<&str>) -> Result<CommandStatus> {
    let config = load_project(path).await?;
    let renderer = InstructionRenderer::new()?;
    match dashboard {
        Some(name) => println!("{}", renderer.render(&config, name)?),
        None => {
            let rendered = renderer.render_all(&config)?;
            if rendered.is_empty() {
                println!("No dashboard has an index profile");
            }
            for (_, text) in rendered {
                println!("{text}");
            }
        }
    }
    Ok(CommandStatus::Completed)
}

async fn run_metadata(path: &Path, json: bool) -> Result<CommandStatus> {
    let config = load_project(path).await?;
    let rows = index_metadata(&config);
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(CommandStatus::Completed);
    }
    for row in rows {
        println!(
            "{} | {} | {} | {} | {}",
            row.index_name, row.dashboard, row.index_path, row.persona_summary, row.update_frequency
        );
    }
    Ok(CommandStatus::Completed)
}
