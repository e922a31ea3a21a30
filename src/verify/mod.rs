//! Index-sync verification
//!
//! After an artifact is placed, the downstream index absorbs it eventually.
//! The verifier probes the index with bounded attempts and backoff:
//!
//! ```text
//! Pending --probe+--> Verified
//!    |
//!    +--probe-/err--> Retrying --probe+--> Verified
//!                        |  ^
//!                        +--+ probe-/err (attempts < max)
//!                        |
//!                        +--> Exhausted (attempts == max, or cancelled)
//! ```
//!
//! A probe that errors is treated exactly like a negative probe: it consumes
//! an attempt. The result keeps the two counts apart for diagnosis.

pub mod backoff;

pub use backoff::BackoffPolicy;

use crate::abstractions::{IndexClient, IndexContext};
use crate::cancel::CancelSignal;
use crate::error::VerificationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// States of one verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Pending,
    Retrying,
    Verified,
    Exhausted,
}

impl SyncState {
    /// Next state after a probe, given the attempts used so far (including it).
    pub fn after_probe(self, positive: bool, attempts_used: u32, max_attempts: u32) -> SyncState {
        match self {
            SyncState::Verified | SyncState::Exhausted => self,
            SyncState::Pending | SyncState::Retrying if positive => SyncState::Verified,
            SyncState::Pending | SyncState::Retrying if attempts_used >= max_attempts => {
                SyncState::Exhausted
            }
            SyncState::Pending | SyncState::Retrying => SyncState::Retrying,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SyncState::Verified | SyncState::Exhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionReason {
    AttemptsExhausted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    Verified,
    Exhausted(ExhaustionReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub outcome: Verification,
    pub attempts_used: u32,
    pub negative_probes: u32,
    pub probe_errors: u32,
    pub last_message: String,
}

impl VerificationResult {
    pub fn is_verified(&self) -> bool {
        self.outcome == Verification::Verified
    }

    pub fn was_cancelled(&self) -> bool {
        self.outcome == Verification::Exhausted(ExhaustionReason::Cancelled)
    }

    /// The coded error for an unverified outcome, `None` when verified.
    pub fn error(&self) -> Option<VerificationError> {
        let message = self.last_message.clone();
        match self.outcome {
            Verification::Verified => None,
            _ if self.was_cancelled() => Some(VerificationError::Cancelled { message }),
            Verification::Exhausted(_) => Some(VerificationError::Exhausted { message }),
        }
    }
}

/// Outcome of a single probe, as reported to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result", content = "message")]
pub enum ProbeOutcome {
    Indexed,
    NotYetIndexed,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub attempt: u32,
    pub max_attempts: u32,
    pub outcome: ProbeOutcome,
}

pub struct IndexSyncVerifier {
    client: Arc<dyn IndexClient>,
    max_attempts: u32,
    backoff: BackoffPolicy,
    cancel: CancelSignal,
}

impl IndexSyncVerifier {
    /// `max_attempts` is clamped to at least one probe.
    pub fn new(
        client: Arc<dyn IndexClient>,
        max_attempts: u32,
        backoff: BackoffPolicy,
        cancel: CancelSignal,
    ) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            backoff,
            cancel,
        }
    }

    pub async fn verify(&self, context: &IndexContext, sheet_tag: &str) -> VerificationResult {
        self.verify_observed(context, sheet_tag, |_| {}).await
    }

    /// Run the state machine, calling `observe` after every probe.
    pub async fn verify_observed<F>(
        &self,
        context: &IndexContext,
        sheet_tag: &str,
        mut observe: F,
    ) -> VerificationResult
    where
        F: FnMut(&ProbeAttempt) + Send,
    {
        let mut state = SyncState::Pending;
        let mut result = VerificationResult {
            outcome: Verification::Exhausted(ExhaustionReason::AttemptsExhausted),
            attempts_used: 0,
            negative_probes: 0,
            probe_errors: 0,
            last_message: String::new(),
        };

        loop {
            if self.cancel.is_cancelled() {
                return cancelled(result);
            }

            result.attempts_used += 1;
            debug!(
                "Probing index '{}' for '{}' (attempt {}/{})",
                context.index_name, sheet_tag, result.attempts_used, self.max_attempts
            );

            let probe = tokio::select! {
                probe = self.client.probe_indexed(context, sheet_tag) => probe,
                _ = self.cancel.cancelled() => return cancelled(result),
            };

            let outcome = match probe {
                Ok(true) => ProbeOutcome::Indexed,
                Ok(false) => {
                    result.negative_probes += 1;
                    result.last_message = format!("'{sheet_tag}' not yet visible in index");
                    ProbeOutcome::NotYetIndexed
                }
                Err(e) => {
                    result.probe_errors += 1;
                    result.last_message = format!("probe failed: {e:#}");
                    warn!("Index probe for '{}' failed: {:#}", sheet_tag, e);
                    ProbeOutcome::Error(format!("{e:#}"))
                }
            };
            let positive = outcome == ProbeOutcome::Indexed;
            observe(&ProbeAttempt {
                attempt: result.attempts_used,
                max_attempts: self.max_attempts,
                outcome,
            });

            state = state.after_probe(positive, result.attempts_used, self.max_attempts);
            if state.is_terminal() {
                return concluded(state, context, sheet_tag, result);
            }

            let delay = self.backoff.delay(result.attempts_used);
            if self.cancel.is_cancelled() {
                return cancelled(result);
            }
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.cancel.cancelled() => return cancelled(result),
            }
        }
    }
}

fn concluded(
    state: SyncState,
    context: &IndexContext,
    sheet_tag: &str,
    mut result: VerificationResult,
) -> VerificationResult {
    if state == SyncState::Verified {
        info!(
            "'{}' verified in '{}' after {} attempt(s)",
            sheet_tag, context.index_name, result.attempts_used
        );
        result.outcome = Verification::Verified;
        result.last_message = "Data successfully indexed in knowledge base".to_string();
    } else {
        warn!(
            "Index did not confirm '{}' after {} attempts",
            sheet_tag, result.attempts_used
        );
        result.outcome = Verification::Exhausted(ExhaustionReason::AttemptsExhausted);
        result.last_message = format!(
            "index did not confirm sync after {} attempts: {}",
            result.attempts_used, result.last_message
        );
    }
    result
}

fn cancelled(mut result: VerificationResult) -> VerificationResult {
    debug!("Verification cancelled after {} attempt(s)", result.attempts_used);
    result.outcome = Verification::Exhausted(ExhaustionReason::Cancelled);
    result.last_message = "verification cancelled".to_string();
    result
}
