use std::fmt;

use serde::Serialize;
use wiper_core::{FailureCause, MessageId, Outcome, RunSummary, SequenceState, StrategyKind};

use crate::page::{ElementHandle, PageError};

/// A rendered message the Locator found, valid until the host UI recycles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    pub element: ElementHandle,
    pub id: MessageId,
}

/// Per-message result as streamed to the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageReport {
    pub id: MessageId,
    pub outcome: Outcome,
    /// `Done` on success, `Failed` otherwise.
    pub reached: SequenceState,
    /// Last state passed before the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<SequenceState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<FailureCause>,
}

impl MessageReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    BatchScanned { pass: u64, candidates: usize },
    Paginated { pass: u64, strategy: StrategyKind },
    MessageFinished(MessageReport),
    RunFinished(RunSummary),
}

/// Conditions that end a run or a bootstrap step. Per-message failures never
/// surface here; they are reported as [`MessageReport`]s.
#[derive(Debug, thiserror::Error)]
pub enum WipeError {
    #[error(transparent)]
    Interaction(#[from] PageError),
    #[error("no authenticated session detected after {waited_secs}s")]
    AuthenticationTimeout { waited_secs: u64 },
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("browser error: {0}")]
    Browser(String),
    #[error("failed to write report: {0}")]
    Report(#[from] crate::report::ReportError),
}

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.element)
    }
}
