use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::summary::RunSummary;

/// Consecutive empty batches after which discovery counts as exhausted.
pub const EMPTY_BATCH_THRESHOLD: u32 = 3;

/// Identifier the host UI assigns to a rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Messages whose wipe-and-delete sequence completed. Grows only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessedSet {
    ids: HashSet<MessageId>,
}

impl ProcessedSet {
    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn insert(&mut self, id: MessageId) -> bool {
        self.ids.insert(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Walk the rendered channel history, paginating towards older messages.
    #[default]
    Scan,
    /// Jump through an author-scoped search, one result at a time.
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Discovery returned nothing for [`EMPTY_BATCH_THRESHOLD`] batches in a row.
    Exhausted,
    /// The processed-count ceiling was reached.
    LimitReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Running,
    Finished(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

/// Mutable bookkeeping for one run. Owned by the Run Controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    strategy: StrategyKind,
    limit: Option<u32>,
    max_attempts: u32,
    processed: ProcessedSet,
    processed_count: u32,
    failed_count: u32,
    consecutive_empty_batches: u32,
    pass: u64,
    failed_attempts: HashMap<MessageId, u32>,
    status: RunStatus,
}

impl RunState {
    /// `limit` of zero means unbounded. `max_attempts` of zero means a failing
    /// message stays eligible for the whole run.
    pub fn new(strategy: StrategyKind, limit: u32, max_attempts: u32) -> Self {
        Self {
            strategy,
            limit: (limit > 0).then_some(limit),
            max_attempts,
            ..Self::default()
        }
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    pub fn processed_count(&self) -> u32 {
        self.processed_count
    }

    pub fn failed_count(&self) -> u32 {
        self.failed_count
    }

    pub fn consecutive_empty_batches(&self) -> u32 {
        self.consecutive_empty_batches
    }

    /// Number of batches requested so far.
    pub fn pass(&self) -> u64 {
        self.pass
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, RunStatus::Finished(_))
    }

    /// True when the Locator should offer this message as a candidate.
    pub fn is_eligible(&self, id: &MessageId) -> bool {
        if self.processed.contains(id) {
            return false;
        }
        if self.max_attempts == 0 {
            return true;
        }
        self.failed_attempts.get(id).copied().unwrap_or(0) < self.max_attempts
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            strategy: self.strategy,
            processed: self.processed_count,
            failed: self.failed_count,
            stop_reason: match self.status {
                RunStatus::Running => None,
                RunStatus::Finished(reason) => Some(reason),
            },
        }
    }

    pub(crate) fn begin_pass(&mut self) {
        self.pass += 1;
    }

    pub(crate) fn record_empty_batch(&mut self) -> u32 {
        self.consecutive_empty_batches += 1;
        self.consecutive_empty_batches
    }

    pub(crate) fn reset_empty_batches(&mut self) {
        self.consecutive_empty_batches = 0;
    }

    pub(crate) fn record_success(&mut self, id: MessageId) {
        self.failed_attempts.remove(&id);
        if self.processed.insert(id) {
            self.processed_count += 1;
        }
    }

    pub(crate) fn record_failure(&mut self, id: MessageId) {
        *self.failed_attempts.entry(id).or_insert(0) += 1;
        self.failed_count += 1;
    }

    pub(crate) fn limit_reached(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.processed_count >= limit)
    }

    pub(crate) fn finish(&mut self, reason: StopReason) {
        self.status = RunStatus::Finished(reason);
    }
}
