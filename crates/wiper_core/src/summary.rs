use serde::{Deserialize, Serialize};

use crate::{StopReason, StrategyKind};

/// Final tally reported to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub strategy: StrategyKind,
    pub processed: u32,
    pub failed: u32,
    pub stop_reason: Option<StopReason>,
}
