//! Wiper core: pure run state, the Run Controller's transition function and
//! the data-driven selector table.
mod effect;
mod msg;
mod params;
mod selectors;
mod sequence;
mod state;
mod summary;
mod update;

pub use effect::Effect;
pub use msg::Msg;
pub use params::{ParamsError, RunParams, ValidatedDiscovery};
pub use selectors::{Matcher, SelectorTable, SelectorTableError, SemanticTarget};
pub use sequence::{FailureCause, SequenceState};
pub use state::{
    MessageId, Outcome, ProcessedSet, RunState, RunStatus, StopReason, StrategyKind,
    EMPTY_BATCH_THRESHOLD,
};
pub use summary::RunSummary;
pub use update::update;
