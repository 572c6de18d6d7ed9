use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SemanticTarget;

/// Per-message interaction states, in the order a successful sequence visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceState {
    Start,
    Revealed,
    MenuOpen1,
    EditOpen,
    TextCleared,
    EditSaved,
    Revealed2,
    MenuOpen2,
    DeleteConfirmOpen,
    Deleted,
    Done,
    Failed,
}

impl SequenceState {
    /// Whether the delete affordance has already been activated from this state.
    pub fn delete_attempted(self) -> bool {
        matches!(
            self,
            SequenceState::DeleteConfirmOpen | SequenceState::Deleted | SequenceState::Done
        )
    }
}

/// Why a sequence ended in [`SequenceState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureCause {
    /// The whole selector chain for a required target came up empty.
    ElementNotFound { target: SemanticTarget },
    /// A synthetic event or lookup threw, typically because virtualization
    /// detached the element mid-sequence.
    Interaction { message: String },
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::ElementNotFound { target } => write!(f, "{target} not found"),
            FailureCause::Interaction { message } => write!(f, "interaction failed: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SequenceState;

    #[test]
    fn delete_is_attempted_only_after_confirm_dialog() {
        assert!(!SequenceState::MenuOpen2.delete_attempted());
        assert!(SequenceState::DeleteConfirmOpen.delete_attempted());
        assert!(!SequenceState::Failed.delete_attempted());
    }
}
