use crate::{MessageId, Outcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The run is starting; no batch has been requested yet.
    Started,
    /// The active discovery strategy returned a batch of eligible candidates.
    BatchDiscovered { candidates: Vec<MessageId> },
    /// The sequencer finished one message, successfully or not.
    MessageFinished { id: MessageId, outcome: Outcome },
    /// Every candidate of the current batch has been handed to the sequencer.
    BatchCompleted,
}
