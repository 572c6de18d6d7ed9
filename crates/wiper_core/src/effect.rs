#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the active strategy for the next batch.
    Discover { pass: u64 },
    /// Hand the candidates of the current batch to the sequencer, in order.
    ProcessBatch,
    /// Wait the inter-message rate-limit interval.
    Throttle,
    /// Advance the view so more candidates can render.
    Paginate,
    /// Stop the run.
    Finish { reason: crate::StopReason },
}
