use crate::{Effect, Msg, Outcome, RunState, StopReason, StrategyKind, EMPTY_BATCH_THRESHOLD};

/// Pure update function: applies a message to the run state and returns the
/// effects the engine must carry out next, in order.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    if state.is_finished() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Started => {
            state.begin_pass();
            vec![Effect::Discover { pass: state.pass() }]
        }
        Msg::BatchDiscovered { candidates } => {
            if candidates.is_empty() {
                let empties = state.record_empty_batch();
                if empties >= EMPTY_BATCH_THRESHOLD {
                    state.finish(StopReason::Exhausted);
                    vec![Effect::Finish {
                        reason: StopReason::Exhausted,
                    }]
                } else {
                    state.begin_pass();
                    vec![Effect::Paginate, Effect::Discover { pass: state.pass() }]
                }
            } else {
                state.reset_empty_batches();
                vec![Effect::ProcessBatch]
            }
        }
        Msg::MessageFinished { id, outcome } => {
            match outcome {
                Outcome::Success => state.record_success(id),
                Outcome::Failure => state.record_failure(id),
            }
            if state.limit_reached() {
                state.finish(StopReason::LimitReached);
                vec![Effect::Finish {
                    reason: StopReason::LimitReached,
                }]
            } else {
                vec![Effect::Throttle]
            }
        }
        Msg::BatchCompleted => {
            state.begin_pass();
            match state.strategy() {
                // Scrolling older history into view after each batch.
                StrategyKind::Scan => {
                    vec![Effect::Paginate, Effect::Discover { pass: state.pass() }]
                }
                // The next batch re-issues the query, which already resets the result list.
                StrategyKind::Search => vec![Effect::Discover { pass: state.pass() }],
            }
        }
    };

    (state, effects)
}
