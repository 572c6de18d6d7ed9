use std::collections::VecDeque;

use engine_logging::{engine_error, engine_info, engine_warn};
use wiper_core::{
    update, Effect, Msg, RunParams, RunState, RunSummary, StopReason, StrategyKind,
};

use crate::pagination::PaginationDriver;
use crate::page::{Page, PageError};
use crate::progress::ProgressSink;
use crate::resolver::SelectorResolver;
use crate::sequencer::InteractionSequencer;
use crate::settle::{settle, SettlePolicy};
use crate::strategy::{select_strategy, DiscoveryStrategy};
use crate::{EngineEvent, MessageHandle, MessageReport, WipeError};

/// Everything a finished run leaves behind.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub reports: Vec<MessageReport>,
    pub state: RunState,
}

/// Orchestrates discovery, the per-message sequence and pagination until
/// discovery is exhausted or the processed-count limit is reached. There is
/// no global timeout.
pub struct RunController {
    strategy: Box<dyn DiscoveryStrategy>,
    sequencer: InteractionSequencer,
    pagination: PaginationDriver,
    settle: SettlePolicy,
    limit: u32,
    max_attempts: u32,
}

impl RunController {
    pub fn new(
        strategy: Box<dyn DiscoveryStrategy>,
        resolver: SelectorResolver,
        settle: SettlePolicy,
        limit: u32,
        max_attempts: u32,
    ) -> Self {
        Self {
            strategy,
            sequencer: InteractionSequencer::new(resolver.clone(), settle),
            pagination: PaginationDriver::new(resolver, settle),
            settle,
            limit,
            max_attempts,
        }
    }

    /// Wire a controller from the shell's parameter bundle.
    pub fn from_params(
        params: &RunParams,
        resolver: SelectorResolver,
        settle: SettlePolicy,
    ) -> Result<Self, wiper_core::ParamsError> {
        let strategy = select_strategy(params, &resolver, settle)?;
        Ok(Self::new(
            strategy,
            resolver,
            settle,
            params.limit,
            params.max_attempts,
        ))
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Runs to completion. Log records carry this run's own pass counter,
    /// whichever worker thread the task resumes on.
    pub async fn run(
        &self,
        page: &dyn Page,
        sink: &dyn ProgressSink,
    ) -> Result<RunOutcome, WipeError> {
        engine_logging::scope_pass(self.run_scoped(page, sink)).await
    }

    async fn run_scoped(
        &self,
        page: &dyn Page,
        sink: &dyn ProgressSink,
    ) -> Result<RunOutcome, WipeError> {
        self.strategy
            .prepare(page)
            .await
            .map_err(|err| WipeError::Navigation(err.to_string()))?;

        let mut state = RunState::new(self.strategy.kind(), self.limit, self.max_attempts);
        let mut reports = Vec::new();

        let result = self.drive(page, sink, &mut state, &mut reports).await;
        let summary = state.summary();
        sink.emit(EngineEvent::RunFinished(summary));

        match result {
            Ok(()) => {
                engine_info!(
                    "Run finished: processed={} failed={} reason={:?}",
                    summary.processed,
                    summary.failed,
                    summary.stop_reason
                );
                Ok(RunOutcome {
                    summary,
                    reports,
                    state,
                })
            }
            Err(err) => {
                engine_error!(
                    "Run aborted after processed={} failed={}: {}",
                    summary.processed,
                    summary.failed,
                    err
                );
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        page: &dyn Page,
        sink: &dyn ProgressSink,
        state: &mut RunState,
        reports: &mut Vec<MessageReport>,
    ) -> Result<(), WipeError> {
        let mut queue: VecDeque<Effect> = apply(state, Msg::Started).into();
        let mut batch: Vec<MessageHandle> = Vec::new();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Discover { pass } => {
                    engine_logging::set_pass(pass);
                    // Handles never outlive the batch they were found in.
                    page.release_handles();
                    batch = self.discover(page, state).await?;
                    sink.emit(EngineEvent::BatchScanned {
                        pass,
                        candidates: batch.len(),
                    });
                    let candidates = batch.iter().map(|m| m.id.clone()).collect();
                    queue.extend(apply(state, Msg::BatchDiscovered { candidates }));
                }
                Effect::ProcessBatch => {
                    let handles = std::mem::take(&mut batch);
                    if let Some(reason) = self.process_batch(page, sink, state, reports, handles).await {
                        engine_info!("Stopping: {:?}", reason);
                        return Ok(());
                    }
                    queue.extend(apply(state, Msg::BatchCompleted));
                }
                Effect::Paginate => {
                    let strategy = self.strategy.kind();
                    if let Err(err) = self.pagination.advance(page, strategy).await {
                        engine_warn!("Pagination failed: {}", err);
                    }
                    sink.emit(EngineEvent::Paginated {
                        pass: state.pass(),
                        strategy,
                    });
                }
                Effect::Throttle => settle(self.settle.inter_message).await,
                Effect::Finish { reason } => {
                    engine_info!("Stopping: {:?}", reason);
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// A recycled element during discovery yields an empty batch; any other
    /// page failure is fatal.
    async fn discover(
        &self,
        page: &dyn Page,
        state: &RunState,
    ) -> Result<Vec<MessageHandle>, WipeError> {
        match self.strategy.next_batch(page, state).await {
            Ok(batch) => Ok(batch),
            Err(PageError::Detached(handle)) => {
                engine_warn!("Discovery lost element {}; treating batch as empty", handle);
                Ok(Vec::new())
            }
            Err(err) => Err(WipeError::Interaction(err)),
        }
    }

    /// Returns the stop reason when the limit was reached mid-batch.
    async fn process_batch(
        &self,
        page: &dyn Page,
        sink: &dyn ProgressSink,
        state: &mut RunState,
        reports: &mut Vec<MessageReport>,
        batch: Vec<MessageHandle>,
    ) -> Option<StopReason> {
        for message in batch {
            let report = self.sequencer.run(page, &message).await;
            sink.emit(EngineEvent::MessageFinished(report.clone()));
            let msg = Msg::MessageFinished {
                id: report.id.clone(),
                outcome: report.outcome,
            };
            reports.push(report);

            for effect in apply(state, msg) {
                match effect {
                    Effect::Finish { reason } => return Some(reason),
                    Effect::Throttle => settle(self.settle.inter_message).await,
                    other => engine_warn!("Unexpected effect while processing: {:?}", other),
                }
            }
        }
        None
    }
}

fn apply(state: &mut RunState, msg: Msg) -> Vec<Effect> {
    let (next, effects) = update(std::mem::take(state), msg);
    *state = next;
    effects
}
