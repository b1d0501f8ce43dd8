//! A queue of typed steps run one by one, to completion, or across a
//! worker pool.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tracing::info_span;
use uuid::Uuid;

use super::pool::WorkerPool;
use super::progress::{BatchPhase, BatchProgressEvent, ProgressReporter};
use crate::actions::{ActionKind, OutcomeStatus, UnitOutcome};
use crate::engine::SyncEngine;
use crate::error::DispatchError;
use crate::unit::UnitKey;

/// Optional inputs a batch operation may draw its parameter from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchParams {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub profile_id: Option<String>,
    /// Propagate job id changes to the TMS.
    #[serde(default)]
    pub notify_tms: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub unit: UnitKey,
    pub action: ActionKind,
}

/// Cloneable switch that stops a batch before its next step.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What one call to [`Batch::step`] did.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// `Processing <label>` progress line.
    pub message: String,
    pub outcome: UnitOutcome,
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub batch_id: String,
    pub operation: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub aborted: bool,
    /// Steps never run because the batch was aborted.
    pub remaining: usize,
    /// Per-unit messages in step order.
    pub messages: Vec<String>,
    pub outcomes: Vec<UnitOutcome>,
}

impl BatchSummary {
    /// One line such as `2 succeeded, 1 failed, 1 skipped`.
    pub fn report(&self) -> String {
        let mut report = format!("{} succeeded, {} failed", self.succeeded, self.failed);
        if self.skipped > 0 {
            report.push_str(&format!(", {} skipped", self.skipped));
        }
        if self.aborted && self.remaining > 0 {
            report.push_str(&format!(" (aborted, {} not processed)", self.remaining));
        }
        report
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.aborted
    }
}

pub struct Batch {
    id: String,
    operation: String,
    engine: Arc<SyncEngine>,
    pending: VecDeque<(usize, Step)>,
    outcomes: Vec<Option<UnitOutcome>>,
    processed: usize,
    progress: Arc<dyn ProgressReporter>,
    abort: AbortHandle,
}

impl Batch {
    pub(crate) fn new(
        operation: &str,
        engine: Arc<SyncEngine>,
        steps: Vec<Step>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        let total = steps.len();
        let batch = Self {
            id,
            operation: operation.to_string(),
            engine,
            pending: steps.into_iter().enumerate().collect(),
            outcomes: vec![None; total],
            processed: 0,
            progress,
            abort: AbortHandle::default(),
        };

        info!("Batch {} queued: {} on {} units", batch.id, batch.operation, total);
        batch.emit(
            BatchPhase::Started,
            format!("Queued {} on {} units", batch.operation, total),
        );
        batch
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty() || self.abort.is_aborted()
    }

    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Handle for aborting the batch from another thread.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Runs the next step. Returns `None` once the queue is empty or the
    /// batch was aborted.
    pub fn step(&mut self) -> Option<StepReport> {
        if self.abort.is_aborted() {
            return None;
        }
        let (index, step) = self.pending.pop_front()?;

        let _span = info_span!("batch", id = %self.id, operation = %self.operation).entered();
        let outcome = self.engine.execute(&step.unit, &step.action);
        let message = format!("Processing {}", outcome.label);
        self.emit(BatchPhase::Processing, message.clone());
        self.record(index, outcome.clone());

        Some(StepReport { message, outcome })
    }

    /// Runs every remaining step on the calling thread.
    pub fn run(mut self) -> BatchSummary {
        while self.step().is_some() {}
        self.finish()
    }

    /// Runs the remaining steps across `workers` threads. Steps for the
    /// same unit are serialized by the engine's unit locks.
    pub fn run_parallel(mut self, workers: usize) -> Result<BatchSummary, DispatchError> {
        let _span = info_span!("batch", id = %self.id, operation = %self.operation).entered();
        let pool = WorkerPool::new(Arc::clone(&self.engine), workers.max(1));
        let result = self.drive(&pool);
        pool.shutdown();
        pool.wait();
        result?;
        Ok(self.finish())
    }

    /// Keeps at most `pool.capacity()` steps in flight so neither channel
    /// can fill up while this thread is blocked.
    fn drive(&mut self, pool: &WorkerPool) -> Result<(), DispatchError> {
        let mut in_flight = 0;
        loop {
            while in_flight < pool.capacity() && !self.abort.is_aborted() {
                let Some(next) = self.pending.pop_front() else {
                    break;
                };
                pool.submit(next)?;
                in_flight += 1;
            }

            if in_flight == 0 {
                return Ok(());
            }

            let (index, outcome) = pool.recv_result().ok_or(DispatchError::ChannelClosed)?;
            in_flight -= 1;
            self.emit(
                BatchPhase::Processing,
                format!("Processing {}", outcome.label),
            );
            self.record(index, outcome);
        }
    }

    fn record(&mut self, index: usize, outcome: UnitOutcome) {
        self.processed += 1;
        self.progress.report(BatchProgressEvent::unit_finished(
            &self.id,
            &self.operation,
            &outcome,
            self.processed,
            self.total(),
        ));
        if let Some(slot) = self.outcomes.get_mut(index) {
            *slot = Some(outcome);
        }
    }

    fn emit(&self, phase: BatchPhase, message: String) {
        self.progress.report(BatchProgressEvent::new(
            &self.id,
            &self.operation,
            phase,
            message,
            self.processed,
            self.total(),
        ));
    }

    /// Closes the batch. Unprocessed steps of an aborted batch are dropped.
    pub fn finish(self) -> BatchSummary {
        let aborted = self.abort.is_aborted() && !self.pending.is_empty();
        let remaining = self.pending.len();
        let total = self.total();
        let outcomes: Vec<UnitOutcome> = self.outcomes.into_iter().flatten().collect();

        let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
        let summary = BatchSummary {
            batch_id: self.id,
            operation: self.operation,
            total,
            succeeded: count(OutcomeStatus::Succeeded),
            failed: count(OutcomeStatus::Failed),
            skipped: count(OutcomeStatus::Skipped),
            aborted,
            remaining,
            messages: outcomes.iter().map(|o| o.message.clone()).collect(),
            outcomes,
        };

        let phase = if aborted {
            warn!("Batch {} aborted: {}", summary.batch_id, summary.report());
            BatchPhase::Aborted
        } else {
            info!("Batch {} finished: {}", summary.batch_id, summary.report());
            BatchPhase::Completed
        };
        self.progress.report(BatchProgressEvent::new(
            &summary.batch_id,
            &summary.operation,
            phase,
            summary.report(),
            summary.total - summary.remaining,
            summary.total,
        ));

        summary
    }
}
