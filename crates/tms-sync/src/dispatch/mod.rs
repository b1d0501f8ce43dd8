//! Turns an operation name and a selection of units into a batch of
//! single-action steps.

pub mod batch;
pub mod pool;
pub mod progress;
pub mod registry;

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;

pub use batch::{AbortHandle, Batch, BatchParams, BatchSummary, Step, StepReport};
pub use pool::WorkerPool;
pub use progress::{
    BatchPhase, BatchProgressBroadcaster, BatchProgressEvent, NoopProgress, ProgressReporter,
};
pub use registry::OperationRegistry;

use crate::engine::SyncEngine;
use crate::error::DispatchError;
use crate::unit::UnitKey;

pub struct Dispatcher {
    engine: Arc<SyncEngine>,
    registry: OperationRegistry,
    progress: Arc<dyn ProgressReporter>,
}

impl Dispatcher {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self::with_progress(engine, Arc::new(NoopProgress))
    }

    pub fn with_progress(engine: Arc<SyncEngine>, progress: Arc<dyn ProgressReporter>) -> Self {
        Self {
            engine,
            registry: OperationRegistry::new(),
            progress,
        }
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Registered operation names, without parameter suffixes.
    pub fn operations(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    /// Resolves the operation and queues one step per distinct unit. No
    /// unit is touched until the batch is driven.
    pub fn prepare(
        &self,
        operation: &str,
        units: &[UnitKey],
        params: &BatchParams,
    ) -> Result<Batch, DispatchError> {
        let action = self.registry.resolve(operation, params, &self.engine)?;

        let mut seen = HashSet::new();
        let steps: Vec<Step> = units
            .iter()
            .filter(|key| seen.insert(*key))
            .map(|key| Step {
                unit: key.clone(),
                action: action.clone(),
            })
            .collect();
        if steps.len() < units.len() {
            debug!(
                "Dropped {} duplicate units from {} batch",
                units.len() - steps.len(),
                operation
            );
        }

        Ok(Batch::new(
            operation,
            Arc::clone(&self.engine),
            steps,
            Arc::clone(&self.progress),
        ))
    }

    /// Runs the whole batch on the calling thread.
    pub fn run_batch(
        &self,
        operation: &str,
        units: &[UnitKey],
        params: &BatchParams,
    ) -> Result<BatchSummary, DispatchError> {
        Ok(self.prepare(operation, units, params)?.run())
    }

    /// Runs the whole batch across the engine's configured worker count.
    pub fn run_parallel(
        &self,
        operation: &str,
        units: &[UnitKey],
        params: &BatchParams,
    ) -> Result<BatchSummary, DispatchError> {
        self.prepare(operation, units, params)?
            .run_parallel(self.engine.worker_count())
    }
}
