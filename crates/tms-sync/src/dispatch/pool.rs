use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use super::batch::Step;
use crate::actions::UnitOutcome;
use crate::engine::SyncEngine;
use crate::error::{DispatchError, SyncError};

/// A step tagged with its position in the batch.
pub type IndexedStep = (usize, Step);
pub type IndexedOutcome = (usize, UnitOutcome);

/// Fixed set of threads running batch steps against a shared engine.
/// Channels are bounded at twice the worker count.
pub struct WorkerPool {
    step_sender: Sender<IndexedStep>,
    result_receiver: Receiver<IndexedOutcome>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    capacity: usize,
}

impl WorkerPool {
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(engine: Arc<SyncEngine>, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let capacity = worker_count * 2;
        let (step_sender, step_receiver) = bounded::<IndexedStep>(capacity);
        let (result_sender, result_receiver) = bounded::<IndexedOutcome>(capacity);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let step_rx = step_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_engine = Arc::clone(&engine);

            let handle = thread::spawn(move || {
                run_worker(worker_id, step_rx, result_tx, shutdown_flag, worker_engine);
            });

            workers.push(handle);
        }

        info!("Started {} sync workers", worker_count);

        Self {
            step_sender,
            result_receiver,
            workers,
            shutdown,
            capacity,
        }
    }

    /// Number of steps that may be in flight without blocking either channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn submit(&self, step: IndexedStep) -> Result<(), DispatchError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(DispatchError::ChannelClosed);
        }

        self.step_sender
            .send(step)
            .map_err(|_| DispatchError::ChannelClosed)
    }

    pub fn recv_result(&self) -> Option<IndexedOutcome> {
        self.result_receiver.recv().ok()
    }

    pub fn shutdown(&self) {
        debug!("Shutting down sync worker pool");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        // Dropping the sender lets idle workers exit
        drop(self.step_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Sync worker {} panicked: {:?}", i, e);
            } else {
                debug!("Sync worker {} finished", i);
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    step_receiver: Receiver<IndexedStep>,
    result_sender: Sender<IndexedOutcome>,
    shutdown: Arc<AtomicBool>,
    engine: Arc<SyncEngine>,
) {
    debug!("Sync worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Sync worker {} received shutdown signal", worker_id);
            break;
        }

        match step_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok((index, step)) => {
                debug!("Sync worker {} running {} on {}", worker_id, step.action.name(), step.unit);
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    engine.execute(&step.unit, &step.action)
                }))
                .unwrap_or_else(|payload| {
                    let reason = panic_reason(payload.as_ref());
                    error!(
                        "Sync worker {} panicked running {} on {}: {}",
                        worker_id,
                        step.action.name(),
                        step.unit,
                        reason
                    );
                    let label = step.unit.to_string();
                    UnitOutcome::failed(
                        &step.unit,
                        &label,
                        &step.action,
                        &SyncError::Panicked(reason),
                    )
                });

                if let Err(e) = result_sender.send((index, outcome)) {
                    error!("Sync worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Sync worker {} step channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Sync worker {} stopped", worker_id);
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
