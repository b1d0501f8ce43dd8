//! Batch progress events and the reporters that forward them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::actions::{OutcomeStatus, UnitOutcome};

/// Phase of a batch run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    Started,
    Processing,
    UnitFinished,
    Completed,
    Aborted,
}

impl std::fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchPhase::Started => write!(f, "Started"),
            BatchPhase::Processing => write!(f, "Processing"),
            BatchPhase::UnitFinished => write!(f, "Unit finished"),
            BatchPhase::Completed => write!(f, "Completed"),
            BatchPhase::Aborted => write!(f, "Aborted"),
        }
    }
}

/// Progress event for a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgressEvent {
    pub batch_id: String,
    pub operation: String,
    pub phase: BatchPhase,
    pub message: String,
    /// Steps finished so far.
    pub processed: usize,
    pub total: usize,
    /// Unit the event is about, as `kind:id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OutcomeStatus>,
    pub timestamp: DateTime<Utc>,
}

impl BatchProgressEvent {
    pub fn new(
        batch_id: &str,
        operation: &str,
        phase: BatchPhase,
        message: impl Into<String>,
        processed: usize,
        total: usize,
    ) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            operation: operation.to_string(),
            phase,
            message: message.into(),
            processed,
            total,
            unit: None,
            outcome: None,
            timestamp: Utc::now(),
        }
    }

    /// Event for a finished unit, carrying its outcome.
    pub fn unit_finished(
        batch_id: &str,
        operation: &str,
        outcome: &UnitOutcome,
        processed: usize,
        total: usize,
    ) -> Self {
        let mut event = Self::new(
            batch_id,
            operation,
            BatchPhase::UnitFinished,
            outcome.message.clone(),
            processed,
            total,
        );
        event.unit = Some(outcome.unit.to_string());
        event.outcome = Some(outcome.status);
        event
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: BatchProgressEvent);
}

/// Discards every event.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: BatchProgressEvent) {}
}

/// Broadcasts batch progress events to any number of subscribers.
#[derive(Clone)]
pub struct BatchProgressBroadcaster {
    sender: Arc<broadcast::Sender<BatchProgressEvent>>,
}

impl BatchProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: BatchProgressEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for BatchProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ProgressReporter for BatchProgressBroadcaster {
    fn report(&self, event: BatchProgressEvent) {
        self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitKey;

    #[test]
    fn test_broadcaster_send_receive() {
        let broadcaster = BatchProgressBroadcaster::new(10);
        let mut rx = broadcaster.subscribe();

        broadcaster.report(BatchProgressEvent::new(
            "batch-1",
            "upload",
            BatchPhase::Started,
            "Starting",
            0,
            3,
        ));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.batch_id, "batch-1");
        assert_eq!(received.phase, BatchPhase::Started);
        assert_eq!(received.total, 3);
        assert!(received.unit.is_none());
    }

    #[test]
    fn test_send_without_subscribers() {
        let broadcaster = BatchProgressBroadcaster::default();
        broadcaster.send(BatchProgressEvent::new(
            "batch-1",
            "upload",
            BatchPhase::Completed,
            "done",
            1,
            1,
        ));
    }

    #[test]
    fn test_unit_finished_event_serialization() {
        let outcome = UnitOutcome {
            unit: UnitKey::content("7"),
            label: "About us".to_string(),
            action: "upload",
            status: OutcomeStatus::Failed,
            message: "Upload failed for 'About us': TMS API error: boom".to_string(),
            artifact: None,
        };
        let event = BatchProgressEvent::unit_finished("b", "upload", &outcome, 2, 3);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["batchId"], "b");
        assert_eq!(json["phase"], "unit_finished");
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["processed"], 2);
        assert_eq!(json["unit"], outcome.unit.to_string());
    }

    #[test]
    fn test_event_parses_from_client_json() {
        let event: BatchProgressEvent = serde_json::from_str(
            r#"{
                "batchId": "b",
                "operation": "download",
                "phase": "unit_finished",
                "message": "Downloaded es",
                "processed": 1,
                "total": 4,
                "unit": "content:9",
                "outcome": "skipped",
                "timestamp": "2026-03-01T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(event.phase, BatchPhase::UnitFinished);
        assert_eq!(event.outcome, Some(OutcomeStatus::Skipped));
        assert_eq!(event.unit.as_deref(), Some("content:9"));
    }
}
