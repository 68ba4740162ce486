//! Progress notifications emitted while a simulation run is in flight.
//!
//! Sinks are fire-and-forget: the orchestrator logs and discards any error a
//! sink returns.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

/// Event name used for every status message, as consumed by the dashboard.
pub const STATUS_UPDATE: &str = "status_update";

/// A progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub run_id: Uuid,
    pub name: String,
    pub payload: ProgressPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPayload {
    pub message: String,
    /// Paths simulated so far, if the event reports simulation progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl ProgressEvent {
    pub fn status(run_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            run_id,
            name: STATUS_UPDATE.to_string(),
            payload: ProgressPayload {
                message: message.into(),
                completed: None,
                total: None,
            },
        }
    }

    pub fn batch(run_id: Uuid, completed: usize, total: usize) -> Self {
        Self {
            run_id,
            name: STATUS_UPDATE.to_string(),
            payload: ProgressPayload {
                message: format!("Simulated {} of {} paths", completed, total),
                completed: Some(completed),
                total: Some(total),
            },
        }
    }
}

#[derive(Debug, Error)]
#[error("progress sink failed: {0}")]
pub struct ProgressError(pub String);

/// Receiver of progress notifications.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: &ProgressEvent) -> Result<(), ProgressError>;
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) -> Result<(), ProgressError> + Send + Sync,
{
    fn notify(&self, event: &ProgressEvent) -> Result<(), ProgressError> {
        self(event)
    }
}

/// Writes every event to the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn notify(&self, event: &ProgressEvent) -> Result<(), ProgressError> {
        log::info!("[{}] {}: {}", event.run_id, event.name, event.payload.message);
        Ok(())
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressSink for RecordingProgressSink {
    fn notify(&self, event: &ProgressEvent) -> Result<(), ProgressError> {
        self.events
            .lock()
            .map_err(|e| ProgressError(e.to_string()))?
            .push(event.clone());
        Ok(())
    }
}
