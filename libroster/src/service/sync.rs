//! Background data-sync worker
//!
//! A single unit of work meant to be driven by an external scheduler (cron,
//! a systemd timer). The worker performs a fixed, simulated amount of work
//! and reports a tagged success/failure outcome; retry policy belongs to
//! whoever schedules it, not here.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::Result;
use crate::service::events::{Event, EventBus};

/// Outcome of one sync run, with a string payload either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Success { result: String },
    Failure { error: String },
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Success { .. })
    }

    /// Exit code for a one-shot runner: 0 on success, 1 on failure.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

pub struct SyncWorker {
    duration: Duration,
    event_bus: EventBus,
}

impl SyncWorker {
    pub fn new(duration: Duration, event_bus: EventBus) -> Self {
        Self {
            duration,
            event_bus,
        }
    }

    /// Run the job once.
    ///
    /// Faults are captured into the failure payload rather than propagated;
    /// the caller always gets an outcome.
    pub async fn run(&self) -> SyncOutcome {
        self.event_bus.emit(Event::SyncStarted);
        info!(duration = ?self.duration, "sync started");

        match self.perform().await {
            Ok(result) => {
                info!(%result, "sync completed");
                self.event_bus.emit(Event::SyncCompleted {
                    result: result.clone(),
                });
                SyncOutcome::Success { result }
            }
            Err(fault) => {
                let error = fault.to_string();
                warn!(%error, "sync failed");
                self.event_bus.emit(Event::SyncFailed {
                    error: error.clone(),
                });
                SyncOutcome::Failure { error }
            }
        }
    }

    // Stand-in for the real transfer: a fixed-duration wait and a canned
    // result payload.
    async fn perform(&self) -> Result<String> {
        sleep(self.duration).await;
        Ok("data sync complete".to_string())
    }
}
