//! Scheduler loop
//!
//! Drives [`ReconciliationEngine::apply_if_changed()`] on a fixed interval
//! until cancelled. The first tick runs immediately; afterwards the loop
//! sleeps for the interval between the end of one tick and the start of the
//! next, so slow ticks push later ticks back.
//!
//! Cancellation is cooperative. It is observed before each tick and while
//! sleeping, never in the middle of a resolve or apply.

use super::{EngineEvent, ReconciliationEngine};
use crate::error::{Error, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Why the scheduler loop returned
#[derive(Debug)]
pub enum Termination {
    /// The cancellation token fired (operator interrupt)
    Cancelled,

    /// An unexpected error stopped the loop
    Fatal(Error),
}

impl Termination {
    /// Check whether the loop ended through cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Termination::Cancelled)
    }

    /// Convert into a `Result`, mapping cancellation to `Ok(())`
    pub fn into_result(self) -> Result<()> {
        match self {
            Termination::Cancelled => Ok(()),
            Termination::Fatal(e) => Err(e),
        }
    }
}

/// Sequential driver for a [`ReconciliationEngine`]
pub struct Scheduler {
    engine: ReconciliationEngine,
    interval: Duration,
}

impl Scheduler {
    /// Create a scheduler using the engine's configured poll interval
    pub fn new(engine: ReconciliationEngine) -> Self {
        let interval = engine.poll_interval();
        Self { engine, interval }
    }

    /// The engine being driven
    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Run until `cancel` fires or a tick fails
    ///
    /// # Returns
    ///
    /// - `Termination::Cancelled`: Clean shutdown
    /// - `Termination::Fatal(Error)`: The loop stopped on an unexpected error
    pub async fn run(mut self, cancel: CancellationToken) -> Termination {
        info!(
            "Starting VPN IP Whitelist Updater Service (interval={:?}, reset every {} ticks)",
            self.interval,
            self.engine.reset_counter_initial()
        );
        self.engine.emit_event(EngineEvent::Started {
            poll_interval_secs: self.interval.as_secs(),
            reset_counter_initial: self.engine.reset_counter_initial(),
        });

        let termination = loop {
            if cancel.is_cancelled() {
                break Termination::Cancelled;
            }

            if let Err(e) = self.engine.apply_if_changed().await {
                break Termination::Fatal(e);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Termination::Cancelled,
                _ = tokio::time::sleep(self.interval) => {}
            }
        };

        let reason = match &termination {
            Termination::Cancelled => {
                info!("Service stopped by user");
                "Cancelled".to_string()
            }
            Termination::Fatal(e) => {
                error!("Unexpected error: {}", e);
                e.to_string()
            }
        };
        self.engine.emit_event(EngineEvent::Stopped { reason });

        termination
    }
}
