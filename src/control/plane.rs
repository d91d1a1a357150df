use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::ControlError;
use crate::lifecycle::LifecycleTx;
use crate::state::{RunSnapshot, RunState};

use super::command::ControlCommand;
use super::wire::{StatusMessage, decode_request};

/// What a command did to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started(u32),
    Resized(u32),
    Stopped,
    /// Concurrency recorded while idle; nothing started.
    Configured(u32),
    Ignored,
}

/// Applies control commands to the shared run state and publishes the
/// matching lifecycle directive.
pub struct ControlPlane {
    state: Arc<RunState>,
    lifecycle: Arc<LifecycleTx>,
    max_concurrency: u32,
}

impl ControlPlane {
    #[must_use]
    pub const fn new(
        state: Arc<RunState>,
        lifecycle: Arc<LifecycleTx>,
        max_concurrency: u32,
    ) -> Self {
        Self {
            state,
            lifecycle,
            max_concurrency,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        self.state.snapshot()
    }

    pub fn apply(&self, command: ControlCommand) -> Transition {
        let running = self.state.is_running();
        match command {
            ControlCommand::Start(concurrency) if !running => {
                self.state.configure(concurrency, true);
                self.lifecycle.start(concurrency);
                Transition::Started(concurrency)
            }
            ControlCommand::Start(_) => Transition::Ignored,
            ControlCommand::Update(concurrency) if running => {
                self.state.configure(concurrency, true);
                self.lifecycle.start(concurrency);
                Transition::Resized(concurrency)
            }
            ControlCommand::Update(concurrency) => {
                self.state.set_concurrency(concurrency);
                Transition::Configured(concurrency)
            }
            ControlCommand::Stop => {
                self.state.set_running(false);
                self.lifecycle.stop();
                Transition::Stopped
            }
        }
    }

    /// Handles one inbound text message and returns the reply. Malformed and
    /// unrecognized messages leave the run untouched; rejected ones say why.
    pub fn handle_message(&self, text: &str) -> StatusMessage {
        let request = match decode_request(text) {
            Ok(request) => request,
            Err(err) => {
                warn!("{}", err);
                return self.reject(&err);
            }
        };

        match ControlCommand::from_request(&request, self.max_concurrency) {
            Ok(Some(command)) => match self.apply(command) {
                Transition::Started(concurrency) => info!("Starting with concurrency {}", concurrency),
                Transition::Resized(concurrency) => info!("Updating concurrency to {}", concurrency),
                Transition::Stopped => info!("Stopping"),
                Transition::Configured(concurrency) => {
                    info!("Concurrency set to {} (idle)", concurrency);
                }
                Transition::Ignored => debug!("Ignoring {:?} while running", command),
            },
            Ok(None) => debug!("Ignoring unrecognized action '{}'", request.action),
            Err(err) => {
                warn!("Rejected control message: {}", err);
                return self.reject(&err);
            }
        }
        StatusMessage::from(self.snapshot())
    }

    fn reject(&self, err: &ControlError) -> StatusMessage {
        StatusMessage {
            state: self.snapshot(),
            error: Some(err.to_string()),
        }
    }
}
