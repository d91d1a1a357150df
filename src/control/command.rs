use crate::error::ControlError;

use super::wire::ControlRequest;

/// A decoded control action. Consumed as soon as it is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start(u32),
    Stop,
    Update(u32),
}

impl ControlCommand {
    /// Maps a wire request onto a command. Unrecognized actions yield `None`.
    ///
    /// # Errors
    ///
    /// Returns an error when `start`/`update` lack a concurrency or ask for
    /// more than `max_concurrency`.
    pub fn from_request(
        request: &ControlRequest,
        max_concurrency: u32,
    ) -> Result<Option<Self>, ControlError> {
        let action = request.action.trim().to_ascii_lowercase();
        let command = match action.as_str() {
            "start" => Self::Start(required_concurrency(request, "start", max_concurrency)?),
            "update" => Self::Update(required_concurrency(request, "update", max_concurrency)?),
            "stop" => Self::Stop,
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

fn required_concurrency(
    request: &ControlRequest,
    action: &'static str,
    max: u32,
) -> Result<u32, ControlError> {
    let requested = request
        .concurrency
        .ok_or(ControlError::MissingConcurrency { action })?;
    if requested > max {
        return Err(ControlError::ConcurrencyTooHigh { requested, max });
    }
    Ok(requested)
}
