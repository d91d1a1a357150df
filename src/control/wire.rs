use serde::{Deserialize, Serialize};

use crate::error::ControlError;
use crate::state::RunSnapshot;

/// Inbound control message.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ControlRequest {
    #[serde(default, alias = "Action")]
    pub action: String,
    #[serde(default, alias = "Concurrency")]
    pub concurrency: Option<u32>,
}

/// Outbound message written after every inbound one. `error` is present only
/// when the inbound message was rejected.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusMessage {
    pub state: RunSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<RunSnapshot> for StatusMessage {
    fn from(state: RunSnapshot) -> Self {
        Self { state, error: None }
    }
}

pub(crate) fn decode_request(text: &str) -> Result<ControlRequest, ControlError> {
    serde_json::from_str(text).map_err(|err| ControlError::Decode { source: err })
}

pub(crate) fn encode_status(status: &StatusMessage) -> Result<String, ControlError> {
    serde_json::to_string(status).map_err(|err| ControlError::Encode { source: err })
}
