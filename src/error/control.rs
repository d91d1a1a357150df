use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Failed to bind control listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Control I/O failed ({context}): {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("WebSocket error ({context}): {source}")]
    WebSocket {
        context: &'static str,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("Controller did not accept a frame within {limit:?}")]
    WriteTimeout { limit: std::time::Duration },
    #[error("Failed to decode control message: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode state snapshot: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    #[error("Action '{action}' requires a concurrency value.")]
    MissingConcurrency { action: &'static str },
    #[error("Concurrency {requested} exceeds the maximum of {max}.")]
    ConcurrencyTooHigh { requested: u32, max: u32 },
    #[error("Binary control frames are not supported.")]
    BinaryFrame,
    #[error("{status} {message}")]
    Http { status: u16, message: String },
    #[cfg(test)]
    #[error("{message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("{message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}

impl ControlError {
    pub(crate) fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }
}
