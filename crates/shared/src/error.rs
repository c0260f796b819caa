use thiserror::Error;

/// Transport-level failure of a bridge request. Application-level refusals
/// are never reported through this type; they arrive as ordinary replies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("host connection closed")]
    Disconnected,
    #[error("host dropped request {action} without replying")]
    ReplyDropped { action: String },
    #[error("host answered {action} with status {status}")]
    Status { action: String, status: u16 },
    #[error("malformed reply: {0}")]
    Decode(String),
    #[error("request {action} timed out")]
    TimedOut { action: String },
}

impl BridgeError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}
