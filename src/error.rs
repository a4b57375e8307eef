use thiserror::Error;

use crate::dom::NodeId;

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("{message}")]
    Selection { message: String },
    #[error("synthesis backend failed: {message}")]
    Backend { message: String },
    #[error("audio playback failed: {message}")]
    Audio { message: String },
    #[error("node {node:?} is stale: {reason}")]
    StaleNode { node: NodeId, reason: &'static str },
}

impl HighlightError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn selection(message: impl Into<String>) -> Self {
        Self::Selection {
            message: message.into(),
        }
    }

    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend {
            message: err.to_string(),
        }
    }

    pub fn audio(err: impl std::fmt::Display) -> Self {
        Self::Audio {
            message: err.to_string(),
        }
    }

    pub(crate) fn stale(node: NodeId, reason: &'static str) -> Self {
        Self::StaleNode { node, reason }
    }
}
