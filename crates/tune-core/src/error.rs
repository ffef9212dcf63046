//! Error kinds for directory lookups and the audio sink.

/// Failures talking to the station directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// One mirror failed; always recovered by moving to the next mirror.
    #[error("mirror {mirror} unreachable: {reason}")]
    MirrorUnreachable { mirror: String, reason: String },

    /// Every candidate mirror failed.
    #[error("all {attempted} directory mirrors failed")]
    Exhausted { attempted: usize },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("JSON parsing failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl DirectoryError {
    pub fn unreachable(mirror: impl Into<String>, reason: impl ToString) -> Self {
        Self::MirrorUnreachable {
            mirror: mirror.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures reported by the audio sink.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SinkError {
    /// The stream never started.
    #[error("stream connect failed: {0}")]
    ConnectFailed(String),

    /// The stream failed after it had started playing.
    #[error("stream failed while playing: {0}")]
    RuntimeFailure(String),

    /// The player backend is missing or could not be started.
    #[error("audio sink unavailable: {0}")]
    Unavailable(String),

    #[error("player IPC error: {0}")]
    Ipc(String),
}
