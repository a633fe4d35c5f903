//! Error types surfaced by the alert engine.

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures a caller of the engine can observe. Transport failures are not
/// here: they are reported to the presentation sink and never abort the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// History lookup past the end. Never clamped.
    #[error("Index out of range: {index} (history holds {len} alerts)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Payload had the wrong shape (missing or unparseable timestamp, ...)
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Payload was not valid JSON for the alert schema
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl EngineError {
    /// True for the "drop the message, keep the channel" class of failure.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            EngineError::MalformedMessage(_) | EngineError::Decode(_)
        )
    }
}
