/// Message used when a failed operation carries no message of its own.
pub const DEFAULT_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// The ways a producer or page fetch can fail.
///
/// Only [`RequestError::Failed`] is ever surfaced to the user.
/// [`RequestError::Aborted`] is the cancellation marker and is swallowed silently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The operation observed its cancellation and gave up.
    #[error("request was aborted")]
    Aborted,
    /// The operation failed, optionally with a human readable message.
    #[error("{}", .0.as_deref().unwrap_or(DEFAULT_ERROR_MESSAGE))]
    Failed(Option<String>),
}

impl RequestError {
    /// A failure with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        RequestError::Failed(Some(message.into()))
    }

    /// A failure without a message.
    pub fn unknown() -> Self {
        RequestError::Failed(None)
    }

    /// Whether this is the cancellation marker.
    pub fn is_aborted(&self) -> bool {
        matches!(self, RequestError::Aborted)
    }

    /// The message to show for this error, or `default` if it has none.
    ///
    /// Empty messages count as missing.
    pub fn message_or(&self, default: &str) -> String {
        match self {
            RequestError::Failed(Some(message)) if !message.is_empty() => message.clone(),
            RequestError::Aborted => self.to_string(),
            RequestError::Failed(_) => default.to_string(),
        }
    }
}

impl From<String> for RequestError {
    fn from(message: String) -> Self {
        RequestError::Failed(Some(message))
    }
}

impl From<&str> for RequestError {
    fn from(message: &str) -> Self {
        RequestError::Failed(Some(message.to_string()))
    }
}
