/// Convenience result type used across adreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// A scene was rejected when building a timeline. Not retryable; the input must change.
    #[error("invalid scene: {0}")]
    InvalidScene(String),

    /// The encoder cannot be created for the requested container/codec configuration.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The encoder faulted mid-stream. Partial output has been discarded.
    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    /// The caller aborted the run.
    #[error("cancelled")]
    Cancelled,

    /// A rendering primitive (font, raster surface) could not be initialized.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid configuration or input data outside the scene model.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Copyable classification of a terminal failure, stored in the pipeline state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// See [`ReelError::InvalidScene`].
    InvalidScene,
    /// See [`ReelError::UnsupportedFormat`].
    UnsupportedFormat,
    /// See [`ReelError::EncodingFailed`].
    EncodingFailed,
    /// See [`ReelError::Cancelled`].
    Cancelled,
    /// See [`ReelError::Render`].
    Render,
    /// Any other error.
    Other,
}

impl ReelError {
    /// Build a [`ReelError::InvalidScene`] value.
    pub fn invalid_scene(msg: impl Into<String>) -> Self {
        Self::InvalidScene(msg.into())
    }

    /// Build a [`ReelError::UnsupportedFormat`] value.
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Build a [`ReelError::EncodingFailed`] value.
    pub fn encoding_failed(msg: impl Into<String>) -> Self {
        Self::EncodingFailed(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Classify this error for the terminal pipeline state.
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::InvalidScene(_) => FailureReason::InvalidScene,
            Self::UnsupportedFormat(_) => FailureReason::UnsupportedFormat,
            Self::EncodingFailed(_) => FailureReason::EncodingFailed,
            Self::Cancelled => FailureReason::Cancelled,
            Self::Render(_) => FailureReason::Render,
            Self::Validation(_) | Self::Serde(_) | Self::Other(_) => FailureReason::Other,
        }
    }

    /// Return `true` for a caller-initiated abort.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
