/// Result alias used across the crate.
pub type KenBurnsResult<T> = Result<T, KenBurnsError>;

/// Error taxonomy for render sessions.
///
/// Display prefixes are stable so callers can tell the failure reasons apart without matching on
/// variants.
#[derive(thiserror::Error, Debug)]
pub enum KenBurnsError {
    /// Inputs or settings were rejected before any rendering started.
    #[error("validation error: {0}")]
    Validation(String),

    /// A render was requested while the controller already has one in flight.
    #[error("render already running")]
    AlreadyRunning,

    /// The music track could not be loaded or started. Recovered by falling back to silence.
    #[error("audio init error: {0}")]
    AudioInit(String),

    /// No codec in the fallback chain is available.
    #[error("encoder unsupported: {0}")]
    EncoderUnsupported(String),

    /// The encoder failed while consuming frames or finalizing output.
    #[error("encoding failure: {0}")]
    Encoding(String),

    /// The render loop observed a cancellation request.
    #[error("render cancelled")]
    Cancelled,

    /// I/O and other context-carrying failures.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KenBurnsError {
    /// Build a [`KenBurnsError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`KenBurnsError::AudioInit`].
    pub fn audio_init(msg: impl Into<String>) -> Self {
        Self::AudioInit(msg.into())
    }

    /// Build a [`KenBurnsError::EncoderUnsupported`].
    pub fn encoder_unsupported(msg: impl Into<String>) -> Self {
        Self::EncoderUnsupported(msg.into())
    }

    /// Build a [`KenBurnsError::Encoding`].
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// `false` only for errors the session recovers from locally.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::AudioInit(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
