//! Common result and error types for the Chronos analyzer.

/// The standard result type for fallible internal operations.
///
/// `Ok` contains the result value (which may be partial or degraded after
/// error recovery). `Err` indicates an unrecoverable internal error such as
/// an exceeded capacity ceiling, not a user-facing error. User errors are
/// reported through a diagnostic sink and the operation still returns `Ok`.
pub type StaResult<T> = Result<T, InternalError>;

/// An internal analyzer error: a capacity ceiling was exceeded or an
/// invariant was violated.
///
/// These errors should never occur on well-formed designs within the
/// documented limits. They terminate the analysis rather than degrade it.
#[derive(Debug, thiserror::Error)]
#[error("internal timing analyzer error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
