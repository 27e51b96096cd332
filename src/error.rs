use thiserror::Error;

/// Result type for synthesis operations.
pub type SynthResult<T> = Result<T, SynthError>;

/// Errors raised by the synthesis pipeline.
///
/// Every error is detected before or during a computation and reported to
/// the caller; no operation returns partial output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    /// Unrecognized waveform name, non-positive frequency, sample rate or
    /// duration, mismatched node/curve lengths, non-finite input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Input outside the mathematical domain of an operation
    /// (e.g. a non-positive x where a logarithm is taken).
    #[error("domain error: {0}")]
    Domain(String),

    /// The requested render would allocate more samples than allowed.
    #[error("requested {requested} samples, limit is {limit}")]
    ResourceLimitExceeded {
        /// Number of samples the request asked for.
        requested: u64,
        /// Configured ceiling.
        limit: usize,
    },
}

impl SynthError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SynthError::InvalidArgument(msg.into())
    }

    pub(crate) fn domain(msg: impl Into<String>) -> Self {
        SynthError::Domain(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            SynthError::invalid("unknown waveform 'noise'").to_string(),
            "invalid argument: unknown waveform 'noise'"
        );
        assert_eq!(
            SynthError::domain("x must be positive").to_string(),
            "domain error: x must be positive"
        );
        let e = SynthError::ResourceLimitExceeded {
            requested: 100,
            limit: 10,
        };
        assert_eq!(e.to_string(), "requested 100 samples, limit is 10");
    }
}
