use thiserror::Error;

/// Error taxonomy for the relay.
///
/// The `Upstream*` variants belong to the outbound dispatch layer; only
/// timeouts and unreachable hosts are retried there. Everything else maps
/// onto an HTTP status in the server module.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Inbound payload failed validation; carries every violated rule.
    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),

    /// Client exhausted its request quota for the current window.
    #[error("Rate limit exceeded, resets in {reset_in}s")]
    RateLimitExceeded { reset_in: u64 },

    /// Unknown conversation identifier.
    #[error("Conversation not found: {0}")]
    NotFound(String),

    /// Outbound webhook call exceeded the request timeout.
    #[error("Webhook request timed out")]
    UpstreamTimeout,

    /// Transport-level failure reaching the webhook (connect, DNS).
    #[error("Webhook unreachable: {0}")]
    UpstreamUnreachable(String),

    /// Webhook answered with a non-success HTTP status. Not retried.
    #[error("Webhook rejected the request (status {status})")]
    UpstreamRejected { status: u16 },

    /// Webhook body could not be decoded as JSON. Not retried.
    #[error("Webhook returned an undecodable body: {0}")]
    UpstreamBadPayload(String),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything unexpected. Detail is only exposed in development mode.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Whether the dispatch layer may retry after this error.
    ///
    /// Only transport-level failures qualify; an HTTP error status or a
    /// malformed body is a definitive answer from the upstream.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RelayError::UpstreamTimeout | RelayError::UpstreamUnreachable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(RelayError::UpstreamTimeout.is_retryable());
        assert!(RelayError::UpstreamUnreachable("connection refused".into()).is_retryable());
        assert!(!RelayError::UpstreamRejected { status: 500 }.is_retryable());
        assert!(!RelayError::UpstreamBadPayload("not json".into()).is_retryable());
        assert!(!RelayError::NotFound("abc".into()).is_retryable());
    }

    #[test]
    fn test_rejected_display_carries_status() {
        let err = RelayError::UpstreamRejected { status: 502 };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RelayError>();
    }
}
