/// Failure of a remote call, classified once at the call site.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// No node is registered for the service, or the node refused the
    /// connection.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The node did not answer in time.
    #[error("Remote call timed out")]
    Timeout,

    /// The node answered with a status and no usable envelope.
    #[error("Remote service returned HTTP {0}")]
    UnexpectedStatus(u16),

    /// Anything else: broken body, TLS, protocol errors.
    #[error("Unexpected remote error: {0}")]
    UnexpectedError(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if err.is_connect() {
            RemoteError::Unavailable(err.to_string())
        } else if err.is_decode() {
            RemoteError::UnexpectedError(format!("undecodable reply: {err}"))
        } else {
            RemoteError::UnexpectedError(err.to_string())
        }
    }
}
