//! Broker error types.

/// Errors that can occur during broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// The request never produced an HTTP response.
    #[error("connection error: {0}")]
    Connection(String),

    /// Non-200/204 response; `message` comes from the provider's `Error` payload.
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("not connected")]
    NotConnected,

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("token store error: {0}")]
    TokenStore(String),

    #[error(transparent)]
    Core(#[from] tickwire::Error),

    #[error("tick stream cancelled")]
    Cancelled,

    #[error("giving up after {attempts} consecutive failures: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<BrokerError>,
    },
}

impl BrokerError {
    /// True for failures that mean the access token is missing or rejected,
    /// including a retry budget spent on such failures.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            BrokerError::Api { status: 401, .. } | BrokerError::Auth(_) | BrokerError::NotConnected => {
                true
            }
            BrokerError::RetriesExhausted { last, .. } => last.is_auth_failure(),
            _ => false,
        }
    }
}
