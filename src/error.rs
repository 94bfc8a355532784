//! Core error types.

/// Errors from signing and from decoding provider payloads.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed signing inputs (e.g. a URL without scheme or host).
    #[error("signature error: {0}")]
    Signature(String),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid environment `{0}` (expected `sandbox` or `production`)")]
    Environment(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            Error::MissingField("oauth_token").to_string(),
            "missing field `oauth_token`"
        );
        assert_eq!(
            Error::Signature("url has no scheme: x".into()).to_string(),
            "signature error: url has no scheme: x"
        );
    }

    #[test]
    fn is_error() {
        let err: Box<dyn std::error::Error> = Box::new(Error::Environment("live".into()));
        assert!(err.to_string().contains("sandbox"));
    }
}
