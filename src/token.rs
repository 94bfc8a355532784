//! OAuth tokens and the form-encoded bodies they arrive in.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::{Error, Result};

/// An OAuth1 token pair.
///
/// The same shape serves as the short-lived request token and the long-lived
/// access token; which one it is depends on where it sits in the handshake.
/// Tokens are opaque and replaced wholesale, never edited.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub oauth_token: String,
    pub oauth_token_secret: String,
}

impl OAuthToken {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            oauth_token: token.into(),
            oauth_token_secret: secret.into(),
        }
    }

    /// Parse a token from a provider response such as
    /// `oauth_token=abc&oauth_token_secret=def&oauth_callback_confirmed=true`.
    pub fn from_form(body: &str) -> Result<Self> {
        let mut fields = parse_form(body);
        let oauth_token = fields
            .remove("oauth_token")
            .ok_or(Error::MissingField("oauth_token"))?;
        let oauth_token_secret = fields
            .remove("oauth_token_secret")
            .ok_or(Error::MissingField("oauth_token_secret"))?;
        Ok(Self {
            oauth_token,
            oauth_token_secret,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthToken")
            .field("oauth_token", &self.oauth_token)
            .field("oauth_token_secret", &"<redacted>")
            .finish()
    }
}

/// Decode an `application/x-www-form-urlencoded` body.
///
/// `+` decodes to a space and each value is percent-decoded exactly once.
/// A repeated key keeps its last value; invalid UTF-8 is replaced with U+FFFD.
pub fn parse_form(body: &str) -> BTreeMap<String, String> {
    form_urlencoded::parse(body.trim().as_bytes())
        .into_owned()
        .collect()
}
