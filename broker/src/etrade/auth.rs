//! Three-legged OAuth1 handshake.
//!
//! 1. [`request_token`]: signed GET with `oauth_callback=oob`.
//! 2. [`authorize_url`]: the user opens it and reads back a verifier code.
//! 3. [`access_token`]: signed GET with the request token and verifier.
//!
//! Legs 1 and 3 happen in different process runs, so the caller persists
//! the request token in between.

use log::{debug, info};
use tickwire::oauth::{self, OAuthParams};
use tickwire::{KeyConfig, OAuthToken};

use super::endpoints::{ACCESS_TOKEN_URL, AUTHORIZE_URL, REQUEST_TOKEN_URL};
use crate::error::BrokerError;
use crate::pipeline::RequestPipeline;

/// Handshake leg 1: obtain a request token.
pub async fn request_token(
    pipeline: &RequestPipeline,
    keys: &KeyConfig,
) -> Result<OAuthToken, BrokerError> {
    let params = OAuthParams::template(&keys.key).with(oauth::CALLBACK, "oob");
    let body = pipeline
        .signed_form_get(REQUEST_TOKEN_URL, params, &keys.secret, "")
        .await?;
    debug!("request token obtained");
    Ok(OAuthToken::from_form(&body)?)
}

/// The page where the user approves the request token.
pub fn authorize_url(keys: &KeyConfig, request_token: &OAuthToken) -> String {
    format!(
        "{AUTHORIZE_URL}?key={}&token={}",
        keys.key, request_token.oauth_token
    )
}

/// Handshake leg 3: exchange the request token and verifier for an access
/// token.
pub async fn access_token(
    pipeline: &RequestPipeline,
    keys: &KeyConfig,
    request_token: &OAuthToken,
    verifier: &str,
) -> Result<OAuthToken, BrokerError> {
    let params = OAuthParams::template(&keys.key)
        .with(oauth::TOKEN, &request_token.oauth_token)
        .with(oauth::VERIFIER, verifier.trim());
    let body = pipeline
        .signed_form_get(
            ACCESS_TOKEN_URL,
            params,
            &keys.secret,
            &request_token.oauth_token_secret,
        )
        .await?;
    info!("access token obtained");
    Ok(OAuthToken::from_form(&body)?)
}

/// Where the handshake stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    AwaitingVerifier { request_token: OAuthToken },
    Authenticated { access_token: OAuthToken },
}

/// Handshake state machine.
///
/// `Unauthenticated → AwaitingVerifier → Authenticated`; any rejected access
/// token sends it back to `Unauthenticated` via [`invalidate`](Self::invalidate).
#[derive(Debug, Clone, Default)]
pub struct AuthFlow {
    state: AuthState,
}

impl AuthFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn access_token(&self) -> Option<&OAuthToken> {
        match &self.state {
            AuthState::Authenticated { access_token } => Some(access_token),
            _ => None,
        }
    }

    pub fn request_token(&self) -> Option<&OAuthToken> {
        match &self.state {
            AuthState::AwaitingVerifier { request_token } => Some(request_token),
            _ => None,
        }
    }

    /// Run leg 1 and wait for a verifier.
    pub async fn start(
        &mut self,
        pipeline: &RequestPipeline,
        keys: &KeyConfig,
    ) -> Result<OAuthToken, BrokerError> {
        let token = request_token(pipeline, keys).await?;
        self.state = AuthState::AwaitingVerifier {
            request_token: token.clone(),
        };
        Ok(token)
    }

    /// Wait for a verifier on a request token obtained in an earlier run.
    pub fn resume(&mut self, request_token: OAuthToken) {
        self.state = AuthState::AwaitingVerifier { request_token };
    }

    /// Run leg 3. The request token is discarded whether or not the
    /// exchange succeeds.
    pub async fn complete(
        &mut self,
        pipeline: &RequestPipeline,
        keys: &KeyConfig,
        verifier: &str,
    ) -> Result<OAuthToken, BrokerError> {
        let request_token = match std::mem::take(&mut self.state) {
            AuthState::AwaitingVerifier { request_token } => request_token,
            _ => {
                return Err(BrokerError::Auth(
                    "no request token is awaiting a verifier".into(),
                ));
            }
        };
        let token = access_token(pipeline, keys, &request_token, verifier).await?;
        self.state = AuthState::Authenticated {
            access_token: token.clone(),
        };
        Ok(token)
    }

    /// Adopt a previously persisted access token, replacing any current one.
    pub fn authenticated(&mut self, access_token: OAuthToken) {
        self.state = AuthState::Authenticated { access_token };
    }

    pub fn invalidate(&mut self) {
        self.state = AuthState::Unauthenticated;
    }
}
