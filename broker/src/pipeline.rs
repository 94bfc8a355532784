//! Signed request pipeline: OAuth header, query string, JSON body, status
//! interpretation.

use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value};
use tickwire::oauth::{self, OAuthParams};
use tickwire::{KeyConfig, OAuthToken};

use crate::error::BrokerError;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

/// Issues signed requests over a [`Transport`]. Never retries.
#[derive(Clone)]
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
}

impl RequestPipeline {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Execute an authenticated API call.
    ///
    /// Returns the parsed JSON body on 200, `{}` on 204, and
    /// [`BrokerError::Api`] carrying the provider's error message otherwise.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        access_token: &OAuthToken,
        keys: &KeyConfig,
        body: Option<&Value>,
    ) -> Result<Value, BrokerError> {
        debug!("{method} {url} {query:?}");
        let params = OAuthParams::template(&keys.key).with(oauth::TOKEN, &access_token.oauth_token);
        let request = build_request(
            method,
            url,
            query,
            params,
            &keys.secret,
            &access_token.oauth_token_secret,
            body,
        )?;
        let response = self.transport.send(request).await?;
        interpret(response)
    }

    /// Signed GET for the handshake legs, which answer with a form-encoded
    /// body rather than JSON.
    pub async fn signed_form_get(
        &self,
        url: &str,
        params: OAuthParams,
        consumer_secret: &str,
        token_secret: &str,
    ) -> Result<String, BrokerError> {
        let signed = oauth::sign(Method::Get.as_str(), url, params, consumer_secret, token_secret, &[])?;
        let request =
            HttpRequest::new(Method::Get, url).with_header("Authorization", signed.authorization_header());

        let response = self.transport.send(request).await?;
        if response.status != 200 {
            return Err(BrokerError::Auth(format!(
                "{url} returned {}: {}",
                response.status,
                response.body.trim()
            )));
        }
        Ok(response.body)
    }
}

/// Assemble a signed request from an unsigned parameter template.
///
/// Query parameters are signed together with the header parameters but only
/// the header parameters go into `Authorization`; the query string itself
/// uses the raw values.
pub fn build_request(
    method: Method,
    url: &str,
    query: &[(String, String)],
    params: OAuthParams,
    consumer_secret: &str,
    token_secret: &str,
    body: Option<&Value>,
) -> Result<HttpRequest, BrokerError> {
    let signed = oauth::sign(method.as_str(), url, params, consumer_secret, token_secret, query)?;

    let mut request = HttpRequest::new(method, attach_query(url, query))
        .with_header("Authorization", signed.authorization_header());

    if method.has_body() {
        let empty = Value::Object(Map::new());
        let json = serde_json::to_string(body.unwrap_or(&empty))
            .map_err(|e| BrokerError::Decode(format!("failed to serialize body: {e}")))?;
        request = request.with_header("Content-Type", "application/json");
        request.body = Some(json);
    }

    Ok(request)
}

/// Append `?k1=v1&k2=v2` with values as given.
pub fn attach_query(url: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let qs = query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{url}?{qs}")
}

/// Map a transport response to the pipeline result.
pub fn interpret(response: HttpResponse) -> Result<Value, BrokerError> {
    match response.status {
        200 => serde_json::from_str(&response.body)
            .map_err(|e| BrokerError::Decode(format!("invalid JSON body: {e}"))),
        204 => Ok(Value::Object(Map::new())),
        status => Err(api_error(status, &response.body)),
    }
}

fn api_error(status: u16, body: &str) -> BrokerError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    match parsed.as_ref().and_then(|v| v.get("Error")) {
        Some(Value::Object(err)) => BrokerError::Api {
            status,
            code: err.get("code").and_then(Value::as_i64),
            message: err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(err.clone()).to_string()),
        },
        Some(Value::String(message)) => BrokerError::Api {
            status,
            code: None,
            message: message.clone(),
        },
        _ => BrokerError::Api {
            status,
            code: None,
            message: if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            },
        },
    }
}
