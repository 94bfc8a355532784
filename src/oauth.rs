//! OAuth1 HMAC-SHA1 request signing.
//!
//! The signature covers the HTTP method, the normalized base URL and the
//! merged set of OAuth header parameters and query parameters. Only the
//! header parameters (plus `oauth_signature`) end up in the `Authorization`
//! header; query parameters travel in the URL.
//!
//! ```
//! use tickwire::oauth::{self, OAuthParams};
//!
//! let header = OAuthParams::template_with("key", "abcdefghijklmnop", 1_700_000_000)
//!     .with("oauth_token", "token");
//! let query = vec![("detailFlag".to_string(), "ALL".to_string())];
//! let signed = oauth::sign(
//!     "GET",
//!     "https://api.etrade.com/v1/market/quote/AAPL.json",
//!     header,
//!     "secret",
//!     "token-secret",
//!     &query,
//! )
//! .unwrap();
//!
//! assert!(signed.get("oauth_signature").is_some());
//! assert!(signed.get("detailFlag").is_none());
//! ```

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::Sha1;
use url::Url;

use crate::error::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// The only signature method the provider accepts.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// Length of generated nonces.
pub const NONCE_LEN: usize = 16;

pub const CONSUMER_KEY: &str = "oauth_consumer_key";
pub const NONCE: &str = "oauth_nonce";
pub const TIMESTAMP: &str = "oauth_timestamp";
pub const METHOD: &str = "oauth_signature_method";
pub const TOKEN: &str = "oauth_token";
pub const SIGNATURE: &str = "oauth_signature";
pub const CALLBACK: &str = "oauth_callback";
pub const VERIFIER: &str = "oauth_verifier";

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - _ . ~`.
pub fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Random alphanumeric nonce of [`NONCE_LEN`] characters.
pub fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Current time in whole seconds since the Unix epoch.
pub fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// An ordered OAuth parameter set, built fresh for every request.
///
/// Insertion order is preserved so the emitted header is stable; inserting
/// an existing key replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OAuthParams {
    params: Vec<(String, String)>,
}

impl OAuthParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base template with a random nonce and the current timestamp.
    pub fn template(consumer_key: &str) -> Self {
        Self::template_with(consumer_key, &nonce(), timestamp())
    }

    /// Base template with a caller-supplied nonce and timestamp.
    pub fn template_with(consumer_key: &str, nonce: &str, timestamp: u64) -> Self {
        Self::new()
            .with(CONSUMER_KEY, consumer_key)
            .with(NONCE, nonce)
            .with(TIMESTAMP, &timestamp.to_string())
            .with(METHOD, SIGNATURE_METHOD)
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.params.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Serialize as an `Authorization` header value.
    ///
    /// Each value is percent-encoded exactly once here; the stored values
    /// (including `oauth_signature`) are raw.
    pub fn authorization_header(&self) -> String {
        let mut header = String::from("OAuth realm=\"\"");
        for (k, v) in &self.params {
            header.push_str(&format!(",{k}=\"{}\"", percent_encode(v)));
        }
        header
    }
}

/// Sign a request.
///
/// Header and query parameters are merged (query wins on a name clash) to
/// build the signature base string. The returned set is `header_params` plus
/// `oauth_signature`, which is stored un-encoded.
pub fn sign(
    http_method: &str,
    url: &str,
    header_params: OAuthParams,
    consumer_secret: &str,
    token_secret: &str,
    query_params: &[(String, String)],
) -> Result<OAuthParams> {
    let mut merged: BTreeMap<&str, &str> = header_params.iter().collect();
    for (k, v) in query_params {
        merged.insert(k.as_str(), v.as_str());
    }

    let base = signature_base_string(http_method, url, merged)?;
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).map_err(|e| Error::Signature(e.to_string()))?;
    mac.update(base.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    Ok(header_params.with(SIGNATURE, &signature))
}

/// Build the OAuth1 signature base string:
/// `METHOD&enc(base_url)&enc(k1=v1&k2=v2...)`, with pairs percent-encoded and
/// sorted by encoded key, then encoded value.
pub fn signature_base_string<'a>(
    http_method: &str,
    url: &str,
    params: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<String> {
    let mut pairs: Vec<(String, String)> = params
        .into_iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    pairs.sort();

    let normalized = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        http_method.to_ascii_uppercase(),
        percent_encode(&base_url(url)?),
        percent_encode(&normalized)
    ))
}

/// Normalize a request URL for signing: scheme, host, non-default port and
/// path only. Query, fragment and userinfo are dropped.
pub fn base_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| Error::Signature(format!("{url}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::Signature(format!("url has no host: {url}")))?;

    let mut base = format!("{}://{host}", parsed.scheme());
    if let Some(port) = parsed.port() {
        base.push_str(&format!(":{port}"));
    }
    base.push_str(parsed.path());
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photos_header() -> OAuthParams {
        OAuthParams::new()
            .with(CONSUMER_KEY, "dpf43f3p2l4k3l03")
            .with(TOKEN, "nnch734d00sl2jdk")
            .with(METHOD, SIGNATURE_METHOD)
            .with(TIMESTAMP, "1191242096")
            .with(NONCE, "kllo9940pd9333jh")
            .with("oauth_version", "1.0")
    }

    fn photos_query() -> Vec<(String, String)> {
        vec![
            ("file".into(), "vacation.jpg".into()),
            ("size".into(), "original".into()),
        ]
    }

    #[test]
    fn photos_base_string() {
        let merged = photos_header()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .chain(photos_query())
            .collect::<Vec<_>>();
        let base = signature_base_string(
            "GET",
            "http://photos.example.net/photos",
            merged.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
        .unwrap();
        assert_eq!(
            base,
            "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg\
             %26oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3Dkllo9940pd9333jh\
             %26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1191242096\
             %26oauth_token%3Dnnch734d00sl2jdk%26oauth_version%3D1.0%26size%3Doriginal"
        );
    }

    #[test]
    fn photos_signature() {
        let signed = sign(
            "GET",
            "http://photos.example.net/photos",
            photos_header(),
            "kd94hf93k423kf44",
            "pfkkdhi9sl3r4s00",
            &photos_query(),
        )
        .unwrap();
        assert_eq!(signed.get(SIGNATURE), Some("tR3+Ty81lMeYAr/Fid0kMTYa/WM="));
    }

    #[test]
    fn query_params_stay_out_of_header() {
        let signed = sign(
            "GET",
            "http://photos.example.net/photos",
            photos_header(),
            "kd94hf93k423kf44",
            "pfkkdhi9sl3r4s00",
            &photos_query(),
        )
        .unwrap();
        assert_eq!(signed.len(), photos_header().len() + 1);
        assert!(signed.get("file").is_none());
        assert!(signed.get("size").is_none());
    }

    #[test]
    fn sign_is_deterministic() {
        let make = || {
            sign(
                "get",
                "https://api.etrade.com/v1/accounts/list.json",
                OAuthParams::template_with("K", "0123456789abcdef", 1_600_000_000),
                "S",
                "",
                &[],
            )
            .unwrap()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn method_is_uppercased() {
        let lower = signature_base_string("get", "https://a.com/x", [("a", "1")]).unwrap();
        let upper = signature_base_string("GET", "https://a.com/x", [("a", "1")]).unwrap();
        assert_eq!(lower, upper);
        assert!(lower.starts_with("GET&"));
    }

    #[test]
    fn token_secret_changes_signature() {
        let sign_with = |token_secret| {
            sign(
                "GET",
                "https://api.etrade.com/oauth/request_token",
                OAuthParams::template_with("K", "0123456789abcdef", 1_600_000_000),
                "S",
                token_secret,
                &[],
            )
            .unwrap()
            .get(SIGNATURE)
            .map(str::to_string)
        };
        assert_ne!(sign_with(""), sign_with("ts"));
    }

    #[test]
    fn query_overrides_header_on_clash() {
        let clash = vec![("a".to_string(), "query".to_string())];
        let with_clash =
            sign("GET", "https://a.com/", OAuthParams::new().with("a", "header"), "s", "", &clash)
                .unwrap();
        let query_only =
            sign("GET", "https://a.com/", OAuthParams::new().with("a", "query"), "s", "", &[])
                .unwrap();
        assert_eq!(with_clash.get(SIGNATURE), query_only.get(SIGNATURE));
        assert_eq!(with_clash.get("a"), Some("header"));
    }

    #[test]
    fn template_has_base_fields() {
        let params = OAuthParams::template("consumer");
        assert_eq!(params.get(CONSUMER_KEY), Some("consumer"));
        assert_eq!(params.get(METHOD), Some("HMAC-SHA1"));
        assert_eq!(params.get(NONCE).map(str::len), Some(NONCE_LEN));
        assert!(params.get(TIMESTAMP).unwrap().parse::<u64>().is_ok());
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn nonces_are_alphanumeric_and_fresh() {
        let a = nonce();
        let b = nonce();
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn insert_replaces_in_place() {
        let params = OAuthParams::new().with("a", "1").with("b", "2").with("a", "3");
        let collected: Vec<_> = params.iter().collect();
        assert_eq!(collected, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn header_encodes_values_once() {
        let header = OAuthParams::new()
            .with(CONSUMER_KEY, "k")
            .with(SIGNATURE, "ab+c/d=")
            .authorization_header();
        assert_eq!(
            header,
            "OAuth realm=\"\",oauth_consumer_key=\"k\",oauth_signature=\"ab%2Bc%2Fd%3D\""
        );
    }

    #[test]
    fn base_url_normalization() {
        assert_eq!(
            base_url("HTTPS://Api.ETrade.com:443/v1/accounts/list.json?x=1#frag").unwrap(),
            "https://api.etrade.com/v1/accounts/list.json"
        );
        assert_eq!(
            base_url("http://example.com:8080/Path").unwrap(),
            "http://example.com:8080/Path"
        );
        assert_eq!(base_url("http://example.com").unwrap(), "http://example.com/");
        assert_eq!(base_url("http://example.com:80/").unwrap(), "http://example.com/");
    }

    #[test]
    fn base_url_without_scheme_is_rejected() {
        assert!(matches!(base_url("api.etrade.com/x"), Err(Error::Signature(_))));
        assert!(matches!(base_url("https://"), Err(Error::Signature(_))));
        assert!(matches!(base_url("mailto:ops@etrade.com"), Err(Error::Signature(_))));
    }

    #[test]
    fn base_url_drops_userinfo() {
        assert_eq!(
            base_url("https://user:pw@API.etrade.com/v1/x.json").unwrap(),
            "https://api.etrade.com/v1/x.json"
        );
    }

    #[test]
    fn percent_encode_unreserved() {
        assert_eq!(percent_encode("AZaz09-_.~"), "AZaz09-_.~");
        assert_eq!(percent_encode("a b+c&d=e!*"), "a%20b%2Bc%26d%3De%21%2A");
    }
}
