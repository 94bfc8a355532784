//! What actually goes over the wire: headers, query strings, bodies, and
//! error mapping for the REST calls.

use std::sync::Arc;

use serde_json::json;
use tickwire::oauth::{self, OAuthParams};
use tickwire::{Environment, KeyConfig, OAuthToken};
use tickwire_broker::etrade::{BalanceQuery, ETradeClient, OrdersQuery, QuoteQuery};
use tickwire_broker::mock::MockTransport;
use tickwire_broker::transport::{HttpResponse, Method};
use tickwire_broker::BrokerError;

const QUOTES: &str = r#"{"QuoteResponse":{"QuoteData":[{"All":{"lastTrade":1.0},"Product":{"symbol":"AAPL"}}]}}"#;

fn token() -> OAuthToken {
    OAuthToken::new("at", "ats")
}

fn client(transport: &Arc<MockTransport>, production: bool) -> ETradeClient {
    ETradeClient::new(transport.clone(), KeyConfig::new(production, "ck", "cs"))
}

/// `k="v"` pairs of an Authorization header, realm first.
fn header_fields(header: &str) -> Vec<(String, String)> {
    header
        .strip_prefix("OAuth ")
        .expect("OAuth scheme")
        .split(',')
        .map(|kv| {
            let (k, v) = kv.split_once('=').expect("k=v");
            (k.to_string(), v.trim_matches('"').to_string())
        })
        .collect()
}

// ============================================================================
// Authorization header
// ============================================================================

#[tokio::test]
async fn quote_request_header_composition() {
    let transport = MockTransport::builder().json("/market/quote/", QUOTES).build().shared();
    client(&transport, false)
        .quotes(&token(), &["AAPL".to_string()], &QuoteQuery::all())
        .await
        .unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::Get);
    assert_eq!(
        request.url,
        "https://apisb.etrade.com/v1/market/quote/AAPL.json?detailFlag=ALL"
    );

    let header = request.header("Authorization").unwrap();
    let fields = header_fields(header);
    let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "realm",
            "oauth_consumer_key",
            "oauth_nonce",
            "oauth_timestamp",
            "oauth_signature_method",
            "oauth_token",
            "oauth_signature",
        ]
    );
    assert_eq!(fields[0].1, "");
    assert_eq!(fields[1].1, "ck");
    assert_eq!(fields[2].1.len(), oauth::NONCE_LEN);
    assert!(fields[2].1.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(fields[4].1, "HMAC-SHA1");
    assert_eq!(fields[5].1, "at");

    // 20-byte digest → 28 base64 chars with one pad, sent percent-encoded
    let signature = &fields[6].1;
    assert!(signature.ends_with("%3D"));
    assert!(!signature.contains('+') && !signature.contains('/'));

    // recompute over the merged header + query set
    let nonce = &fields[2].1;
    let timestamp: u64 = fields[3].1.parse().unwrap();
    let expected = oauth::sign(
        "GET",
        "https://apisb.etrade.com/v1/market/quote/AAPL.json",
        OAuthParams::template_with("ck", nonce, timestamp).with(oauth::TOKEN, "at"),
        "cs",
        "ats",
        &[("detailFlag".to_string(), "ALL".to_string())],
    )
    .unwrap();
    assert_eq!(header, expected.authorization_header());
}

#[tokio::test]
async fn each_request_gets_a_fresh_nonce() {
    let transport = MockTransport::builder()
        .json("/accounts/list", r#"{"AccountListResponse":{}}"#)
        .build()
        .shared();
    let client = client(&transport, false);
    client.account_list(&token()).await.unwrap();
    client.account_list(&token()).await.unwrap();

    let nonces: Vec<String> = transport
        .requests()
        .iter()
        .map(|r| header_fields(r.header("Authorization").unwrap())[2].1.clone())
        .collect();
    assert_ne!(nonces[0], nonces[1]);
}

// ============================================================================
// Hosts, queries and bodies
// ============================================================================

#[tokio::test]
async fn production_keys_use_the_production_host() {
    let transport = MockTransport::builder()
        .json("/balance", r#"{"BalanceResponse":{"Computed":{"RealTimeValues":{"totalAccountValue":10.5}}}}"#)
        .build()
        .shared();
    let client = client(&transport, true);
    assert_eq!(client.environment(), Environment::Production);

    let balance = client
        .balance(&token(), "acct", &BalanceQuery::brokerage_real_time())
        .await
        .unwrap();
    assert_eq!(balance.total_account_value(), Some(10.5));
    assert_eq!(
        transport.requests()[0].url,
        "https://api.etrade.com/v1/accounts/acct/balance.json?instType=BROKERAGE&realTimeNAV=true"
    );
}

#[tokio::test]
async fn order_calls_wrap_their_payloads() {
    let transport = MockTransport::builder()
        .json("/orders/preview", r#"{"PreviewOrderResponse":{}}"#)
        .json("/orders/place", r#"{"PlaceOrderResponse":{}}"#)
        .route("/orders/cancel", HttpResponse::new(204, ""))
        .build()
        .shared();
    let client = client(&transport, false);
    let token = token();

    client.preview_order(&token, "acct", json!({"orderType": "EQ"})).await.unwrap();
    client.place_order(&token, "acct", json!({"orderType": "EQ"})).await.unwrap();
    let cancelled = client.cancel_order(&token, "acct", json!({"orderId": 7})).await.unwrap();
    assert_eq!(cancelled, json!({}));

    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].body.as_deref(), Some(r#"{"PreviewOrderRequest":{"orderType":"EQ"}}"#));
    assert_eq!(requests[1].body.as_deref(), Some(r#"{"PlaceOrderRequest":{"orderType":"EQ"}}"#));
    assert_eq!(requests[2].method, Method::Put);
    assert_eq!(requests[2].body.as_deref(), Some(r#"{"CancelOrderRequest":{"orderId":7}}"#));
    for request in &requests {
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }
}

#[tokio::test]
async fn list_orders_passes_filters() {
    let transport = MockTransport::builder().json("/orders", r#"{"OrdersResponse":{}}"#).build().shared();
    let query = OrdersQuery {
        status: Some("OPEN".into()),
        count: Some(25),
        ..Default::default()
    };
    client(&transport, false).orders(&token(), "acct", &query).await.unwrap();
    assert_eq!(
        transport.requests()[0].url,
        "https://apisb.etrade.com/v1/accounts/acct/orders.json?count=25&status=OPEN"
    );
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn unauthorized_carries_provider_message() {
    let transport = MockTransport::builder()
        .route("/accounts/list", HttpResponse::new(401, r#"{"Error":{"message":"oauth_problem"}}"#))
        .build()
        .shared();
    let err = client(&transport, false).account_list(&token()).await.unwrap_err();
    assert_eq!(err.to_string(), "oauth_problem");
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn transport_failure_is_a_connection_error() {
    let transport = MockTransport::builder().fail("/market/quote/", "connection reset").build().shared();
    let err = client(&transport, false)
        .quotes(&token(), &["AAPL".to_string()], &QuoteQuery::all())
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Connection(_)));
    assert!(!err.is_auth_failure());
}

#[tokio::test]
async fn missing_envelope_is_a_decode_error() {
    let transport = MockTransport::builder().json("/market/quote/", "{}").build().shared();
    let err = client(&transport, false)
        .quotes(&token(), &["AAPL".to_string()], &QuoteQuery::all())
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::Decode(_)));
}
