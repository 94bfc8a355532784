//! Runner commands end to end: config file → broker → token file → tick log,
//! with the network replaced by a scripted transport.

use std::path::Path;
use std::sync::Arc;

use tickwire::OAuthToken;
use tickwire_broker::mock::MockTransport;
use tickwire_broker::store::{ACCESS_TOKEN_KEY, REQUEST_TOKEN_KEY, load_token};
use tickwire_broker::transport::HttpResponse;
use tickwire_broker::RunOutcome;
use tickwire_runner::commands;
use tickwire_runner::config::Config;
use tickwire_runner::error::Error;
use tickwire_runner::recorder::TickRecorder;
use tickwire_runner::store::FileTokenStore;

const ACCOUNT_LIST: &str = r#"{"AccountListResponse":{"Accounts":{"Account":[
    {"accountId":"840104290","accountIdKey":"JIdOIAcSpwR1Jva7RQBraQ","accountType":"INDIVIDUAL","accountStatus":"ACTIVE"}]}}}"#;

const REGULAR: &str = r#"{"QuoteResponse":{"QuoteData":[
    {"All":{"lastTrade":185.62,"bid":185.6,"ask":185.64},"Product":{"symbol":"AAPL"}},
    {"All":{"lastTrade":101.1},"Product":{"symbol":"MSFT"}}]}}"#;

const EXTENDED: &str = r#"{"QuoteResponse":{"QuoteData":[
    {"All":{"lastTrade":185.62,"ExtendedHourQuoteDetail":{"lastPrice":185.9}},"Product":{"symbol":"AAPL"}},
    {"All":{"lastTrade":101.1},"Product":{"symbol":"MSFT"}}]}}"#;

fn write_config(dir: &Path) -> Config {
    let toml = format!(
        r#"
[broker]
environment = "sandbox"
watch_list = ["AAPL", "MSFT"]

[keys]
sandbox = {{ isProduction = false, key = "ck", secret = "cs" }}
production = {{ isProduction = true, key = "pk", secret = "ps" }}

[polling]
interval_ms = 10

[storage]
token_file = "{tokens}"

[logging]
dir = "{logs}"
tick_file = "ticks.jsonl"
"#,
        tokens = dir.join("tokens.json").display(),
        logs = dir.join("logs").display(),
    );
    let path = dir.join("config.toml");
    std::fs::write(&path, toml).unwrap();
    Config::load(&path).unwrap()
}

fn log_lines(config: &Config) -> Vec<serde_json::Value> {
    std::fs::read_to_string(config.tick_path())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

// ============================================================================
// run
// ============================================================================

#[tokio::test(start_paused = true)]
async fn first_run_asks_for_authorization_then_verifier_run_records_ticks() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    // no token yet
    let transport = MockTransport::builder()
        .json("/oauth/request_token", "oauth_token=rt&oauth_token_secret=rts")
        .build()
        .shared();
    let mut broker = commands::open_broker(&config, transport.clone()).unwrap();
    let mut recorder = TickRecorder::open(&config.tick_path()).unwrap();
    let outcome = commands::run(&config, &mut broker, &mut recorder).await.unwrap();
    assert!(matches!(outcome, RunOutcome::AuthorizationRequired { ref authorize_url }
        if authorize_url.ends_with("?key=ck&token=rt")));

    // second process run with the verifier
    let transport = MockTransport::builder()
        .json("/oauth/access_token", "oauth_token=at&oauth_token_secret=ats")
        .json("/accounts/list", ACCOUNT_LIST)
        .json("/market/quote/", REGULAR)
        .json("/market/quote/", REGULAR)
        .json("/market/quote/", EXTENDED)
        .build()
        .shared();
    let mut broker = commands::open_broker(&config, transport.clone())
        .unwrap()
        .with_verifier("V3R1");
    let mut recorder = TickRecorder::open(&config.tick_path()).unwrap();
    let outcome = commands::run(&config, &mut broker, &mut recorder).await.unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Completed {
            ticks: 2,
            handler_errors: 0
        }
    );
    assert_eq!(recorder.recorded(), 2);
    assert_eq!(
        transport.requests_to("/market/quote/")[0].url,
        "https://apisb.etrade.com/v1/market/quote/AAPL,MSFT.json?detailFlag=ALL"
    );

    let store = FileTokenStore::open(config.token_path()).unwrap();
    assert_eq!(
        load_token(&store, ACCESS_TOKEN_KEY).unwrap(),
        Some(OAuthToken::new("at", "ats"))
    );

    let events: Vec<String> = log_lines(&config)
        .iter()
        .map(|l| l["event"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        events,
        vec![
            "run_started",
            "run_finished",
            "run_started",
            "balance",
            "quotes",
            "balance",
            "quotes",
            "run_finished",
        ]
    );
}

// ============================================================================
// authorize / status / quotes
// ============================================================================

#[tokio::test]
async fn authorize_runs_both_legs_and_persists_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let transport = MockTransport::builder()
        .json("/oauth/request_token", "oauth_token=rt&oauth_token_secret=rts")
        .json("/oauth/access_token", "oauth_token=at&oauth_token_secret=ats")
        .json("/accounts/list", ACCOUNT_LIST)
        .build()
        .shared();
    let mut broker = commands::open_broker(&config, transport.clone()).unwrap();

    let mut shown = String::new();
    let accounts = commands::authorize(&mut broker, |url| {
        shown = url.to_string();
        Ok("CODE".to_string())
    })
    .await
    .unwrap();

    assert_eq!(shown, "https://us.etrade.com/e/t/etws/authorize?key=ck&token=rt");
    assert_eq!(accounts.iter().count(), 1);

    let store = FileTokenStore::open(config.token_path()).unwrap();
    assert_eq!(
        load_token(&store, REQUEST_TOKEN_KEY).unwrap(),
        Some(OAuthToken::new("rt", "rts"))
    );
    assert_eq!(
        load_token(&store, ACCESS_TOKEN_KEY).unwrap(),
        Some(OAuthToken::new("at", "ats"))
    );
}

#[tokio::test]
async fn empty_verifier_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let transport = MockTransport::builder()
        .json("/oauth/request_token", "oauth_token=rt&oauth_token_secret=rts")
        .build()
        .shared();
    let mut broker = commands::open_broker(&config, transport.clone()).unwrap();

    let err = commands::authorize(&mut broker, |_| Ok("  ".to_string())).await.unwrap_err();
    assert!(matches!(err, Error::Aborted(_)));
    assert!(transport.requests_to("/oauth/access_token").is_empty());
}

#[tokio::test]
async fn status_without_token_is_not_authorized() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let transport = MockTransport::builder().build().shared();
    let mut broker = commands::open_broker(&config, transport.clone()).unwrap();

    assert!(matches!(commands::status(&mut broker).await, Err(Error::NotAuthorized)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn quotes_with_rejected_token_is_not_authorized() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    std::fs::write(
        config.token_path(),
        serde_json::json!({ "accessToken": r#"{"oauth_token":"old","oauth_token_secret":"s"}"# })
            .to_string(),
    )
    .unwrap();
    let transport = MockTransport::builder()
        .route(
            "/accounts/list",
            HttpResponse::new(401, r#"{"Error":{"message":"oauth_problem"}}"#),
        )
        .build()
        .shared();
    let mut broker = commands::open_broker(&config, transport.clone()).unwrap();

    assert!(matches!(commands::quotes(&mut broker).await, Err(Error::NotAuthorized)));
    assert!(transport.requests_to("/market/quote/").is_empty());
}

#[tokio::test]
async fn quotes_with_stored_token() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    std::fs::write(
        config.token_path(),
        serde_json::json!({ "accessToken": r#"{"oauth_token":"at","oauth_token_secret":"ats"}"# })
            .to_string(),
    )
    .unwrap();
    let transport = MockTransport::builder()
        .json("/accounts/list", ACCOUNT_LIST)
        .json("/market/quote/", REGULAR)
        .build()
        .shared();
    let mut broker = commands::open_broker(&config, transport.clone()).unwrap();

    let quotes = commands::quotes(&mut broker).await.unwrap();
    assert_eq!(quotes.symbols().collect::<Vec<_>>(), vec!["AAPL", "MSFT"]);
    assert!(!quotes.is_extended_hours());
}

#[test]
fn missing_config_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, Error::ConfigRead { .. }));
}
