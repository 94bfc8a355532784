//! Command implementations: run → authorize → status → quotes.

use std::sync::Arc;

use log::info;
use tickwire::{AccountListResponse, QuoteResponse};
use tickwire_broker::transport::Transport;
use tickwire_broker::{Broker, Connection, ETradeBroker, RunOutcome, TokenStore, run_bot};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::recorder::TickRecorder;
use crate::store::FileTokenStore;

/// Broker for the configured environment, backed by the configured token file.
pub fn open_broker(
    config: &Config,
    transport: Arc<dyn Transport>,
) -> Result<ETradeBroker<FileTokenStore>> {
    let store = FileTokenStore::open(config.token_path())?;
    Ok(ETradeBroker::new(
        transport,
        config.key_config().clone(),
        store,
        config.poll_config(),
    ))
}

/// Stream ticks into the recorder until the session ends.
pub async fn run<S>(
    config: &Config,
    broker: &mut ETradeBroker<S>,
    recorder: &mut TickRecorder,
) -> Result<RunOutcome>
where
    S: TokenStore + Send + Sync,
{
    recorder.log_run_started(&config.broker.environment.to_string(), &config.broker.watch_list)?;
    let outcome = run_bot(broker, recorder).await?;
    recorder.log_run_finished(&outcome)?;

    match &outcome {
        RunOutcome::Completed {
            ticks,
            handler_errors,
        } => {
            println!("Session over: {ticks} ticks recorded ({handler_errors} handler errors).");
        }
        RunOutcome::AuthorizationRequired { authorize_url } => print_authorize(authorize_url),
    }
    Ok(outcome)
}

/// Full handshake in one sitting. `prompt` receives the authorize URL and
/// returns the verifier code the user read off that page.
pub async fn authorize<S, F>(broker: &mut ETradeBroker<S>, prompt: F) -> Result<AccountListResponse>
where
    S: TokenStore + Send + Sync,
    F: FnOnce(&str) -> Result<String>,
{
    let url = broker.begin_authorization().await?;
    print_authorize(&url);

    let verifier = prompt(&url)?;
    if verifier.trim().is_empty() {
        return Err(Error::Aborted("no verifier code entered".into()));
    }
    broker.submit_verifier(verifier);

    match broker.connect().await? {
        Connection::Connected { accounts } => {
            info!("access token stored");
            println!("Authorized.");
            display_accounts(&accounts);
            Ok(accounts)
        }
        Connection::AuthorizationRequired { .. } => {
            Err(Error::Aborted("verifier code was not accepted".into()))
        }
    }
}

/// Probe the stored access token.
pub async fn status<S>(broker: &mut ETradeBroker<S>) -> Result<AccountListResponse>
where
    S: TokenStore + Send + Sync,
{
    print!("Checking stored access token against {}... ", broker.client().environment());
    match broker.restore().await {
        Some(accounts) => {
            println!("OK");
            display_accounts(&accounts);
            Ok(accounts)
        }
        None => {
            println!("NOT AUTHORIZED");
            Err(Error::NotAuthorized)
        }
    }
}

/// One quote snapshot for the watch list.
pub async fn quotes<S>(broker: &mut ETradeBroker<S>) -> Result<QuoteResponse>
where
    S: TokenStore + Send + Sync,
{
    if broker.restore().await.is_none() {
        return Err(Error::NotAuthorized);
    }
    let quotes = broker.quotes().await?;
    display_quotes(&quotes);
    Ok(quotes)
}

// === Display ===

fn print_authorize(url: &str) {
    println!("Authorization required. Open this URL and approve access:\n\n  {url}\n");
    println!("Then run `tickwire run --verifier <CODE>` with the code shown.");
}

fn display_accounts(accounts: &AccountListResponse) {
    println!(
        "{:<12} {:<24} {:<12} {:<10}",
        "ACCOUNT", "ID KEY", "TYPE", "STATUS"
    );
    for a in accounts.iter() {
        println!(
            "{:<12} {:<24} {:<12} {:<10}",
            a.account_id,
            a.account_id_key,
            a.account_type.as_deref().unwrap_or("-"),
            a.account_status.as_deref().unwrap_or("-"),
        );
    }
}

fn display_quotes(quotes: &QuoteResponse) {
    println!("{:<8} {:>12} {:>12} {:>12}  {}", "SYMBOL", "LAST", "BID", "ASK", "SESSION");
    for q in &quotes.quote_data {
        let all = q.all.as_ref();
        let price = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |p| format!("{p:.2}"));
        println!(
            "{:<8} {:>12} {:>12} {:>12}  {}",
            q.product.symbol,
            price(q.last_trade()),
            price(all.and_then(|a| a.bid)),
            price(all.and_then(|a| a.ask)),
            if q.has_extended_hours() { "extended" } else { "regular" },
        );
    }
}
