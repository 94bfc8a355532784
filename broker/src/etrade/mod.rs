//! E*TRADE implementation of the [`Broker`] trait.

pub mod auth;
pub mod client;
pub mod endpoints;

use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use log::{debug, error, info, warn};
use tickwire::{AccountListResponse, Environment, KeyConfig, KeySet, QuoteResponse, Tick};
use tokio_util::sync::CancellationToken;

use crate::error::BrokerError;
use crate::store::{ACCESS_TOKEN_KEY, REQUEST_TOKEN_KEY, TokenStore, load_token, save_token};
use crate::ticks::{PollConfig, TickStream};
use crate::transport::Transport;
use crate::types::{Order, Position};
use crate::{Broker, Connection};

pub use auth::{AuthFlow, AuthState};
pub use client::ETradeClient;
pub use endpoints::{BalanceQuery, OrdersQuery, PortfolioQuery, QuoteQuery, TransactionsQuery};

/// Quote-polling E*TRADE broker.
///
/// Tokens live in the injected [`TokenStore`] so that an authorization
/// started in one run can be finished in the next.
pub struct ETradeBroker<S> {
    client: ETradeClient,
    store: S,
    auth: AuthFlow,
    stream: TickStream,
    verifier: Option<String>,
    finished: bool,
}

impl<S: TokenStore + Send + Sync> ETradeBroker<S> {
    pub fn new(transport: Arc<dyn Transport>, keys: KeyConfig, store: S, poll: PollConfig) -> Self {
        Self {
            client: ETradeClient::new(transport, keys),
            store,
            auth: AuthFlow::new(),
            stream: TickStream::new(poll),
            verifier: None,
            finished: false,
        }
    }

    /// Pick the key pair for `env` out of a [`KeySet`].
    pub fn from_key_set(
        transport: Arc<dyn Transport>,
        keys: &KeySet,
        env: Environment,
        store: S,
        poll: PollConfig,
    ) -> Self {
        Self::new(transport, keys.select(env).clone(), store, poll)
    }

    /// Verifier code to exchange on the next [`connect`](Broker::connect).
    pub fn with_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.submit_verifier(verifier);
        self
    }

    pub fn submit_verifier(&mut self, verifier: impl Into<String>) {
        self.verifier = Some(verifier.into());
    }

    pub fn auth_state(&self) -> &AuthState {
        self.auth.state()
    }

    pub fn client(&self) -> &ETradeClient {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.stream.cancellation_token()
    }

    /// Run leg 1, persist the request token and return the URL the user
    /// must visit.
    pub async fn begin_authorization(&mut self) -> Result<String, BrokerError> {
        let request_token = self.auth.start(self.client.pipeline(), self.client.keys()).await?;
        save_token(&mut self.store, REQUEST_TOKEN_KEY, &request_token)?;
        let url = auth::authorize_url(self.client.keys(), &request_token);
        info!("authorization required: {url}");
        Ok(url)
    }

    /// Adopt the stored access token if the provider still accepts it.
    pub async fn restore(&mut self) -> Option<AccountListResponse> {
        let stored = match load_token(&self.store, ACCESS_TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!("ignoring stored access token: {e}");
                None
            }
        };
        let Some(token) = stored else {
            debug!("no stored access token");
            self.auth.invalidate();
            return None;
        };

        match self.client.account_list(&token).await {
            Ok(accounts) => {
                self.auth.authenticated(token);
                Some(accounts)
            }
            Err(e) => {
                warn!("stored access token rejected: {e}");
                self.auth.invalidate();
                None
            }
        }
    }

    async fn exchange_verifier(&mut self, verifier: &str) -> Result<AccountListResponse, BrokerError> {
        let request_token = load_token(&self.store, REQUEST_TOKEN_KEY)?
            .ok_or_else(|| BrokerError::Auth("no stored request token to verify".into()))?;
        self.auth.resume(request_token);
        let access_token = self
            .auth
            .complete(self.client.pipeline(), self.client.keys(), verifier)
            .await?;
        save_token(&mut self.store, ACCESS_TOKEN_KEY, &access_token)?;
        self.client.account_list(&access_token).await
    }

    /// One quote snapshot for the watch list.
    pub async fn quotes(&self) -> Result<QuoteResponse, BrokerError> {
        let token = self.auth.access_token().ok_or(BrokerError::NotConnected)?;
        self.client
            .quotes(token, &self.stream.config().watch_list, &QuoteQuery::all())
            .await
    }

    /// Real-time total account value.
    pub async fn balance(&self, account_id_key: &str) -> Result<f64, BrokerError> {
        let token = self.auth.access_token().ok_or(BrokerError::NotConnected)?;
        self.client
            .balance(token, account_id_key, &BalanceQuery::brokerage_real_time())
            .await?
            .total_account_value()
            .ok_or_else(|| BrokerError::Decode("balance has no totalAccountValue".into()))
    }

    /// Ticks until the session ends.
    ///
    /// The stream ends without yielding the final `done` tick. A tick error
    /// is logged and also ends it. Do not poll it again after it returns
    /// `None`.
    pub fn ticks(&mut self) -> impl Stream<Item = Tick> + '_ {
        futures::stream::unfold(self, |broker| async move {
            match broker.next_tick().await {
                Ok(Some(tick)) => Some((tick, broker)),
                Ok(None) => None,
                Err(e) => {
                    error!("tick stream stopped: {e}");
                    None
                }
            }
        })
    }
}

#[async_trait]
impl<S: TokenStore + Send + Sync> Broker for ETradeBroker<S> {
    /// A pending verifier is exchanged first. Otherwise the stored access
    /// token is probed against the account list; when that fails a new
    /// authorization is started and its URL returned.
    async fn connect(&mut self) -> Result<Connection, BrokerError> {
        let accounts = match self.verifier.take() {
            Some(verifier) => Some(self.exchange_verifier(&verifier).await?),
            None => self.restore().await,
        };

        match accounts {
            Some(accounts) => {
                info!("connected to {} ({} accounts)", self.client.environment(), accounts.iter().count());
                self.finished = false;
                Ok(Connection::Connected { accounts })
            }
            None => {
                let authorize_url = self.begin_authorization().await?;
                Ok(Connection::AuthorizationRequired { authorize_url })
            }
        }
    }

    async fn next_tick(&mut self) -> Result<Option<Tick>, BrokerError> {
        if self.finished {
            return Ok(None);
        }
        let token = self.auth.access_token().ok_or(BrokerError::NotConnected)?;
        let step = match self.stream.next(&self.client, token).await {
            Ok(step) => step,
            Err(e) => {
                if e.is_auth_failure() {
                    warn!("access token rejected while polling: {e}");
                    self.auth.invalidate();
                }
                return Err(e);
            }
        };
        if step.done {
            info!("extended hours reached, session over");
            self.finished = true;
            return Ok(None);
        }
        Ok(Some(step.tick))
    }

    async fn create_order(
        &mut self,
        symbol: &str,
        shares: f64,
        limit: f64,
        to_open: bool,
    ) -> Result<(), BrokerError> {
        debug!("order entry not supported, ignoring {symbol} x{shares} @ {limit} (open={to_open})");
        Ok(())
    }

    async fn orders(&self) -> Result<Vec<Order>, BrokerError> {
        Ok(Vec::new())
    }

    async fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        Ok(Vec::new())
    }
}
