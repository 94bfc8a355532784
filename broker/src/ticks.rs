//! Polling tick stream.
//!
//! Each poll waits out the interval while the quote fetch and the balance
//! leg run alongside it, so a poll takes `max(interval, fetch time)`. A failed
//! poll is logged and retried; the [`SessionTracker`] only sees successful
//! polls.

use std::time::Duration;

use log::{debug, warn};
use tickwire::{OAuthToken, QuoteResponse, SessionTracker, Tick, TickStep};
use tokio_util::sync::CancellationToken;

use crate::error::BrokerError;
use crate::etrade::client::ETradeClient;
use crate::etrade::endpoints::{BalanceQuery, QuoteQuery};

/// What to do about consecutive failed polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Give up after this many failures in a row. `None` retries forever.
    pub max_consecutive_failures: Option<u32>,
    /// Extra wait after a failure, on top of the polling interval.
    pub backoff: Duration,
}

/// Whether each poll also fetches the account balance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BalanceLeg {
    /// Ticks carry a balance of `0.0`.
    #[default]
    Disabled,
    Enabled { account_id_key: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub watch_list: Vec<String>,
    pub balance: BalanceLeg,
    pub retry: RetryPolicy,
}

impl PollConfig {
    pub fn new(interval: Duration, watch_list: Vec<String>) -> Self {
        Self {
            interval,
            watch_list,
            balance: BalanceLeg::Disabled,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_balance(mut self, account_id_key: impl Into<String>) -> Self {
        self.balance = BalanceLeg::Enabled {
            account_id_key: account_id_key.into(),
        };
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Vec::new())
    }
}

/// Turns polls into [`TickStep`]s.
#[derive(Debug)]
pub struct TickStream {
    config: PollConfig,
    tracker: SessionTracker,
    cancel: CancellationToken,
}

impl TickStream {
    pub fn new(config: PollConfig) -> Self {
        Self::with_cancellation(config, CancellationToken::new())
    }

    pub fn with_cancellation(config: PollConfig, cancel: CancellationToken) -> Self {
        Self {
            config,
            tracker: SessionTracker::new(),
            cancel,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    /// Cancelling this token makes the pending and all later `next` calls
    /// return [`BrokerError::Cancelled`].
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Poll until one attempt succeeds, then advance the session.
    ///
    /// Fails only on cancellation or when the retry policy's failure budget
    /// is spent.
    pub async fn next(
        &mut self,
        client: &ETradeClient,
        token: &OAuthToken,
    ) -> Result<TickStep, BrokerError> {
        let cancel = self.cancel.clone();
        let mut failures: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(BrokerError::Cancelled);
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(BrokerError::Cancelled),
                result = poll_once(&self.config, client, token) => result,
            };

            match result {
                Ok(tick) => {
                    let step = self.tracker.advance(tick);
                    debug!(
                        "tick: {} quotes, done={}",
                        step.tick.quotes.quote_data.len(),
                        step.done
                    );
                    return Ok(step);
                }
                Err(e) => {
                    failures += 1;
                    warn!("poll failed ({failures} in a row): {e}");
                    if let Some(max) = self.config.retry.max_consecutive_failures {
                        if failures >= max {
                            return Err(BrokerError::RetriesExhausted {
                                attempts: failures,
                                last: Box::new(e),
                            });
                        }
                    }
                    let backoff = self.config.retry.backoff;
                    if !backoff.is_zero() {
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(BrokerError::Cancelled),
                            _ = tokio::time::sleep(backoff) => {}
                        }
                    }
                }
            }
        }
    }
}

async fn poll_once(
    config: &PollConfig,
    client: &ETradeClient,
    token: &OAuthToken,
) -> Result<Tick, BrokerError> {
    let query = QuoteQuery::all();
    let (_, quotes, balance) = tokio::join!(
        tokio::time::sleep(config.interval),
        client.quotes(token, &config.watch_list, &query),
        fetch_balance(&config.balance, client, token),
    );
    let quotes: QuoteResponse = quotes?;
    Ok(Tick {
        balance: balance?,
        quotes,
    })
}

async fn fetch_balance(
    leg: &BalanceLeg,
    client: &ETradeClient,
    token: &OAuthToken,
) -> Result<f64, BrokerError> {
    match leg {
        BalanceLeg::Disabled => Ok(0.0),
        BalanceLeg::Enabled { account_id_key } => client
            .balance(token, account_id_key, &BalanceQuery::brokerage_real_time())
            .await?
            .total_account_value()
            .ok_or_else(|| {
                BrokerError::Decode("balance has no Computed.RealTimeValues.totalAccountValue".into())
            }),
    }
}
