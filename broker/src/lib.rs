//! Broker layer for tickwire.
//!
//! Signs and sends E*TRADE requests, runs the OAuth1 handshake, and polls
//! quotes into a bounded stream of [`Tick`]s. All network access goes
//! through the [`Transport`](transport::Transport) trait; the default
//! `http` feature provides a reqwest implementation and [`mock`] a scripted
//! one for tests.

pub mod driver;
pub mod error;
pub mod etrade;
pub mod mock;
pub mod pipeline;
pub mod store;
pub mod ticks;
pub mod transport;
pub mod types;

pub use driver::{Callbacks, HandlerError, RunOutcome, TickHandler, run_bot};
pub use error::BrokerError;
pub use etrade::{ETradeBroker, ETradeClient};
pub use store::{MemoryTokenStore, TokenStore};
pub use ticks::{BalanceLeg, PollConfig, RetryPolicy, TickStream};
pub use types::*;

use async_trait::async_trait;
use tickwire::{AccountListResponse, Tick};

/// Outcome of [`Broker::connect`].
#[derive(Debug, Clone, PartialEq)]
pub enum Connection {
    Connected { accounts: AccountListResponse },
    /// The user must approve access at `authorize_url`, then connect again
    /// with the verifier code shown there.
    AuthorizationRequired { authorize_url: String },
}

/// A quote source that can also (nominally) trade.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Establish an authenticated session, or report that the user must
    /// authorize first.
    async fn connect(&mut self) -> Result<Connection, BrokerError>;

    /// Next tick, or `None` once the session is over.
    async fn next_tick(&mut self) -> Result<Option<Tick>, BrokerError>;

    /// Submit a limit order. Order entry is a stub: implementations may
    /// accept and ignore it.
    async fn create_order(
        &mut self,
        symbol: &str,
        shares: f64,
        limit: f64,
        to_open: bool,
    ) -> Result<(), BrokerError>;

    /// Open orders known to the broker.
    async fn orders(&self) -> Result<Vec<Order>, BrokerError>;

    /// Current positions.
    async fn positions(&self) -> Result<Vec<Position>, BrokerError>;
}
