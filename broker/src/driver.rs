//! Drive a [`Broker`] to the end of the session, handing each tick to a
//! [`TickHandler`].

use async_trait::async_trait;
use log::{error, info};
use tickwire::QuoteResponse;

use crate::error::BrokerError;
use crate::{Broker, Connection};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Per-tick callbacks. Both default to doing nothing.
#[async_trait]
pub trait TickHandler: Send {
    async fn on_balance(&mut self, _balance: f64) -> Result<(), HandlerError> {
        Ok(())
    }

    async fn on_quotes(&mut self, _quotes: &QuoteResponse) -> Result<(), HandlerError> {
        Ok(())
    }
}

type BalanceFn = Box<dyn FnMut(f64) -> Result<(), HandlerError> + Send>;
type QuotesFn = Box<dyn FnMut(&QuoteResponse) -> Result<(), HandlerError> + Send>;

/// Closure-based handler.
///
/// ```
/// use tickwire_broker::Callbacks;
///
/// let handler = Callbacks::new()
///     .on_balance(|b| {
///         println!("balance {b}");
///         Ok(())
///     })
///     .on_quotes(|q| {
///         println!("{} quotes", q.quote_data.len());
///         Ok(())
///     });
/// # let _ = handler;
/// ```
#[derive(Default)]
pub struct Callbacks {
    balance: Option<BalanceFn>,
    quotes: Option<QuotesFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_balance<F>(mut self, f: F) -> Self
    where
        F: FnMut(f64) -> Result<(), HandlerError> + Send + 'static,
    {
        self.balance = Some(Box::new(f));
        self
    }

    pub fn on_quotes<F>(mut self, f: F) -> Self
    where
        F: FnMut(&QuoteResponse) -> Result<(), HandlerError> + Send + 'static,
    {
        self.quotes = Some(Box::new(f));
        self
    }
}

#[async_trait]
impl TickHandler for Callbacks {
    async fn on_balance(&mut self, balance: f64) -> Result<(), HandlerError> {
        match self.balance.as_mut() {
            Some(f) => f(balance),
            None => Ok(()),
        }
    }

    async fn on_quotes(&mut self, quotes: &QuoteResponse) -> Result<(), HandlerError> {
        match self.quotes.as_mut() {
            Some(f) => f(quotes),
            None => Ok(()),
        }
    }
}

/// How a [`run_bot`] call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { ticks: u64, handler_errors: u64 },
    AuthorizationRequired { authorize_url: String },
}

/// Connect, then feed every tick to `handler` until the session ends.
///
/// `on_balance` runs before `on_quotes`; when it fails, `on_quotes` is
/// skipped for that tick. Handler errors are logged and counted, never
/// fatal. Cancellation ends the run normally. Connection and other tick
/// errors are returned.
pub async fn run_bot<B, H>(broker: &mut B, handler: &mut H) -> Result<RunOutcome, BrokerError>
where
    B: Broker + ?Sized,
    H: TickHandler + ?Sized,
{
    match broker.connect().await? {
        Connection::Connected { .. } => {}
        Connection::AuthorizationRequired { authorize_url } => {
            return Ok(RunOutcome::AuthorizationRequired { authorize_url });
        }
    }

    let mut ticks: u64 = 0;
    let mut handler_errors: u64 = 0;
    loop {
        let tick = match broker.next_tick().await {
            Ok(Some(tick)) => tick,
            Ok(None) => break,
            Err(BrokerError::Cancelled) => {
                info!("run cancelled");
                break;
            }
            Err(e) => return Err(e),
        };
        ticks += 1;

        let handled = match handler.on_balance(tick.balance).await {
            Ok(()) => handler.on_quotes(&tick.quotes).await,
            Err(e) => Err(e),
        };
        if let Err(e) = handled {
            handler_errors += 1;
            error!("tick handler failed: {e}");
        }
    }

    info!("run finished after {ticks} ticks ({handler_errors} handler errors)");
    Ok(RunOutcome::Completed {
        ticks,
        handler_errors,
    })
}
