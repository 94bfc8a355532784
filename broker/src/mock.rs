//! Scripted transport for testing without network calls.
//!
//! Routes match on a URL substring, first registered route wins. Each route
//! replays its queued responses in order and keeps returning the last one
//! once the queue is down to a single entry. Unmatched requests get a 404.
//!
//! ```
//! use tickwire_broker::mock::MockTransport;
//! use tickwire_broker::transport::HttpResponse;
//!
//! let transport = MockTransport::builder()
//!     .route("/oauth/request_token", HttpResponse::new(200, "oauth_token=r&oauth_token_secret=s"))
//!     .json("/market/quote/", r#"{"QuoteResponse":{"QuoteData":[]}}"#)
//!     .build();
//! assert!(transport.requests().is_empty());
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

pub use crate::store::MemoryTokenStore;

use crate::error::BrokerError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    Fail(String),
}

#[derive(Debug)]
struct Route {
    fragment: String,
    replies: VecDeque<Reply>,
}

impl Route {
    fn next(&mut self) -> Option<Reply> {
        if self.replies.len() > 1 {
            self.replies.pop_front()
        } else {
            self.replies.front().cloned()
        }
    }
}

/// Builder for [`MockTransport`].
#[derive(Debug, Default)]
pub struct MockTransportBuilder {
    routes: Vec<Route>,
}

impl MockTransportBuilder {
    fn push(mut self, fragment: &str, reply: Reply) -> Self {
        match self.routes.iter_mut().find(|r| r.fragment == fragment) {
            Some(route) => route.replies.push_back(reply),
            None => self.routes.push(Route {
                fragment: fragment.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    /// Queue a response for URLs containing `fragment`.
    pub fn route(self, fragment: &str, response: HttpResponse) -> Self {
        self.push(fragment, Reply::Response(response))
    }

    /// Queue a 200 response with the given body.
    pub fn json(self, fragment: &str, body: &str) -> Self {
        self.route(fragment, HttpResponse::new(200, body))
    }

    /// Queue a connection failure.
    pub fn fail(self, fragment: &str, message: &str) -> Self {
        self.push(fragment, Reply::Fail(message.to_string()))
    }

    pub fn build(self) -> MockTransport {
        MockTransport {
            routes: Mutex::new(self.routes),
            requests: Mutex::new(Vec::new()),
        }
    }
}

/// A [`Transport`] that replays scripted responses and records every request.
#[derive(Debug)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder::default()
    }

    /// Shareable handle, ready to hand to a client.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests whose URL contains `fragment`.
    pub fn requests_to(&self, fragment: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(fragment))
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BrokerError> {
        let reply = {
            let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            routes
                .iter_mut()
                .find(|r| request.url.contains(&r.fragment))
                .and_then(Route::next)
        };
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(BrokerError::Connection(message)),
            None => Ok(HttpResponse::new(404, "no mock route")),
        }
    }
}
