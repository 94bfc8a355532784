//! E*TRADE REST client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tickwire::{AccountListResponse, BalanceResponse, Environment, KeyConfig, OAuthToken, QuoteResponse};

use super::endpoints::{self, BalanceQuery, OrdersQuery, PortfolioQuery, QueryParams, QuoteQuery, TransactionsQuery};
use crate::error::BrokerError;
use crate::pipeline::RequestPipeline;
use crate::transport::{Method, Transport};

/// Async E*TRADE client bound to one consumer key.
///
/// Every call takes the access token explicitly; the client holds no
/// session state.
#[derive(Clone)]
pub struct ETradeClient {
    pipeline: RequestPipeline,
    keys: KeyConfig,
}

impl ETradeClient {
    pub fn new(transport: Arc<dyn Transport>, keys: KeyConfig) -> Self {
        Self {
            pipeline: RequestPipeline::new(transport),
            keys,
        }
    }

    pub fn keys(&self) -> &KeyConfig {
        &self.keys
    }

    pub fn environment(&self) -> Environment {
        self.keys.environment()
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    async fn call(
        &self,
        method: Method,
        url: &str,
        query: Vec<(String, String)>,
        token: &OAuthToken,
        body: Option<&Value>,
    ) -> Result<Value, BrokerError> {
        self.pipeline
            .execute(method, url, &query, token, &self.keys, body)
            .await
    }

    /// List accounts (GET /v1/accounts/list).
    pub async fn account_list(&self, token: &OAuthToken) -> Result<AccountListResponse, BrokerError> {
        let url = endpoints::account_list_url(self.environment());
        let value = self.call(Method::Get, &url, Vec::new(), token, None).await?;
        extract(value, "AccountListResponse")
    }

    /// Account balance (GET /v1/accounts/{key}/balance).
    pub async fn balance(
        &self,
        token: &OAuthToken,
        account_id_key: &str,
        query: &BalanceQuery,
    ) -> Result<BalanceResponse, BrokerError> {
        let url = endpoints::account_url(self.environment(), account_id_key, "balance");
        let value = self.call(Method::Get, &url, query.to_query(), token, None).await?;
        extract(value, "BalanceResponse")
    }

    /// Portfolio (GET /v1/accounts/{key}/portfolio).
    pub async fn portfolio(
        &self,
        token: &OAuthToken,
        account_id_key: &str,
        query: &PortfolioQuery,
    ) -> Result<Value, BrokerError> {
        let url = endpoints::account_url(self.environment(), account_id_key, "portfolio");
        self.call(Method::Get, &url, query.to_query(), token, None).await
    }

    /// Transactions (GET /v1/accounts/{key}/transactions).
    pub async fn transactions(
        &self,
        token: &OAuthToken,
        account_id_key: &str,
        query: &TransactionsQuery,
    ) -> Result<Value, BrokerError> {
        let url = endpoints::account_url(self.environment(), account_id_key, "transactions");
        self.call(Method::Get, &url, query.to_query(), token, None).await
    }

    /// Orders (GET /v1/accounts/{key}/orders).
    pub async fn orders(
        &self,
        token: &OAuthToken,
        account_id_key: &str,
        query: &OrdersQuery,
    ) -> Result<Value, BrokerError> {
        let url = endpoints::account_url(self.environment(), account_id_key, "orders");
        self.call(Method::Get, &url, query.to_query(), token, None).await
    }

    /// Preview an order (POST .../orders/preview).
    pub async fn preview_order(
        &self,
        token: &OAuthToken,
        account_id_key: &str,
        data: Value,
    ) -> Result<Value, BrokerError> {
        let url = endpoints::account_url(self.environment(), account_id_key, "orders/preview");
        let body = json!({ "PreviewOrderRequest": data });
        self.call(Method::Post, &url, Vec::new(), token, Some(&body)).await
    }

    /// Place a previewed order (POST .../orders/place).
    pub async fn place_order(
        &self,
        token: &OAuthToken,
        account_id_key: &str,
        data: Value,
    ) -> Result<Value, BrokerError> {
        let url = endpoints::account_url(self.environment(), account_id_key, "orders/place");
        let body = json!({ "PlaceOrderRequest": data });
        self.call(Method::Post, &url, Vec::new(), token, Some(&body)).await
    }

    /// Cancel an order (PUT .../orders/cancel).
    pub async fn cancel_order(
        &self,
        token: &OAuthToken,
        account_id_key: &str,
        data: Value,
    ) -> Result<Value, BrokerError> {
        let url = endpoints::account_url(self.environment(), account_id_key, "orders/cancel");
        let body = json!({ "CancelOrderRequest": data });
        self.call(Method::Put, &url, Vec::new(), token, Some(&body)).await
    }

    /// Quotes for a comma-joined symbol list (GET /v1/market/quote/{symbols}).
    pub async fn quotes(
        &self,
        token: &OAuthToken,
        symbols: &[String],
        query: &QuoteQuery,
    ) -> Result<QuoteResponse, BrokerError> {
        let url = endpoints::quote_url(self.environment(), symbols);
        let value = self.call(Method::Get, &url, query.to_query(), token, None).await?;
        extract(value, "QuoteResponse")
    }
}

/// Pull the named envelope field out of a response and decode it.
fn extract<T: DeserializeOwned>(mut value: Value, field: &str) -> Result<T, BrokerError> {
    let inner = value
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| BrokerError::Decode(format!("response has no `{field}`")))?;
    serde_json::from_value(inner).map_err(|e| BrokerError::Decode(format!("bad `{field}`: {e}")))
}
