//! E*TRADE endpoint URLs and typed query parameters.
//!
//! Every query struct keeps an `extra` list for provider parameters that are
//! not modeled; they are appended after the typed ones.

use tickwire::Environment;

/// Handshake leg 1. Always the production host.
pub const REQUEST_TOKEN_URL: &str = "https://api.etrade.com/oauth/request_token";

/// Handshake leg 3. Always the production host.
pub const ACCESS_TOKEN_URL: &str = "https://api.etrade.com/oauth/access_token";

/// User-facing authorization page.
pub const AUTHORIZE_URL: &str = "https://us.etrade.com/e/t/etws/authorize";

/// `https://{host}.etrade.com/v1/{api}.json`
pub fn api_url(env: Environment, api: &str) -> String {
    format!("https://{}.etrade.com/v1/{api}.json", env.host())
}

pub fn account_list_url(env: Environment) -> String {
    api_url(env, "accounts/list")
}

pub fn account_url(env: Environment, account_id_key: &str, resource: &str) -> String {
    api_url(env, &format!("accounts/{account_id_key}/{resource}"))
}

pub fn quote_url(env: Environment, symbols: &[String]) -> String {
    api_url(env, &format!("market/quote/{}", symbols.join(",")))
}

/// Anything that renders to a query parameter list.
pub trait QueryParams {
    fn to_query(&self) -> Vec<(String, String)>;
}

impl QueryParams for () {
    fn to_query(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

fn push<T: ToString>(query: &mut Vec<(String, String)>, key: &str, value: &Option<T>) {
    if let Some(v) = value {
        query.push((key.to_string(), v.to_string()));
    }
}

fn push_extra(query: &mut Vec<(String, String)>, extra: &[(String, String)]) {
    query.extend(extra.iter().cloned());
}

/// Quote detail level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailFlag {
    #[default]
    All,
    Fundamental,
    Intraday,
    Options,
    Week52,
    MutualFund,
}

impl DetailFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailFlag::All => "ALL",
            DetailFlag::Fundamental => "FUNDAMENTAL",
            DetailFlag::Intraday => "INTRADAY",
            DetailFlag::Options => "OPTIONS",
            DetailFlag::Week52 => "WEEK_52",
            DetailFlag::MutualFund => "MF_DETAIL",
        }
    }
}

impl std::fmt::Display for DetailFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteQuery {
    pub detail_flag: Option<DetailFlag>,
    pub require_earnings_date: Option<bool>,
    pub override_symbol_count: Option<bool>,
    pub skip_mini_options_check: Option<bool>,
    pub extra: Vec<(String, String)>,
}

impl QuoteQuery {
    /// `detailFlag=ALL`, the level the tick stream polls with.
    pub fn all() -> Self {
        Self {
            detail_flag: Some(DetailFlag::All),
            ..Self::default()
        }
    }
}

impl QueryParams for QuoteQuery {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        push(&mut q, "detailFlag", &self.detail_flag);
        push(&mut q, "requireEarningsDate", &self.require_earnings_date);
        push(&mut q, "overrideSymbolCount", &self.override_symbol_count);
        push(&mut q, "skipMiniOptionsCheck", &self.skip_mini_options_check);
        push_extra(&mut q, &self.extra);
        q
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceQuery {
    pub inst_type: String,
    pub account_type: Option<String>,
    pub real_time_nav: Option<bool>,
    pub extra: Vec<(String, String)>,
}

impl BalanceQuery {
    /// `instType=BROKERAGE&realTimeNAV=true`, used for the tick balance.
    pub fn brokerage_real_time() -> Self {
        Self {
            real_time_nav: Some(true),
            ..Self::default()
        }
    }
}

impl Default for BalanceQuery {
    fn default() -> Self {
        Self {
            inst_type: "BROKERAGE".to_string(),
            account_type: None,
            real_time_nav: None,
            extra: Vec::new(),
        }
    }
}

impl QueryParams for BalanceQuery {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut q = vec![("instType".to_string(), self.inst_type.clone())];
        push(&mut q, "accountType", &self.account_type);
        push(&mut q, "realTimeNAV", &self.real_time_nav);
        push_extra(&mut q, &self.extra);
        q
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortfolioQuery {
    pub count: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page_number: Option<u32>,
    pub market_session: Option<String>,
    pub totals_required: Option<bool>,
    pub lots_required: Option<bool>,
    pub view: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl QueryParams for PortfolioQuery {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        push(&mut q, "count", &self.count);
        push(&mut q, "sortBy", &self.sort_by);
        push(&mut q, "sortOrder", &self.sort_order);
        push(&mut q, "pageNumber", &self.page_number);
        push(&mut q, "marketSession", &self.market_session);
        push(&mut q, "totalsRequired", &self.totals_required);
        push(&mut q, "lotsRequired", &self.lots_required);
        push(&mut q, "view", &self.view);
        push_extra(&mut q, &self.extra);
        q
    }
}

/// Dates are `MMDDYYYY`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_order: Option<String>,
    pub marker: Option<String>,
    pub count: Option<u32>,
    pub extra: Vec<(String, String)>,
}

impl QueryParams for TransactionsQuery {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        push(&mut q, "startDate", &self.start_date);
        push(&mut q, "endDate", &self.end_date);
        push(&mut q, "sortOrder", &self.sort_order);
        push(&mut q, "marker", &self.marker);
        push(&mut q, "count", &self.count);
        push_extra(&mut q, &self.extra);
        q
    }
}

/// Dates are `MMDDYYYY`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdersQuery {
    pub marker: Option<String>,
    pub count: Option<u32>,
    pub status: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub symbol: Option<String>,
    pub security_type: Option<String>,
    pub transaction_type: Option<String>,
    pub market_session: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl QueryParams for OrdersQuery {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut q = Vec::new();
        push(&mut q, "marker", &self.marker);
        push(&mut q, "count", &self.count);
        push(&mut q, "status", &self.status);
        push(&mut q, "fromDate", &self.from_date);
        push(&mut q, "toDate", &self.to_date);
        push(&mut q, "symbol", &self.symbol);
        push(&mut q, "securityType", &self.security_type);
        push(&mut q, "transactionType", &self.transaction_type);
        push(&mut q, "marketSession", &self.market_session);
        push_extra(&mut q, &self.extra);
        q
    }
}
