//! Account list and balance payloads.

use serde::{Deserialize, Serialize};

/// `GET /v1/accounts/list.json` → `AccountListResponse`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountListResponse {
    #[serde(rename = "Accounts", default)]
    pub accounts: Accounts,
}

impl AccountListResponse {
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.account.iter()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Accounts {
    #[serde(rename = "Account", default)]
    pub account: Vec<Account>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    pub account_id: String,
    pub account_id_key: String,
    pub account_mode: Option<String>,
    pub account_desc: Option<String>,
    pub account_name: Option<String>,
    pub account_type: Option<String>,
    pub institution_type: Option<String>,
    pub account_status: Option<String>,
    pub closed_date: Option<i64>,
}

/// `GET /v1/accounts/{accountIdKey}/balance.json` → `BalanceResponse`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceResponse {
    pub account_id: Option<String>,
    pub account_type: Option<String>,
    pub option_level: Option<String>,
    pub account_description: Option<String>,
    pub quote_mode: Option<i64>,
    pub day_trader_status: Option<String>,
    pub account_mode: Option<String>,
    #[serde(rename = "Cash")]
    pub cash: Option<CashBalance>,
    #[serde(rename = "Computed")]
    pub computed: Option<ComputedBalance>,
    #[serde(rename = "Margin")]
    pub margin: Option<MarginBalance>,
}

impl BalanceResponse {
    /// Real-time total account value, the figure a tick reports as balance.
    pub fn total_account_value(&self) -> Option<f64> {
        self.computed
            .as_ref()
            .and_then(|c| c.real_time_values.as_ref())
            .and_then(|rt| rt.total_account_value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CashBalance {
    pub funds_for_open_orders_cash: Option<f64>,
    pub money_mkt_balance: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputedBalance {
    pub cash_available_for_investment: Option<f64>,
    pub cash_available_for_withdrawal: Option<f64>,
    pub total_available_for_withdrawal: Option<f64>,
    pub net_cash: Option<f64>,
    pub cash_balance: Option<f64>,
    pub settled_cash_for_investment: Option<f64>,
    pub un_settled_cash_for_investment: Option<f64>,
    pub margin_buying_power: Option<f64>,
    pub cash_buying_power: Option<f64>,
    pub dt_margin_buying_power: Option<f64>,
    pub dt_cash_buying_power: Option<f64>,
    pub margin_balance: Option<f64>,
    pub account_balance: Option<f64>,
    #[serde(rename = "OpenCalls")]
    pub open_calls: Option<OpenCalls>,
    #[serde(rename = "RealTimeValues")]
    pub real_time_values: Option<RealTimeValues>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenCalls {
    pub min_equity_call: Option<f64>,
    pub fed_call: Option<f64>,
    pub cash_call: Option<f64>,
    pub house_call: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RealTimeValues {
    pub total_account_value: Option<f64>,
    pub net_mv: Option<f64>,
    pub net_mv_long: Option<f64>,
    pub net_mv_short: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarginBalance {
    pub dt_cash_open_order_reserve: Option<f64>,
    pub dt_margin_open_order_reserve: Option<f64>,
}
