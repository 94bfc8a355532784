//! Quote payloads from `GET /v1/market/quote/{symbols}.json`.
//!
//! Only the fields a tick consumer commonly reads are typed. Every field is
//! optional because the provider omits whatever does not apply to a symbol
//! or detail level; anything not modeled is kept in `extra`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A batch of per-symbol quotes, in request order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponse {
    #[serde(rename = "QuoteData", default)]
    pub quote_data: Vec<QuoteData>,
}

impl QuoteResponse {
    /// True if any quote in the batch carries an extended-hours detail record.
    pub fn is_extended_hours(&self) -> bool {
        self.quote_data.iter().any(QuoteData::has_extended_hours)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.quote_data.iter().map(|q| q.product.symbol.as_str())
    }

    pub fn get(&self, symbol: &str) -> Option<&QuoteData> {
        self.quote_data.iter().find(|q| q.product.symbol == symbol)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(rename = "dateTimeUTC", default, skip_serializing_if = "Option::is_none")]
    pub date_time_utc: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ah_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_mini_options: Option<bool>,
    #[serde(rename = "All", default, skip_serializing_if = "Option::is_none")]
    pub all: Option<AllQuoteDetails>,
    #[serde(rename = "Product", default)]
    pub product: Product,
}

impl QuoteData {
    /// Presence of the sub-record is what matters, not its contents.
    pub fn has_extended_hours(&self) -> bool {
        self.all
            .as_ref()
            .is_some_and(|all| all.extended_hour_quote_detail.is_some())
    }

    pub fn last_trade(&self) -> Option<f64> {
        self.all.as_ref().and_then(|all| all.last_trade)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_sub_type: Option<String>,
}

/// The `All` detail level (`detailFlag=ALL`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllQuoteDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_trade: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_close_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_last_trade: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(
        rename = "ExtendedHourQuoteDetail",
        default,
        deserialize_with = "present_even_if_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub extended_hour_quote_detail: Option<ExtendedHourQuoteDetail>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Only an absent key means regular hours; `null` still marks extended hours.
fn present_even_if_null<'de, D>(deserializer: D) -> Result<Option<ExtendedHourQuoteDetail>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(
        Option::<ExtendedHourQuoteDetail>::deserialize(deserializer)?.unwrap_or_default(),
    ))
}

/// After-hours trading figures, present only outside the regular session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedHourQuoteDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_last_trade: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_quote_parses() {
        let json = r#"{"QuoteData":[{"All":{}, "Product":{"symbol":"AAPL"}}]}"#;
        let quotes: QuoteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(quotes.quote_data.len(), 1);
        assert_eq!(quotes.quote_data[0].product.symbol, "AAPL");
        assert!(!quotes.is_extended_hours());
    }

    #[test]
    fn empty_extended_detail_still_counts() {
        let json = r#"{"QuoteData":[
            {"All":{"lastTrade": 190.5}, "Product":{"symbol":"AAPL"}},
            {"All":{"ExtendedHourQuoteDetail":{}}, "Product":{"symbol":"MSFT"}}
        ]}"#;
        let quotes: QuoteResponse = serde_json::from_str(json).unwrap();
        assert!(quotes.is_extended_hours());
        assert!(!quotes.get("AAPL").unwrap().has_extended_hours());
        assert!(quotes.get("MSFT").unwrap().has_extended_hours());
        assert_eq!(quotes.get("AAPL").unwrap().last_trade(), Some(190.5));
    }

    #[test]
    fn null_extended_detail_still_counts() {
        let json = r#"{"QuoteData":[
            {"All":{"lastTrade": 190.5, "ExtendedHourQuoteDetail": null}, "Product":{"symbol":"AAPL"}}
        ]}"#;
        let quotes: QuoteResponse = serde_json::from_str(json).unwrap();
        assert!(quotes.is_extended_hours());
        assert_eq!(quotes.get("AAPL").unwrap().last_trade(), Some(190.5));
    }

    #[test]
    fn missing_all_is_regular_hours() {
        let json = r#"{"QuoteData":[{"Product":{"symbol":"SPY"}}]}"#;
        let quotes: QuoteResponse = serde_json::from_str(json).unwrap();
        assert!(!quotes.is_extended_hours());
    }

    #[test]
    fn unknown_fields_are_kept() {
        let json = r#"{"QuoteData":[{
            "dateTime": "15:59:59 EDT 06-20-2024",
            "dateTimeUTC": 1718913599,
            "quoteStatus": "REALTIME",
            "ahFlag": "false",
            "All": {"bid": 1.5, "beta": 1.2, "primaryExchange": "NSDQ"},
            "Product": {"symbol": "AAPL", "securityType": "EQ"}
        }]}"#;
        let quotes: QuoteResponse = serde_json::from_str(json).unwrap();
        let quote = &quotes.quote_data[0];
        let all = quote.all.as_ref().unwrap();
        assert_eq!(all.bid, Some(1.5));
        assert_eq!(all.extra["primaryExchange"], "NSDQ");
        assert_eq!(quote.date_time_utc, Some(1718913599));
        assert_eq!(quote.product.security_type.as_deref(), Some("EQ"));
    }

    #[test]
    fn symbols_in_order() {
        let json = r#"{"QuoteData":[{"Product":{"symbol":"B"}},{"Product":{"symbol":"A"}}]}"#;
        let quotes: QuoteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(quotes.symbols().collect::<Vec<_>>(), vec!["B", "A"]);
    }
}
