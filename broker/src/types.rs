//! Order and position records exposed by the broker surface.

use serde::{Deserialize, Serialize};

/// An order as the trading client sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Epoch milliseconds at creation.
    pub timestamp: i64,
    pub symbol: String,
    pub shares: f64,
    pub limit: f64,
    pub to_open: bool,
    pub is_order_filled: bool,
}

impl Order {
    pub fn new(timestamp: i64, symbol: impl Into<String>, shares: f64, limit: f64, to_open: bool) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            shares,
            limit,
            to_open,
            is_order_filled: false,
        }
    }
}

/// A held position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Average cost per share.
    pub cost_basis: f64,
    /// Last share price.
    pub marker: f64,
    pub symbol: String,
    pub shares: f64,
}

impl Position {
    pub fn market_value(&self) -> f64 {
        self.marker * self.shares
    }

    pub fn unrealized_pnl(&self) -> f64 {
        (self.marker - self.cost_basis) * self.shares
    }
}
