//! Ticks and the end-of-session rule.
//!
//! A poll whose quotes carry no extended-hours detail is a regular-hours
//! poll. Once one has been seen, the first extended-hours poll ends the
//! stream: the trading day opened, then closed into after-hours.

use serde::{Deserialize, Serialize};

use crate::quote::QuoteResponse;

/// One observation of the polling stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub balance: f64,
    pub quotes: QuoteResponse,
}

/// A tick paired with the stream's verdict on it.
#[derive(Clone, Debug, PartialEq)]
pub struct TickStep {
    pub tick: Tick,
    pub done: bool,
}

/// Extended-hours session state.
///
/// `had_open_hours` is sticky: it is never reset once set, so every
/// regular → extended transition reports `done` again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionTracker {
    had_open_hours: bool,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn had_open_hours(&self) -> bool {
        self.had_open_hours
    }

    /// Record one poll and return whether the stream is done.
    pub fn observe(&mut self, is_extended_hours: bool) -> bool {
        self.had_open_hours |= !is_extended_hours;
        self.had_open_hours && is_extended_hours
    }

    /// Advance on a polled tick.
    pub fn advance(&mut self, tick: Tick) -> TickStep {
        let done = self.observe(tick.quotes.is_extended_hours());
        TickStep { tick, done }
    }
}
