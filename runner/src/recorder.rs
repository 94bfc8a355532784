//! JSONL tick log.
//!
//! Each run appends events to a ticks.jsonl file, one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tickwire::QuoteResponse;
use tickwire_broker::{HandlerError, RunOutcome, TickHandler};

use crate::error::Result;

/// One line of the tick log.
#[derive(Debug, Clone, Serialize)]
pub struct TickEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only tick logger, usable as a [`TickHandler`].
pub struct TickRecorder {
    writer: BufWriter<std::fs::File>,
    recorded: u64,
}

impl TickRecorder {
    /// Open (or create) the tick log for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            recorded: 0,
        })
    }

    /// Number of quote snapshots written so far.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = TickEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let line = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn log_run_started(&mut self, environment: &str, watch_list: &[String]) -> Result<()> {
        self.log(
            "run_started",
            json!({
                "environment": environment,
                "watch_list": watch_list,
            }),
        )
    }

    pub fn log_run_finished(&mut self, outcome: &RunOutcome) -> Result<()> {
        let data = match outcome {
            RunOutcome::Completed {
                ticks,
                handler_errors,
            } => json!({ "ticks": ticks, "handler_errors": handler_errors }),
            RunOutcome::AuthorizationRequired { .. } => json!({ "authorization_required": true }),
        };
        self.log("run_finished", data)
    }

    fn log_quotes(&mut self, quotes: &QuoteResponse) -> Result<()> {
        let summary: Vec<_> = quotes
            .quote_data
            .iter()
            .map(|q| {
                json!({
                    "symbol": q.product.symbol,
                    "last": q.last_trade(),
                    "extended": q.has_extended_hours(),
                })
            })
            .collect();
        self.log(
            "quotes",
            json!({
                "extended_hours": quotes.is_extended_hours(),
                "summary": summary,
                "quotes": quotes,
            }),
        )?;
        self.recorded += 1;
        Ok(())
    }
}

#[async_trait]
impl TickHandler for TickRecorder {
    async fn on_balance(&mut self, balance: f64) -> std::result::Result<(), HandlerError> {
        Ok(self.log("balance", json!({ "balance": balance }))?)
    }

    async fn on_quotes(&mut self, quotes: &QuoteResponse) -> std::result::Result<(), HandlerError> {
        Ok(self.log_quotes(quotes)?)
    }
}
