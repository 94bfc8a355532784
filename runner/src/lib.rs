//! tickwire-runner: command-line front end for the tickwire broker layer.
//!
//! Loads a TOML config, keeps OAuth tokens in a JSON file between runs, and
//! records every polled tick to a JSONL log until the trading session ends.

pub mod commands;
pub mod config;
pub mod error;
pub mod recorder;
pub mod store;
