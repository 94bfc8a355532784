//! CLI entry point for tickwire.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{info, warn};

use tickwire_broker::transport::ReqwestTransport;
use tickwire_runner::commands;
use tickwire_runner::config::Config;
use tickwire_runner::error::Error;
use tickwire_runner::recorder::TickRecorder;

#[derive(Parser)]
#[command(name = "tickwire")]
#[command(about = "E*TRADE quote ticks until the trading session ends")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect and record ticks until extended hours begin
    Run {
        /// Verifier code from the authorization page
        #[arg(long)]
        verifier: Option<String>,
    },

    /// Authorize interactively and store the access token
    Authorize,

    /// Check the stored access token
    Status,

    /// Print one quote snapshot for the watch list
    Quotes,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(Error::Aborted(msg)) = e.downcast_ref::<Error>() {
                eprintln!("{msg}");
                return ExitCode::SUCCESS;
            }
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let mut broker = commands::open_broker(&config, Arc::new(ReqwestTransport::new()))?;

    match cli.command {
        Command::Run { verifier } => {
            if let Some(code) = verifier {
                broker.submit_verifier(code);
            }

            let cancel = broker.cancellation_token();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("interrupted, stopping");
                        cancel.cancel();
                    }
                    Err(e) => warn!("cannot listen for ctrl-c: {e}"),
                }
            });

            let tick_path = config.tick_path();
            let mut recorder = TickRecorder::open(&tick_path)
                .with_context(|| format!("opening {}", tick_path.display()))?;
            commands::run(&config, &mut broker, &mut recorder).await?;
        }
        Command::Authorize => {
            commands::authorize(&mut broker, |_url| {
                dialoguer::Input::<String>::new()
                    .with_prompt("Verifier code")
                    .interact_text()
                    .map_err(|e| Error::Aborted(format!("verifier prompt failed: {e}")))
            })
            .await?;
        }
        Command::Status => {
            commands::status(&mut broker).await?;
        }
        Command::Quotes => {
            commands::quotes(&mut broker).await?;
        }
    }
    Ok(())
}
