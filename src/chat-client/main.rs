use std::{io, path::PathBuf, process::exit};

use clap::Parser;
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use libchat::err::{ChatError, ChatResult};

mod client;
use client::{Args, ChatClient};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "warn";

fn main() {
    let args = Args::parse();
    match run(args) {
        Ok(true) => exit(0),
        Ok(false) => exit(1),
        // Not a failure of this program, so no error prefix.
        Err(ChatError::ServerBusy) => {
            println!("{}", ChatError::ServerBusy);
            exit(1);
        }
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            exit(1);
        }
    }
}

fn run(args: Args) -> ChatResult<bool> {
    let env_file = load_env()?;
    init_logging();
    debug!(?env_file, ?args, "starting");

    ChatClient::new(&args).run()
}

/// Load variables from a `.env` file if there is one.
fn load_env() -> ChatResult<Option<PathBuf>> {
    match dotenv::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Log to stderr so diagnostics stay out of the chat transcript.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
