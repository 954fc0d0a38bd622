mod args;
mod commands;

use std::{
    env,
    fs::{self, OpenOptions},
    process::ExitCode,
};

use anyhow::Result;
use rental_core::{
    config::{self, AppConfig},
    ApiClient, AuthManager,
};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::commands::Shell;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = init_logging() {
        eprintln!("logging disabled: {err:#}");
    }

    let args: Vec<String> = env::args().skip(1).collect();
    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Vec<String>) -> Result<ExitCode> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let client = ApiClient::new(&config)?;
    let auth = AuthManager::new(client.clone(), config.session_path());
    auth.restore();

    let shell = Shell::new(client, auth);
    shell.dispatch(&args).await
}

fn init_logging() -> Result<()> {
    let log_dir = env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("game-rental.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(std::sync::Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
