//! Armada CLI - manifest resolution and secret provisioning for agent fleets

use std::process::ExitCode;

use armada_cli::cli::Cli;
use armada_cli::output::json::{error_code, format_error};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ARMADA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            if json {
                let message = format!("{e:#}");
                match format_error(&message, error_code(&e)) {
                    Ok(body) => println!("{body}"),
                    Err(_) => eprintln!("Error: {message}"),
                }
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
