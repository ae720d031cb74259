use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use distributed_config::{load, load_from, AppConfig};
use distributed_gateway::build_router;
use distributed_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "distributed-server")]
#[command(about = "Distributed HTTP gateway (serves by default)")]
struct Cli {
    /// Configuration file to use instead of the default search locations
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match cli.config_file {
        Some(path) => load_from(Some(path)),
        None => load(),
    }
    .context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Config => print_config(&config),
    }
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Distributed gateway");

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let app = build_router(services.state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(distributed_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("gateway shut down");
    Ok(())
}

fn print_config(config: &AppConfig) -> anyhow::Result<()> {
    let rendered =
        serde_json::to_string_pretty(config).context("failed to serialise configuration")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["distributed-server"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config_file.is_none());
    }

    #[test]
    fn config_file_is_accepted_after_the_subcommand() {
        let cli =
            Cli::try_parse_from(["distributed-server", "config", "--config-file", "gw.toml"])
                .unwrap();
        assert_eq!(cli.command, Some(Commands::Config));
        assert_eq!(cli.config_file, Some(PathBuf::from("gw.toml")));
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(Cli::try_parse_from(["distributed-server", "dump-data"]).is_err());
    }
}
