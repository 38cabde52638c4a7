use std::sync::Arc;

use clap::Parser as _;
use dotenvy::dotenv;
use tracing::{error, info};
use verifier::cli::{Cli, Commands, RunCmd, SetupCmd};
use verifier::core::config::Config;
use verifier::server::setup_server;
use verifier::setup::setup;
use verifier::utils::logging::init_logging;
use verifier::VerifierResult;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();
    info!("Starting verifier");
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { run_command } => {
            if let Err(e) = run_verifier(run_command).await {
                error!(error = %e, error_chain = ?e, "Verifier stopped with an error");
                panic!("Failed to run verifier: {}", e);
            }
        }
        Commands::Setup { setup_command } => {
            if let Err(e) = setup_verifier(setup_command).await {
                error!(error = %e, error_chain = ?e, "Setup failed");
                panic!("Failed to setup verifier: {}", e);
            }
        }
    }
}

async fn run_verifier(run_cmd: &RunCmd) -> VerifierResult<()> {
    let config = Arc::new(Config::from_run_cmd(run_cmd)?);
    let (address, handle) = setup_server(config).await?;
    info!(address = %address, "Verifier service started");

    tokio::signal::ctrl_c().await?;

    if let Err(e) = handle.shutdown().await {
        error!(error = %e, "Server task did not stop cleanly");
    }
    info!("Verifier service shutting down");
    Ok(())
}

async fn setup_verifier(setup_cmd: &SetupCmd) -> VerifierResult<()> {
    setup(setup_cmd).await
}
