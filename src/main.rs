//! connected-vehicle CLI binary entry point.

use clap::Parser;
use connected_vehicle::cli::{commands, Cli, Commands};
use connected_vehicle::config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::from_env();
    commands::init_tracing(&config);

    let result = match &cli.command {
        Commands::CheckConfig => commands::handle_check_config(&config),
        Commands::AuthUrl => commands::handle_auth_url(&config),
        Commands::Vehicles(args) => commands::handle_vehicles(&config, args).await,
        Commands::Status(args) => commands::handle_status(&config, args).await,
        Commands::Command(args) => commands::handle_command(&config, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
