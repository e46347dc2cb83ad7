//! Command-line interface for the connected-vehicle client.

pub mod commands;

use clap::{Args, Parser, Subcommand};

use crate::vehicle::VehicleCommand;

/// Connected-vehicle API CLI
#[derive(Parser, Debug)]
#[command(
    name = "connected-vehicle",
    version,
    about = "Talk to the connected-vehicle API"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report which configuration keys are set
    CheckConfig,
    /// Print the browser authorization URL
    AuthUrl,
    /// List vehicles linked to the account
    Vehicles(AuthArgs),
    /// Show the status of one vehicle
    Status(VehicleArgs),
    /// Send a remote command to one vehicle
    Command(CommandArgs),
}

/// How to obtain a token for commands that call the vehicle API.
#[derive(Args, Debug, Default)]
pub struct AuthArgs {
    /// Authorization code from the redirect; read from stdin when omitted
    #[arg(long)]
    pub code: Option<String>,
}

/// Arguments for commands addressed to one vehicle.
#[derive(Args, Debug)]
pub struct VehicleArgs {
    /// Vehicle VIN; defaults to VIN from the configuration
    #[arg(long)]
    pub vin: Option<String>,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Arguments for `connected-vehicle command`.
#[derive(Args, Debug)]
pub struct CommandArgs {
    /// lock, unlock, engine-start, engine-stop, honk or flash
    pub command: VehicleCommand,

    #[command(flatten)]
    pub target: VehicleArgs,
}
