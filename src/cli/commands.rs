//! CLI command handlers.

use std::io::Write;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::{AuthArgs, CommandArgs, VehicleArgs};
use crate::auth::{mask_secret, Authenticator, ScopeSet};
use crate::config::Config;
use crate::vehicle::{CommandOutcome, VehicleApiClient};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Install the stderr subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Handle `connected-vehicle check-config`.
pub fn handle_check_config(config: &Config) -> CliResult {
    let show = |value: &Option<String>, secret: bool| match value {
        Some(v) if secret => format!("set ({})", mask_secret(v)),
        Some(v) => format!("set ({v})"),
        None => "missing".to_string(),
    };

    println!("Configuration\n");
    println!("  CLIENT_ID      {}", show(&config.client_id, false));
    println!("  CLIENT_SECRET  {}", show(&config.client_secret, true));
    println!("  API_KEY        {}", show(&config.api_key, true));
    println!("  VIN            {}", show(&config.vin, false));
    println!("  REDIRECT_URI   {}", config.redirect_uri);
    println!("  API_BASE_URL   {}", config.api_base_url);
    println!("  AUTH_BASE_URL  {}", config.auth_base_url);
    println!(
        "  TOKEN LIFETIME {} min",
        config.token_lifetime.num_minutes()
    );

    if let Some(vin) = config.vin.as_deref().map(crate::vehicle::Vin::from) {
        if !vin.looks_valid() {
            println!("\nwarning: VIN {vin} does not look like a 17-character VIN");
        }
    }

    let missing = config.missing_fields();
    if missing.is_empty() {
        println!("\nAll required keys are set.");
        Ok(())
    } else {
        Err(format!("missing required configuration: {}", missing.join(", ")).into())
    }
}

/// Handle `connected-vehicle auth-url`.
pub fn handle_auth_url(config: &Config) -> CliResult {
    let auth = config.authenticator(ScopeSet::vehicle_control())?;
    println!("{}", auth.authorization_url()?);
    Ok(())
}

/// Handle `connected-vehicle vehicles`.
pub async fn handle_vehicles(config: &Config, args: &AuthArgs) -> CliResult {
    let client = authorized_client(config, ScopeSet::basic(), args).await?;
    let vehicles = client.get_vehicles().await?;
    if vehicles.is_empty() {
        println!("No vehicles linked to this account.");
    }
    for record in &vehicles.records {
        println!("{}", serde_json::to_string_pretty(record)?);
    }
    Ok(())
}

/// Handle `connected-vehicle status`.
pub async fn handle_status(config: &Config, args: &VehicleArgs) -> CliResult {
    let vin = target_vin(config, args)?;
    let client = authorized_client(config, ScopeSet::basic(), &args.auth).await?;
    let status = client.get_vehicle_status(&vin).await?;
    println!("{}", serde_json::to_string_pretty(status.as_json())?);
    Ok(())
}

/// Handle `connected-vehicle command <command>`.
pub async fn handle_command(config: &Config, args: &CommandArgs) -> CliResult {
    let vin = target_vin(config, &args.target)?;
    let client = authorized_client(config, ScopeSet::vehicle_control(), &args.target.auth).await?;
    match client.send_command(&vin, args.command).await? {
        CommandOutcome::Executed => println!("{} executed on {vin}", args.command),
        CommandOutcome::Accepted => {
            println!("{} accepted for {vin}; check status to confirm", args.command)
        }
    }
    Ok(())
}

fn target_vin(config: &Config, args: &VehicleArgs) -> Result<String, Box<dyn std::error::Error>> {
    match &args.vin {
        Some(vin) => Ok(vin.clone()),
        None => Ok(config.require_vin()?.to_string()),
    }
}

async fn authorized_client(
    config: &Config,
    scopes: ScopeSet,
    args: &AuthArgs,
) -> Result<VehicleApiClient, Box<dyn std::error::Error>> {
    let auth = Arc::new(config.authenticator(scopes)?);
    let code = match &args.code {
        Some(code) => code.clone(),
        None => prompt_for_code(&auth)?,
    };
    auth.exchange_code_for_token(&code).await?;
    Ok(config.vehicle_client(auth))
}

fn prompt_for_code(auth: &Authenticator) -> Result<String, Box<dyn std::error::Error>> {
    println!("Visit: {}", auth.authorization_url()?);
    println!("After authorizing, paste the `code` parameter from the redirect:");
    print!("> ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let code = line.trim();
    if code.is_empty() {
        return Err("no authorization code provided".into());
    }
    Ok(code.to_string())
}
