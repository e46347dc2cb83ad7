//! Async client for a connected-vehicle cloud API.
//!
//! Authenticates with the OAuth2 authorization-code flow and issues REST
//! calls against the vehicle API: list vehicles, read vehicle status and
//! send remote commands such as lock and unlock.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use connected_vehicle::prelude::*;
//!
//! # async fn example() -> connected_vehicle::error::Result<()> {
//! let config = Config::from_env();
//! let auth = Arc::new(config.authenticator(ScopeSet::vehicle_control())?);
//! println!("Open {}", auth.authorization_url()?);
//!
//! auth.exchange_code_for_token("code-from-redirect").await?;
//! let client = config.vehicle_client(auth);
//! let status = client.get_vehicle_status("YV1ZWK8V4S2663123").await?;
//! println!("{}", status.as_json());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;
pub mod transport;
pub mod vehicle;

#[cfg(feature = "cli")]
pub mod cli;
