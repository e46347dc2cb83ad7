//! Vehicle API client, identifiers and commands.

pub mod client;
pub mod command;
pub mod types;

pub use client::{VehicleApiClient, DEFAULT_API_BASE_URL};
pub use command::{CommandOutcome, CommandRequest, VehicleCommand};
pub use types::{VehicleList, VehicleResource, VehicleStatus, Vin};
