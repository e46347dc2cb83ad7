//! Remote vehicle commands.

use strum::{Display, EnumString};

use super::types::Vin;

/// Remote command understood by the vehicle API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum VehicleCommand {
    Lock,
    Unlock,
    EngineStart,
    EngineStop,
    Honk,
    Flash,
}

impl VehicleCommand {
    /// Path below `/vehicles/{vin}/commands/`.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::EngineStart => "engine/start",
            Self::EngineStop => "engine/stop",
            Self::Honk => "honk",
            Self::Flash => "flash",
        }
    }
}

/// A command addressed to one vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub vin: Vin,
    pub command: VehicleCommand,
}

impl CommandRequest {
    pub fn new(vin: impl Into<Vin>, command: VehicleCommand) -> Self {
        Self {
            vin: vin.into(),
            command,
        }
    }
}

/// How the API took a command.
///
/// Both variants are success. `Accepted` (HTTP 202) only means the command
/// was queued for the vehicle; the client does not poll for completion, so
/// callers that need confirmation must read the vehicle status themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// HTTP 200.
    Executed,
    /// HTTP 202.
    Accepted,
}

impl CommandOutcome {
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200 => Some(Self::Executed),
            202 => Some(Self::Accepted),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}
