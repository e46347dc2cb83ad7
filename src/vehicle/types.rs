//! Vehicle identifiers and pass-through response bodies.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::error::ApiError;

/// Vehicle identification number.
///
/// Opaque to the client: any string is accepted and sent as given.
/// [`looks_valid`](Self::looks_valid) is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    pub const LENGTH: usize = 17;

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for 17 characters from the VIN alphabet (digits and capital
    /// letters except I, O and Q).
    pub fn looks_valid(&self) -> bool {
        self.0.len() == Self::LENGTH
            && self.0.chars().all(|c| {
                c.is_ascii_digit() || (c.is_ascii_uppercase() && !matches!(c, 'I' | 'O' | 'Q'))
            })
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Vin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Vin {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Vin {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Vehicle records returned by the vehicle list endpoint, in server order.
///
/// Records are passed through unchanged. Both a bare JSON array and the
/// `{"data": [...]}` envelope are accepted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleList {
    pub records: Vec<Value>,
}

impl VehicleList {
    pub fn from_json(body: Value) -> Result<Self, ApiError> {
        match body {
            Value::Array(records) => Ok(Self { records }),
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(records)) => Ok(Self { records }),
                _ => Err(ApiError::MalformedResponse(
                    "vehicle list object has no `data` array".to_string(),
                )),
            },
            other => Err(ApiError::MalformedResponse(format!(
                "expected vehicle list, got {other}"
            ))),
        }
    }

    /// VINs of records that carry a string `vin` field.
    pub fn vins(&self) -> Vec<Vin> {
        self.records
            .iter()
            .filter_map(|record| record.get("vin").and_then(Value::as_str))
            .map(Vin::from)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Vehicle status body, exactly as the server returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleStatus(pub Value);

impl VehicleStatus {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }
}

/// Read endpoints below `/vehicles/{vin}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum VehicleResource {
    Doors,
    Windows,
    Fuel,
    EngineStatus,
    Warnings,
    Odometer,
    Statistics,
}

impl VehicleResource {
    pub fn path_segment(&self) -> String {
        self.to_string()
    }
}
