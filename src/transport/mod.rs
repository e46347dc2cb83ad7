//! HTTP plumbing shared by the authenticator and the vehicle client.

pub mod http;

pub use http::{default_client, read_body, vehicle_headers, DEFAULT_TIMEOUT};
