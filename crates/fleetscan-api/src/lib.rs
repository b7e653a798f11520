// fleetscan-api: Async Rust client for the Aruba Central REST API

pub mod auth;
pub mod client;
pub mod configuration;
pub mod credentials;
pub mod error;
pub mod firmware;
pub mod models;
pub mod monitoring;
pub mod platform;
pub mod transport;

pub use auth::{AccessToken, Authenticator, TokenStore};
pub use client::CentralClient;
pub use credentials::{ClientCredential, Credential, Endpoint, JsonDocument};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
