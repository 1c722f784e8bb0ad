// apex-api: Async Rust client for Neptune Apex controllers (REST + legacy CGI)

pub mod auth;
pub mod client;
pub mod error;
pub mod legacy;
pub mod models;
pub mod rest;
pub mod session;
pub mod transport;

pub use auth::{Credentials, Generation};
pub use client::ApexClient;
pub use error::Error;
pub use legacy::LegacyFormat;
pub use models::{
    Config, FeedState, Input, InputConfig, ModuleConfig, ModuleExtra, NetworkConfig, Output,
    OutputConfig, Profile, ProfileData, Status, SystemInfo,
};
pub use rest::OutputState;
pub use session::Session;
pub use transport::{RetryPolicy, TransportConfig};
