//! Transport layer for the chat wizard.
//!
//! Provides:
//! - Client configuration (base URL, endpoints, timeouts)
//! - HTTP transport (feature: http)
//! - Terminal input bridge (feature: tui)

pub mod config;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tui")]
pub mod tui;

pub use config::{ClientConfig, ConfigError};

#[cfg(feature = "http")]
pub use http::HttpTransport;
