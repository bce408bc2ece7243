//! ldapgate Core Library
//!
//! Configuration and error types shared by the ldapgate crates.

pub mod config;
pub mod error;

pub use config::{GatewayConfig, LdapConfig, LoggingConfig, TlsProfile};
pub use error::{Error, Result};

/// ldapgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder replaced by the escaped username in the search filter template
pub const USERNAME_PLACEHOLDER: char = '?';

/// Separator between search bases in `user_search_base`
pub const SEARCH_BASE_DELIMITER: char = '#';
