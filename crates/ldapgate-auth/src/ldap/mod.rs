//! LDAP authentication module
//!
//! Authenticates a username/password pair in two steps:
//! - resolve the username to a DN with a subtree search over the configured bases
//! - bind as that DN with the supplied password
//!
//! The directory itself sits behind the [`Directory`] trait; [`LdapDirectory`]
//! implements it over `ldap3`.

mod authenticator;
mod client;
mod directory;
mod escape;
mod resolver;
mod scope;
mod types;

#[cfg(test)]
mod fake;

pub use authenticator::{authenticate, LdapConnection};
pub use client::{select_tls_profile, LdapDirectory};
pub use directory::{BoundContext, Directory};
pub use escape::{escape_filter_value, prepare_search_base};
pub use resolver::resolve_user_dn;
pub use scope::ServiceScope;
pub use types::*;
