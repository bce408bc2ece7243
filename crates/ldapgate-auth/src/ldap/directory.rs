//! Directory client seam
//!
//! The authenticator only needs two operations from a directory: a subtree
//! search and a bind. Implementations exist for ldap3 ([`super::LdapDirectory`])
//! and, in tests, an in-memory fake.

use super::scope::ServiceScope;
use async_trait::async_trait;
use ldapgate_core::Result;

/// Directory client trait
#[async_trait]
pub trait Directory: Send + Sync {
    /// Subtree search under `base`, returning the DNs of matching entries in
    /// the order the server sent them.
    ///
    /// Faults are reported as [`ldapgate_core::Error::Directory`].
    async fn search(&self, base: &str, filter: &str) -> Result<Vec<String>>;

    /// Open a new context authenticated as `dn` with `credential`.
    ///
    /// A rejected credential is a directory fault like any other.
    async fn bind(
        &self,
        scope: &ServiceScope,
        dn: &str,
        credential: &[u8],
    ) -> Result<Box<dyn BoundContext>>;

    /// Release the connection used for searches.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Context returned by a successful bind
#[async_trait]
pub trait BoundContext: Send {
    /// Release the context. Calling it again is a no-op.
    async fn close(&mut self) -> Result<()>;
}
