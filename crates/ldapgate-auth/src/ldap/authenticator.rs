//! Username/password authentication over a [`Directory`]

use super::client::LdapDirectory;
use super::directory::Directory;
use super::resolver::resolve_user_dn;
use super::scope::ServiceScope;
use super::types::{AuthOutcome, Credential, ResolvedName};
use ldapgate_core::{Error, GatewayConfig, LdapConfig, Result};
use std::sync::Arc;
use tracing::{debug, error};

/// Everything one authentication call needs: the directory, its
/// configuration and the id of the service the call is made for.
pub struct LdapConnection {
    directory: Arc<dyn Directory>,
    config: LdapConfig,
    instance_id: Option<String>,
}

impl LdapConnection {
    pub fn new(
        directory: Arc<dyn Directory>,
        config: LdapConfig,
        instance_id: Option<String>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            directory,
            config,
            instance_id,
        })
    }

    /// Connect to the configured LDAP server with ldap3.
    pub async fn connect(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;
        let directory = LdapDirectory::connect(&config.ldap, config.tls.clone()).await?;

        Self::new(
            Arc::new(directory),
            config.ldap.clone(),
            config.instance_id.clone(),
        )
    }

    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    pub fn directory(&self) -> &dyn Directory {
        self.directory.as_ref()
    }

    /// Authenticate and render the result for the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
        self.verify(username, password).await.into()
    }

    /// Authenticate, keeping the structured error.
    pub async fn verify(&self, username: &str, password: &str) -> Result<()> {
        self.bind_as_user(username, password).await
    }

    /// Resolve a username to its DN without binding.
    pub async fn resolve(&self, username: &str) -> Result<ResolvedName> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidUsername);
        }

        resolve_user_dn(self.directory(), &self.config, username)
            .await?
            .ok_or(Error::UserNotFound)
    }

    /// Close the shared search connection.
    pub async fn close(&self) -> Result<()> {
        self.directory.close().await
    }

    async fn bind_as_user(&self, username: &str, password: &str) -> Result<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidUsername);
        }

        let credential = Credential::new(username, password);
        // Dropped on every return below, which ends the service identity
        let scope = ServiceScope::enter(self.instance_id());

        debug!("Authenticating user '{}'", credential.username);
        let name = resolve_user_dn(self.directory(), &self.config, &credential.username)
            .await?
            .ok_or(Error::UserNotFound)?;

        let mut context = self
            .directory
            .bind(&scope, name.as_str(), credential.password_bytes())
            .await
            .map_err(|e| {
                error!("Failed to bind user '{}': {}", name, e);
                e
            })?;
        debug!("User '{}' is authenticated", name);

        context.close().await
    }
}

/// Authenticate `username` with `password` against the connection's directory.
///
/// Never fails outright: every problem, from an empty username to a rejected
/// bind, comes back as an unsuccessful [`AuthOutcome`] carrying one message.
pub async fn authenticate(connection: &LdapConnection, username: &str, password: &str) -> AuthOutcome {
    connection.authenticate(username, password).await
}
