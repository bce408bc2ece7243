//! LDAP Client implementation
//!
//! [`Directory`] over ldap3. One connection, bound as the service account,
//! serves every user search; each user bind gets a fresh connection whose TLS
//! settings come from the calling service's profile.

use super::directory::{BoundContext, Directory};
use super::scope::ServiceScope;
use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use ldapgate_core::{Error, LdapConfig, Result, TlsProfile};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Attribute list asking the server for no attributes (RFC 4511)
const NO_ATTRIBUTES: &str = "1.1";

/// ldap3-backed directory client
pub struct LdapDirectory {
    ldap: Ldap,
    config: LdapConfig,
    tls_profiles: HashMap<String, TlsProfile>,
}

impl LdapDirectory {
    /// Open the search connection and bind it as the service account, if one
    /// is configured.
    pub async fn connect(
        config: &LdapConfig,
        tls_profiles: HashMap<String, TlsProfile>,
    ) -> Result<Self> {
        let mut ldap = open_connection(
            config,
            &TlsProfile::from_ldap(config),
            Duration::from_secs(config.connection_timeout_secs),
        )
        .await?;

        if let (Some(bind_dn), Some(bind_password)) = (&config.bind_dn, &config.bind_password) {
            ldap.with_timeout(Duration::from_secs(config.read_timeout_secs))
                .simple_bind(bind_dn, bind_password)
                .await
                .map_err(|e| Error::Directory(format!("Service bind failed: {}", e)))?
                .success()
                .map_err(|e| Error::Directory(format!("Service bind failed: {}", e)))?;
            debug!("Search connection bound as '{}'", bind_dn);
        }

        info!("Connected to LDAP server {}", config.server_url);

        Ok(Self {
            ldap,
            config: config.clone(),
            tls_profiles,
        })
    }

    fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.config.read_timeout_secs)
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    async fn search(&self, base: &str, filter: &str) -> Result<Vec<String>> {
        // Ldap is a cloneable handle onto the shared, multiplexed connection
        let mut ldap = self.ldap.clone();

        debug!("Searching '{}' with filter: {}", base, filter);
        let (entries, _res) = ldap
            .with_timeout(self.read_timeout())
            .search(base, Scope::Subtree, filter, vec![NO_ATTRIBUTES])
            .await
            .map_err(Error::directory)?
            .success()
            .map_err(Error::directory)?;

        Ok(entries
            .into_iter()
            .map(|entry| SearchEntry::construct(entry).dn)
            .collect())
    }

    async fn bind(
        &self,
        scope: &ServiceScope,
        dn: &str,
        credential: &[u8],
    ) -> Result<Box<dyn BoundContext>> {
        let profile = select_tls_profile(&self.config, &self.tls_profiles, scope)?;
        let password = simple_bind_password(credential)?;
        let timeout = profile
            .connection_timeout_secs
            .unwrap_or(self.config.connection_timeout_secs);

        let mut ldap = open_connection(&self.config, &profile, Duration::from_secs(timeout)).await?;

        let bound = match ldap
            .with_timeout(self.read_timeout())
            .simple_bind(dn, password)
            .await
        {
            Ok(result) => result.success().map_err(Error::directory),
            Err(e) => Err(Error::directory(e)),
        };

        if let Err(e) = bound {
            let _ = ldap.unbind().await;
            return Err(e);
        }

        Ok(Box::new(LdapBoundContext { ldap: Some(ldap) }))
    }

    async fn close(&self) -> Result<()> {
        let mut ldap = self.ldap.clone();
        ldap.unbind().await.map_err(Error::directory)
    }
}

/// Connection opened by a successful user bind
struct LdapBoundContext {
    ldap: Option<Ldap>,
}

#[async_trait]
impl BoundContext for LdapBoundContext {
    async fn close(&mut self) -> Result<()> {
        if let Some(mut ldap) = self.ldap.take() {
            ldap.unbind().await.map_err(Error::directory)?;
        }
        Ok(())
    }
}

/// Pick the TLS settings for a user bind.
///
/// Plain `ldap://` connections never look at the service identity. When TLS
/// is in use the identity is required; a profile registered for it replaces
/// the LDAP section's own settings.
pub fn select_tls_profile(
    config: &LdapConfig,
    profiles: &HashMap<String, TlsProfile>,
    scope: &ServiceScope,
) -> Result<TlsProfile> {
    if !config.uses_tls() {
        return Ok(TlsProfile::from_ldap(config));
    }

    let service_id = scope.service_id()?;
    match profiles.get(service_id) {
        Some(profile) => Ok(profile.clone()),
        None => {
            debug!("No TLS profile for service '{}', using defaults", service_id);
            Ok(TlsProfile::from_ldap(config))
        }
    }
}

/// Password for a simple bind.
///
/// An empty password turns a simple bind into an unauthenticated bind, which
/// most servers accept for any DN, so it is refused here.
fn simple_bind_password(credential: &[u8]) -> Result<&str> {
    if credential.is_empty() {
        return Err(Error::Directory(
            "Empty password is not allowed for a simple bind".into(),
        ));
    }
    std::str::from_utf8(credential)
        .map_err(|e| Error::Directory(format!("Password is not valid UTF-8: {}", e)))
}

async fn open_connection(config: &LdapConfig, profile: &TlsProfile, timeout: Duration) -> Result<Ldap> {
    let settings = LdapConnSettings::new()
        .set_conn_timeout(timeout)
        .set_starttls(config.start_tls)
        .set_no_tls_verify(profile.skip_tls_verify);

    debug!("Connecting to LDAP server: {}", config.server_url);

    let (conn, ldap) = LdapConnAsync::with_settings(settings, &config.server_url)
        .await
        .map_err(Error::directory)?;

    ldap3::drive!(conn);

    Ok(ldap)
}
