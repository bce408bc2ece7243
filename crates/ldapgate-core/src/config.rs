//! Configuration for ldapgate

use crate::{Error, Result, SEARCH_BASE_DELIMITER, USERNAME_PLACEHOLDER};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Service instance id, selects the TLS profile used for user binds
    #[serde(default)]
    pub instance_id: Option<String>,

    #[serde(default)]
    pub ldap: LdapConfig,

    /// TLS profiles keyed by service instance id
    #[serde(default)]
    pub tls: HashMap<String, TlsProfile>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::InternalError(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::InternalError(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from `LDAPGATE_*` variables resolved through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let flag = |key: &str| lookup(key).map(|v| v == "true").unwrap_or(false);

        if let Some(id) = lookup("LDAPGATE_INSTANCE_ID") {
            config.instance_id = Some(id);
        }
        if let Some(url) = lookup("LDAPGATE_SERVER_URL") {
            config.ldap.server_url = url;
        }
        if let Some(dn) = lookup("LDAPGATE_BIND_DN") {
            config.ldap.bind_dn = Some(dn);
        }
        if let Some(password) = lookup("LDAPGATE_BIND_PASSWORD") {
            config.ldap.bind_password = Some(password);
        }
        if let Some(base) = lookup("LDAPGATE_USER_SEARCH_BASE") {
            config.ldap.user_search_base = base;
        }
        if let Some(filter) = lookup("LDAPGATE_USER_SEARCH_FILTER") {
            config.ldap.user_search_filter = filter;
        }
        if flag("LDAPGATE_START_TLS") {
            config.ldap.start_tls = true;
        }
        if flag("LDAPGATE_SKIP_TLS_VERIFY") {
            config.ldap.skip_tls_verify = true;
        }
        if let Some(secs) = lookup("LDAPGATE_CONNECTION_TIMEOUT") {
            if let Ok(s) = secs.parse() {
                config.ldap.connection_timeout_secs = s;
            }
        }
        if let Some(secs) = lookup("LDAPGATE_READ_TIMEOUT") {
            if let Ok(s) = secs.parse() {
                config.ldap.read_timeout_secs = s;
            }
        }
        if let Some(level) = lookup("LDAPGATE_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = lookup("LDAPGATE_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        self.ldap.validate()?;

        for (service, profile) in &self.tls {
            if profile.connection_timeout_secs == Some(0) {
                return Err(Error::InvalidArgument(format!(
                    "TLS profile '{}' has a zero connection timeout",
                    service
                )));
            }
        }
        Ok(())
    }
}

/// LDAP connection and user search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// LDAP server URL (ldap:// or ldaps://)
    #[serde(default = "default_ldap_url")]
    pub server_url: String,

    /// Service account DN for the search connection; anonymous when unset
    #[serde(default)]
    pub bind_dn: Option<String>,

    #[serde(default)]
    pub bind_password: Option<String>,

    /// One or more search bases joined by `#`
    /// Example: "ou=people,dc=example,dc=com#ou=svc,dc=example,dc=com"
    #[serde(default)]
    pub user_search_base: String,

    /// User search filter, `?` is replaced by the escaped username
    #[serde(default = "default_user_search_filter")]
    pub user_search_filter: String,

    /// Use STARTTLS on an ldap:// connection
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification (not recommended for production)
    #[serde(default)]
    pub skip_tls_verify: bool,

    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Per-operation timeout for searches and binds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_ldap_url() -> String {
    "ldap://localhost:389".to_string()
}

fn default_user_search_filter() -> String {
    "(&(objectClass=person)(uid=?))".to_string()
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_read_timeout() -> u64 {
    60
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            server_url: default_ldap_url(),
            bind_dn: None,
            bind_password: None,
            user_search_base: String::new(),
            user_search_filter: default_user_search_filter(),
            start_tls: false,
            skip_tls_verify: false,
            connection_timeout_secs: default_connection_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

impl LdapConfig {
    /// Check whether the server URL is an ldaps: URL.
    pub fn is_ldaps_url(&self) -> bool {
        is_ldaps_url(&self.server_url)
    }

    /// Whether connections to this server negotiate TLS at all.
    pub fn uses_tls(&self) -> bool {
        self.is_ldaps_url() || self.start_tls
    }

    /// Configured search bases in order, empty pieces dropped.
    pub fn search_bases(&self) -> Vec<&str> {
        self.user_search_base
            .split(SEARCH_BASE_DELIMITER)
            .map(str::trim)
            .filter(|base| !base.is_empty())
            .collect()
    }

    /// Substitute an already escaped username into the filter template.
    pub fn build_user_filter(&self, escaped_username: &str) -> Result<String> {
        let placeholders = self
            .user_search_filter
            .matches(USERNAME_PLACEHOLDER)
            .count();
        if placeholders != 1 {
            return Err(Error::InvalidArgument(format!(
                "User search filter must contain exactly one '{}' placeholder, found {}",
                USERNAME_PLACEHOLDER, placeholders
            )));
        }

        Ok(self
            .user_search_filter
            .replace(USERNAME_PLACEHOLDER, escaped_username))
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            return Err(Error::InvalidArgument("Server URL is required".into()));
        }

        let lower = self.server_url.to_ascii_lowercase();
        if !lower.starts_with("ldap://") && !lower.starts_with("ldaps://") {
            return Err(Error::InvalidArgument(
                "Server URL must start with ldap:// or ldaps://".into(),
            ));
        }

        if self.start_tls && self.is_ldaps_url() {
            return Err(Error::InvalidArgument(
                "STARTTLS cannot be used with an ldaps:// URL".into(),
            ));
        }

        if self.bind_dn.is_some() != self.bind_password.is_some() {
            return Err(Error::InvalidArgument(
                "bind_dn and bind_password must be set together".into(),
            ));
        }

        if self.connection_timeout_secs == 0 {
            return Err(Error::InvalidArgument(
                "Connection timeout must be greater than zero".into(),
            ));
        }

        if self.read_timeout_secs == 0 {
            return Err(Error::InvalidArgument(
                "Read timeout must be greater than zero".into(),
            ));
        }

        let pieces = self.user_search_base.split(SEARCH_BASE_DELIMITER).count();
        let bases = self.search_bases().len();
        if bases == 0 {
            return Err(Error::InvalidArgument(
                "At least one user search base is required".into(),
            ));
        }
        if bases < pieces {
            warn!(
                "Ignoring {} empty search base(s) in '{}'",
                pieces - bases,
                self.user_search_base
            );
        }

        if self.user_search_filter.trim().is_empty() {
            return Err(Error::InvalidArgument("User search filter is required".into()));
        }

        self.build_user_filter("")?;

        Ok(())
    }
}

/// Check whether the provided url is an ldaps: url.
pub fn is_ldaps_url(url: &str) -> bool {
    url.len() > 7
        && url
            .get(..8)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("ldaps://"))
}

/// TLS settings applied to user binds for one service.
///
/// Whether TLS is used at all is decided by the LDAP section (`ldaps://` or
/// `start_tls`); a profile only tunes how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsProfile {
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Overrides `ldap.connection_timeout_secs` when set
    #[serde(default)]
    pub connection_timeout_secs: Option<u64>,
}

impl TlsProfile {
    /// The TLS settings the LDAP section itself describes.
    pub fn from_ldap(config: &LdapConfig) -> Self {
        Self {
            skip_tls_verify: config.skip_tls_verify,
            connection_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ldap_config() -> LdapConfig {
        LdapConfig {
            user_search_base: "ou=people,dc=example,dc=com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_ldaps_url() {
        assert!(is_ldaps_url("ldaps://ldap.example.com:636"));
        assert!(is_ldaps_url("LDAPS://ldap.example.com"));
        assert!(is_ldaps_url("ldaps://"));
        assert!(!is_ldaps_url("ldap://ldap.example.com"));
        assert!(!is_ldaps_url("ldaps:/"));
        assert!(!is_ldaps_url(""));
    }

    #[test]
    fn test_search_bases_split() {
        let config = LdapConfig {
            user_search_base: "ou=people,dc=x# ou=svc,dc=x ##".to_string(),
            ..Default::default()
        };

        assert_eq!(config.search_bases(), vec!["ou=people,dc=x", "ou=svc,dc=x"]);
    }

    #[test]
    fn test_user_filter_building() {
        let config = LdapConfig {
            user_search_filter: "(uid=?)".to_string(),
            ..ldap_config()
        };

        assert_eq!(config.build_user_filter("john").unwrap(), "(uid=john)");
    }

    #[test]
    fn test_user_filter_requires_single_placeholder() {
        let mut config = ldap_config();

        config.user_search_filter = "(uid=john)".to_string();
        assert!(matches!(
            config.build_user_filter("x"),
            Err(Error::InvalidArgument(_))
        ));

        config.user_search_filter = "(|(uid=?)(mail=?))".to_string();
        assert!(config.build_user_filter("x").is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LdapConfig::default();

        // Should fail - no search base
        assert!(config.validate().is_err());

        config.user_search_base = "ou=people,dc=example,dc=com".to_string();
        assert!(config.validate().is_ok());

        config.server_url = "http://ldap.example.com".to_string();
        assert!(config.validate().is_err());

        config.server_url = "ldaps://ldap.example.com".to_string();
        config.start_tls = true;
        assert!(config.validate().is_err());

        config.start_tls = false;
        config.bind_dn = Some("cn=admin,dc=example,dc=com".to_string());
        assert!(config.validate().is_err());

        config.bind_password = Some("secret".to_string());
        assert!(config.validate().is_ok());

        config.connection_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));

        config.connection_timeout_secs = 5;
        config.read_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));

        config.read_timeout_secs = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_logging_section() {
        let config = GatewayConfig::from_toml(
            r#"
[ldap]
user_search_base = "ou=people,dc=x"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_tls_profile_zero_timeout_rejected() {
        let mut config = GatewayConfig {
            ldap: LdapConfig {
                server_url: "ldaps://ldap.example.com".to_string(),
                ..ldap_config()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.tls.insert(
            "billing".to_string(),
            TlsProfile {
                skip_tls_verify: false,
                connection_timeout_secs: Some(0),
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = GatewayConfig::from_toml(
            r#"
instance_id = "portal"

[ldap]
server_url = "ldaps://ldap.example.com:636"
user_search_base = "ou=people,dc=example,dc=com#ou=svc,dc=example,dc=com"
user_search_filter = "(uid=?)"

[tls.portal]
skip_tls_verify = true
connection_timeout_secs = 2

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.instance_id.as_deref(), Some("portal"));
        assert!(config.ldap.is_ldaps_url());
        assert_eq!(config.ldap.search_bases().len(), 2);
        assert_eq!(config.ldap.read_timeout_secs, 60);
        assert!(config.tls["portal"].skip_tls_verify);
        assert_eq!(config.tls["portal"].connection_timeout_secs, Some(2));
        assert_eq!(config.logging.format, "json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[ldap]\nuser_search_base = \"ou=people,dc=example,dc=com\""
        )
        .unwrap();

        let config = GatewayConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.ldap.server_url, "ldap://localhost:389");
        assert_eq!(config.ldap.user_search_filter, "(&(objectClass=person)(uid=?))");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_file_missing() {
        let result = GatewayConfig::from_file("/nonexistent/ldapgate.toml");
        assert!(matches!(result, Err(Error::InternalError(_))));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("LDAPGATE_INSTANCE_ID", "portal"),
            ("LDAPGATE_SERVER_URL", "ldap://dir.internal:389"),
            ("LDAPGATE_USER_SEARCH_BASE", "ou=people,dc=x"),
            ("LDAPGATE_START_TLS", "true"),
            ("LDAPGATE_READ_TIMEOUT", "15"),
            ("LDAPGATE_CONNECTION_TIMEOUT", "soon"),
        ]
        .into_iter()
        .collect();

        let config = GatewayConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.instance_id.as_deref(), Some("portal"));
        assert_eq!(config.ldap.server_url, "ldap://dir.internal:389");
        assert!(config.ldap.start_tls);
        assert!(config.ldap.uses_tls());
        assert_eq!(config.ldap.read_timeout_secs, 15);
        // Unparseable values keep the default
        assert_eq!(config.ldap.connection_timeout_secs, 5);
    }
}
