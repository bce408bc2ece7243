//! LDAP authentication types

use ldapgate_core::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Resolved Name
// ============================================================================

/// Fully qualified DN of a user entry, as returned by the directory.
///
/// The DN keeps the directory's escaping (`CN=Hello\,Ok=test,OU=Industry`);
/// decoding it would make it impossible to re-encode for the bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName(String);

impl ResolvedName {
    /// Returns `None` for an empty DN, which never names a user entry.
    pub fn new(dn: impl Into<String>) -> Option<Self> {
        let dn = dn.into();
        if dn.is_empty() {
            None
        } else {
            Some(Self(dn))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Credential
// ============================================================================

/// Username and UTF-8 password bytes for a single authentication call
pub struct Credential {
    pub username: String,
    password: Vec<u8>,
}

impl Credential {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.as_bytes().to_vec(),
        }
    }

    pub fn password_bytes(&self) -> &[u8] {
        &self.password
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Authentication Outcome
// ============================================================================

/// Result of the public `authenticate` call: success, or one error message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl From<Result<()>> for AuthOutcome {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => AuthOutcome::success(),
            Err(e) => AuthOutcome::failure(e.to_string()),
        }
    }
}
