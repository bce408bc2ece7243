//! Per-call service identity

use ldapgate_core::{Error, Result};

/// Identifies which service's TLS settings apply to one authentication call.
///
/// A scope is created at the start of a call and passed down explicitly to
/// the directory client; it is dropped when the call returns, so nothing
/// outside the call can observe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceScope {
    service_id: Option<String>,
}

impl ServiceScope {
    /// Enter a scope for the given service instance id.
    pub fn enter(service_id: Option<&str>) -> Self {
        Self {
            service_id: service_id.filter(|id| !id.is_empty()).map(str::to_string),
        }
    }

    /// A scope with no service identity.
    pub fn unset() -> Self {
        Self { service_id: None }
    }

    /// The service id, for code that needs it to pick a TLS configuration.
    pub fn service_id(&self) -> Result<&str> {
        self.service_id
            .as_deref()
            .ok_or(Error::ServiceIdentityMissing)
    }

    pub fn is_set(&self) -> bool {
        self.service_id.is_some()
    }
}
