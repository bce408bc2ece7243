//! In-memory directory for tests

use super::directory::{BoundContext, Directory};
use super::escape::escape_filter_value;
use super::scope::ServiceScope;
use async_trait::async_trait;
use ldapgate_core::{Error, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub(crate) const INVALID_CREDENTIALS: &str = "rc=49 (invalidCredentials), dn: \"\", text: \"\"";

struct FakeUser {
    base: String,
    filter: String,
    dn: String,
    password: Vec<u8>,
}

/// A bind the fake saw, with the service identity visible to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BindCall {
    pub dn: String,
    pub service_id: Option<String>,
}

/// Directory whose users match the filter `(uid=<escaped uid>)`
#[derive(Default)]
pub(crate) struct FakeDirectory {
    users: Vec<FakeUser>,
    search_fault: Option<String>,
    close_fault: Option<String>,
    searches: Mutex<Vec<(String, String)>>,
    binds: Mutex<Vec<BindCall>>,
    closes: Arc<AtomicUsize>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, base: &str, uid: &str, dn: &str, password: &str) -> Self {
        self.users.push(FakeUser {
            base: base.to_string(),
            filter: format!("(uid={})", escape_filter_value(uid)),
            dn: dn.to_string(),
            password: password.as_bytes().to_vec(),
        });
        self
    }

    pub fn failing_search(mut self, message: &str) -> Self {
        self.search_fault = Some(message.to_string());
        self
    }

    /// Binds succeed but closing the bound context fails.
    pub fn failing_close(mut self, message: &str) -> Self {
        self.close_fault = Some(message.to_string());
        self
    }

    pub fn searches(&self) -> Vec<(String, String)> {
        self.searches.lock().clone()
    }

    pub fn binds(&self) -> Vec<BindCall> {
        self.binds.lock().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn search(&self, base: &str, filter: &str) -> Result<Vec<String>> {
        self.searches
            .lock()
            .push((base.to_string(), filter.to_string()));

        if let Some(ref message) = self.search_fault {
            return Err(Error::Directory(message.clone()));
        }

        Ok(self
            .users
            .iter()
            .filter(|u| u.base == base && u.filter == filter)
            .map(|u| u.dn.clone())
            .collect())
    }

    async fn bind(
        &self,
        scope: &ServiceScope,
        dn: &str,
        credential: &[u8],
    ) -> Result<Box<dyn BoundContext>> {
        self.binds.lock().push(BindCall {
            dn: dn.to_string(),
            service_id: scope.service_id().ok().map(str::to_string),
        });

        // Let concurrent calls interleave between resolution and bind
        tokio::task::yield_now().await;

        let accepted = self
            .users
            .iter()
            .any(|u| u.dn == dn && u.password == credential);
        if !accepted {
            return Err(Error::Directory(INVALID_CREDENTIALS.to_string()));
        }

        Ok(Box::new(FakeContext {
            open: true,
            close_fault: self.close_fault.clone(),
            closes: self.closes.clone(),
        }))
    }
}

struct FakeContext {
    open: bool,
    close_fault: Option<String>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl BoundContext for FakeContext {
    /// Counts the first successful close only.
    async fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        if let Some(ref message) = self.close_fault {
            return Err(Error::Directory(message.clone()));
        }
        self.open = false;
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_context_close_is_idempotent() {
        let dn = "uid=john,ou=people,dc=x";
        let directory = FakeDirectory::new().with_user("ou=people,dc=x", "john", dn, "s3cret");

        let mut context = directory
            .bind(&ServiceScope::unset(), dn, b"s3cret")
            .await
            .unwrap();

        assert!(context.close().await.is_ok());
        assert!(context.close().await.is_ok());
        assert_eq!(directory.closes(), 1);
    }
}
