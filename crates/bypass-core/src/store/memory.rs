// # Memory Domain Store
//
// In-memory implementation of DomainStore.
//
// Nothing survives a restart. Useful for tests and for embedding the engine
// in an application that manages its own whitelist.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::DomainStore;

/// In-memory domain store implementation
///
/// Clones share the same underlying set, so a test can keep a handle and
/// edit the whitelist while an engine owns another clone.
///
/// # Example
///
/// ```rust,no_run
/// use bypass_core::store::MemoryDomainStore;
/// use bypass_core::traits::DomainStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryDomainStore::with_domains(["example.com"]);
///     assert!(store.read_all().await?.contains("example.com"));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDomainStore {
    inner: Arc<RwLock<BTreeSet<String>>>,
}

impl MemoryDomainStore {
    /// Create a new empty memory domain store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `domains`
    pub fn with_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: Arc::new(RwLock::new(domains.into_iter().map(Into::into).collect())),
        }
    }

    /// Get the number of stored domains
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl DomainStore for MemoryDomainStore {
    async fn read_all(&self) -> Result<BTreeSet<String>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn write_all(&self, domains: &BTreeSet<String>) -> Result<(), Error> {
        *self.inner.write().await = domains.clone();
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}
