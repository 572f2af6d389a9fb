//! In-memory resource provider.
//!
//! [`InMemoryProvider`] keeps resources in a map keyed by scope and name.
//! It supports pagination and failure injection so cleanup behavior can be
//! exercised without a cloud account.
//!
//! ## Limitations
//!
//! - **NOT a real backend**: nothing is created or billed
//! - **Single-process only**: state is not shared across processes

use super::{ResourcePage, ResourceProvider};
use crate::models::{ResourceDescriptor, ResourceKind, Scope};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{PoisonError, RwLock};

/// Default number of resources per listing page.
const DEFAULT_PAGE_SIZE: usize = 50;

/// Internal state protected by a single lock.
#[derive(Debug, Default)]
struct MemoryState {
    resources: HashMap<Scope, BTreeMap<String, ResourceDescriptor>>,
    failing_deletes: HashMap<String, String>,
    list_failure: Option<Error>,
    delete_calls: Vec<String>,
}

/// Converts a lock poison error to a provider error.
fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::ProviderFailure {
        operation: "memory".to_string(),
        cause: "provider lock poisoned".to_string(),
    }
}

/// In-memory provider for one resource kind.
#[derive(Debug)]
pub struct InMemoryProvider {
    kind: ResourceKind,
    page_size: usize,
    state: RwLock<MemoryState>,
}

impl InMemoryProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            page_size: DEFAULT_PAGE_SIZE,
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Sets the listing page size (minimum 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Adds or replaces a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn insert(&self, scope: &Scope, resource: ResourceDescriptor) -> Result<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state
            .resources
            .entry(scope.clone())
            .or_default()
            .insert(resource.name.clone(), resource);
        drop(state);
        Ok(())
    }

    /// Makes every delete of `name` fail with `cause`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn fail_delete(&self, name: impl Into<String>, cause: impl Into<String>) -> Result<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.failing_deletes.insert(name.into(), cause.into());
        drop(state);
        Ok(())
    }

    /// Makes every listing fail with `error`; `None` clears the failure.
    ///
    /// Use [`Error::NotImplemented`] to simulate a kind that cannot be
    /// enumerated.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn fail_listing(&self, error: Option<Error>) -> Result<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.list_failure = error;
        drop(state);
        Ok(())
    }

    /// Returns true if the resource exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn contains(&self, scope: &Scope, name: &str) -> Result<bool> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state
            .resources
            .get(scope)
            .is_some_and(|resources| resources.contains_key(name)))
    }

    /// Returns the number of resources in `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn count(&self, scope: &Scope) -> Result<usize> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.resources.get(scope).map_or(0, BTreeMap::len))
    }

    /// Returns every name passed to `delete`, in call order.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn delete_calls(&self) -> Result<Vec<String>> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.delete_calls.clone())
    }
}

#[async_trait]
impl ResourceProvider for InMemoryProvider {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn list_page(&self, scope: &Scope, page_token: Option<&str>) -> Result<ResourcePage> {
        let state = self.state.read().map_err(poison_err)?;
        if let Some(error) = &state.list_failure {
            return Err(error.clone());
        }

        // Tokens are the last name returned, so deletions between pages do
        // not shift later entries.
        let after = page_token.map_or(Bound::Unbounded, |token| Bound::Excluded(token.to_string()));
        let (resources, has_more) = {
            let mut remaining = state
                .resources
                .get(scope)
                .into_iter()
                .flat_map(|resources| resources.range((after.clone(), Bound::Unbounded)))
                .map(|(_, resource)| resource);
            let page: Vec<ResourceDescriptor> =
                remaining.by_ref().take(self.page_size).cloned().collect();
            (page, remaining.next().is_some())
        };
        drop(state);

        let next_page_token = resources
            .last()
            .filter(|_| has_more)
            .map(|resource| resource.name.clone());

        Ok(ResourcePage {
            resources,
            next_page_token,
        })
    }

    async fn delete(&self, name: &str, scope: &Scope) -> Result<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.delete_calls.push(name.to_string());

        if let Some(cause) = state.failing_deletes.get(name) {
            return Err(Error::ProviderFailure {
                operation: "delete".to_string(),
                cause: cause.clone(),
            });
        }

        let removed = state
            .resources
            .get_mut(scope)
            .and_then(|resources| resources.remove(name));
        drop(state);

        removed.map(|_| ()).ok_or_else(|| Error::ProviderFailure {
            operation: "delete".to_string(),
            cause: format!("resource '{name}' not found in {scope}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm(name: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::ComputeInstance, name, "RUNNING")
    }

    #[tokio::test]
    async fn test_pagination() {
        let provider = InMemoryProvider::new(ResourceKind::ComputeInstance).with_page_size(2);
        let scope = Scope::zone("z");
        for name in ["a", "b", "c"] {
            provider.insert(&scope, vm(name)).expect("insert");
        }

        let first = provider.list_page(&scope, None).await.expect("page 1");
        assert_eq!(first.resources.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("b"));

        let second = provider
            .list_page(&scope, first.next_page_token.as_deref())
            .await
            .expect("page 2");
        assert_eq!(second.resources.len(), 1);
        assert_eq!(second.resources[0].name, "c");
        assert!(second.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_pagination_survives_deletes_between_pages() {
        let provider = InMemoryProvider::new(ResourceKind::ComputeInstance).with_page_size(2);
        let scope = Scope::zone("z");
        for name in ["a", "b", "c", "d"] {
            provider.insert(&scope, vm(name)).expect("insert");
        }

        let first = provider.list_page(&scope, None).await.expect("page 1");
        provider.delete("a", &scope).await.expect("delete");
        provider.delete("b", &scope).await.expect("delete");

        let second = provider
            .list_page(&scope, first.next_page_token.as_deref())
            .await
            .expect("page 2");
        let names: Vec<&str> = second.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c", "d"]);
        assert!(second.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let provider = InMemoryProvider::new(ResourceKind::ComputeInstance);
        provider.insert(&Scope::zone("a"), vm("vm")).expect("insert");

        let page = provider.list_page(&Scope::zone("b"), None).await.expect("list");
        assert!(page.resources.is_empty());
        assert!(provider.delete("vm", &Scope::zone("b")).await.is_err());
        assert!(provider.contains(&Scope::zone("a"), "vm").expect("contains"));
    }

    #[tokio::test]
    async fn test_delete_and_failure_injection() {
        let provider = InMemoryProvider::new(ResourceKind::ComputeInstance);
        let scope = Scope::zone("z");
        provider.insert(&scope, vm("ok")).expect("insert");
        provider.insert(&scope, vm("stuck")).expect("insert");
        provider.fail_delete("stuck", "permission denied").expect("inject");

        provider.delete("ok", &scope).await.expect("delete");
        let err = provider.delete("stuck", &scope).await.expect_err("should fail");
        assert_eq!(err.to_string(), "provider 'delete' failed: permission denied");

        assert_eq!(provider.count(&scope).expect("count"), 1);
        assert_eq!(provider.delete_calls().expect("calls"), vec!["ok", "stuck"]);
    }

    #[tokio::test]
    async fn test_listing_failure() {
        let provider = InMemoryProvider::new(ResourceKind::CloudRunService);
        provider
            .fail_listing(Some(Error::NotImplemented("services".to_string())))
            .expect("inject");

        let err = provider
            .list_page(&Scope::region("r"), None)
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::NotImplemented(_)));

        provider.fail_listing(None).expect("clear");
        assert!(provider.list_page(&Scope::region("r"), None).await.is_ok());
    }
}
