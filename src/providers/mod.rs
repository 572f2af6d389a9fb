//! Resource providers.
//!
//! A provider lists and deletes one kind of cloud resource. The lifecycle
//! engine only sees this trait; how resources are physically enumerated or
//! removed is entirely the provider's concern.
//!
//! # Implementations
//!
//! | Provider | Backend |
//! |----------|---------|
//! | [`GcloudCliProvider`] | `gcloud` CLI, one instance per resource kind |
//! | [`InMemoryProvider`] | Thread-safe in-memory store with failure injection |

mod gcloud;
mod memory;

pub use gcloud::{GcloudCliProvider, GcloudSettings, parse_instances_json, parse_services_json};
pub use memory::InMemoryProvider;

use crate::models::{ResourceDescriptor, ResourceKind, Scope};
use crate::{Error, Result};
use async_trait::async_trait;

/// One page of a resource listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePage {
    /// Resources on this page.
    pub resources: Vec<ResourceDescriptor>,
    /// Token for the next page, `None` on the last page.
    pub next_page_token: Option<String>,
}

impl ResourcePage {
    /// Creates a final page.
    #[must_use]
    pub const fn last(resources: Vec<ResourceDescriptor>) -> Self {
        Self {
            resources,
            next_page_token: None,
        }
    }
}

/// Lists and deletes resources of a single kind.
///
/// Implementations must be safe to share across tasks.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// The resource kind this provider manages.
    fn kind(&self) -> ResourceKind;

    /// Lists one page of resources in `scope`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotImplemented`] if this kind cannot be enumerated.
    /// - [`Error::ProviderFailure`] if the backend call fails.
    async fn list_page(&self, scope: &Scope, page_token: Option<&str>) -> Result<ResourcePage>;

    /// Deletes the named resource.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderFailure`] if the backend rejects the call.
    async fn delete(&self, name: &str, scope: &Scope) -> Result<()>;
}

/// Drains every page of a listing.
///
/// # Errors
///
/// Propagates the first page error. A provider that hands back the token it
/// was given is reported as a [`Error::ProviderFailure`] instead of looping.
pub async fn list_all(
    provider: &dyn ResourceProvider,
    scope: &Scope,
) -> Result<Vec<ResourceDescriptor>> {
    let mut resources = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = provider.list_page(scope, token.as_deref()).await?;
        resources.extend(page.resources);

        match page.next_page_token {
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                return Err(repeated_token(&next));
            },
            Some(next) => token = Some(next),
            None => return Ok(resources),
        }
    }
}

/// Error for a provider that returned the same page token twice in a row.
pub(crate) fn repeated_token(token: &str) -> Error {
    Error::ProviderFailure {
        operation: "list".to_string(),
        cause: format!("page token '{token}' repeated"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StuckProvider;

    #[async_trait]
    impl ResourceProvider for StuckProvider {
        fn kind(&self) -> ResourceKind {
            ResourceKind::ComputeInstance
        }

        async fn list_page(&self, _scope: &Scope, _token: Option<&str>) -> Result<ResourcePage> {
            Ok(ResourcePage {
                resources: Vec::new(),
                next_page_token: Some("same".to_string()),
            })
        }

        async fn delete(&self, _name: &str, _scope: &Scope) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_list_all_detects_repeated_token() {
        let result = list_all(&StuckProvider, &Scope::zone("z")).await;
        assert_eq!(result, Err(repeated_token("same")));
    }

    #[tokio::test]
    async fn test_list_all_drains_pages() {
        let provider = InMemoryProvider::new(ResourceKind::ComputeInstance).with_page_size(2);
        let scope = Scope::zone("z");
        for i in 0..5 {
            provider
                .insert(
                    &scope,
                    ResourceDescriptor::new(ResourceKind::ComputeInstance, format!("vm-{i}"), "RUNNING"),
                )
                .expect("insert");
        }

        let all = list_all(&provider, &scope).await.expect("list");
        assert_eq!(all.len(), 5);
    }
}
