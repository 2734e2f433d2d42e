use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;

use super::ClientGetter;
use crate::context::RequestContext;
use crate::errors::ClientLookupError;
use crate::models::OAuthClient;

/// Client set held in memory, keyed by name.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct InMemoryClientGetter {
    clients: Arc<DashMap<String, OAuthClient>>,
}

/// Accepted file shapes: a bare list, or `{ items: [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClientFile {
    Bare(Vec<OAuthClient>),
    List { items: Vec<OAuthClient> },
}

impl InMemoryClientGetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_clients(clients: impl IntoIterator<Item = OAuthClient>) -> Self {
        let getter = Self::new();
        for client in clients {
            getter.insert(client);
        }
        getter
    }

    /// Parse clients from YAML (or JSON, which is valid YAML).
    pub fn from_yaml(source: &str) -> anyhow::Result<Self> {
        let clients = match serde_yaml::from_str::<ClientFile>(source).context("parsing client list")? {
            ClientFile::List { items } => items,
            ClientFile::Bare(items) => items,
        };
        Ok(Self::from_clients(clients))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading clients from {}", path.display()))?;
        let getter = Self::from_yaml(&source)?;
        tracing::debug!(path = %path.display(), clients = getter.len(), "loaded oauth clients");
        Ok(getter)
    }

    /// Add or replace a client. Returns the previous entry, if any.
    pub fn insert(&self, client: OAuthClient) -> Option<OAuthClient> {
        self.clients.insert(client.name().to_string(), client)
    }

    pub fn remove(&self, name: &str) -> Option<OAuthClient> {
        self.clients.remove(name).map(|(_, client)| client)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl ClientGetter for InMemoryClientGetter {
    async fn get_client(&self, _ctx: &RequestContext, name: &str) -> Result<OAuthClient, ClientLookupError> {
        self.clients
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ClientLookupError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScopeRestriction;

    #[tokio::test]
    async fn test_lookup_hit_and_miss() {
        let getter = InMemoryClientGetter::from_clients([OAuthClient::named("console")]);
        let ctx = RequestContext::new();

        let client = getter.get_client(&ctx, "console").await.unwrap();
        assert_eq!(client.name(), "console");

        let err = getter.get_client(&ctx, "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_insert_replaces_and_remove() {
        let getter = InMemoryClientGetter::new();
        assert!(getter.insert(OAuthClient::named("c1")).is_none());

        let restricted = OAuthClient::named("c1").with_restriction(ScopeRestriction::literals(["read"]));
        assert!(getter.insert(restricted).is_some());
        assert_eq!(getter.len(), 1);

        let ctx = RequestContext::new();
        let client = getter.get_client(&ctx, "c1").await.unwrap();
        assert_eq!(client.scope_restrictions.len(), 1);

        assert!(getter.remove("c1").is_some());
        assert!(getter.is_empty());
    }

    #[test]
    fn test_from_yaml_both_shapes() {
        let bare = InMemoryClientGetter::from_yaml(
            r#"
- metadata: { name: c1 }
- metadata: { name: c2 }
"#,
        )
        .unwrap();
        assert_eq!(bare.len(), 2);

        let wrapped = InMemoryClientGetter::from_yaml(
            r#"{"items": [{"metadata": {"name": "c1"}, "scopeRestrictions": [{"literals": ["read"]}]}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.len(), 1);
    }

    #[test]
    fn test_from_yaml_rejects_garbage() {
        assert!(InMemoryClientGetter::from_yaml("just a string").is_err());
    }
}
