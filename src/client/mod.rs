//! Client lookup used by token admission.

pub mod memory;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::errors::ClientLookupError;
use crate::models::OAuthClient;

pub use memory::InMemoryClientGetter;

/// Resolves a client by name.
///
/// Implementations own any caching and retry; callers surface every error
/// as-is.
#[async_trait]
pub trait ClientGetter: Send + Sync {
    async fn get_client(&self, ctx: &RequestContext, name: &str) -> Result<OAuthClient, ClientLookupError>;
}
