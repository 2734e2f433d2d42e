use async_trait::async_trait;

use crate::context::RequestContext;
use crate::models::Object;
use crate::validation::ErrorList;

/// Policy shared by the create and update paths.
pub trait RestStrategy: Send + Sync {
    /// Whether objects of this kind live inside a namespace.
    fn namespace_scoped(&self) -> bool;

    /// Normalize an object after it passed validation.
    fn canonicalize(&self, obj: &mut dyn Object);
}

#[async_trait]
pub trait RestCreateStrategy: RestStrategy {
    /// Derive a name from `metadata.generateName`.
    fn generate_name(&self, base: &str) -> String;

    /// Normalize an incoming object before validation. The only create hook
    /// allowed to mutate the object.
    fn prepare_for_create(&self, ctx: &RequestContext, obj: &mut dyn Object);

    /// Every reason `obj` may not be created. Empty means admissible.
    async fn validate(&self, ctx: &RequestContext, obj: &dyn Object) -> ErrorList;
}

#[async_trait]
pub trait RestUpdateStrategy: RestStrategy {
    /// Whether an update for a missing object may create it.
    fn allow_create_on_update(&self) -> bool;

    /// Whether an update may omit `metadata.resourceVersion`.
    fn allow_unconditional_update(&self) -> bool;

    fn prepare_for_update(&self, ctx: &RequestContext, obj: &mut dyn Object, old: &dyn Object);

    async fn validate_update(&self, ctx: &RequestContext, obj: &dyn Object, old: &dyn Object) -> ErrorList;
}
