//! The fixed sequence a registry runs around a strategy on create and update.

use super::strategy::{RestCreateStrategy, RestStrategy, RestUpdateStrategy};
use crate::context::RequestContext;
use crate::errors::AdmissionError;
use crate::models::Object;
use crate::validation::{ErrorList, FieldError, FieldPath};

const CONFLICT_DETAIL: &str =
    "the object has been modified; please apply your changes to the latest version and try again";

/// Admit `obj` for creation: scope the namespace, prepare, fill system
/// fields, derive the name, validate, canonicalize.
///
/// On success `obj` is ready to persist.
pub async fn before_create<S>(strategy: &S, ctx: &RequestContext, obj: &mut dyn Object) -> Result<(), AdmissionError>
where
    S: RestCreateStrategy + ?Sized,
{
    scope_namespace(strategy, ctx, obj)?;
    strategy.prepare_for_create(ctx, obj);

    let meta = obj.meta_mut();
    meta.fill_system_fields();
    if meta.name.is_empty() && !meta.generate_name.is_empty() {
        meta.name = strategy.generate_name(&meta.generate_name);
    }

    let errs = strategy.validate(ctx, obj).await;
    reject_invalid(obj, errs)?;

    strategy.canonicalize(obj);
    tracing::debug!(
        request_id = %ctx.request_id,
        kind = obj.kind(),
        name = %obj.meta().name,
        "create admitted"
    );
    Ok(())
}

/// Admit `obj` as a replacement for `old` (`None` when nothing is stored
/// under that name).
pub async fn before_update<S>(
    strategy: &S,
    ctx: &RequestContext,
    obj: &mut dyn Object,
    old: Option<&dyn Object>,
) -> Result<(), AdmissionError>
where
    S: RestCreateStrategy + RestUpdateStrategy + ?Sized,
{
    let Some(old) = old else {
        if !strategy.allow_create_on_update() {
            return Err(AdmissionError::NotFound {
                kind: obj.kind(),
                name: obj.meta().name.clone(),
            });
        }
        return before_create(strategy, ctx, obj).await;
    };

    let version = &obj.meta().resource_version;
    if version.is_empty() {
        if !strategy.allow_unconditional_update() {
            let errs = vec![FieldError::invalid(
                FieldPath::new("metadata").child("resourceVersion"),
                "",
                "must be specified for an update",
            )];
            reject_invalid(obj, errs.into())?;
        }
    } else if *version != old.meta().resource_version {
        return Err(AdmissionError::Conflict {
            kind: obj.kind(),
            name: obj.meta().name.clone(),
            detail: CONFLICT_DETAIL.to_string(),
        });
    }

    scope_namespace(strategy, ctx, obj)?;

    // Clients may omit server-owned fields on update.
    let meta = obj.meta_mut();
    if meta.uid.is_none() {
        meta.uid = old.meta().uid;
    }
    if meta.creation_timestamp.is_none() {
        meta.creation_timestamp = old.meta().creation_timestamp;
    }

    strategy.prepare_for_update(ctx, obj, old);
    let errs = strategy.validate_update(ctx, obj, old).await;
    reject_invalid(obj, errs)?;

    strategy.canonicalize(obj);
    tracing::debug!(
        request_id = %ctx.request_id,
        kind = obj.kind(),
        name = %obj.meta().name,
        "update admitted"
    );
    Ok(())
}

/// Cluster-scoped kinds drop any namespace; namespaced kinds take it from the
/// request and must agree with it.
fn scope_namespace<S>(strategy: &S, ctx: &RequestContext, obj: &mut dyn Object) -> Result<(), AdmissionError>
where
    S: RestStrategy + ?Sized,
{
    let meta = obj.meta_mut();
    if !strategy.namespace_scoped() {
        meta.namespace.clear();
        return Ok(());
    }

    match ctx.namespace.as_deref() {
        Some(ns) if meta.namespace.is_empty() => {
            meta.namespace = ns.to_string();
            Ok(())
        }
        Some(ns) if meta.namespace != ns => Err(AdmissionError::BadRequest(
            "the namespace of the provided object does not match the namespace sent on the request".into(),
        )),
        _ => Ok(()),
    }
}

fn reject_invalid(obj: &dyn Object, errors: ErrorList) -> Result<(), AdmissionError> {
    if errors.is_empty() {
        return Ok(());
    }
    Err(AdmissionError::Invalid {
        kind: obj.kind(),
        name: obj.meta().name.clone(),
        errors,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::models::{OAuthClient, ObjectMeta};

    /// Namespaced strategy with permissive update flags, to exercise the
    /// branches the token strategy never takes.
    struct Permissive;

    impl RestStrategy for Permissive {
        fn namespace_scoped(&self) -> bool {
            true
        }

        fn canonicalize(&self, obj: &mut dyn Object) {
            obj.meta_mut().labels.insert("canonical".into(), "true".into());
        }
    }

    #[async_trait]
    impl RestCreateStrategy for Permissive {
        fn generate_name(&self, base: &str) -> String {
            format!("{}generated", base)
        }

        fn prepare_for_create(&self, _ctx: &RequestContext, _obj: &mut dyn Object) {}

        async fn validate(&self, _ctx: &RequestContext, _obj: &dyn Object) -> ErrorList {
            ErrorList::new()
        }
    }

    #[async_trait]
    impl RestUpdateStrategy for Permissive {
        fn allow_create_on_update(&self) -> bool {
            true
        }

        fn allow_unconditional_update(&self) -> bool {
            true
        }

        fn prepare_for_update(&self, _ctx: &RequestContext, _obj: &mut dyn Object, _old: &dyn Object) {}

        async fn validate_update(&self, _ctx: &RequestContext, _obj: &dyn Object, _old: &dyn Object) -> ErrorList {
            ErrorList::new()
        }
    }

    #[tokio::test]
    async fn test_create_generates_name_and_fills_system_fields() {
        let ctx = RequestContext::new().with_namespace("team-a");
        let mut obj = OAuthClient {
            metadata: ObjectMeta {
                generate_name: "client-".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        before_create(&Permissive, &ctx, &mut obj).await.unwrap();
        assert_eq!(obj.metadata.name, "client-generated");
        assert_eq!(obj.metadata.namespace, "team-a");
        assert!(obj.metadata.uid.is_some());
        assert!(obj.metadata.creation_timestamp.is_some());
        assert_eq!(obj.metadata.labels["canonical"], "true");
    }

    #[tokio::test]
    async fn test_namespace_mismatch_is_bad_request() {
        let ctx = RequestContext::new().with_namespace("team-a");
        let mut obj = OAuthClient::named("c1");
        obj.metadata.namespace = "team-b".into();

        let err = before_create(&Permissive, &ctx, &mut obj).await.unwrap_err();
        assert!(matches!(err, AdmissionError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_update_missing_object_creates_when_allowed() {
        let ctx = RequestContext::new().with_namespace("team-a");
        let mut obj = OAuthClient::named("c1");
        before_update(&Permissive, &ctx, &mut obj, None).await.unwrap();
        assert!(obj.metadata.uid.is_some());
    }

    #[tokio::test]
    async fn test_update_copies_server_fields_and_detects_conflicts() {
        let ctx = RequestContext::new();
        let mut old = OAuthClient::named("c1");
        old.metadata.fill_system_fields();
        old.metadata.resource_version = "7".into();

        let mut obj = OAuthClient::named("c1");
        before_update(&Permissive, &ctx, &mut obj, Some(&old as &dyn Object)).await.unwrap();
        assert_eq!(obj.metadata.uid, old.metadata.uid);
        assert_eq!(obj.metadata.creation_timestamp, old.metadata.creation_timestamp);

        let mut stale = OAuthClient::named("c1");
        stale.metadata.resource_version = "6".into();
        let err = before_update(&Permissive, &ctx, &mut stale, Some(&old as &dyn Object)).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_trait_objects_are_accepted() {
        let strategy: Arc<dyn RestCreateStrategy> = Arc::new(Permissive);
        let mut obj = OAuthClient::named("c1");
        before_create(strategy.as_ref(), &RequestContext::new(), &mut obj)
            .await
            .unwrap();
    }
}
