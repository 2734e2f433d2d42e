//! Admission and selection policy for `OAuthAuthorizeToken`.

use std::sync::Arc;

use async_trait::async_trait;

use super::strategy::{RestCreateStrategy, RestStrategy, RestUpdateStrategy};
use crate::client::ClientGetter;
use crate::context::RequestContext;
use crate::errors::TypeMismatchError;
use crate::models::{AuthorizeToken, Object};
use crate::scope::validate_scope_restrictions;
use crate::selection::{FieldSelector, FieldSet, LabelSelector, LabelSet, SelectionPredicate};
use crate::validation::{
    validate_authorize_token, validate_authorize_token_update, ErrorList, FieldError, FieldPath,
};

/// Gates creates and updates of authorize tokens.
///
/// Holds nothing but the client lookup, so one instance can serve any number
/// of concurrent requests.
#[derive(Clone)]
pub struct AuthorizeTokenStrategy {
    client_getter: Arc<dyn ClientGetter>,
}

impl AuthorizeTokenStrategy {
    pub fn new(client_getter: Arc<dyn ClientGetter>) -> Self {
        Self { client_getter }
    }
}

fn as_token(obj: &dyn Object) -> Result<&AuthorizeToken, TypeMismatchError> {
    obj.as_any()
        .downcast_ref::<AuthorizeToken>()
        .ok_or(TypeMismatchError {
            expected: AuthorizeToken::KIND,
            found: obj.kind(),
        })
}

fn wrong_kind(err: TypeMismatchError) -> ErrorList {
    vec![FieldError::internal(FieldPath::root(), &err)].into()
}

impl RestStrategy for AuthorizeTokenStrategy {
    /// Tokens are cluster-scoped.
    fn namespace_scoped(&self) -> bool {
        false
    }

    fn canonicalize(&self, _obj: &mut dyn Object) {}
}

#[async_trait]
impl RestCreateStrategy for AuthorizeTokenStrategy {
    /// The name is the token secret; it is never suffixed server-side.
    fn generate_name(&self, base: &str) -> String {
        base.to_string()
    }

    fn prepare_for_create(&self, _ctx: &RequestContext, _obj: &mut dyn Object) {}

    async fn validate(&self, ctx: &RequestContext, obj: &dyn Object) -> ErrorList {
        let token = match as_token(obj) {
            Ok(token) => token,
            Err(err) => return wrong_kind(err),
        };
        let mut errs = validate_authorize_token(token);

        let client_path = FieldPath::new("clientName");
        // A malformed or missing name already has its error; there is nothing to resolve.
        if errs.on_field("clientName").next().is_some() {
            return errs;
        }

        let client = match self.client_getter.get_client(ctx, &token.client_name).await {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    client = %token.client_name,
                    error = %err,
                    "authorize token references an unresolvable client"
                );
                errs.push(FieldError::internal(client_path, &err));
                return errs;
            }
        };

        if let Err(err) = validate_scope_restrictions(&client, &token.scopes) {
            tracing::warn!(
                request_id = %ctx.request_id,
                client = %token.client_name,
                scopes = ?token.scopes,
                error = %err,
                "authorize token scopes rejected by client restrictions"
            );
            errs.push(FieldError::internal(client_path, &err));
        }

        if errs.is_empty() {
            tracing::debug!(
                request_id = %ctx.request_id,
                client = %token.client_name,
                "authorize token admitted"
            );
        }
        errs
    }
}

#[async_trait]
impl RestUpdateStrategy for AuthorizeTokenStrategy {
    fn allow_create_on_update(&self) -> bool {
        false
    }

    fn allow_unconditional_update(&self) -> bool {
        false
    }

    fn prepare_for_update(&self, _ctx: &RequestContext, _obj: &mut dyn Object, _old: &dyn Object) {}

    /// Structural only. `clientName` is immutable, so the client check done on
    /// create still holds.
    async fn validate_update(&self, _ctx: &RequestContext, obj: &dyn Object, old: &dyn Object) -> ErrorList {
        match (as_token(obj), as_token(old)) {
            (Ok(new), Ok(old)) => validate_authorize_token_update(new, old),
            (Err(err), _) | (_, Err(err)) => wrong_kind(err),
        }
    }
}

/// Labels and selectable fields of a token, for selector evaluation.
pub fn get_attrs(obj: &dyn Object) -> Result<(LabelSet, FieldSet), TypeMismatchError> {
    let token = as_token(obj)?;
    Ok((token.metadata.labels.clone(), token.selectable_fields()))
}

/// Predicate the registry evaluates per token on list and watch.
pub fn matcher(label: LabelSelector, field: FieldSelector) -> SelectionPredicate {
    SelectionPredicate {
        label,
        field,
        get_attrs,
    }
}
