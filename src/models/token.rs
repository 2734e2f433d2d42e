use serde::{Deserialize, Serialize};

use super::meta::ObjectMeta;
use super::object::impl_object;
use crate::selection::fields::FieldSet;

/// An in-flight authorization-code grant.
///
/// The token value itself is `metadata.name`. Everything past the metadata is
/// fixed at creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeToken {
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Name of the `OAuthClient` the grant was issued to.
    #[serde(default)]
    pub client_name: String,
    /// Lifetime in seconds from creation.
    #[serde(default)]
    pub expires_in: i64,
    /// Requested scopes. Empty means the client's default set.
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, rename = "redirectURI")]
    pub redirect_uri: String,
    /// Opaque value echoed back to the client.
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default, rename = "userUID")]
    pub user_uid: String,
    /// PKCE challenge.
    #[serde(default)]
    pub code_challenge: String,
    #[serde(default)]
    pub code_challenge_method: String,
}

impl_object!(AuthorizeToken, "OAuthAuthorizeToken");

impl AuthorizeToken {
    pub const KIND: &'static str = "OAuthAuthorizeToken";

    /// Fields a field selector may filter on.
    pub fn selectable_fields(&self) -> FieldSet {
        let mut fields = FieldSet::new();
        fields.insert("metadata.name".into(), self.metadata.name.clone());
        fields.insert("clientName".into(), self.client_name.clone());
        fields.insert("userName".into(), self.user_name.clone());
        fields.insert("userUID".into(), self.user_uid.clone());
        fields
    }
}
