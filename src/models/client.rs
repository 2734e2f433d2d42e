use serde::{Deserialize, Serialize};

use super::meta::ObjectMeta;
use super::object::impl_object;

/// A registered OAuth consumer.
///
/// Read-only from the point of view of token admission; only `metadata.name`
/// and `scope_restrictions` take part in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthClient {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret: String,
    #[serde(default, rename = "redirectURIs")]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub grant_method: GrantHandlerType,
    /// Rules limiting which scopes tokens for this client may carry.
    /// Empty means unrestricted.
    #[serde(default)]
    pub scope_restrictions: Vec<ScopeRestriction>,
}

impl_object!(OAuthClient, "OAuthClient");

impl OAuthClient {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn with_restriction(mut self, restriction: ScopeRestriction) -> Self {
        self.scope_restrictions.push(restriction);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantHandlerType {
    #[default]
    Auto,
    Prompt,
    Deny,
}

/// One scope rule. Exactly one of the two forms should be set; a rule with
/// neither matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeRestriction {
    /// Scopes allowed verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub literals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_role: Option<ClusterRoleScopeRestriction>,
}

impl ScopeRestriction {
    pub fn literals<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            literals: values.into_iter().map(Into::into).collect(),
            cluster_role: None,
        }
    }

    pub fn cluster_role(restriction: ClusterRoleScopeRestriction) -> Self {
        Self {
            literals: Vec::new(),
            cluster_role: Some(restriction),
        }
    }
}

/// Constrains `role:<name>:<namespace>[:!]` scopes. `*` in either list
/// matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleScopeRestriction {
    pub role_names: Vec<String>,
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub allow_escalation: bool,
}
