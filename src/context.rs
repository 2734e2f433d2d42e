use uuid::Uuid;

/// Per-request data the registry passes through to strategies.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// Authenticated caller, if known.
    pub user: Option<String>,
    /// Namespace from the request path. Ignored for cluster-scoped kinds.
    pub namespace: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user: None,
            namespace: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
