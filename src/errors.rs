use thiserror::Error;

use crate::validation::ErrorList;

/// Failure resolving a client by name.
#[derive(Debug, Error)]
pub enum ClientLookupError {
    #[error("oauthclient \"{0}\" not found")]
    NotFound(String),

    #[error("client lookup failed: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ClientLookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientLookupError::NotFound(_))
    }
}

/// Why a single requested scope failed a client's restrictions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeViolation {
    #[error("{scope} not found in [{}]", .allowed.join(", "))]
    NotInLiterals { scope: String, allowed: Vec<String> },

    #[error("{scope} is not a role scope")]
    NotRoleScope { scope: String },

    #[error("bad format for role scope: {scope}")]
    MalformedRoleScope { scope: String },

    #[error("{role} does not match [{}]", .allowed.join(", "))]
    RoleNotAllowed { role: String, allowed: Vec<String> },

    #[error("{namespace} does not match [{}]", .allowed.join(", "))]
    NamespaceNotAllowed { namespace: String, allowed: Vec<String> },

    #[error("{scope} is not allowed to escalate")]
    EscalationNotAllowed { scope: String },

    #[error("{scope} did not match any scope restriction")]
    NoMatchingRestriction { scope: String },
}

/// A client's scope policy rejected the requested scopes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeRestrictionError {
    #[error("{client} may not request unscoped tokens")]
    Unscoped { client: String },

    #[error("{}", join_violations(.violations))]
    Denied { violations: Vec<ScopeViolation> },
}

fn join_violations(violations: &[ScopeViolation]) -> String {
    match violations {
        [single] => single.to_string(),
        many => format!(
            "[{}]",
            many.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// A kind-specific operation was handed an object of another kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a {expected}: got {found}")]
pub struct TypeMismatchError {
    pub expected: &'static str,
    pub found: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorParseError {
    #[error("invalid selector \"{selector}\": {reason}")]
    Invalid { selector: String, reason: String },

    #[error("invalid label key \"{key}\": {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid label value \"{value}\": {reason}")]
    InvalidValue { value: String, reason: String },
}

/// Outcome of the registry-side create/update sequence.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("{kind} \"{name}\" is invalid: {errors}")]
    Invalid {
        kind: &'static str,
        name: String,
        errors: ErrorList,
    },

    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: &'static str, name: String },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("operation cannot be fulfilled on {kind} \"{name}\": {detail}")]
    Conflict {
        kind: &'static str,
        name: String,
        detail: String,
    },
}

impl AdmissionError {
    /// Field errors carried by an `Invalid` rejection.
    pub fn field_errors(&self) -> Option<&ErrorList> {
        match self {
            AdmissionError::Invalid { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_error_messages() {
        let single = ScopeRestrictionError::Denied {
            violations: vec![ScopeViolation::NotInLiterals {
                scope: "admin".into(),
                allowed: vec!["read".into(), "write".into()],
            }],
        };
        assert_eq!(single.to_string(), "admin not found in [read, write]");

        let many = ScopeRestrictionError::Denied {
            violations: vec![
                ScopeViolation::NotRoleScope { scope: "admin".into() },
                ScopeViolation::EscalationNotAllowed { scope: "role:admin:*:!".into() },
            ],
        };
        assert_eq!(
            many.to_string(),
            "[admin is not a role scope, role:admin:*:! is not allowed to escalate]"
        );

        let unscoped = ScopeRestrictionError::Unscoped { client: "console".into() };
        assert_eq!(unscoped.to_string(), "console may not request unscoped tokens");
    }

    #[test]
    fn test_lookup_error_kinds() {
        assert!(ClientLookupError::NotFound("c2".into()).is_not_found());
        assert_eq!(
            ClientLookupError::NotFound("c2".into()).to_string(),
            "oauthclient \"c2\" not found"
        );
        let internal = ClientLookupError::from(anyhow::anyhow!("connection reset"));
        assert!(!internal.is_not_found());
        assert_eq!(internal.to_string(), "client lookup failed: connection reset");
    }
}
