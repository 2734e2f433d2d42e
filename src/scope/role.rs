use crate::errors::ScopeViolation;

pub const ROLE_SCOPE_PREFIX: &str = "role:";
const ESCALATING_SUFFIX: &str = ":!";

/// A parsed `role:<role>:<namespace>[:!]` scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleScope {
    pub role: String,
    /// `*` means every namespace.
    pub namespace: String,
    /// Set by a trailing `:!`, which grants escalating permissions.
    pub escalating: bool,
}

impl RoleScope {
    /// Role names may contain colons, namespaces can't, so the namespace is
    /// everything after the last colon.
    pub fn parse(scope: &str) -> Result<Self, ScopeViolation> {
        let malformed = || ScopeViolation::MalformedRoleScope {
            scope: scope.to_string(),
        };

        let rest = scope.strip_prefix(ROLE_SCOPE_PREFIX).ok_or_else(malformed)?;
        let (rest, escalating) = match rest.strip_suffix(ESCALATING_SUFFIX) {
            Some(trimmed) => (trimmed, true),
            None => (rest, false),
        };

        let (role, namespace) = rest.rsplit_once(':').ok_or_else(malformed)?;
        if role.is_empty() || namespace.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            role: role.to_string(),
            namespace: namespace.to_string(),
            escalating,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_scope() {
        let parsed = RoleScope::parse("role:view:team-a").unwrap();
        assert_eq!(parsed.role, "view");
        assert_eq!(parsed.namespace, "team-a");
        assert!(!parsed.escalating);
    }

    #[test]
    fn test_parse_escalating_and_colon_role() {
        let parsed = RoleScope::parse("role:system:image-puller:*:!").unwrap();
        assert_eq!(parsed.role, "system:image-puller");
        assert_eq!(parsed.namespace, "*");
        assert!(parsed.escalating);
    }

    #[test]
    fn test_parse_malformed() {
        for bad in ["role:", "role:view", "role:view:", "role::ns", "user:info"] {
            assert!(
                matches!(RoleScope::parse(bad), Err(ScopeViolation::MalformedRoleScope { .. })),
                "expected {bad} to be malformed"
            );
        }
    }
}
