//! Scope restriction evaluation.
//!
//! A client with no restrictions may request anything. Otherwise each
//! requested scope must be accepted by at least one of the client's rules.

pub mod role;

use crate::errors::{ScopeRestrictionError, ScopeViolation};
use crate::models::{ClusterRoleScopeRestriction, OAuthClient, ScopeRestriction};

pub use role::{RoleScope, ROLE_SCOPE_PREFIX};

/// Check `scopes` against `client`'s restrictions.
///
/// Violations are collected per scope so the caller sees every offending
/// scope in one error.
pub fn validate_scope_restrictions(
    client: &OAuthClient,
    scopes: &[String],
) -> Result<(), ScopeRestrictionError> {
    if client.scope_restrictions.is_empty() {
        return Ok(());
    }
    if scopes.is_empty() {
        return Err(ScopeRestrictionError::Unscoped {
            client: client.name().to_string(),
        });
    }

    let violations: Vec<ScopeViolation> = scopes
        .iter()
        .filter_map(|scope| check_scope(&client.scope_restrictions, scope).err())
        .flatten()
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ScopeRestrictionError::Denied { violations })
    }
}

/// First matching rule wins; failures from non-matching rules are only
/// reported when nothing matched.
fn check_scope(restrictions: &[ScopeRestriction], scope: &str) -> Result<(), Vec<ScopeViolation>> {
    let mut violations = Vec::new();

    for restriction in restrictions {
        if !restriction.literals.is_empty() {
            match check_literals(scope, &restriction.literals) {
                Ok(()) => return Ok(()),
                Err(v) => violations.push(v),
            }
            continue;
        }

        if let Some(cluster_role) = &restriction.cluster_role {
            match check_cluster_role(scope, cluster_role) {
                Ok(()) => return Ok(()),
                Err(v) => violations.push(v),
            }
        }
    }

    if violations.is_empty() {
        violations.push(ScopeViolation::NoMatchingRestriction {
            scope: scope.to_string(),
        });
    }
    Err(violations)
}

fn check_literals(scope: &str, literals: &[String]) -> Result<(), ScopeViolation> {
    if literals.iter().any(|l| l == scope) {
        return Ok(());
    }
    Err(ScopeViolation::NotInLiterals {
        scope: scope.to_string(),
        allowed: literals.to_vec(),
    })
}

fn check_cluster_role(scope: &str, restriction: &ClusterRoleScopeRestriction) -> Result<(), ScopeViolation> {
    if !scope.starts_with(ROLE_SCOPE_PREFIX) {
        return Err(ScopeViolation::NotRoleScope {
            scope: scope.to_string(),
        });
    }
    let parsed = RoleScope::parse(scope)?;

    if !matches_any(&restriction.role_names, &parsed.role) {
        return Err(ScopeViolation::RoleNotAllowed {
            role: parsed.role,
            allowed: restriction.role_names.clone(),
        });
    }
    if !matches_any(&restriction.namespaces, &parsed.namespace) {
        return Err(ScopeViolation::NamespaceNotAllowed {
            namespace: parsed.namespace,
            allowed: restriction.namespaces.clone(),
        });
    }
    if parsed.escalating && !restriction.allow_escalation {
        return Err(ScopeViolation::EscalationNotAllowed {
            scope: scope.to_string(),
        });
    }
    Ok(())
}

fn matches_any(allowed: &[String], value: &str) -> bool {
    allowed.iter().any(|a| a == "*" || a == value)
}
