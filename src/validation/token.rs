use once_cell::sync::Lazy;
use regex::Regex;

use super::field::{ErrorList, FieldError, FieldPath};
use super::meta::{immutable, validate_object_meta, validate_object_meta_update, validate_path_segment_name};
use crate::models::AuthorizeToken;

/// Token names are the secret itself, so they must carry enough entropy.
pub const MIN_TOKEN_LENGTH: usize = 32;

pub const CODE_CHALLENGE_METHOD_PLAIN: &str = "plain";
pub const CODE_CHALLENGE_METHOD_S256: &str = "S256";
const CODE_CHALLENGE_METHODS: &[&str] = &[CODE_CHALLENGE_METHOD_PLAIN, CODE_CHALLENGE_METHOD_S256];

// RFC 7636 §4.2
static CODE_CHALLENGE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-._~]{43,128}$").unwrap());

pub fn validate_token_name(name: &str, prefix: bool) -> Vec<String> {
    let mut msgs = validate_path_segment_name(name, prefix);
    if name.len() < MIN_TOKEN_LENGTH {
        msgs.push(format!("must be at least {} characters long", MIN_TOKEN_LENGTH));
    }
    msgs
}

pub fn validate_client_name_field(value: &str, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if value.is_empty() {
        errs.push(FieldError::required(path.clone(), ""));
        return errs;
    }
    for msg in validate_path_segment_name(value, false) {
        errs.push(FieldError::invalid(path.clone(), value, msg));
    }
    errs
}

pub fn validate_user_name_field(value: &str, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if value.is_empty() {
        errs.push(FieldError::required(path.clone(), ""));
        return errs;
    }
    for msg in validate_path_segment_name(value, false) {
        errs.push(FieldError::invalid(path.clone(), value, msg));
    }
    if value == "~" {
        errs.push(FieldError::invalid(path.clone(), value, "may not be '~'"));
    }
    errs
}

/// Scopes are space-delimited on the wire, so a single scope can't contain
/// whitespace.
pub fn validate_scopes(scopes: &[String], path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    for (i, scope) in scopes.iter().enumerate() {
        let scope_path = path.index(i);
        if scope.is_empty() {
            errs.push(FieldError::required(scope_path, "scope may not be empty"));
            continue;
        }
        if scope.chars().any(|c| c.is_whitespace() || c.is_control()) {
            errs.push(FieldError::invalid(
                scope_path.clone(),
                scope,
                "may not contain whitespace or control characters",
            ));
        }
        if scopes[..i].contains(scope) {
            errs.push(FieldError::duplicate(scope_path, scope));
        }
    }
    errs
}

fn validate_redirect_uri(value: &str, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    if value.is_empty() {
        return errs;
    }
    match url::Url::parse(value) {
        Ok(parsed) => {
            if parsed.fragment().is_some() {
                errs.push(FieldError::invalid(path.clone(), value, "may not contain a fragment"));
            }
        }
        Err(e) => errs.push(FieldError::invalid(
            path.clone(),
            value,
            format!("must be an absolute URI: {}", e),
        )),
    }
    errs
}

fn validate_code_challenge(token: &AuthorizeToken) -> ErrorList {
    let mut errs = ErrorList::new();
    let challenge_path = FieldPath::new("codeChallenge");
    let method_path = FieldPath::new("codeChallengeMethod");

    match (token.code_challenge.is_empty(), token.code_challenge_method.is_empty()) {
        (true, true) => {}
        (false, true) => errs.push(FieldError::required(
            method_path,
            "required when codeChallenge is set",
        )),
        (true, false) => errs.push(FieldError::required(
            challenge_path,
            "required when codeChallengeMethod is set",
        )),
        (false, false) => {
            if !CODE_CHALLENGE_METHODS.contains(&token.code_challenge_method.as_str()) {
                errs.push(FieldError::not_supported(
                    method_path,
                    &token.code_challenge_method,
                    CODE_CHALLENGE_METHODS,
                ));
            }
            if !CODE_CHALLENGE_REGEX.is_match(&token.code_challenge) {
                errs.push(FieldError::invalid(
                    challenge_path,
                    &token.code_challenge,
                    "must be 43-128 characters from [A-Za-z0-9-._~]",
                ));
            }
        }
    }
    errs
}

/// Structural checks for a new authorize token.
pub fn validate_authorize_token(token: &AuthorizeToken) -> ErrorList {
    let mut errs = validate_object_meta(
        &token.metadata,
        false,
        validate_token_name,
        &FieldPath::new("metadata"),
    );
    errs.append(validate_client_name_field(&token.client_name, &FieldPath::new("clientName")));
    errs.append(validate_user_name_field(&token.user_name, &FieldPath::new("userName")));
    errs.append(validate_scopes(&token.scopes, &FieldPath::new("scopes")));

    if token.user_uid.is_empty() {
        errs.push(FieldError::required(FieldPath::new("userUID"), ""));
    }
    if token.expires_in < 0 {
        errs.push(FieldError::invalid(
            FieldPath::new("expiresIn"),
            token.expires_in,
            "must be greater than or equal to 0",
        ));
    }
    errs.append(validate_redirect_uri(&token.redirect_uri, &FieldPath::new("redirectURI")));
    errs.append(validate_code_challenge(token));
    errs
}

/// Structural checks for an update: metadata identity is preserved, the new
/// object is itself valid, and nothing past the metadata changed.
pub fn validate_authorize_token_update(new: &AuthorizeToken, old: &AuthorizeToken) -> ErrorList {
    let mut errs = validate_object_meta_update(&new.metadata, &old.metadata, &FieldPath::new("metadata"));
    errs.append(validate_authorize_token(new));

    errs.extend(immutable(&new.client_name, &old.client_name, FieldPath::new("clientName")));
    errs.extend(immutable(&new.user_name, &old.user_name, FieldPath::new("userName")));
    errs.extend(immutable(&new.user_uid, &old.user_uid, FieldPath::new("userUID")));
    errs.extend(immutable(&new.scopes, &old.scopes, FieldPath::new("scopes")));
    errs.extend(immutable(&new.expires_in, &old.expires_in, FieldPath::new("expiresIn")));
    errs.extend(immutable(&new.redirect_uri, &old.redirect_uri, FieldPath::new("redirectURI")));
    errs.extend(immutable(&new.state, &old.state, FieldPath::new("state")));
    errs.extend(immutable(&new.code_challenge, &old.code_challenge, FieldPath::new("codeChallenge")));
    errs.extend(immutable(
        &new.code_challenge_method,
        &old.code_challenge_method,
        FieldPath::new("codeChallengeMethod"),
    ));
    errs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObjectMeta;
    use crate::validation::ErrorType;

    fn valid_token() -> AuthorizeToken {
        AuthorizeToken {
            metadata: ObjectMeta::named("a".repeat(MIN_TOKEN_LENGTH)),
            client_name: "console".into(),
            expires_in: 300,
            scopes: vec!["user:info".into()],
            redirect_uri: "https://console.example.com/oauth/callback".into(),
            state: "xyz".into(),
            user_name: "alice".into(),
            user_uid: "8c3f5a3e".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_token_passes() {
        assert!(validate_authorize_token(&valid_token()).is_empty());
    }

    #[test]
    fn test_empty_scopes_pass_structural_checks() {
        let mut token = valid_token();
        token.scopes.clear();
        assert!(validate_authorize_token(&token).is_empty());
    }

    #[test]
    fn test_short_token_name_rejected() {
        let mut token = valid_token();
        token.metadata.name = "short".into();
        let errs = validate_authorize_token(&token);
        assert_eq!(errs.on_field("metadata.name").count(), 1);
    }

    #[test]
    fn test_missing_required_fields_accumulate() {
        let mut token = valid_token();
        token.client_name.clear();
        token.user_name.clear();
        token.user_uid.clear();
        let errs = validate_authorize_token(&token);
        assert_eq!(errs.len(), 3);
        assert!(errs.iter().all(|e| e.error_type == ErrorType::Required));
    }

    #[test]
    fn test_namespace_forbidden() {
        let mut token = valid_token();
        token.metadata.namespace = "default".into();
        let errs = validate_authorize_token(&token);
        assert_eq!(errs.on_field("metadata.namespace").count(), 1);
    }

    #[test]
    fn test_bad_scopes() {
        let mut token = valid_token();
        token.scopes = vec!["".into(), "user:info".into(), "a b".into(), "user:info".into()];
        let errs = validate_authorize_token(&token);
        assert_eq!(errs.on_field("scopes[0]").count(), 1);
        assert_eq!(errs.on_field("scopes[2]").count(), 1);
        assert_eq!(errs.on_field("scopes[3]").next().unwrap().error_type, ErrorType::Duplicate);
    }

    #[test]
    fn test_negative_expiry_rejected() {
        let mut token = valid_token();
        token.expires_in = -1;
        assert_eq!(validate_authorize_token(&token).on_field("expiresIn").count(), 1);
    }

    #[test]
    fn test_redirect_uri_must_be_absolute_without_fragment() {
        let mut token = valid_token();
        token.redirect_uri = "/relative/callback".into();
        assert_eq!(validate_authorize_token(&token).on_field("redirectURI").count(), 1);

        token.redirect_uri = "https://console.example.com/cb#frag".into();
        assert_eq!(validate_authorize_token(&token).on_field("redirectURI").count(), 1);
    }

    #[test]
    fn test_pkce_fields() {
        let mut token = valid_token();
        token.code_challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM".into();
        let errs = validate_authorize_token(&token);
        assert_eq!(errs.on_field("codeChallengeMethod").count(), 1);

        token.code_challenge_method = CODE_CHALLENGE_METHOD_S256.into();
        assert!(validate_authorize_token(&token).is_empty());

        token.code_challenge_method = "md5".into();
        let errs = validate_authorize_token(&token);
        assert_eq!(errs.on_field("codeChallengeMethod").next().unwrap().error_type, ErrorType::NotSupported);

        token.code_challenge = "too-short".into();
        token.code_challenge_method = CODE_CHALLENGE_METHOD_PLAIN.into();
        assert_eq!(validate_authorize_token(&token).on_field("codeChallenge").count(), 1);
    }

    #[test]
    fn test_update_allows_label_changes() {
        let old = valid_token();
        let mut new = old.clone();
        new.metadata.labels.insert("consumed".into(), "true".into());
        assert!(validate_authorize_token_update(&new, &old).is_empty());
    }

    #[test]
    fn test_update_rejects_client_name_change() {
        let old = valid_token();
        let mut new = old.clone();
        new.client_name = "other".into();
        let errs = validate_authorize_token_update(&new, &old);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.on_field("clientName").count(), 1);
        assert!(errs.to_string().contains("field is immutable"));
    }

    #[test]
    fn test_update_rejects_scope_and_identity_changes() {
        let old = valid_token();
        let mut new = old.clone();
        new.scopes.push("user:full".into());
        new.user_uid = "other-uid".into();
        let errs = validate_authorize_token_update(&new, &old);
        assert_eq!(errs.on_field("scopes").count(), 1);
        assert_eq!(errs.on_field("userUID").count(), 1);
    }
}
