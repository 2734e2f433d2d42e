use once_cell::sync::Lazy;
use regex::Regex;

use super::field::{ErrorList, FieldError, FieldPath};
use crate::models::ObjectMeta;

const QUALIFIED_NAME_MAX_LEN: usize = 63;
const LABEL_VALUE_MAX_LEN: usize = 63;
const DNS_SUBDOMAIN_MAX_LEN: usize = 253;
/// Upper bound on the summed size of all annotation keys and values.
pub const TOTAL_ANNOTATION_SIZE_LIMIT: usize = 256 * 1024;

static QUALIFIED_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").unwrap());

static DNS_SUBDOMAIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap()
});

/// Name validator for a kind: `(name, is_prefix) -> problems`.
pub type ValidateNameFn = fn(&str, bool) -> Vec<String>;

/// Names that end up as a single URL path segment.
pub fn validate_path_segment_name(name: &str, prefix: bool) -> Vec<String> {
    let mut msgs = Vec::new();
    if !prefix && (name == "." || name == "..") {
        msgs.push(format!("may not be '{}'", name));
    }
    for illegal in ["/", "%"] {
        if name.contains(illegal) {
            msgs.push(format!("may not contain '{}'", illegal));
        }
    }
    msgs
}

/// `[prefix/]name`, used for label and annotation keys.
pub fn is_qualified_name(value: &str) -> Vec<String> {
    let mut msgs = Vec::new();
    let (prefix, name) = match value.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, value),
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            msgs.push("prefix part must be non-empty".to_string());
        } else {
            msgs.extend(is_dns_subdomain(prefix).into_iter().map(|m| format!("prefix part {}", m)));
        }
    }

    if name.is_empty() {
        msgs.push("name part must be non-empty".to_string());
    } else if name.len() > QUALIFIED_NAME_MAX_LEN {
        msgs.push(format!("name part must be no more than {} characters", QUALIFIED_NAME_MAX_LEN));
    }
    if !name.is_empty() && !QUALIFIED_NAME_REGEX.is_match(name) {
        msgs.push(
            "name part must consist of alphanumeric characters, '-', '_' or '.', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    if value.matches('/').count() > 1 {
        msgs.push("may contain at most one '/'".to_string());
    }
    msgs
}

pub fn is_dns_subdomain(value: &str) -> Vec<String> {
    let mut msgs = Vec::new();
    if value.len() > DNS_SUBDOMAIN_MAX_LEN {
        msgs.push(format!("must be no more than {} characters", DNS_SUBDOMAIN_MAX_LEN));
    }
    if !DNS_SUBDOMAIN_REGEX.is_match(value) {
        msgs.push(
            "must consist of lower case alphanumeric characters, '-' or '.', \
             and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    msgs
}

pub fn is_valid_label_value(value: &str) -> Vec<String> {
    let mut msgs = Vec::new();
    if value.is_empty() {
        return msgs;
    }
    if value.len() > LABEL_VALUE_MAX_LEN {
        msgs.push(format!("must be no more than {} characters", LABEL_VALUE_MAX_LEN));
    }
    if !QUALIFIED_NAME_REGEX.is_match(value) {
        msgs.push(
            "a valid label must be an empty string or consist of alphanumeric characters, \
             '-', '_' or '.', and must start and end with an alphanumeric character"
                .to_string(),
        );
    }
    msgs
}

pub fn validate_labels(labels: &std::collections::BTreeMap<String, String>, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    for (key, value) in labels {
        for msg in is_qualified_name(key) {
            errs.push(FieldError::invalid(path.clone(), key, msg));
        }
        for msg in is_valid_label_value(value) {
            errs.push(FieldError::invalid(path.key(key), value, msg));
        }
    }
    errs
}

pub fn validate_annotations(
    annotations: &std::collections::BTreeMap<String, String>,
    path: &FieldPath,
) -> ErrorList {
    let mut errs = ErrorList::new();
    let mut total = 0usize;
    for (key, value) in annotations {
        for msg in is_qualified_name(&key.to_lowercase()) {
            errs.push(FieldError::invalid(path.clone(), key, msg));
        }
        total += key.len() + value.len();
    }
    if total > TOTAL_ANNOTATION_SIZE_LIMIT {
        errs.push(FieldError::too_long(path.clone(), TOTAL_ANNOTATION_SIZE_LIMIT));
    }
    errs
}

/// Validate metadata on create.
///
/// `requires_namespace` is false for cluster-scoped kinds, in which case any
/// namespace is forbidden.
pub fn validate_object_meta(
    meta: &ObjectMeta,
    requires_namespace: bool,
    name_fn: ValidateNameFn,
    path: &FieldPath,
) -> ErrorList {
    let mut errs = ErrorList::new();

    if !meta.generate_name.is_empty() {
        for msg in name_fn(&meta.generate_name, true) {
            errs.push(FieldError::invalid(path.child("generateName"), &meta.generate_name, msg));
        }
    }
    if meta.name.is_empty() {
        errs.push(FieldError::required(path.child("name"), "name or generateName is required"));
    } else {
        for msg in name_fn(&meta.name, false) {
            errs.push(FieldError::invalid(path.child("name"), &meta.name, msg));
        }
    }

    if requires_namespace {
        if meta.namespace.is_empty() {
            errs.push(FieldError::required(path.child("namespace"), ""));
        } else {
            for msg in is_dns_subdomain(&meta.namespace) {
                errs.push(FieldError::invalid(path.child("namespace"), &meta.namespace, msg));
            }
        }
    } else if !meta.namespace.is_empty() {
        errs.push(FieldError::forbidden(path.child("namespace"), "not allowed on this type"));
    }

    errs.append(validate_labels(&meta.labels, &path.child("labels")));
    errs.append(validate_annotations(&meta.annotations, &path.child("annotations")));
    errs
}

/// Validate metadata changes on update. Identity fields may not change.
///
/// Labels and annotations are not checked here; callers re-run
/// [`validate_object_meta`] on the new object.
pub fn validate_object_meta_update(new: &ObjectMeta, old: &ObjectMeta, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();

    errs.extend(immutable(&new.name, &old.name, path.child("name")));
    errs.extend(immutable(&new.namespace, &old.namespace, path.child("namespace")));
    if new.uid != old.uid {
        errs.push(FieldError::invalid(
            path.child("uid"),
            new.uid.map(|u| u.to_string()).unwrap_or_default(),
            "field is immutable",
        ));
    }
    if new.creation_timestamp != old.creation_timestamp {
        errs.push(FieldError::invalid(
            path.child("creationTimestamp"),
            new.creation_timestamp
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            "field is immutable",
        ));
    }
    errs
}

/// `Invalid: field is immutable` when `new != old`.
pub fn immutable<T>(new: &T, old: &T, path: FieldPath) -> Option<FieldError>
where
    T: PartialEq + std::fmt::Debug,
{
    if new == old {
        return None;
    }
    Some(FieldError::invalid(path, format!("{:?}", new), "field is immutable"))
}
