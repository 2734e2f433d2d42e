//! Label/field selection over authorize tokens.

use authorize_token::models::{AuthorizeToken, OAuthClient, Object, ObjectMeta};
use authorize_token::registry::{get_attrs, matcher};
use authorize_token::selection::{FieldSelector, LabelSelector};

fn token(name: &str, client: &str, user: &str, labels: &[(&str, &str)]) -> AuthorizeToken {
    let mut metadata = ObjectMeta::named(name);
    for (k, v) in labels {
        metadata.labels.insert(k.to_string(), v.to_string());
    }
    AuthorizeToken {
        metadata,
        client_name: client.into(),
        user_name: user.into(),
        user_uid: format!("uid-{user}"),
        ..Default::default()
    }
}

fn fixtures() -> Vec<AuthorizeToken> {
    vec![
        token("t1", "console", "alice", &[("env", "prod")]),
        token("t2", "console", "bob", &[("env", "staging")]),
        token("t3", "cli", "alice", &[("env", "prod"), ("consumed", "true")]),
        token("t4", "cli", "carol", &[]),
    ]
}

fn select(label: &str, field: &str) -> Vec<String> {
    let pred = matcher(LabelSelector::parse(label).unwrap(), FieldSelector::parse(field).unwrap());
    fixtures()
        .into_iter()
        .filter(|t| pred.matches(t).unwrap())
        .map(|t| t.metadata.name)
        .collect()
}

#[test]
fn test_attrs_expose_labels_and_selectable_fields() {
    let tok = token("t1", "console", "alice", &[("env", "prod")]);
    let (labels, fields) = get_attrs(&tok).unwrap();

    assert_eq!(labels, tok.metadata.labels);
    assert_eq!(fields.get("metadata.name").map(String::as_str), Some("t1"));
    assert_eq!(fields.get("clientName").map(String::as_str), Some("console"));
    assert_eq!(fields.get("userName").map(String::as_str), Some("alice"));
    assert_eq!(fields.get("userUID").map(String::as_str), Some("uid-alice"));
}

#[test]
fn test_attrs_reject_other_kinds() {
    let client = OAuthClient::named("console");
    let err = get_attrs(&client as &dyn Object).unwrap_err();
    assert_eq!(err.expected, "OAuthAuthorizeToken");
    assert_eq!(err.to_string(), "not a OAuthAuthorizeToken: got OAuthClient");
}

#[test]
fn test_empty_selectors_match_all() {
    assert_eq!(select("", ""), vec!["t1", "t2", "t3", "t4"]);
}

#[test]
fn test_field_selection() {
    assert_eq!(select("", "clientName=console"), vec!["t1", "t2"]);
    assert_eq!(select("", "userName=alice,clientName!=console"), vec!["t3"]);
}

#[test]
fn test_label_selection() {
    assert_eq!(select("env=prod", ""), vec!["t1", "t3"]);
    assert_eq!(select("env in (prod,staging),!consumed", ""), vec!["t1", "t2"]);
    assert_eq!(select("env notin (prod)", ""), vec!["t2", "t4"]);
}

#[test]
fn test_combined_selection() {
    assert_eq!(select("env=prod", "clientName=cli"), vec!["t3"]);
    assert!(select("env=staging", "userName=alice").is_empty());
}
