use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::SelectorParseError;
use crate::validation::meta::{is_qualified_name, is_valid_label_value};

pub type LabelSet = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// One clause of a label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub op: Operator,
    pub values: Vec<String>,
}

impl Requirement {
    pub fn new(key: &str, op: Operator, values: Vec<String>) -> Result<Self, SelectorParseError> {
        if let Some(reason) = is_qualified_name(key).into_iter().next() {
            return Err(SelectorParseError::InvalidKey {
                key: key.to_string(),
                reason,
            });
        }
        for value in &values {
            if let Some(reason) = is_valid_label_value(value).into_iter().next() {
                return Err(SelectorParseError::InvalidValue {
                    value: value.clone(),
                    reason,
                });
            }
        }
        Ok(Self {
            key: key.to_string(),
            op,
            values,
        })
    }

    /// Negative operators match objects that lack the key entirely.
    pub fn matches(&self, labels: &LabelSet) -> bool {
        let value = labels.get(&self.key);
        match self.op {
            Operator::Equals | Operator::In => value.is_some_and(|v| self.values.contains(v)),
            Operator::NotEquals | Operator::NotIn => value.map_or(true, |v| !self.values.contains(v)),
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Operator::Equals => write!(f, "{}={}", self.key, self.values[0]),
            Operator::NotEquals => write!(f, "{}!={}", self.key, self.values[0]),
            Operator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, self.values.join(",")),
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}

/// Conjunction of label requirements.
///
/// Grammar: `k=v`, `k==v`, `k!=v`, `k in (a,b)`, `k notin (a,b)`, `k`,
/// `!k`, joined by commas. The empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn everything() -> Self {
        Self::default()
    }

    /// Equality-only selector built from a label set.
    pub fn from_set(set: &LabelSet) -> Result<Self, SelectorParseError> {
        let requirements = set
            .iter()
            .map(|(k, v)| Requirement::new(k, Operator::Equals, vec![v.clone()]))
            .collect::<Result<_, _>>()?;
        Ok(Self { requirements })
    }

    pub fn parse(selector: &str) -> Result<Self, SelectorParseError> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Ok(Self::everything());
        }
        let requirements = split_terms(selector)?
            .into_iter()
            .map(|term| parse_term(selector, term.trim()))
            .collect::<Result<_, _>>()?;
        Ok(Self { requirements })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn matches(&self, labels: &LabelSet) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl FromStr for LabelSelector {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.requirements.iter().map(ToString::to_string).collect();
        f.write_str(&terms.join(","))
    }
}

// ── Parsing ──────────────────────────────────────────────────

fn invalid(selector: &str, reason: impl Into<String>) -> SelectorParseError {
    SelectorParseError::Invalid {
        selector: selector.to_string(),
        reason: reason.into(),
    }
}

/// Split on commas outside parentheses.
fn split_terms(selector: &str) -> Result<Vec<&str>, SelectorParseError> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in selector.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| invalid(selector, "unbalanced ')'"))?;
            }
            ',' if depth == 0 => {
                terms.push(&selector[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(invalid(selector, "unbalanced '('"));
    }
    terms.push(&selector[start..]);
    Ok(terms)
}

fn parse_term(selector: &str, term: &str) -> Result<Requirement, SelectorParseError> {
    if term.is_empty() {
        return Err(invalid(selector, "empty term"));
    }

    if let Some(key) = term.strip_prefix('!') {
        return Requirement::new(key.trim(), Operator::DoesNotExist, Vec::new());
    }

    if let Some(open) = term.find('(') {
        return parse_set_term(selector, term, open);
    }

    if let Some((key, value)) = term.split_once("!=") {
        return Requirement::new(key.trim(), Operator::NotEquals, vec![value.trim().to_string()]);
    }
    if let Some((key, value)) = term.split_once("==").or_else(|| term.split_once('=')) {
        return Requirement::new(key.trim(), Operator::Equals, vec![value.trim().to_string()]);
    }

    if term.split_whitespace().count() != 1 {
        return Err(invalid(selector, format!("unexpected term \"{}\"", term)));
    }
    Requirement::new(term, Operator::Exists, Vec::new())
}

fn parse_set_term(selector: &str, term: &str, open: usize) -> Result<Requirement, SelectorParseError> {
    let inner = term[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| invalid(selector, format!("expected ')' at end of \"{}\"", term)))?;

    let head: Vec<&str> = term[..open].split_whitespace().collect();
    let (key, op) = match head.as_slice() {
        [key, "in"] => (*key, Operator::In),
        [key, "notin"] => (*key, Operator::NotIn),
        _ => return Err(invalid(selector, format!("expected \"<key> in|notin (...)\", got \"{}\"", term))),
    };

    let values: Vec<String> = inner.split(',').map(|v| v.trim().to_string()).collect();
    if values.iter().all(String::is_empty) {
        return Err(invalid(selector, format!("\"{}\" requires at least one value", term)));
    }
    Requirement::new(key, op, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> LabelSet {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        let sel = LabelSelector::parse("").unwrap();
        assert!(sel.is_empty());
        assert!(sel.matches(&LabelSet::new()));
        assert!(sel.matches(&labels(&[("app", "web")])));
    }

    #[test]
    fn test_equality() {
        let sel = LabelSelector::parse("app=web,tier==frontend").unwrap();
        assert!(sel.matches(&labels(&[("app", "web"), ("tier", "frontend")])));
        assert!(!sel.matches(&labels(&[("app", "web")])));
        assert!(!sel.matches(&labels(&[("app", "db"), ("tier", "frontend")])));
    }

    #[test]
    fn test_not_equals_matches_missing_key() {
        let sel = LabelSelector::parse("app!=web").unwrap();
        assert!(sel.matches(&LabelSet::new()));
        assert!(sel.matches(&labels(&[("app", "db")])));
        assert!(!sel.matches(&labels(&[("app", "web")])));
    }

    #[test]
    fn test_set_based() {
        let sel = LabelSelector::parse("env in (prod, staging),tier notin (cache)").unwrap();
        assert_eq!(sel.requirements().len(), 2);
        assert!(sel.matches(&labels(&[("env", "prod")])));
        assert!(sel.matches(&labels(&[("env", "staging"), ("tier", "web")])));
        assert!(!sel.matches(&labels(&[("env", "dev")])));
        assert!(!sel.matches(&labels(&[("env", "prod"), ("tier", "cache")])));
    }

    #[test]
    fn test_exists() {
        let sel = LabelSelector::parse("consumed,!revoked").unwrap();
        assert!(sel.matches(&labels(&[("consumed", "true")])));
        assert!(!sel.matches(&labels(&[("consumed", "true"), ("revoked", "")])));
        assert!(!sel.matches(&LabelSet::new()));
    }

    #[test]
    fn test_display_round_trips_canonical_form() {
        let sel = LabelSelector::parse("app == web, env in (a, b), !gone").unwrap();
        assert_eq!(sel.to_string(), "app=web,env in (a,b),!gone");
    }

    #[test]
    fn test_from_set() {
        let sel = LabelSelector::from_set(&labels(&[("app", "web")])).unwrap();
        assert_eq!(sel.to_string(), "app=web");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(LabelSelector::parse("app=web,,x"), Err(SelectorParseError::Invalid { .. })));
        assert!(matches!(LabelSelector::parse("env in (a"), Err(SelectorParseError::Invalid { .. })));
        assert!(matches!(LabelSelector::parse("env in ()"), Err(SelectorParseError::Invalid { .. })));
        assert!(matches!(LabelSelector::parse("env within (a)"), Err(SelectorParseError::Invalid { .. })));
        assert!(matches!(LabelSelector::parse("bad key=x"), Err(SelectorParseError::InvalidKey { .. })));
        assert!(matches!(LabelSelector::parse("app=bad value"), Err(SelectorParseError::InvalidValue { .. })));
    }
}
