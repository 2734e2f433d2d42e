use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::SelectorParseError;

pub type FieldSet = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOperator {
    Equals,
    NotEquals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequirement {
    pub field: String,
    pub op: FieldOperator,
    pub value: String,
}

impl FieldRequirement {
    /// A field missing from the set compares as the empty string.
    pub fn matches(&self, fields: &FieldSet) -> bool {
        let actual = fields.get(&self.field).map(String::as_str).unwrap_or("");
        match self.op {
            FieldOperator::Equals => actual == self.value,
            FieldOperator::NotEquals => actual != self.value,
        }
    }
}

/// Conjunction of `field=value` / `field==value` / `field!=value` terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    requirements: Vec<FieldRequirement>,
}

impl FieldSelector {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn one_term_equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            requirements: vec![FieldRequirement {
                field: field.into(),
                op: FieldOperator::Equals,
                value: value.into(),
            }],
        }
    }

    pub fn parse(selector: &str) -> Result<Self, SelectorParseError> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Ok(Self::everything());
        }

        let mut requirements = Vec::new();
        for term in selector.split(',') {
            let term = term.trim();
            let (field, op, value) = if let Some((f, v)) = term.split_once("!=") {
                (f, FieldOperator::NotEquals, v)
            } else if let Some((f, v)) = term.split_once("==").or_else(|| term.split_once('=')) {
                (f, FieldOperator::Equals, v)
            } else {
                return Err(SelectorParseError::Invalid {
                    selector: selector.to_string(),
                    reason: format!("invalid field selector term \"{}\"", term),
                });
            };

            let field = field.trim();
            if field.is_empty() {
                return Err(SelectorParseError::Invalid {
                    selector: selector.to_string(),
                    reason: format!("missing field name in \"{}\"", term),
                });
            }
            requirements.push(FieldRequirement {
                field: field.to_string(),
                op,
                value: value.trim().to_string(),
            });
        }
        Ok(Self { requirements })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[FieldRequirement] {
        &self.requirements
    }

    pub fn matches(&self, fields: &FieldSet) -> bool {
        self.requirements.iter().all(|r| r.matches(fields))
    }

    /// The value `field` must equal, when the selector pins it exactly.
    pub fn requires_exact_match(&self, field: &str) -> Option<&str> {
        self.requirements
            .iter()
            .find(|r| r.field == field && r.op == FieldOperator::Equals)
            .map(|r| r.value.as_str())
    }
}

impl FromStr for FieldSelector {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .requirements
            .iter()
            .map(|r| match r.op {
                FieldOperator::Equals => format!("{}={}", r.field, r.value),
                FieldOperator::NotEquals => format!("{}!={}", r.field, r.value),
            })
            .collect();
        f.write_str(&terms.join(","))
    }
}
