use super::fields::{FieldSelector, FieldSet};
use super::labels::{LabelSelector, LabelSet};
use crate::errors::TypeMismatchError;
use crate::models::Object;

/// Projects an object into the label and field sets selectors run against.
pub type AttrFunc = fn(&dyn Object) -> Result<(LabelSet, FieldSet), TypeMismatchError>;

/// A label selector, a field selector, and the projection that feeds them.
#[derive(Debug, Clone)]
pub struct SelectionPredicate {
    pub label: LabelSelector,
    pub field: FieldSelector,
    pub get_attrs: AttrFunc,
}

impl SelectionPredicate {
    /// True when neither selector constrains anything.
    pub fn empty(&self) -> bool {
        self.label.is_empty() && self.field.is_empty()
    }

    /// Evaluate against one object. Empty predicates match without calling
    /// `get_attrs`.
    pub fn matches(&self, obj: &dyn Object) -> Result<bool, TypeMismatchError> {
        if self.empty() {
            return Ok(true);
        }
        let (labels, fields) = (self.get_attrs)(obj)?;
        Ok(self.label.matches(&labels) && self.field.matches(&fields))
    }
}
