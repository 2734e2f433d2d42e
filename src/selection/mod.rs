//! Label and field selection for filtered list/watch.

pub mod fields;
pub mod labels;
pub mod predicate;

pub use fields::{FieldSelector, FieldSet};
pub use labels::{LabelSelector, LabelSet};
pub use predicate::{AttrFunc, SelectionPredicate};
