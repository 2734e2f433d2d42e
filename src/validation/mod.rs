//! Structural validation of stored objects.
//!
//! Validators never short-circuit: every check runs and every failure lands
//! in the returned [`ErrorList`], so callers see all problems at once.

pub mod field;
pub mod meta;
pub mod token;

pub use field::{ErrorList, ErrorType, FieldError, FieldPath};
pub use token::{validate_authorize_token, validate_authorize_token_update};
