//! The contract between the generic registry and per-kind policy, plus the
//! authorize token implementation of it.

pub mod authorize_token;
pub mod lifecycle;
pub mod strategy;

pub use authorize_token::{get_attrs, matcher, AuthorizeTokenStrategy};
pub use lifecycle::{before_create, before_update};
pub use strategy::{RestCreateStrategy, RestStrategy, RestUpdateStrategy};
