//! Admission and selection policy for OAuth authorize tokens.
//!
//! A generic registry calls [`registry::AuthorizeTokenStrategy`] on every
//! create and update of an `OAuthAuthorizeToken`, and [`registry::matcher`]
//! to filter tokens on list and watch.

pub mod client;
pub mod config;
pub mod context;
pub mod errors;
pub mod models;
pub mod registry;
pub mod scope;
pub mod selection;
pub mod validation;
