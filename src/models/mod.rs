pub mod client;
pub mod meta;
pub mod object;
pub mod token;

pub use client::{ClusterRoleScopeRestriction, GrantHandlerType, OAuthClient, ScopeRestriction};
pub use meta::ObjectMeta;
pub use object::Object;
pub use token::AuthorizeToken;
