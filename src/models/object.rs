use std::any::Any;
use std::fmt::Debug;

use super::meta::ObjectMeta;

/// A stored resource as seen by the generic registry.
///
/// The registry only knows objects through this trait; strategies downcast to
/// the concrete kind they govern.
pub trait Object: Debug + Send + Sync {
    /// Kind name, e.g. `OAuthAuthorizeToken`.
    fn kind(&self) -> &'static str;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Implements [`Object`] for a type with a `metadata: ObjectMeta` field.
macro_rules! impl_object {
    ($ty:ty, $kind:literal) => {
        impl $crate::models::object::Object for $ty {
            fn kind(&self) -> &'static str {
                $kind
            }

            fn meta(&self) -> &$crate::models::meta::ObjectMeta {
                &self.metadata
            }

            fn meta_mut(&mut self) -> &mut $crate::models::meta::ObjectMeta {
                &mut self.metadata
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    };
}

pub(crate) use impl_object;
