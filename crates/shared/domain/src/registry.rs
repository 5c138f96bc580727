//! Type-erased container for initialized feature state.
//!
//! Each feature crate builds its own slice at startup; the HTTP state stores them by
//! [`TypeId`] and handlers downcast back to the concrete type.

use std::any::{Any, TypeId};
use std::fmt::Debug;

/// Feature state that can live in the shared HTTP state.
pub trait FeatureSlice: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// A feature slice together with the [`TypeId`] it is registered under.
#[derive(Debug)]
pub struct InitializedSlice {
    pub id: TypeId,
    pub state: Box<dyn FeatureSlice>,
}

impl InitializedSlice {
    pub fn new<T: FeatureSlice>(state: T) -> Self {
        Self { id: TypeId::of::<T>(), state: Box::new(state) }
    }

    /// Downcasts the stored state.
    #[must_use]
    pub fn downcast<T: FeatureSlice>(&self) -> Option<&T> {
        self.state.as_any().downcast_ref::<T>()
    }
}
