// ABOUTME: Phantom-typed names for load balancer sub-resources.
// ABOUTME: Prevents passing a frontend name where a backend or probe name is expected.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
pub enum FrontendMarker {}
pub enum BackendMarker {}
pub enum ProbeMarker {}

/// The name of a resource nested inside a load balancer.
///
/// Load balancing rules reference their frontend, backend, and probe by name.
/// The marker keeps those three references from being swapped by accident.
pub struct ResourceName<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> ResourceName<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

// Manual impls so T needs no bounds.

impl<T> std::fmt::Debug for ResourceName<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ResourceName").field(&self.value).finish()
    }
}

impl<T> Clone for ResourceName<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for ResourceName<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for ResourceName<T> {}

impl<T> Hash for ResourceName<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for ResourceName<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

pub type FrontendName = ResourceName<FrontendMarker>;
pub type BackendName = ResourceName<BackendMarker>;
pub type ProbeName = ResourceName<ProbeMarker>;
