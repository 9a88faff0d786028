use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A type-erased, shareable attribute value.
pub type AttributeValue = Arc<dyn Any + Send + Sync>;

/// Free-form request-scoped metadata, e.g. route parameters attached by a dispatcher.
///
/// Values are immutable once inserted, so cloning the map shares them.
#[derive(Clone, Default)]
pub struct Attributes {
    inner: HashMap<String, AttributeValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// The value under `name` if it is a `T`.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.inner.get(name).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_raw(&self, name: &str) -> Option<&AttributeValue> {
        self.inner.get(name)
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.inner.insert(name.into(), Arc::new(value));
    }

    pub fn insert_raw(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.inner.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.inner.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inner.keys()).finish()
    }
}
