//! Immutable request context.

use std::collections::BTreeMap;
use std::sync::Arc;

use modelkit_proto::Value;

/// An immutable key/value bag carried by an environment.
///
/// Cloning is cheap; deriving a context with a new key copies the map only
/// when it is shared, so the source never observes the change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: Arc<BTreeMap<String, Value>>,
}

impl Context {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Check if a key is set.
    pub fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// A copy of this context with `key` set to `value`.
    pub fn with_key(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut derived = self.clone();
        Arc::make_mut(&mut derived.values).insert(key.into(), value.into());
        derived
    }

    /// A copy of this context without `key`.
    pub fn without_key(&self, key: &str) -> Self {
        if !self.has_key(key) {
            return self.clone();
        }
        let mut derived = self.clone();
        Arc::make_mut(&mut derived.values).remove(key);
        derived
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no key is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}
