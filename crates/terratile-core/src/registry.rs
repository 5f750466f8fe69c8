use crate::SmallKeyHashMap;

use std::fmt::Debug;
use std::hash::Hash;
use std::io;
use std::sync::Arc;

/// A value that can be looked up in a [`Registry`] by a stable key, usually its declared name.
pub trait RegistryEntry<K> {
    fn registry_key(&self) -> K;
}

impl<K, T> RegistryEntry<K> for Arc<T>
where
    T: RegistryEntry<K> + ?Sized,
{
    #[inline]
    fn registry_key(&self) -> K {
        (**self).registry_key()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("dynamic registry is full ({capacity} ids)")]
    Full { capacity: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Stable lookup from key to value.
///
/// Built once from every discovered asset and never reordered afterwards; iteration follows insertion order.
#[derive(Clone, Debug)]
pub struct Registry<V, K = String> {
    values: Vec<V>,
    by_key: SmallKeyHashMap<K, V>,
}

impl<V, K> Default for Registry<V, K> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            by_key: SmallKeyHashMap::default(),
        }
    }
}

impl<V, K> Registry<V, K>
where
    V: RegistryEntry<K> + Clone,
    K: Clone + Debug + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` under its own key. Duplicate keys are ignored with a warning.
    pub fn add(&mut self, value: V) {
        let key = value.registry_key();
        if self.by_key.contains_key(&key) {
            log::warn!("Tried to add duplicate registry key {:?}", key);
            return;
        }
        self.by_key.insert(key, value.clone());
        self.values.push(value);
    }

    pub fn remove_key(&mut self, key: &K) -> Option<V> {
        let value = self.by_key.remove(key)?;
        self.values.retain(|v| v.registry_key() != *key);
        Some(value)
    }

    pub fn remove(&mut self, value: &V) -> Option<V> {
        self.remove_key(&value.registry_key())
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.by_key.clear();
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.by_key.get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.by_key.contains_key(key)
    }

    /// All values in insertion order.
    #[inline]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<V, K> FromIterator<V> for Registry<V, K>
where
    V: RegistryEntry<K> + Clone,
    K: Clone + Debug + Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut registry = Self::new();
        for value in iter {
            registry.add(value);
        }
        registry
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
