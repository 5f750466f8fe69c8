//! Compact ids for one serialization pass.
//!
//! A [`DynamicRegistry`] hands out `u16` ids in first-use order so that binary formats can store small integers instead
//! of names. The ids are only meaningful alongside the registry blob written in the same pass; they are not stable
//! across exports or versions.
//!
//! # Blob Format
//!
//! ```text
//! i32 count
//! count * (u32 byte length, UTF-8 name)
//! ```
//!
//! All integers are little-endian.

use crate::io::{read_i32, read_string, write_i32, write_string};
use crate::registry::{Registry, RegistryEntry, RegistryError};
use crate::SmallKeyHashMap;

use std::fmt::Debug;
use std::hash::Hash;
use std::io::{self, Read, Write};

/// Encodes "no value" at a tile position.
pub const ABSENT_ID: u16 = u16::MAX;

/// Maps values to small ids, assigned in first-use order starting at 0.
pub struct DynamicRegistry<V, K = String> {
    /// `None` marks a name that did not resolve on import. The slot is kept so later ids stay aligned.
    values: Vec<Option<V>>,
    keys: Vec<K>,
    ids: SmallKeyHashMap<K, u16>,
}

impl<V, K> Default for DynamicRegistry<V, K> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            keys: Vec::new(),
            ids: SmallKeyHashMap::default(),
        }
    }
}

impl<V, K> DynamicRegistry<V, K>
where
    V: RegistryEntry<K> + Clone,
    K: Clone + Debug + Eq + Hash,
{
    /// Every id below this is usable; [`ABSENT_ID`] is reserved.
    pub const CAPACITY: usize = ABSENT_ID as usize;

    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-assigns ids to every value of `registry`, in registry order.
    pub fn from_registry(registry: &Registry<V, K>) -> Result<Self, RegistryError> {
        let mut dynamic = Self::new();
        for value in registry.values() {
            dynamic.id_of(Some(value))?;
        }
        Ok(dynamic)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.keys.clear();
        self.ids.clear();
    }

    /// The id of `value`, assigning the next free id if it hasn't been seen yet. `None` maps to [`ABSENT_ID`].
    pub fn id_of(&mut self, value: Option<&V>) -> Result<u16, RegistryError> {
        let value = match value {
            Some(v) => v,
            None => return Ok(ABSENT_ID),
        };

        let key = value.registry_key();
        if let Some(&id) = self.ids.get(&key) {
            return Ok(id);
        }

        let id = self.push(key, Some(value.clone()))?;
        Ok(id)
    }

    /// The value behind `id`, or `None` for [`ABSENT_ID`], unknown ids and stale names.
    #[inline]
    pub fn value(&self, id: u16) -> Option<&V> {
        self.values.get(id as usize)?.as_ref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys in id order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    fn push(&mut self, key: K, value: Option<V>) -> Result<u16, RegistryError> {
        if self.values.len() >= Self::CAPACITY {
            return Err(RegistryError::Full {
                capacity: Self::CAPACITY,
            });
        }
        let id = self.values.len() as u16;
        if let Some(existing) = self.ids.get(&key) {
            log::warn!("Duplicate dynamic registry key {:?}; keeping id {}", key, existing);
        } else {
            self.ids.insert(key.clone(), id);
        }
        self.keys.push(key);
        self.values.push(value);
        Ok(id)
    }
}

impl<V> DynamicRegistry<V, String>
where
    V: RegistryEntry<String> + Clone,
{
    pub fn export(&self, writer: &mut dyn Write) -> Result<(), RegistryError> {
        let count = i32::try_from(self.keys.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many registry entries"))?;
        write_i32(writer, count)?;
        for key in self.keys.iter() {
            write_string(writer, key)?;
        }
        Ok(())
    }

    /// Reads a blob written by [`DynamicRegistry::export`], resolving names against `registry`.
    ///
    /// Names missing from `registry` are logged and kept as placeholder slots that resolve to `None`.
    pub fn import(reader: &mut dyn Read, registry: &Registry<V, String>) -> Result<Self, RegistryError> {
        let count = read_i32(reader)?;
        if count < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("negative registry entry count {}", count),
            )
            .into());
        }

        let mut dynamic = Self::new();
        for _ in 0..count {
            let name = read_string(reader)?;
            let value = registry.get(&name).cloned();
            if value.is_none() {
                log::warn!("Registry has no entry named {:?}; tiles using it will be empty", name);
            }
            dynamic.push(name, value)?;
        }
        Ok(dynamic)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::Arc;

    #[derive(Debug)]
    struct Kind(&'static str);

    impl RegistryEntry<String> for Kind {
        fn registry_key(&self) -> String {
            self.0.to_owned()
        }
    }

    fn registry(names: &[&'static str]) -> Registry<Arc<Kind>> {
        names.iter().map(|&n| Arc::new(Kind(n))).collect()
    }

    #[test]
    fn ids_follow_first_use_order() {
        let static_registry = registry(&["grass", "sand", "stone"]);
        let values = static_registry.values();

        let mut dynamic: DynamicRegistry<Arc<Kind>> = DynamicRegistry::new();
        let uses = [&values[2], &values[0], &values[2], &values[1]];
        let ids: Vec<u16> = uses.iter().map(|v| dynamic.id_of(Some(*v)).unwrap()).collect();
        assert_eq!(ids, [0, 1, 0, 2]);
        assert_eq!(dynamic.id_of(None).unwrap(), ABSENT_ID);
        assert!(dynamic.value(ABSENT_ID).is_none());
        assert_eq!(dynamic.keys(), &["stone", "grass", "sand"]);
    }

    #[test]
    fn two_passes_assign_the_same_ids() {
        let static_registry = registry(&["grass", "sand", "stone"]);
        let sequence = [1, 1, 0, 2, 0];

        let pass = || {
            let mut dynamic: DynamicRegistry<Arc<Kind>> = DynamicRegistry::new();
            sequence
                .iter()
                .map(|&i| dynamic.id_of(Some(&static_registry.values()[i])).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(pass(), pass());
    }

    #[test]
    fn import_resolves_the_same_instances() {
        let static_registry = registry(&["grass", "sand", "stone"]);
        let dynamic = DynamicRegistry::from_registry(&static_registry).unwrap();

        let mut blob = Vec::new();
        dynamic.export(&mut blob).unwrap();

        let imported = DynamicRegistry::import(&mut blob.as_slice(), &static_registry).unwrap();
        assert_eq!(imported.len(), 3);
        for (id, original) in static_registry.values().iter().enumerate() {
            assert!(Arc::ptr_eq(imported.value(id as u16).unwrap(), original));
        }
    }

    #[test]
    fn stale_names_keep_later_ids_aligned() {
        let old = registry(&["grass", "lava", "stone"]);
        let mut blob = Vec::new();
        DynamicRegistry::from_registry(&old).unwrap().export(&mut blob).unwrap();

        let new = registry(&["grass", "stone"]);
        let imported = DynamicRegistry::import(&mut blob.as_slice(), &new).unwrap();
        assert_eq!(imported.len(), 3);
        assert_eq!(imported.value(0).unwrap().0, "grass");
        assert!(imported.value(1).is_none());
        assert_eq!(imported.value(2).unwrap().0, "stone");
    }

    #[test]
    fn negative_count_is_rejected() {
        let mut blob = Vec::new();
        write_i32(&mut blob, -3).unwrap();
        let static_registry = registry(&[]);
        assert!(matches!(
            DynamicRegistry::import(&mut blob.as_slice(), &static_registry),
            Err(RegistryError::Io(_))
        ));
    }
}
