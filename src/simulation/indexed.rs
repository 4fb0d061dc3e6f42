//! Dense per-pop-type storage laid out parallel to the shared [`PopTypeKeys`].

use std::ops::{Index, IndexMut};
use std::sync::Arc;

use crate::simulation::{PopTypeId, PopTypeKeys};

#[derive(Debug, Clone)]
pub struct IndexedMap<V> {
    keys: Arc<PopTypeKeys>,
    values: Vec<V>,
}

impl<V: Clone + Default> IndexedMap<V> {
    pub fn new(keys: Arc<PopTypeKeys>) -> Self {
        let values = vec![V::default(); keys.len()];
        Self { keys, values }
    }

    pub fn fill(&mut self, value: V) {
        self.values.fill(value);
    }
}

impl<V> IndexedMap<V> {
    pub fn keys(&self) -> &Arc<PopTypeKeys> {
        &self.keys
    }

    #[cfg(test)]
    pub fn get(&self, id: PopTypeId) -> Option<&V> {
        self.values.get(id.index())
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (PopTypeId, &V)> {
        self.keys.ids().zip(self.values.iter())
    }
}

impl<V> Index<PopTypeId> for IndexedMap<V> {
    type Output = V;

    fn index(&self, id: PopTypeId) -> &V {
        &self.values[id.index()]
    }
}

impl<V> IndexMut<PopTypeId> for IndexedMap<V> {
    fn index_mut(&mut self, id: PopTypeId) -> &mut V {
        &mut self.values[id.index()]
    }
}
