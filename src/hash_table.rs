//! HashTable: fixed-width typed keys and values over `RawTable`.
//!
//! `K` and `V` are plain-old-data; their byte images are what gets hashed,
//! compared and stored. Values come back as copies.

use crate::config::{KeyLayout, TableConfig};
use crate::error::TableError;
use crate::raw_table::{Insertion, RawTable, TableStats};
use bytemuck::{bytes_of, pod_read_unaligned, Pod};
use core::marker::PhantomData;

pub struct HashTable<K, V> {
    raw: RawTable,
    _pd: PhantomData<fn() -> (K, V)>,
}

impl<K: Pod, V: Pod> HashTable<K, V> {
    pub fn with_capacity(capacity: usize) -> Result<Self, TableError> {
        Self::with_config(capacity, TableConfig::default())
    }

    /// Fails for zero-sized `K` or `V`, zero capacity, or an invalid config.
    pub fn with_config(capacity: usize, config: TableConfig) -> Result<Self, TableError> {
        let raw = RawTable::new(
            KeyLayout::Fixed(core::mem::size_of::<K>()),
            core::mem::size_of::<V>(),
            capacity,
            config,
        )?;
        Ok(Self {
            raw,
            _pd: PhantomData,
        })
    }

    pub fn put(&mut self, key: &K, value: &V) -> Result<Insertion, TableError> {
        self.raw.put(bytes_of(key), bytes_of(value))
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.raw.lookup(bytes_of(key)).map(pod_read_unaligned)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.raw.lookup(bytes_of(key)).is_some()
    }

    /// Applies `f` to the stored value in place. Returns false if `key` is absent.
    pub fn update(&mut self, key: &K, f: impl FnOnce(&mut V)) -> bool {
        match self.raw.lookup_mut(bytes_of(key)) {
            Some(bytes) => {
                let mut v: V = pod_read_unaligned(bytes);
                f(&mut v);
                bytes.copy_from_slice(bytes_of(&v));
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &K) -> bool {
        self.raw.erase(bytes_of(key))
    }

    pub fn resize(&mut self, desired: usize) -> Result<(), TableError> {
        self.raw.resize(desired)
    }

    pub fn clear(&mut self) {
        self.raw.clear()
    }

    pub fn destroy(&mut self) {
        self.raw.destroy()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
    pub fn load_factor(&self) -> f64 {
        self.raw.load_factor()
    }
    pub fn stats(&self) -> TableStats {
        self.raw.stats()
    }
    pub fn config(&self) -> &TableConfig {
        self.raw.config()
    }
    pub fn as_raw(&self) -> &RawTable {
        &self.raw
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (K, V)> + '_ {
        self.raw
            .iter()
            .map(|(k, v)| (pod_read_unaligned::<K>(k), pod_read_unaligned::<V>(v)))
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = K> + '_ {
        self.raw.iter().map(|(k, _)| pod_read_unaligned::<K>(k))
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = V> + '_ {
        self.raw.iter().map(|(_, v)| pod_read_unaligned::<V>(v))
    }
}

impl<K, V> Clone for HashTable<K, V> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _pd: PhantomData,
        }
    }
}

impl<K, V> core::fmt::Debug for HashTable<K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable").field("raw", &self.raw).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Probing;
    use bytemuck::{Pod, Zeroable};
    use std::collections::BTreeMap;

    #[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    struct Point {
        x: i32,
        y: i32,
    }

    /// Invariant: struct keys compare by their full byte image.
    #[test]
    fn struct_keys_round_trip() {
        let mut t: HashTable<Point, u64> = HashTable::with_capacity(4).unwrap();
        for i in 0..100 {
            t.put(&Point { x: i, y: -i }, &(i as u64 * 7)).unwrap();
        }
        assert_eq!(t.len(), 100);
        assert_eq!(t.get(&Point { x: 42, y: -42 }), Some(294));
        assert_eq!(t.get(&Point { x: 42, y: 42 }), None);
    }

    /// Invariant: values narrower or wider than keys are stored at their own width.
    #[test]
    fn mixed_widths() {
        let mut t: HashTable<u8, [u64; 3]> = HashTable::with_capacity(2).unwrap();
        for i in 0..=255u8 {
            t.put(&i, &[i as u64; 3]).unwrap();
        }
        assert_eq!(t.as_raw().value_size(), 24);
        assert_eq!(t.get(&200), Some([200; 3]));
    }

    #[test]
    fn update_in_place() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(8).unwrap();
        t.put(&1, &10).unwrap();
        assert!(t.update(&1, |v| *v += 5));
        assert!(!t.update(&2, |v| *v += 5));
        assert_eq!(t.get(&1), Some(15));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn iter_keys_values_agree() {
        let cfg = TableConfig::default().with_probing(Probing::Quadratic);
        let mut t: HashTable<u16, i64> = HashTable::with_config(1, cfg).unwrap();
        for i in 0..300u16 {
            t.put(&i, &-(i as i64)).unwrap();
        }
        for i in 0..100u16 {
            t.remove(&i);
        }
        let map: BTreeMap<u16, i64> = t.iter().collect();
        assert_eq!(map.len(), 200);
        assert!(map.iter().all(|(k, v)| *v == -(*k as i64)));
        assert_eq!(t.keys().len(), 200);
        assert_eq!(t.values().sum::<i64>(), map.values().sum::<i64>());
    }

    #[test]
    fn clone_is_independent() {
        let mut a: HashTable<u32, u32> = HashTable::with_capacity(8).unwrap();
        a.put(&1, &1).unwrap();
        let mut b = a.clone();
        b.put(&1, &2).unwrap();
        b.put(&2, &2).unwrap();
        assert_eq!(a.get(&1), Some(1));
        assert_eq!(a.len(), 1);
        assert_eq!(b.get(&1), Some(2));
    }
}
