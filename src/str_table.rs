//! StrTable: string keys of bounded length, fixed-width values.

use crate::config::{KeyLayout, TableConfig, DEFAULT_MAX_KEY_LEN};
use crate::error::TableError;
use crate::raw_table::{Insertion, RawTable, TableStats};
use bytemuck::{bytes_of, pod_read_unaligned, Pod};
use core::marker::PhantomData;

/// Keys must be shorter than the table's maximum key length and must not
/// contain NUL. Every operation taking a key rejects a malformed one with
/// `KeyTooLong` or `KeyContainsNul`.
pub struct StrTable<V> {
    raw: RawTable,
    max_key_len: usize,
    _pd: PhantomData<fn() -> V>,
}

impl<V: Pod> StrTable<V> {
    /// Table accepting keys shorter than [`DEFAULT_MAX_KEY_LEN`] bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self, TableError> {
        Self::with_config(capacity, DEFAULT_MAX_KEY_LEN, TableConfig::default())
    }

    pub fn with_config(
        capacity: usize,
        max_key_len: usize,
        config: TableConfig,
    ) -> Result<Self, TableError> {
        let raw = RawTable::new(
            KeyLayout::Bounded {
                max_len: max_key_len,
            },
            core::mem::size_of::<V>(),
            capacity,
            config,
        )?;
        Ok(Self {
            raw,
            max_key_len,
            _pd: PhantomData,
        })
    }

    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    pub fn put(&mut self, key: &str, value: &V) -> Result<Insertion, TableError> {
        self.raw.put(key.as_bytes(), bytes_of(value))
    }

    pub fn get(&self, key: &str) -> Result<Option<V>, TableError> {
        Ok(self.raw.get(key.as_bytes())?.map(pod_read_unaligned))
    }

    pub fn contains(&self, key: &str) -> Result<bool, TableError> {
        self.raw.contains(key.as_bytes())
    }

    /// Applies `f` to the stored value in place. Returns false if `key` is absent.
    pub fn update(&mut self, key: &str, f: impl FnOnce(&mut V)) -> Result<bool, TableError> {
        match self.raw.get_mut(key.as_bytes())? {
            Some(bytes) => {
                let mut v: V = pod_read_unaligned(bytes);
                f(&mut v);
                bytes.copy_from_slice(bytes_of(&v));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove(&mut self, key: &str) -> Result<bool, TableError> {
        self.raw.remove(key.as_bytes())
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

    /// Entries in physical slot order. Keys borrow from the table.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, V)> + '_ {
        self.raw.iter().map(|(k, v)| {
            let k = core::str::from_utf8(k).expect("stored keys are copied from &str");
            (k, pod_read_unaligned::<V>(v))
        })
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = V> + '_ {
        self.raw.iter().map(|(_, v)| pod_read_unaligned::<V>(v))
    }
}

impl<V> Clone for StrTable<V> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            max_key_len: self.max_key_len,
            _pd: PhantomData,
        }
    }
}

impl<V> core::fmt::Debug for StrTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StrTable")
            .field("max_key_len", &self.max_key_len)
            .field("raw", &self.raw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Probing;
    use crate::error::ErrorKind;

    #[test]
    fn default_bound() {
        let t: StrTable<u32> = StrTable::with_capacity(4).unwrap();
        assert_eq!(t.max_key_len(), DEFAULT_MAX_KEY_LEN);
        assert_eq!(t.config(), &TableConfig::default());
    }

    /// Invariant: keys at or over the bound are rejected by every keyed
    /// operation, without mutation.
    #[test]
    fn oversized_key_rejected() {
        let mut t: StrTable<u32> = StrTable::with_config(4, 8, TableConfig::default()).unwrap();
        t.put("1234567", &7).unwrap();
        let err = t.put("12345678", &8).unwrap_err();
        assert_eq!(err, TableError::KeyTooLong { len: 8, max: 8 });
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(t.len(), 1);

        let long = TableError::KeyTooLong { len: 9, max: 8 };
        assert_eq!(t.get("123456789").unwrap_err(), long);
        assert_eq!(t.contains("123456789").unwrap_err(), long);
        assert_eq!(t.remove("123456789").unwrap_err(), long);
        assert_eq!(t.update("123456789", |v| *v = 0).unwrap_err(), long);
        assert_eq!(
            t.as_raw().get(b"123456789").unwrap_err(),
            t.get("123456789").unwrap_err()
        );
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("1234567").unwrap(), Some(7));
    }

    /// Invariant: NUL bytes are rejected on lookups and removal as well as `put`.
    #[test]
    fn nul_in_key_rejected() {
        let mut t: StrTable<u32> = StrTable::with_capacity(4).unwrap();
        assert_eq!(t.put("a\0b", &1).unwrap_err(), TableError::KeyContainsNul);
        assert!(t.is_empty());
        assert_eq!(t.get("a\0").unwrap_err(), TableError::KeyContainsNul);
        assert_eq!(t.contains("a\0").unwrap_err(), TableError::KeyContainsNul);
        assert_eq!(t.remove("a\0").unwrap_err(), TableError::KeyContainsNul);
    }

    /// Invariant: keys that are prefixes of each other are distinct.
    #[test]
    fn prefix_keys_are_distinct() {
        let mut t: StrTable<u32> = StrTable::with_capacity(4).unwrap();
        t.put("key", &1).unwrap();
        t.put("key1", &2).unwrap();
        t.put("ke", &3).unwrap();
        assert_eq!(t.get("key").unwrap(), Some(1));
        assert_eq!(t.get("key1").unwrap(), Some(2));
        assert_eq!(t.get("ke").unwrap(), Some(3));
        assert_eq!(t.get("k").unwrap(), None);
    }

    #[test]
    fn zero_max_key_len_rejected() {
        let r: Result<StrTable<u32>, _> = StrTable::with_config(4, 0, TableConfig::default());
        assert_eq!(r.unwrap_err(), TableError::ZeroMaxKeyLen);
    }

    #[test]
    fn custom_bound_and_config_reported() {
        let cfg = TableConfig::default().with_probing(Probing::Quadratic);
        let t: StrTable<u8> = StrTable::with_config(4, 32, cfg).unwrap();
        assert_eq!(t.max_key_len(), 32);
        assert_eq!(t.config().probing, Probing::Quadratic);
        assert_eq!(t.clone().max_key_len(), 32);
    }

    /// Invariant: iteration yields every live entry; its length is exact.
    #[test]
    fn iter_yields_str_keys() {
        let mut t: StrTable<u16> = StrTable::with_capacity(1).unwrap();
        for (i, w) in ["alpha", "beta", "gamma", "délta"].iter().enumerate() {
            t.put(w, &(i as u16)).unwrap();
        }
        assert!(t.remove("gamma").unwrap());
        assert_eq!(t.iter().len(), 3);
        assert_eq!(t.keys().len(), 3);
        let mut keys: Vec<&str> = t.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["alpha", "beta", "délta"]);
        assert!(t.iter().any(|(k, v)| k == "délta" && v == 3));
        assert_eq!(t.values().map(u32::from).sum::<u32>(), 4);
        assert!(t.update("beta", |v| *v = 100).unwrap());
        assert!(!t.update("gamma", |v| *v = 100).unwrap());
        assert_eq!(t.get("beta").unwrap(), Some(100));
    }
}
