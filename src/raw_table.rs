//! RawTable: open-addressing storage over byte keys and values.
//!
//! One flat `Vec<Slot>`; every slot is `Empty`, `Occupied` or `Tombstone`.
//! Occupied slots own boxed copies of their key and value bytes plus the
//! key's cached hash, which is what resizing re-places entries by.

use crate::config::{KeyLayout, Probing, TableConfig};
use crate::error::TableError;
use crate::hashing::hash_key;
use core::fmt;
use core::mem;
use log::{debug, error, warn};

#[derive(Clone, Debug)]
struct Entry {
    key: Box<[u8]>,
    value: Box<[u8]>,
    hash: u64,
}

#[derive(Clone, Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Occupied(Entry),
    Tombstone,
}

/// Outcome of a probe for an insertion point.
enum Probe {
    Found(usize),
    Vacant(usize),
    Exhausted,
}

/// What a successful `put` did.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Insertion {
    /// A new entry was created.
    Inserted,
    /// The key was present; its value bytes were overwritten in place.
    Replaced,
}

/// Snapshot of occupancy counters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableStats {
    pub count: usize,
    pub capacity: usize,
    pub tombstones: usize,
    pub load_factor: f64,
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "count: {}, cap: {}, tombstones: {}, load factor: {:.3}",
            self.count, self.capacity, self.tombstones, self.load_factor
        )
    }
}

#[derive(Clone)]
pub struct RawTable {
    slots: Vec<Slot>,
    count: usize,
    tombstones: usize,
    key_layout: KeyLayout,
    value_size: usize,
    config: TableConfig,
    destroyed: bool,
}

fn try_vec_with<T>(len: usize, f: impl FnMut() -> T) -> Result<Vec<T>, TableError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| TableError::AllocationFailure {
            bytes: len.saturating_mul(mem::size_of::<T>()),
        })?;
    v.resize_with(len, f);
    Ok(v)
}

fn copy_bytes(src: &[u8]) -> Result<Box<[u8]>, TableError> {
    let mut v = Vec::new();
    v.try_reserve_exact(src.len())
        .map_err(|_| TableError::AllocationFailure { bytes: src.len() })?;
    v.extend_from_slice(src);
    Ok(v.into_boxed_slice())
}

/// Slot indices visited for `hash` in a table of `capacity` slots.
/// `capacity` must be non-zero.
fn probe_seq(capacity: usize, probing: Probing, hash: u64) -> impl Iterator<Item = usize> {
    let cap = capacity as u64;
    let start = hash % cap;
    (0..cap).map(move |x| ((start + probing.offset(x, cap)) % cap) as usize)
}

impl RawTable {
    /// Creates a table of `capacity` empty slots.
    ///
    /// Fails if the key layout, `value_size`, `capacity` or the configured
    /// load factor is degenerate, or if the slot array cannot be allocated.
    pub fn new(
        key_layout: KeyLayout,
        value_size: usize,
        capacity: usize,
        config: TableConfig,
    ) -> Result<Self, TableError> {
        key_layout.validate()?;
        if value_size == 0 {
            return Err(TableError::ZeroValueSize);
        }
        if capacity == 0 {
            return Err(TableError::ZeroCapacity);
        }
        config.validate()?;
        Ok(Self {
            slots: try_vec_with(capacity, Slot::default)?,
            count: 0,
            tombstones: 0,
            key_layout,
            value_size,
            config,
            destroyed: false,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
    pub fn key_layout(&self) -> KeyLayout {
        self.key_layout
    }
    pub fn value_size(&self) -> usize {
        self.value_size
    }
    pub fn config(&self) -> &TableConfig {
        &self.config
    }
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn load_factor(&self) -> f64 {
        if self.slots.is_empty() {
            0.0
        } else {
            self.count as f64 / self.slots.len() as f64
        }
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            count: self.count,
            capacity: self.capacity(),
            tombstones: self.tombstones,
            load_factor: self.load_factor(),
        }
    }

    fn check_live(&self) -> Result<(), TableError> {
        if self.destroyed {
            Err(TableError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn check_value(&self, value: &[u8]) -> Result<(), TableError> {
        if value.len() != self.value_size {
            return Err(TableError::ValueLength {
                expected: self.value_size,
                got: value.len(),
            });
        }
        Ok(())
    }

    /// Index of the occupied slot holding `key`. Tombstones are passed over.
    fn find_index(&self, key: &[u8], hash: u64) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        for i in probe_seq(self.slots.len(), self.config.probing, hash) {
            match &self.slots[i] {
                Slot::Empty => return None,
                Slot::Occupied(e) if e.hash == hash && *e.key == *key => return Some(i),
                _ => {}
            }
        }
        None
    }

    /// Finds `key`, or the slot a new entry for it should take: the first
    /// tombstone on the path if any, else the first empty slot.
    fn probe_insert(&self, key: &[u8], hash: u64) -> Probe {
        let mut first_tombstone = None;
        for i in probe_seq(self.slots.len(), self.config.probing, hash) {
            match &self.slots[i] {
                Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(i)),
                Slot::Tombstone => {
                    first_tombstone.get_or_insert(i);
                }
                Slot::Occupied(e) => {
                    if e.hash == hash && *e.key == *key {
                        return Probe::Found(i);
                    }
                }
            }
        }
        first_tombstone.map_or(Probe::Exhausted, Probe::Vacant)
    }

    /// Probes for `key`; on exhaustion forces one doubling resize and probes again.
    fn locate_for_insert(&mut self, key: &[u8], hash: u64) -> Result<Probe, TableError> {
        match self.probe_insert(key, hash) {
            Probe::Exhausted => {
                let capacity = self.capacity();
                warn!("probe exhausted at capacity {capacity}, forcing resize");
                let target = self.config.round_capacity(capacity.saturating_mul(2));
                self.resize_to(target)?;
                Ok(self.probe_insert(key, hash))
            }
            probe => Ok(probe),
        }
    }

    /// Grows ahead of an insertion so that `count + 1` stays below the threshold.
    fn reserve_one(&mut self) -> Result<(), TableError> {
        let needed = self.count + 1;
        let mut target = self.capacity();
        if !self.config.at_threshold(needed, target) {
            return Ok(());
        }
        while self.config.at_threshold(needed, target) {
            let doubled = target.checked_mul(2).ok_or(TableError::AllocationFailure {
                bytes: usize::MAX,
            })?;
            target = self.config.round_capacity(doubled);
        }
        self.resize_to(target)
    }

    /// Inserts or overwrites. Both slices are copied; nothing is retained by reference.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<Insertion, TableError> {
        self.check_live()?;
        self.key_layout.check_key(key)?;
        self.check_value(value)?;
        self.reserve_one()?;

        let hash = hash_key(key);
        match self.locate_for_insert(key, hash)? {
            Probe::Found(i) => {
                if let Slot::Occupied(e) = &mut self.slots[i] {
                    e.value.copy_from_slice(value);
                }
                Ok(Insertion::Replaced)
            }
            Probe::Vacant(i) => {
                let entry = Entry {
                    key: copy_bytes(key)?,
                    value: copy_bytes(value)?,
                    hash,
                };
                if let Slot::Tombstone = mem::replace(&mut self.slots[i], Slot::Occupied(entry)) {
                    self.tombstones -= 1;
                }
                self.count += 1;
                Ok(Insertion::Inserted)
            }
            Probe::Exhausted => {
                let capacity = self.capacity();
                error!("probe exhausted again after resize to {capacity}");
                Err(TableError::Exhausted { capacity })
            }
        }
    }

    pub(crate) fn lookup(&self, key: &[u8]) -> Option<&[u8]> {
        let i = self.find_index(key, hash_key(key))?;
        match &self.slots[i] {
            Slot::Occupied(e) => Some(&*e.value),
            _ => None,
        }
    }

    pub(crate) fn lookup_mut(&mut self, key: &[u8]) -> Option<&mut [u8]> {
        let i = self.find_index(key, hash_key(key))?;
        match &mut self.slots[i] {
            Slot::Occupied(e) => Some(&mut *e.value),
            _ => None,
        }
    }

    /// Marks `key`'s slot as a tombstone and frees its buffers.
    pub(crate) fn erase(&mut self, key: &[u8]) -> bool {
        match self.find_index(key, hash_key(key)) {
            Some(i) => {
                self.slots[i] = Slot::Tombstone;
                self.count -= 1;
                self.tombstones += 1;
                true
            }
            None => false,
        }
    }

    /// Borrowed view of the value stored for `key`, valid until the next mutation.
    pub fn get(&self, key: &[u8]) -> Result<Option<&[u8]>, TableError> {
        self.key_layout.check_key(key)?;
        Ok(self.lookup(key))
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Result<Option<&mut [u8]>, TableError> {
        self.key_layout.check_key(key)?;
        Ok(self.lookup_mut(key))
    }

    /// Copies the value for `key` into `out`. Returns whether the key was present;
    /// `out` is left untouched when it was not.
    pub fn get_into(&self, key: &[u8], out: &mut [u8]) -> Result<bool, TableError> {
        self.check_value(out)?;
        match self.get(key)? {
            Some(v) => {
                out.copy_from_slice(v);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn contains(&self, key: &[u8]) -> Result<bool, TableError> {
        Ok(self.get(key)?.is_some())
    }

    /// Removes `key` if present and reports whether it was. Absent keys are a no-op.
    pub fn remove(&mut self, key: &[u8]) -> Result<bool, TableError> {
        self.key_layout.check_key(key)?;
        Ok(self.erase(key))
    }

    /// Rebuilds the table with room for `desired` slots (prime-rounded if configured).
    ///
    /// Rejected without change if the current entries would sit at or over the
    /// load factor in the new capacity.
    pub fn resize(&mut self, desired: usize) -> Result<(), TableError> {
        self.check_live()?;
        if desired == 0 {
            return Err(TableError::ZeroCapacity);
        }
        let target = self.config.round_capacity(desired);
        if self.config.at_threshold(self.count, target) {
            return Err(TableError::CapacityTooSmall {
                requested: desired,
                count: self.count,
            });
        }
        self.resize_to(target)
    }

    /// Re-places every occupied entry into `new_capacity` fresh slots by its cached
    /// hash, dropping tombstones. All placements are planned before anything moves,
    /// so a failed allocation or an exhausted probe leaves `self` untouched.
    fn resize_to(&mut self, new_capacity: usize) -> Result<(), TableError> {
        let old_capacity = self.capacity();
        let mut new_slots = try_vec_with(new_capacity, Slot::default)?;
        // placement[new] = old
        let mut placement: Vec<Option<usize>> = try_vec_with(new_capacity, || None)?;

        for (old, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied(e) = slot {
                let at = probe_seq(new_capacity, self.config.probing, e.hash)
                    .find(|&i| placement[i].is_none())
                    .ok_or(TableError::Exhausted {
                        capacity: new_capacity,
                    })?;
                placement[at] = Some(old);
            }
        }

        for (new, old) in placement.into_iter().enumerate() {
            if let Some(old) = old {
                new_slots[new] = mem::take(&mut self.slots[old]);
            }
        }
        self.slots = new_slots;
        self.tombstones = 0;
        debug!(
            "resized {old_capacity} -> {new_capacity} slots ({} entries)",
            self.count
        );
        Ok(())
    }

    /// Resets every slot to empty and frees all entries. Capacity is kept.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.count = 0;
        self.tombstones = 0;
    }

    /// Frees every entry and the slot array. Later calls are no-ops; afterwards
    /// lookups report absent and `put`/`resize` fail with `Destroyed`.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.slots = Vec::new();
        self.count = 0;
        self.tombstones = 0;
        self.destroyed = true;
    }

    /// Occupied entries in physical slot order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            it: self.slots.iter(),
            remaining: self.count,
        }
    }

    /// Occupied entries in physical slot order, with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_> {
        IterMut {
            it: self.slots.iter_mut(),
            remaining: self.count,
        }
    }
}

impl fmt::Debug for RawTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTable")
            .field("key_layout", &self.key_layout)
            .field("value_size", &self.value_size)
            .field("stats", &self.stats())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

/// Iterator over occupied entries of a `RawTable`.
pub struct Iter<'a> {
    it: core::slice::Iter<'a, Slot>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.it.by_ref().find_map(|s| match s {
            Slot::Occupied(e) => Some((&*e.key, &*e.value)),
            _ => None,
        })?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Iterator over occupied entries of a `RawTable` with mutable values.
pub struct IterMut<'a> {
    it: core::slice::IterMut<'a, Slot>,
    remaining: usize,
}

impl<'a> Iterator for IterMut<'a> {
    type Item = (&'a [u8], &'a mut [u8]);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.it.by_ref().find_map(|s| match s {
            Slot::Occupied(e) => Some((&*e.key, &mut *e.value)),
            _ => None,
        })?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for IterMut<'_> {}

impl<'a> IntoIterator for &'a RawTable {
    type Item = (&'a [u8], &'a [u8]);
    type IntoIter = Iter<'a>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
