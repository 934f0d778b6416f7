//! probe-table: an open-addressing hash table over fixed-width byte keys
//! and values, with tombstone deletion and automatic growth.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one canonical table over a single contiguous slot array, with
//!   keys and values copied in by size rather than by type.
//! - Layers:
//!   - RawTable: the byte-level table. Key layout (fixed width or bounded
//!     string) and value width are runtime parameters; every operation
//!     validates slice shapes before touching state.
//!   - HashTable<K, V>: `bytemuck::Pod` keys and values; the type's byte
//!     image is its stored width. Values are returned as copies.
//!   - StrTable<V>: `&str` keys shorter than a configured bound.
//!
//! Slots
//! - Each slot is `Empty`, `Occupied` or `Tombstone`. Only `Occupied`
//!   carries data: boxed key bytes, boxed value bytes and the key's `u64`
//!   hash (xxh3).
//! - Lookups stop at the first `Empty` slot and step over tombstones.
//!   Insertions remember the first tombstone on the path and reuse it.
//!
//! Growth
//! - Before a `put`, if `(len + 1) / capacity` would reach the configured
//!   load factor (0.65 by default) the table doubles, rounding to the next
//!   prime when configured, until it would not.
//! - If a probe sequence is exhausted anyway (quadratic probing over a
//!   composite capacity can do this) the table doubles once and probes
//!   again; a second exhaustion is reported as `TableError::Exhausted`.
//! - Resizing re-places entries by their cached hash and drops tombstones.
//!   All placements are planned first, so a failed resize changes nothing.
//!
//! Constraints
//! - Single-threaded; mutation takes `&mut self`, so borrowed values and
//!   iterators cannot outlive a mutation.
//! - Probing strategy, load factor and prime rounding are fixed at
//!   construction in `TableConfig`.
//! - `destroy` frees storage early and is idempotent; `Drop` covers the rest.

pub mod config;
pub mod error;
pub mod hash_table;
pub mod hashing;
pub mod raw_table;
mod raw_table_proptest;
pub mod str_table;

// Public surface
pub use config::{KeyLayout, Probing, TableConfig, DEFAULT_MAX_KEY_LEN, DEFAULT_MAX_LOAD_FACTOR};
pub use error::{ErrorKind, TableError};
pub use hash_table::HashTable;
pub use raw_table::{Insertion, RawTable, TableStats};
pub use str_table::StrTable;
