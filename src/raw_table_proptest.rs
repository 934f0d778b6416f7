#![cfg(test)]

// Property tests for RawTable kept inside the crate so they can inspect
// tombstone counts through `stats()` alongside the public operations.

use crate::config::{KeyLayout, Probing, TableConfig};
use crate::raw_table::{Insertion, RawTable};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, u32),
    Remove(usize),
    Get(usize),
    Contains(u16),
    Resize(usize),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u16>, Vec<OpI>)> {
    proptest::collection::vec(any::<u16>(), 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<u32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            1 => any::<u16>().prop_map(OpI::Contains),
            1 => (1usize..200).prop_map(OpI::Resize),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_config() -> impl Strategy<Value = TableConfig> {
    (
        prop_oneof![Just(Probing::Linear), Just(Probing::Quadratic)],
        any::<bool>(),
        prop_oneof![Just(0.5), Just(0.65), Just(0.9)],
    )
        .prop_map(|(probing, prime_capacity, lf)| {
            // Quadratic probing over composite capacities may exhaust; keep it prime.
            let prime_capacity = prime_capacity || probing == Probing::Quadratic;
            TableConfig::default()
                .with_probing(probing)
                .with_prime_capacity(prime_capacity)
                .with_max_load_factor(lf)
        })
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `put` reports Inserted exactly when the model lacked the key; values round-trip.
// - `remove` is a no-op for absent keys and decrements `len` by one otherwise.
// - `resize` either succeeds or refuses a too-small target, never losing entries.
// - After each op: `len` parity with the model and `len < capacity`; after a
//   successful `put` the load factor is below the configured threshold.
// - `iter` yields exactly the model's entries.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(
        cfg in arb_config(),
        initial in 1usize..16,
        (pool, ops) in arb_scenario()
    ) {
        let mut sut = RawTable::new(KeyLayout::Fixed(2), 4, initial, cfg).unwrap();
        let mut model: HashMap<u16, u32> = HashMap::new();

        for op in ops {
            match op {
                OpI::Put(i, v) => {
                    let k = pool[i];
                    let had = model.insert(k, v).is_some();
                    let res = sut.put(&k.to_le_bytes(), &v.to_le_bytes()).unwrap();
                    let expected = if had { Insertion::Replaced } else { Insertion::Inserted };
                    prop_assert_eq!(res, expected);
                    prop_assert!(sut.load_factor() < cfg.max_load_factor);
                }
                OpI::Remove(i) => {
                    let k = pool[i];
                    let before = sut.len();
                    let removed = sut.remove(&k.to_le_bytes()).unwrap();
                    prop_assert_eq!(removed, model.remove(&k).is_some());
                    prop_assert_eq!(sut.len(), before - removed as usize);
                }
                OpI::Get(i) => {
                    let k = pool[i];
                    let got = sut.get(&k.to_le_bytes()).unwrap().map(|b| {
                        u32::from_le_bytes(b.try_into().unwrap())
                    });
                    prop_assert_eq!(got, model.get(&k).copied());
                }
                OpI::Contains(k) => {
                    prop_assert_eq!(sut.contains(&k.to_le_bytes()).unwrap(), model.contains_key(&k));
                }
                OpI::Resize(n) => {
                    let before = sut.capacity();
                    match sut.resize(n) {
                        Ok(()) => {
                            prop_assert_eq!(sut.stats().tombstones, 0);
                        }
                        Err(_) => {
                            prop_assert_eq!(sut.capacity(), before);
                        }
                    }
                }
                OpI::Clear => {
                    sut.clear();
                    model.clear();
                }
                OpI::Iterate => {
                    let seen: BTreeMap<u16, u32> = sut
                        .iter()
                        .map(|(k, v)| {
                            (
                                u16::from_le_bytes(k.try_into().unwrap()),
                                u32::from_le_bytes(v.try_into().unwrap()),
                            )
                        })
                        .collect();
                    let expected: BTreeMap<u16, u32> =
                        model.iter().map(|(k, v)| (*k, *v)).collect();
                    prop_assert_eq!(seen, expected);
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.len() < sut.capacity());
        }

        for (k, v) in &model {
            let expected = v.to_le_bytes();
            let got = sut.get(&k.to_le_bytes()).unwrap();
            prop_assert_eq!(got, Some(&expected[..]));
        }
    }
}
