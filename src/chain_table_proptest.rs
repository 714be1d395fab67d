#![cfg(test)]

// Property tests for ChainTable kept inside the crate so they can reach the
// unsynchronized layer directly.

use crate::chain_table::{ChainTable, Handle, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR};
use proptest::prelude::*;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Remove(usize),
    RemoveAt(usize),
    Get(usize),
    Contains(String),
    ContainsValue(i32),
    Rehash,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), -20i32..20).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::RemoveAt),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => (-20i32..20).prop_map(OpI::ContainsValue),
            1 => Just(OpI::Rehash),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_scenario<S: BuildHasher>(
    mut sut: ChainTable<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        let before = sut.mod_count();
        match op {
            OpI::Put(i, v) => {
                let k = key_from(pool, i);
                let prev = sut.put(k.clone(), v);
                let already = model.contains_key(&k);
                prop_assert_eq!(prev, model.insert(k, v));
                if already {
                    prop_assert_eq!(sut.mod_count(), before, "overwrite must not count");
                } else {
                    prop_assert!(sut.mod_count() > before, "insert must count");
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let removed = sut.remove(&k).map(|(_, v)| v);
                prop_assert_eq!(removed, model.remove(&k));
                prop_assert_eq!(sut.mod_count() == before, removed.is_none());
            }
            OpI::RemoveAt(i) => {
                let k = key_from(pool, i);
                if let Some(h) = sut.find(&k) {
                    let (kk, vv) = sut.remove_at(h).expect("live handle removes");
                    prop_assert!(kk == k);
                    prop_assert_eq!(Some(vv), model.remove(&kk));
                    stale.push(h);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::ContainsValue(v) => {
                let has_model = model.values().any(|mv| *mv == v);
                prop_assert_eq!(sut.contains_value(&v), has_model);
            }
            OpI::Rehash => {
                // keep the bucket array small
                if sut.capacity() < 1_000 {
                    let capacity = sut.capacity();
                    sut.rehash();
                    prop_assert_eq!(sut.capacity(), 2 * capacity + 1);
                    prop_assert_eq!(sut.mod_count(), before + 1);
                }
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                for (k, v) in sut.iter() {
                    prop_assert_eq!(Some(v), model.get(k));
                }
            }
        }

        // Post-conditions after each op
        // 1) Stale handles never resolve
        for &h in &stale {
            prop_assert!(sut.entry(h).is_none());
        }
        // 2) Size parity, and the count matches a full traversal
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.iter().count(), sut.len());
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `put` returns the previous value; only inserting a new key counts as a modification.
// - `get`/`contains_key`/`contains_value` parity, including borrowed lookup.
// - `remove` and handle removal return the owned pair and invalidate the handle.
// - Growth (implicit and explicit) keeps every entry reachable.
// - Traversal yields each live entry exactly once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut = ChainTable::with_capacity_and_hasher(
            DEFAULT_CAPACITY,
            DEFAULT_LOAD_FACTOR,
            RandomState::new(),
        ).unwrap();
        run_scenario(sut, &pool, ops)?;
    }

    // Small tables grow often; this exercises many rehashes per case.
    #[test]
    fn prop_state_machine_tiny_table((pool, ops) in arb_scenario(), lf in 0.25f32..4.0) {
        let sut = ChainTable::with_capacity_and_hasher(1, lf, RandomState::new()).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (constant hasher). Every entry shares one chain, so
// this stresses head, middle and tail unlinking.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut = ChainTable::with_capacity_and_hasher(
            DEFAULT_CAPACITY,
            DEFAULT_LOAD_FACTOR,
            ConstBuildHasher,
        ).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}
