// Hashtable property tests.
//
// Property 1: the public API matches a std HashMap model.
//  - Operations: put, remove, put_if_absent, replace, remove_mapping,
//    compute_if_absent, compute_if_present, compute, merge.
//  - Invariant: after every op, len() matches the model, get() matches for
//    every key in the pool, and a full traversal yields the model's pairs.
//
// Property 2: removing through a cursor matches filtering the model.
//  - Invariant: entries kept are exactly those the predicate accepts.
//
// Property 3: a written table reads back equal, with the same load factor
//  and a capacity large enough that loading never grows.
use chained_hashtable::{Hashtable, Remap};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug)]
enum Op {
    Put(u8, i16),
    Remove(u8),
    PutIfAbsent(u8, i16),
    Replace(u8, i16),
    RemoveMapping(u8, i16),
    ComputeIfAbsent(u8, Option<i16>),
    ComputeIfPresent(u8, Option<i16>),
    Compute(u8, Option<i16>),
    Merge(u8, i16),
}

fn arb_op() -> impl Strategy<Value = Op> {
    let k = 0u8..16;
    let v = -8i16..8;
    prop_oneof![
        (k.clone(), v.clone()).prop_map(|(k, v)| Op::Put(k, v)),
        k.clone().prop_map(Op::Remove),
        (k.clone(), v.clone()).prop_map(|(k, v)| Op::PutIfAbsent(k, v)),
        (k.clone(), v.clone()).prop_map(|(k, v)| Op::Replace(k, v)),
        (k.clone(), v.clone()).prop_map(|(k, v)| Op::RemoveMapping(k, v)),
        (k.clone(), proptest::option::of(v.clone())).prop_map(|(k, v)| Op::ComputeIfAbsent(k, v)),
        (k.clone(), proptest::option::of(v.clone())).prop_map(|(k, v)| Op::ComputeIfPresent(k, v)),
        (k.clone(), proptest::option::of(v.clone())).prop_map(|(k, v)| Op::Compute(k, v)),
        (k, v).prop_map(|(k, v)| Op::Merge(k, v)),
    ]
}

// Remapping used by compute/merge: `None` removes, `Some(d)` adds `d`.
fn remap(cur: i16, d: Option<i16>) -> Remap<i16> {
    Remap::from(d.map(|d| cur.wrapping_add(d)))
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_model(ops in proptest::collection::vec(arb_op(), 1..120)) {
        let t: Hashtable<u8, i16> = Hashtable::with_capacity(1).unwrap();
        let mut model: HashMap<u8, i16> = HashMap::new();

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    prop_assert_eq!(t.put(k, v), model.insert(k, v));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(t.remove(&k), model.remove(&k));
                }
                Op::PutIfAbsent(k, v) => {
                    let expected = model.get(&k).copied();
                    model.entry(k).or_insert(v);
                    prop_assert_eq!(t.put_if_absent(k, v), expected);
                }
                Op::Replace(k, v) => {
                    let expected = model.get_mut(&k).map(|m| std::mem::replace(m, v));
                    prop_assert_eq!(t.replace(&k, v), expected);
                }
                Op::RemoveMapping(k, v) => {
                    let hit = model.get(&k) == Some(&v);
                    if hit {
                        model.remove(&k);
                    }
                    prop_assert_eq!(t.remove_mapping(&k, &v), hit);
                }
                Op::ComputeIfAbsent(k, v) => {
                    let expected = match model.get(&k) {
                        Some(cur) => Some(*cur),
                        None => {
                            if let Some(v) = v {
                                model.insert(k, v);
                            }
                            v
                        }
                    };
                    prop_assert_eq!(t.compute_if_absent(k, |_| v).unwrap(), expected);
                }
                Op::ComputeIfPresent(k, d) => {
                    let expected = match model.get(&k).copied() {
                        Some(cur) => match d {
                            Some(d) => {
                                let new = cur.wrapping_add(d);
                                model.insert(k, new);
                                Some(new)
                            }
                            None => {
                                model.remove(&k);
                                None
                            }
                        },
                        None => None,
                    };
                    prop_assert_eq!(t.compute_if_present(&k, |_, cur| remap(*cur, d)).unwrap(), expected);
                }
                Op::Compute(k, d) => {
                    let cur = model.get(&k).copied();
                    let expected = d.map(|d| cur.unwrap_or(0).wrapping_add(d));
                    match expected {
                        Some(new) => model.insert(k, new),
                        None => model.remove(&k),
                    };
                    let got = t
                        .compute(k, |_, cur| remap(cur.copied().unwrap_or(0), d))
                        .unwrap();
                    prop_assert_eq!(got, expected);
                }
                Op::Merge(k, v) => {
                    // Merging zero into an existing value removes it.
                    let expected = match model.get(&k).copied() {
                        None => Some(v),
                        Some(_) if v == 0 => None,
                        Some(cur) => Some(cur.wrapping_add(v)),
                    };
                    match expected {
                        Some(new) => model.insert(k, new),
                        None => model.remove(&k),
                    };
                    let got = t
                        .merge(k, v, |a, b| if *b == 0 { Remap::Remove } else { Remap::Keep(a.wrapping_add(*b)) })
                        .unwrap();
                    prop_assert_eq!(got, expected);
                }
            }

            prop_assert_eq!(t.len(), model.len());
            for k in 0u8..16 {
                prop_assert_eq!(t.get(&k), model.get(&k).copied());
            }
            let pairs: BTreeMap<u8, i16> = t.iter().map(Result::unwrap).collect();
            let expected: BTreeMap<u8, i16> = model.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(pairs, expected);
        }
    }
}

// Property 2: cursor removal filters exactly.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_cursor_remove_filters(
        pairs in proptest::collection::hash_map(any::<u32>(), any::<u32>(), 0..200),
        modulus in 1u32..5,
    ) {
        let t: Hashtable<u32, u32> = pairs.clone().into_iter().collect();
        let mut c = t.entry_set().iter();
        while let Some((_, v)) = c.advance().unwrap() {
            if v % modulus == 0 {
                c.remove().unwrap();
            }
        }
        let kept: HashMap<u32, u32> = pairs.into_iter().filter(|(_, v)| v % modulus != 0).collect();
        prop_assert_eq!(t.len(), kept.len());
        for (k, v) in &kept {
            prop_assert_eq!(t.get(k), Some(*v));
        }
    }
}

// Property 3: write_to / read_from round trip.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_persist_round_trip(
        pairs in proptest::collection::vec(("[a-z]{0,8}", any::<i64>()), 0..150),
        capacity in 0usize..64,
        load_factor in 0.25f32..2.0,
    ) {
        let t: Hashtable<String, i64> =
            Hashtable::with_capacity_and_load_factor(capacity, load_factor).unwrap();
        t.put_all(pairs);

        let mut buf = Vec::new();
        t.write_to(&mut buf).unwrap();
        let back = Hashtable::<String, i64>::read_from(&mut buf.as_slice()).unwrap();

        prop_assert_eq!(&back, &t);
        prop_assert_eq!(back.load_factor(), t.load_factor());
        prop_assert!(back.capacity() >= 1);

        // the copy accepts further writes like the original
        back.put("zz-extra".to_string(), 1);
        prop_assert_eq!(back.len(), t.len() + 1);
    }
}
