//! ChainTable: unsynchronized bucket array with separately chained entries.
//!
//! Entries live in a generational arena (`SlotMap`). Each bucket stores the
//! arena key of its chain head and each entry stores the key of its
//! successor, so unlinking never leaves a dangling successor and stale
//! handles simply stop resolving.

use crate::error::{Error, Result};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;
use tracing::debug;

/// Bucket count used when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 11;

/// Load factor used when none is given.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Largest bucket count the table will grow to.
pub const MAX_CAPACITY: usize = i32::MAX as usize - 8;

/// Stable reference to a live entry. Resolves to nothing once the entry is unlinked.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Handle(DefaultKey);

#[derive(Debug)]
struct Entry<K, V> {
    hash: u64,
    key: K,
    value: V,
    next: Option<DefaultKey>,
}

/// Where an entry sits in its chain.
#[derive(Copy, Clone, Debug)]
struct Link {
    index: usize,
    prev: Option<DefaultKey>,
    key: DefaultKey,
}

/// Traversal state: buckets are visited from the highest index down, chains head to tail.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Position {
    index: usize,
    next: Option<DefaultKey>,
}

/// Entries detached by [`ChainTable::clear`]. Never read; it only carries the
/// entries out of the table so they are dropped after the borrow ends.
pub(crate) struct Detached<K, V>(#[allow(dead_code)] SlotMap<DefaultKey, Entry<K, V>>);

pub(crate) struct ChainTable<K, V, S = RandomState> {
    hasher: S,
    buckets: Vec<Option<DefaultKey>>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    threshold: usize,
    load_factor: f32,
    mod_count: u64,
}

#[inline]
fn bucket_index(hash: u64, capacity: usize) -> usize {
    (hash & 0x7FFF_FFFF) as usize % capacity
}

pub(crate) fn threshold_for(capacity: usize, load_factor: f32) -> usize {
    let limit = (MAX_CAPACITY + 1) as f64;
    (capacity as f64 * load_factor as f64).min(limit) as usize
}

/// Next bucket count after `old`: `2 * old + 1`, clamped to [`MAX_CAPACITY`].
/// `None` once the table already sits at the ceiling.
pub(crate) fn grown_capacity(old: usize) -> Option<usize> {
    let new = old.saturating_mul(2).saturating_add(1);
    if new > MAX_CAPACITY {
        if old >= MAX_CAPACITY {
            return None;
        }
        return Some(MAX_CAPACITY);
    }
    Some(new)
}

/// Validates construction parameters and coerces a zero capacity to one.
pub(crate) fn checked_capacity(capacity: usize, load_factor: f32) -> Result<usize> {
    if capacity > MAX_CAPACITY {
        return Err(Error::IllegalCapacity(capacity));
    }
    // Written to also reject NaN.
    if !(load_factor > 0.0) {
        return Err(Error::IllegalLoadFactor(load_factor));
    }
    Ok(capacity.max(1))
}

impl<K, V, S> ChainTable<K, V, S> {
    /// Builds an empty table with exactly `capacity` buckets. Callers validate first.
    pub(crate) fn with_exact_capacity(capacity: usize, load_factor: f32, hasher: S) -> Self {
        debug_assert!(capacity >= 1 && capacity <= MAX_CAPACITY);
        Self {
            hasher,
            buckets: vec![None; capacity],
            slots: SlotMap::with_key(),
            threshold: threshold_for(capacity, load_factor),
            load_factor,
            mod_count: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn load_factor(&self) -> f32 {
        self.load_factor
    }

    #[cfg(test)]
    pub(crate) fn threshold(&self) -> usize {
        self.threshold
    }

    pub(crate) fn mod_count(&self) -> u64 {
        self.mod_count
    }

    fn index_for(&self, hash: u64) -> usize {
        bucket_index(hash, self.buckets.len())
    }

    pub(crate) fn start(&self) -> Position {
        Position {
            index: self.buckets.len(),
            next: None,
        }
    }

    /// Returns the entry at `pos` and moves `pos` past it.
    pub(crate) fn advance<'a>(&'a self, pos: &mut Position) -> Option<(Handle, &'a K, &'a V)> {
        let mut cur = pos.next;
        while cur.is_none() && pos.index > 0 {
            pos.index -= 1;
            cur = self.buckets.get(pos.index).copied().flatten();
        }
        let k = cur?;
        let e = self.slots.get(k)?;
        pos.next = e.next;
        Some((Handle(k), &e.key, &e.value))
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            table: self,
            pos: self.start(),
        }
    }

    pub(crate) fn entry(&self, h: Handle) -> Option<(&K, &V)> {
        self.slots.get(h.0).map(|e| (&e.key, &e.value))
    }

    /// Overwrites the value in place without touching the modification count.
    pub(crate) fn replace_at(&mut self, h: Handle, value: V) -> Option<V> {
        let e = self.slots.get_mut(h.0)?;
        Some(mem::replace(&mut e.value, value))
    }

    /// Overwrites the value in place and counts it as a modification.
    pub(crate) fn update_at(&mut self, h: Handle, value: V) -> Option<V> {
        let old = self.replace_at(h, value)?;
        self.mod_count = self.mod_count.wrapping_add(1);
        Some(old)
    }

    fn unlink(&mut self, link: Link) -> Option<(K, V)> {
        let e = self.slots.remove(link.key)?;
        match link.prev {
            Some(p) => {
                if let Some(pe) = self.slots.get_mut(p) {
                    pe.next = e.next;
                }
            }
            None => self.buckets[link.index] = e.next,
        }
        self.mod_count = self.mod_count.wrapping_add(1);
        Some((e.key, e.value))
    }

    /// Unlinks the entry behind `h`, locating its bucket from the cached hash.
    pub(crate) fn remove_at(&mut self, h: Handle) -> Option<(K, V)> {
        let hash = self.slots.get(h.0)?.hash;
        let index = self.index_for(hash);
        let mut prev = None;
        let mut cur = self.buckets[index];
        while let Some(k) = cur {
            if k == h.0 {
                return self.unlink(Link { index, prev, key: k });
            }
            prev = Some(k);
            cur = self.slots.get(k)?.next;
        }
        None
    }

    pub(crate) fn find_value(&self, value: &V) -> Option<Handle>
    where
        V: PartialEq,
    {
        let mut pos = self.start();
        while let Some((h, _, v)) = self.advance(&mut pos) {
            if v == value {
                return Some(h);
            }
        }
        None
    }

    pub(crate) fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.find_value(value).is_some()
    }

    /// Grows to `2 * capacity + 1` buckets and relinks every entry.
    ///
    /// Relinking prepends, so chains that stay together come out reversed.
    /// At [`MAX_CAPACITY`] this is a no-op.
    pub(crate) fn rehash(&mut self) {
        let old_capacity = self.buckets.len();
        let Some(new_capacity) = grown_capacity(old_capacity) else {
            debug!(capacity = old_capacity, "rehash skipped at maximum capacity");
            return;
        };
        self.mod_count = self.mod_count.wrapping_add(1);
        self.relink(new_capacity);
        debug!(old_capacity, new_capacity, len = self.slots.len(), "rehashed");
    }

    /// Moves every entry into a fresh array of `capacity` buckets and
    /// recomputes the threshold. Not counted as a modification.
    pub(crate) fn relink(&mut self, capacity: usize) {
        debug_assert!(capacity >= 1 && capacity <= MAX_CAPACITY);
        let old = mem::replace(&mut self.buckets, vec![None; capacity]);
        self.threshold = threshold_for(capacity, self.load_factor);

        for head in old.into_iter().rev() {
            let mut cur = head;
            while let Some(k) = cur {
                let e = &mut self.slots[k];
                cur = e.next;
                let index = bucket_index(e.hash, capacity);
                e.next = self.buckets[index];
                self.buckets[index] = Some(k);
            }
        }
    }

    /// Empties every bucket. The entries are handed back so they can be
    /// dropped after the caller releases the table.
    pub(crate) fn clear(&mut self) -> Detached<K, V> {
        self.buckets.iter_mut().for_each(|b| *b = None);
        self.mod_count = self.mod_count.wrapping_add(1);
        debug!(len = self.slots.len(), "cleared");
        Detached(mem::replace(&mut self.slots, SlotMap::with_key()))
    }

    fn link_new(&mut self, hash: u64, key: K, value: V) -> Handle {
        let index = self.index_for(hash);
        let next = self.buckets[index];
        let k = self.slots.insert(Entry {
            hash,
            key,
            value,
            next,
        });
        self.buckets[index] = Some(k);
        Handle(k)
    }

    fn add_entry(&mut self, hash: u64, key: K, value: V) -> Handle {
        self.mod_count = self.mod_count.wrapping_add(1);
        if self.slots.len() >= self.threshold {
            self.rehash();
        }
        self.link_new(hash, key, value)
    }
}

impl<K, V, S> ChainTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn with_capacity_and_hasher(
        capacity: usize,
        load_factor: f32,
        hasher: S,
    ) -> Result<Self> {
        let capacity = checked_capacity(capacity, load_factor)?;
        Ok(Self::with_exact_capacity(capacity, load_factor, hasher))
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn locate<Q>(&self, hash: u64, q: &Q) -> Option<Link>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let index = self.index_for(hash);
        let mut prev = None;
        let mut cur = self.buckets[index];
        while let Some(k) = cur {
            let e = &self.slots[k];
            if e.hash == hash && e.key.borrow() == q {
                return Some(Link { index, prev, key: k });
            }
            prev = Some(k);
            cur = e.next;
        }
        None
    }

    pub(crate) fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.locate(hash, q).map(|link| Handle(link.key))
    }

    pub(crate) fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.find(q)?;
        self.slots.get(h.0).map(|e| &e.value)
    }

    pub(crate) fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Maps `key` to `value`, returning the previous value.
    ///
    /// Overwriting an existing key replaces the value in place and is not
    /// counted as a modification.
    pub(crate) fn put(&mut self, key: K, value: V) -> Option<V> {
        self.upsert(key, value).map(|(_, old)| old)
    }

    /// [`put`](Self::put) that also hands back the unused key on overwrite,
    /// so the caller decides where the key and the old value are dropped.
    pub(crate) fn upsert(&mut self, key: K, value: V) -> Option<(K, V)> {
        let hash = self.make_hash(&key);
        if let Some(link) = self.locate(hash, &key) {
            let old = self.replace_at(Handle(link.key), value)?;
            return Some((key, old));
        }
        self.add_entry(hash, key, value);
        None
    }

    /// Links a new entry for a key the caller has just checked is absent.
    pub(crate) fn insert_absent(&mut self, key: K, value: V) -> Handle {
        let hash = self.make_hash(&key);
        debug_assert!(self.locate(hash, &key).is_none());
        self.add_entry(hash, key, value)
    }

    pub(crate) fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let link = self.locate(hash, q)?;
        self.unlink(link)
    }

    /// Removes the mapping for `q` only if `pred` accepts its current value.
    pub(crate) fn remove_if<Q, F>(&mut self, q: &Q, pred: F) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> bool,
    {
        let hash = self.make_hash(q);
        let link = self.locate(hash, q)?;
        if !pred(&self.slots[link.key].value) {
            return None;
        }
        self.unlink(link)
    }

    /// Insert path for loading a dump: no growth, no modification count,
    /// and a duplicate key means the input is corrupt.
    pub(crate) fn reconstitute(&mut self, key: K, value: V) -> Result<()> {
        let hash = self.make_hash(&key);
        if self.locate(hash, &key).is_some() {
            return Err(Error::Corrupt("duplicate key in serialized table".into()));
        }
        self.link_new(hash, key, value);
        Ok(())
    }
}

/// Borrowing traversal in bucket order.
pub(crate) struct Iter<'a, K, V, S> {
    table: &'a ChainTable<K, V, S>,
    pos: Position,
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.table.advance(&mut self.pos).map(|(_, k, v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key lands in bucket 0
    }

    fn table<K: Eq + Hash, V>() -> ChainTable<K, V> {
        ChainTable::with_capacity_and_hasher(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, RandomState::new())
            .unwrap()
    }

    fn colliding<V>() -> ChainTable<&'static str, V, ConstBuildHasher> {
        ChainTable::with_capacity_and_hasher(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, ConstBuildHasher)
            .unwrap()
    }

    fn keys<V, S>(t: &ChainTable<&'static str, V, S>) -> Vec<&'static str> {
        t.iter().map(|(k, _)| *k).collect()
    }

    /// Invariant: capacity 1 with load factor 0.75 has threshold 0, so the first
    /// insert grows the table to 3 buckets before linking.
    #[test]
    fn first_insert_into_capacity_one_rehashes() {
        let mut t: ChainTable<&str, i32> =
            ChainTable::with_capacity_and_hasher(1, 0.75, RandomState::new()).unwrap();
        assert_eq!(t.threshold(), 0);
        assert_eq!(t.put("a", 7), None);
        assert_eq!(t.capacity(), 3);
        assert_eq!(t.threshold(), 2);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("a"), Some(&7));
    }

    #[test]
    fn zero_capacity_is_coerced_to_one() {
        let t: ChainTable<i32, i32> =
            ChainTable::with_capacity_and_hasher(0, 0.75, RandomState::new()).unwrap();
        assert_eq!(t.capacity(), 1);
    }

    #[test]
    fn invalid_parameters_rejected() {
        for lf in [0.0f32, -1.0, f32::NAN] {
            match ChainTable::<i32, i32>::with_capacity_and_hasher(4, lf, RandomState::new()) {
                Err(Error::IllegalLoadFactor(_)) => {}
                other => panic!("unexpected result for {lf}: {:?}", other.map(|t| t.capacity())),
            }
        }
        match ChainTable::<i32, i32>::with_capacity_and_hasher(
            MAX_CAPACITY + 1,
            0.75,
            RandomState::new(),
        ) {
            Err(Error::IllegalCapacity(c)) => assert_eq!(c, MAX_CAPACITY + 1),
            other => panic!("unexpected result: {:?}", other.map(|t| t.capacity())),
        }
    }

    /// Invariant: 100 keys in a default table are all reachable, the count
    /// matches the traversal, and no chain holds the same (hash, key) twice.
    #[test]
    fn hundred_keys_in_default_table() {
        let mut t: ChainTable<i32, i32> = table();
        for i in 1..=100 {
            assert_eq!(t.put(i, i * 10), None);
        }
        assert_eq!(t.len(), 100);
        for i in 1..=100 {
            assert_eq!(t.get(&i), Some(&(i * 10)));
        }

        let mut seen = HashSet::new();
        for head in t.buckets.iter() {
            let mut cur = *head;
            while let Some(k) = cur {
                let e = &t.slots[k];
                assert!(seen.insert((e.hash, e.key)), "duplicate chain entry");
                cur = e.next;
            }
        }
        assert_eq!(seen.len(), 100);
        assert_eq!(t.iter().count(), 100);
    }

    /// Invariant: overwriting a key keeps one entry and leaves the modification
    /// count untouched.
    #[test]
    fn overwrite_is_not_a_modification() {
        let mut t: ChainTable<&str, i32> = table();
        t.put("k", 1);
        let before = t.mod_count();
        assert_eq!(t.put("k", 2), Some(1));
        assert_eq!(t.mod_count(), before);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("k"), Some(&2));
    }

    /// Invariant: the insert that finds `len >= threshold` rehashes exactly once
    /// first; every earlier entry survives with its value.
    #[test]
    fn growth_triggers_single_rehash() {
        let mut t: ChainTable<i32, i32> = table();
        assert_eq!(t.threshold(), 8);
        for i in 0..8 {
            t.put(i, -i);
        }
        assert_eq!(t.capacity(), 11);
        assert_eq!(t.mod_count(), 8);

        t.put(8, -8);
        assert_eq!(t.capacity(), 23);
        // one for the insert, one for the rehash
        assert_eq!(t.mod_count(), 10);
        for i in 0..9 {
            assert_eq!(t.get(&i), Some(&-i));
        }
    }

    /// Invariant: a chain is most-recent-first.
    #[test]
    fn chain_is_lifo() {
        let mut t = colliding();
        for k in ["a", "b", "c"] {
            t.put(k, ());
        }
        assert_eq!(keys(&t), ["c", "b", "a"]);
    }

    /// Invariant: rehash relinks by prepending, so a chain that stays in one
    /// bucket comes out reversed; entries keep their identity.
    #[test]
    fn rehash_reverses_chain() {
        let mut t = colliding();
        for (i, k) in ["a", "b", "c"].into_iter().enumerate() {
            t.put(k, i);
        }
        let h = t.find("b").unwrap();
        t.rehash();
        assert_eq!(t.capacity(), 23);
        assert_eq!(keys(&t), ["a", "b", "c"]);
        assert_eq!(t.find("b"), Some(h));
        assert_eq!(t.get("c"), Some(&2));
    }

    /// Invariant: unlinking the middle, head, and tail of a chain keeps the
    /// remaining links intact.
    #[test]
    fn remove_relinks_chain() {
        let mut t = colliding();
        for (i, k) in ["a", "b", "c", "d"].into_iter().enumerate() {
            t.put(k, i);
        }
        assert_eq!(t.remove("b"), Some(("b", 1)));
        assert_eq!(keys(&t), ["d", "c", "a"]);
        assert_eq!(t.remove("d"), Some(("d", 3)));
        assert_eq!(keys(&t), ["c", "a"]);
        assert_eq!(t.remove("a"), Some(("a", 0)));
        assert_eq!(keys(&t), ["c"]);
        assert_eq!(t.remove("a"), None);
        assert_eq!(t.remove("c"), Some(("c", 2)));
        assert!(t.is_empty());
        assert!(t.buckets.iter().all(Option::is_none));
    }

    /// Invariant: handle removal re-derives the bucket from the cached hash, so it
    /// still works after the table was resized; the handle goes stale afterwards.
    #[test]
    fn remove_at_after_rehash() {
        let mut t: ChainTable<i32, &str> = table();
        t.put(1, "one");
        t.put(2, "two");
        let h = t.find(&2).unwrap();
        t.rehash();
        let before = t.mod_count();
        assert_eq!(t.remove_at(h), Some((2, "two")));
        assert_eq!(t.mod_count(), before + 1);
        assert_eq!(t.remove_at(h), None);
        assert!(t.entry(h).is_none());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn remove_if_checks_value() {
        let mut t: ChainTable<&str, i32> = table();
        t.put("k", 5);
        assert_eq!(t.remove_if("k", |v| *v == 4), None);
        assert_eq!(t.len(), 1);
        assert_eq!(t.remove_if("k", |v| *v == 5), Some(("k", 5)));
        assert!(t.is_empty());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut t: ChainTable<i32, i32> = table();
        for i in 0..20 {
            t.put(i, i);
        }
        let capacity = t.capacity();
        let before = t.mod_count();
        let detached = t.clear();
        drop(detached);
        assert_eq!(t.len(), 0);
        assert_eq!(t.capacity(), capacity);
        assert_eq!(t.mod_count(), before + 1);
        assert_eq!(t.iter().count(), 0);
        assert!(!t.contains_key(&3));
    }

    #[test]
    fn contains_value_scans_all_chains() {
        let mut t: ChainTable<i32, String> = table();
        for i in 0..30 {
            t.put(i, format!("v{i}"));
        }
        assert!(t.contains_value(&"v29".to_string()));
        assert!(t.contains_value(&"v0".to_string()));
        assert!(!t.contains_value(&"v30".to_string()));
    }

    /// Invariant: the load path rejects duplicates and does not count modifications.
    #[test]
    fn reconstitute_rejects_duplicates() {
        let mut t: ChainTable<&str, i32> =
            ChainTable::with_capacity_and_hasher(1, 0.75, RandomState::new()).unwrap();
        t.reconstitute("a", 1).unwrap();
        t.reconstitute("b", 2).unwrap();
        // no growth on this path, even past the threshold
        assert_eq!(t.capacity(), 1);
        assert!(matches!(t.reconstitute("a", 3), Err(Error::Corrupt(_))));
        assert_eq!(t.mod_count(), 0);
        assert_eq!(t.get("a"), Some(&1));
    }

    /// Invariant: an overwrite hands back the caller's key together with the
    /// old value; a fresh insert hands back nothing.
    #[test]
    fn upsert_returns_unused_key() {
        let mut t: ChainTable<String, i32> = table();
        assert_eq!(t.upsert("k".to_string(), 1), None);
        let before = t.mod_count();
        assert_eq!(t.upsert("k".to_string(), 2), Some(("k".to_string(), 1)));
        assert_eq!(t.mod_count(), before);
        assert_eq!(t.get("k"), Some(&2));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: relinking to an explicit size keeps every entry, resets the
    /// threshold and does not count as a modification.
    #[test]
    fn relink_is_not_a_modification() {
        let mut t: ChainTable<i32, i32> = table();
        for i in 0..6 {
            t.put(i, i * 3);
        }
        let before = t.mod_count();
        t.relink(101);
        assert_eq!(t.capacity(), 101);
        assert_eq!(t.threshold(), 75);
        assert_eq!(t.mod_count(), before);
        assert!((0..6).all(|i| t.get(&i) == Some(&(i * 3))));
        assert_eq!(t.iter().count(), 6);
    }

    #[test]
    fn capacity_growth_is_clamped() {
        assert_eq!(grown_capacity(1), Some(3));
        assert_eq!(grown_capacity(11), Some(23));
        assert_eq!(grown_capacity(MAX_CAPACITY / 2 + 1), Some(MAX_CAPACITY));
        assert_eq!(grown_capacity(MAX_CAPACITY), None);
        assert_eq!(threshold_for(MAX_CAPACITY, 2.0), MAX_CAPACITY + 1);
        assert_eq!(threshold_for(11, 0.75), 8);
    }
}
