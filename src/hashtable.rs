//! Hashtable: the public, synchronized map built on [`ChainTable`].
//!
//! Every operation takes one reentrant lock for its full duration. User
//! closures run with the lock held but without any borrow of the table, on
//! cloned snapshots of the entry they concern; the modification count is
//! checked again once they return.

use crate::chain_table::{ChainTable, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, MAX_CAPACITY};
use crate::cursor::{Elements, Entries, Keys};
use crate::error::{Error, Result};
use crate::views::{EntrySet, KeySet, Values};
use core::cell::RefCell;
use core::fmt;
use core::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use parking_lot::ReentrantMutex;
use std::collections::hash_map::{DefaultHasher, RandomState};

/// What a remapping function wants done with the mapping it was shown.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Remap<V> {
    /// Store this value.
    Keep(V),
    /// Drop the mapping, or do not create one.
    Remove,
}

impl<V> From<Option<V>> for Remap<V> {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(v) => Remap::Keep(v),
            None => Remap::Remove,
        }
    }
}

/// A hash table that maps non-optional keys to non-optional values.
///
/// Collisions are resolved by chaining; the table grows to `2 * capacity + 1`
/// buckets once its entry count reaches `capacity * load_factor`. All methods
/// take `&self` and are serialized through an internal reentrant lock, so a
/// `Hashtable` can be shared across threads behind an `Arc`.
///
/// Cursors ([`keys`](Self::keys), [`key_set`](Self::key_set)`.iter()`, ...)
/// lock per step rather than for the whole traversal. They are fail-fast:
/// any change counted as a modification makes their next step return
/// [`Error::ConcurrentModification`]. Overwriting an existing key with
/// [`put`](Self::put) or [`replace`](Self::replace) is not counted.
pub struct Hashtable<K, V, S = RandomState> {
    pub(crate) inner: ReentrantMutex<RefCell<ChainTable<K, V, S>>>,
}

impl<K, V> Hashtable<K, V>
where
    K: Eq + Hash,
{
    /// Empty table with 11 buckets and load factor 0.75.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_and_load_factor(capacity, DEFAULT_LOAD_FACTOR)
    }

    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self> {
        Self::with_capacity_and_hasher(capacity, load_factor, RandomState::new())
    }
}

impl<K, V> Default for Hashtable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Hashtable<K, V, S> {
    pub(crate) fn from_table(table: ChainTable<K, V, S>) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(table)),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&ChainTable<K, V, S>) -> R) -> R {
        let guard = self.inner.lock();
        let table = guard.borrow();
        f(&table)
    }

    fn write<R>(&self, f: impl FnOnce(&mut ChainTable<K, V, S>) -> R) -> R {
        let guard = self.inner.lock();
        let mut table = guard.borrow_mut();
        f(&mut table)
    }

    pub fn len(&self) -> usize {
        self.read(|t| t.len())
    }

    pub fn is_empty(&self) -> bool {
        self.read(|t| t.is_empty())
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.read(|t| t.capacity())
    }

    pub fn load_factor(&self) -> f32 {
        self.read(|t| t.load_factor())
    }

    pub(crate) fn mod_count(&self) -> u64 {
        self.read(|t| t.mod_count())
    }

    /// Grows the bucket array to `2 * capacity + 1` and relinks every entry.
    ///
    /// Called automatically by inserts; at the maximum capacity it does nothing.
    pub fn rehash(&self) {
        self.write(|t| t.rehash())
    }

    pub fn clear(&self) {
        // Entries are dropped outside the borrow so their `Drop` may use the table.
        let detached = self.write(|t| t.clear());
        drop(detached);
    }

    /// Returns `true` if some key maps to `value`. This scans the whole table.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.read(|t| t.contains_value(value))
    }

    /// Removes the first entry, in traversal order, whose value equals `value`.
    pub(crate) fn remove_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let removed = self.write(|t| t.find_value(value).and_then(|h| t.remove_at(h)));
        removed.is_some()
    }

    /// Same as [`contains_value`](Self::contains_value).
    pub fn contains(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.contains_value(value)
    }

    /// Enumeration of the keys. Fail-fast, but cannot remove.
    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys::new(self, false)
    }

    /// Enumeration of the values. Fail-fast, but cannot remove.
    pub fn elements(&self) -> Elements<'_, K, V, S> {
        Elements::new(self, false)
    }

    pub fn key_set(&self) -> KeySet<'_, K, V, S> {
        KeySet::new(self)
    }

    pub fn values(&self) -> Values<'_, K, V, S> {
        Values::new(self)
    }

    pub fn entry_set(&self) -> EntrySet<'_, K, V, S> {
        EntrySet::new(self)
    }

    /// Removing iterator over `(key, value)` pairs; same as `entry_set().iter()`.
    pub fn iter(&self) -> Entries<'_, K, V, S> {
        Entries::new(self, true)
    }

    pub(crate) fn snapshot(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.read(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl<K, V, S> Hashtable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Empty table with the default capacity and load factor.
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_table(ChainTable::with_exact_capacity(
            DEFAULT_CAPACITY,
            DEFAULT_LOAD_FACTOR,
            hasher,
        ))
    }

    /// Fails if `capacity` exceeds [`MAX_CAPACITY`] or `load_factor` is not
    /// strictly positive. A capacity of zero is raised to one.
    pub fn with_capacity_and_hasher(capacity: usize, load_factor: f32, hasher: S) -> Result<Self> {
        let table = ChainTable::with_capacity_and_hasher(capacity, load_factor, hasher)?;
        Ok(Self::from_table(table))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.read(|t| t.contains_key(key))
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.read(|t| t.get(key).cloned())
    }

    pub fn get_or_default<Q>(&self, key: &Q, default: V) -> V
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.get(key).unwrap_or(default)
    }

    /// Maps `key` to `value` and returns the previous value, if any.
    ///
    /// Replacing the value of an existing key is done in place and does not
    /// invalidate outstanding cursors.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let displaced = self.write(|t| t.upsert(key, value));
        displaced.map(|(_, old)| old)
    }

    /// Puts every pair while holding the lock once.
    pub fn put_all<I>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let _guard = self.inner.lock();
        for (k, v) in pairs {
            self.put(k, v);
        }
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let removed = self.write(|t| t.remove(key));
        removed.map(|(_, v)| v)
    }

    /// Removes `key` only while it maps to `value`.
    pub fn remove_mapping<Q>(&self, key: &Q, value: &V) -> bool
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        let removed = self.write(|t| t.remove_if(key, |v| v == value));
        removed.is_some()
    }

    /// Inserts only if `key` is absent; otherwise returns the current value.
    pub fn put_if_absent(&self, key: K, value: V) -> Option<V>
    where
        V: Clone,
    {
        let (current, unused) = self.write(|t| match t.get(&key) {
            Some(existing) => (Some(existing.clone()), Some((key, value))),
            None => {
                t.insert_absent(key, value);
                (None, None)
            }
        });
        drop(unused);
        current
    }

    /// Overwrites the value of an existing key; absent keys are left alone.
    pub fn replace<Q>(&self, key: &Q, value: V) -> Option<V>
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (old, unused) = self.write(|t| match t.find(key) {
            Some(h) => (t.replace_at(h, value), None),
            None => (None, Some(value)),
        });
        drop(unused);
        old
    }

    /// Overwrites the value of `key` only if it currently equals `old`.
    pub fn replace_if_eq<Q>(&self, key: &Q, old: &V, new: V) -> bool
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        let (replaced, displaced) = self.write(|t| match t.find(key) {
            Some(h) if t.entry(h).map_or(false, |(_, v)| v == old) => {
                (true, t.replace_at(h, new))
            }
            _ => (false, Some(new)),
        });
        drop(displaced);
        replaced
    }

    /// Calls `f` for each mapping in traversal order.
    ///
    /// Fails with [`Error::ConcurrentModification`] if `f` modifies the table.
    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        K: Clone,
        V: Clone,
        F: FnMut(&K, &V),
    {
        let guard = self.inner.lock();
        let (mut pos, expected) = {
            let t = guard.borrow();
            (t.start(), t.mod_count())
        };
        loop {
            let (k, v) = {
                let t = guard.borrow();
                if t.mod_count() != expected {
                    return Err(Error::ConcurrentModification);
                }
                match t.advance(&mut pos) {
                    Some((_, k, v)) => (k.clone(), v.clone()),
                    None => return Ok(()),
                }
            };
            f(&k, &v);
        }
    }

    /// Replaces every value with `f(key, value)`.
    ///
    /// Fails with [`Error::ConcurrentModification`] if `f` modifies the table;
    /// values already replaced stay replaced.
    pub fn replace_all<F>(&self, mut f: F) -> Result<()>
    where
        K: Clone,
        V: Clone,
        F: FnMut(&K, &V) -> V,
    {
        let guard = self.inner.lock();
        let (mut pos, expected) = {
            let t = guard.borrow();
            (t.start(), t.mod_count())
        };
        loop {
            let (h, k, v) = {
                let t = guard.borrow();
                if t.mod_count() != expected {
                    return Err(Error::ConcurrentModification);
                }
                match t.advance(&mut pos) {
                    Some((h, k, v)) => (h, k.clone(), v.clone()),
                    None => return Ok(()),
                }
            };
            let new = f(&k, &v);
            let old = {
                let mut t = guard.borrow_mut();
                if t.mod_count() != expected {
                    return Err(Error::ConcurrentModification);
                }
                t.replace_at(h, new)
            };
            drop(old);
        }
    }

    /// Returns the current value of `key`, or inserts `f(&key)` if it yields one.
    ///
    /// `f` is only called for an absent key. Returns `Ok(None)` when `f`
    /// declines to produce a value.
    pub fn compute_if_absent<F>(&self, key: K, f: F) -> Result<Option<V>>
    where
        V: Clone,
        F: FnOnce(&K) -> Option<V>,
    {
        let guard = self.inner.lock();
        let expected = {
            let t = guard.borrow();
            if let Some(v) = t.get(&key) {
                return Ok(Some(v.clone()));
            }
            t.mod_count()
        };
        let Some(value) = f(&key) else {
            return Ok(None);
        };
        let mut t = guard.borrow_mut();
        if t.mod_count() != expected {
            return Err(Error::ConcurrentModification);
        }
        t.insert_absent(key, value.clone());
        Ok(Some(value))
    }

    /// Remaps the value of a present key. [`Remap::Remove`] drops the mapping.
    ///
    /// Returns the new value, or `Ok(None)` if the key was absent or removed.
    pub fn compute_if_present<Q, F>(&self, key: &Q, f: F) -> Result<Option<V>>
    where
        K: core::borrow::Borrow<Q> + Clone,
        Q: ?Sized + Hash + Eq,
        V: Clone,
        F: FnOnce(&K, &V) -> Remap<V>,
    {
        let guard = self.inner.lock();
        let (h, k, v, expected) = {
            let t = guard.borrow();
            let Some(h) = t.find(key) else {
                return Ok(None);
            };
            let Some((k, v)) = t.entry(h) else {
                return Ok(None);
            };
            (h, k.clone(), v.clone(), t.mod_count())
        };
        let remap = f(&k, &v);
        let mut t = guard.borrow_mut();
        if t.mod_count() != expected {
            return Err(Error::ConcurrentModification);
        }
        match remap {
            Remap::Keep(new) => {
                let old = t.update_at(h, new.clone());
                drop(t);
                drop(old);
                Ok(Some(new))
            }
            Remap::Remove => {
                let removed = t.remove_at(h);
                drop(t);
                drop(removed);
                Ok(None)
            }
        }
    }

    /// Remaps the mapping for `key`, present or not.
    ///
    /// `f` sees the current value, if any. [`Remap::Keep`] stores the result
    /// (inserting if absent); [`Remap::Remove`] drops an existing mapping and
    /// leaves an absent key absent.
    pub fn compute<F>(&self, key: K, f: F) -> Result<Option<V>>
    where
        V: Clone,
        F: FnOnce(&K, Option<&V>) -> Remap<V>,
    {
        let guard = self.inner.lock();
        let (found, expected) = {
            let t = guard.borrow();
            let found = t
                .find(&key)
                .and_then(|h| t.entry(h).map(|(_, v)| (h, v.clone())));
            (found, t.mod_count())
        };
        let remap = f(&key, found.as_ref().map(|(_, v)| v));
        let mut t = guard.borrow_mut();
        if t.mod_count() != expected {
            return Err(Error::ConcurrentModification);
        }
        match (found, remap) {
            (Some((h, _)), Remap::Keep(new)) => {
                let old = t.update_at(h, new.clone());
                drop(t);
                drop(old);
                Ok(Some(new))
            }
            (Some((h, _)), Remap::Remove) => {
                let removed = t.remove_at(h);
                drop(t);
                drop(removed);
                Ok(None)
            }
            (None, Remap::Keep(new)) => {
                t.insert_absent(key, new.clone());
                Ok(Some(new))
            }
            (None, Remap::Remove) => Ok(None),
        }
    }

    /// Inserts `value` for an absent key; otherwise stores `f(current, value)`.
    ///
    /// [`Remap::Remove`] drops the existing mapping.
    pub fn merge<F>(&self, key: K, value: V, f: F) -> Result<Option<V>>
    where
        V: Clone,
        F: FnOnce(&V, &V) -> Remap<V>,
    {
        let guard = self.inner.lock();
        let (h, current, expected) = {
            let mut t = guard.borrow_mut();
            let found = t
                .find(&key)
                .and_then(|h| t.entry(h).map(|(_, v)| (h, v.clone())));
            match found {
                Some((h, current)) => (h, current, t.mod_count()),
                None => {
                    t.insert_absent(key, value.clone());
                    return Ok(Some(value));
                }
            }
        };
        let remap = f(&current, &value);
        let mut t = guard.borrow_mut();
        if t.mod_count() != expected {
            return Err(Error::ConcurrentModification);
        }
        match remap {
            Remap::Keep(new) => {
                let old = t.update_at(h, new.clone());
                drop(t);
                drop(old);
                Ok(Some(new))
            }
            Remap::Remove => {
                let removed = t.remove_at(h);
                drop(t);
                drop(removed);
                Ok(None)
            }
        }
    }
}

impl<K, V, S> PartialEq for Hashtable<K, V, S>
where
    K: Eq + Hash + Clone,
    V: PartialEq + Clone,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if core::ptr::eq(self, other) {
            return true;
        }
        // Snapshot first so the two locks are never held together.
        let pairs = self.snapshot();
        other.read(|t| {
            t.len() == pairs.len() && pairs.iter().all(|(k, v)| t.get(k) == Some(v))
        })
    }
}

impl<K, V, S> Eq for Hashtable<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Clone,
    S: BuildHasher,
{
}

impl<K, V, S> Hash for Hashtable<K, V, S>
where
    K: Hash,
    V: Hash,
{
    /// Order-independent: entry count plus the sum of per-entry hashes under
    /// a fixed-key hasher, so equal tables hash alike whatever their `S`.
    fn hash<H: Hasher>(&self, state: &mut H) {
        let entry_hasher = BuildHasherDefault::<DefaultHasher>::default();
        let (len, sum) = self.read(|t| {
            let sum = t
                .iter()
                .fold(0u64, |acc, kv| acc.wrapping_add(entry_hasher.hash_one(kv)));
            (t.len(), sum)
        });
        state.write_usize(len);
        state.write_u64(sum);
    }
}

impl<K, V, S> fmt::Debug for Hashtable<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|t| f.debug_map().entries(t.iter()).finish())
    }
}

impl<K, V, S> FromIterator<(K, V)> for Hashtable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    /// Sized like a copy of another map: `max(2 * n, 11)` buckets.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let capacity = iter
            .size_hint()
            .0
            .saturating_mul(2)
            .clamp(DEFAULT_CAPACITY, MAX_CAPACITY);
        let table = Self::from_table(ChainTable::with_exact_capacity(
            capacity,
            DEFAULT_LOAD_FACTOR,
            S::default(),
        ));
        table.put_all(iter);
        table
    }
}

impl<K, V, S> Extend<(K, V)> for Hashtable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}

impl<'a, K, V, S> IntoIterator for &'a Hashtable<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Item = Result<(K, V)>;
    type IntoIter = Entries<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
