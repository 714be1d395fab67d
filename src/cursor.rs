//! Fail-fast cursors over a [`Hashtable`].
//!
//! A cursor walks buckets from the highest index down and each chain from
//! head to tail. It locks the table once per step, never across the whole
//! traversal, and compares the table's modification count with the one it
//! recorded; on a mismatch the step fails and the cursor stays failed.

use crate::chain_table::{Handle, Position};
use crate::error::{Error, Result};
use crate::hashtable::Hashtable;
use core::marker::PhantomData;
use tracing::trace;

/// Chooses what a cursor yields for each entry.
pub trait Project<K, V> {
    type Item;

    fn project(key: &K, value: &V) -> Self::Item;
}

/// Cursor kind yielding keys.
#[derive(Debug)]
pub enum KeyKind {}

/// Cursor kind yielding values.
#[derive(Debug)]
pub enum ValueKind {}

/// Cursor kind yielding `(key, value)` pairs.
#[derive(Debug)]
pub enum EntryKind {}

impl<K: Clone, V> Project<K, V> for KeyKind {
    type Item = K;

    fn project(key: &K, _value: &V) -> K {
        key.clone()
    }
}

impl<K, V: Clone> Project<K, V> for ValueKind {
    type Item = V;

    fn project(_key: &K, value: &V) -> V {
        value.clone()
    }
}

impl<K: Clone, V: Clone> Project<K, V> for EntryKind {
    type Item = (K, V);

    fn project(key: &K, value: &V) -> (K, V) {
        (key.clone(), value.clone())
    }
}

pub type Keys<'a, K, V, S> = Cursor<'a, K, V, S, KeyKind>;
pub type Elements<'a, K, V, S> = Cursor<'a, K, V, S, ValueKind>;
pub type Entries<'a, K, V, S> = Cursor<'a, K, V, S, EntryKind>;

/// Cursor over a table. Enumerations (from [`Hashtable::keys`] and
/// [`Hashtable::elements`]) can only read; cursors obtained from the views or
/// [`Hashtable::iter`] can also [`remove`](Self::remove) and
/// [`set_value`](Self::set_value) on the element they last returned.
///
/// As an [`Iterator`] it yields `Err(ConcurrentModification)` once and then
/// ends.
pub struct Cursor<'a, K, V, S, T> {
    table: &'a Hashtable<K, V, S>,
    pos: Position,
    last_returned: Option<Handle>,
    expected_mod_count: u64,
    removable: bool,
    failed: bool,
    _kind: PhantomData<fn() -> T>,
}

impl<'a, K, V, S, T> Cursor<'a, K, V, S, T> {
    pub(crate) fn new(table: &'a Hashtable<K, V, S>, removable: bool) -> Self {
        let guard = table.inner.lock();
        let t = guard.borrow();
        Self {
            table,
            pos: t.start(),
            last_returned: None,
            expected_mod_count: t.mod_count(),
            removable,
            failed: false,
            _kind: PhantomData,
        }
    }

    pub fn is_removable(&self) -> bool {
        self.removable
    }

    fn check(&mut self, mod_count: u64) -> Result<()> {
        if self.failed || mod_count != self.expected_mod_count {
            self.failed = true;
            return Err(Error::ConcurrentModification);
        }
        Ok(())
    }

    fn current(&self) -> Result<Handle> {
        if !self.removable {
            return Err(Error::Unsupported("enumeration cannot modify the table"));
        }
        self.last_returned
            .ok_or(Error::IllegalState("no element to act on"))
    }

    /// Moves to the next entry. `Ok(None)` once every entry has been visited.
    pub fn advance(&mut self) -> Result<Option<T::Item>>
    where
        T: Project<K, V>,
    {
        let table = self.table;
        let guard = table.inner.lock();
        let t = guard.borrow();
        self.check(t.mod_count())?;
        match t.advance(&mut self.pos) {
            Some((h, k, v)) => {
                self.last_returned = Some(h);
                Ok(Some(T::project(k, v)))
            }
            None => Ok(None),
        }
    }

    /// Removes the entry returned by the last [`advance`](Self::advance).
    ///
    /// The cursor adopts the table's new modification count and can keep
    /// going. Fails with [`Error::IllegalState`] if nothing was returned yet
    /// or the element was already removed.
    pub fn remove(&mut self) -> Result<()> {
        let h = self.current()?;
        let table = self.table;
        let guard = table.inner.lock();
        let removed = {
            let mut t = guard.borrow_mut();
            self.check(t.mod_count())?;
            let Some(removed) = t.remove_at(h) else {
                self.failed = true;
                return Err(Error::ConcurrentModification);
            };
            self.expected_mod_count = t.mod_count();
            removed
        };
        self.last_returned = None;
        trace!("entry removed through cursor");
        drop(removed);
        Ok(())
    }

    /// Replaces the value of the entry returned by the last
    /// [`advance`](Self::advance) and returns the old one. Like an overwriting
    /// `put`, this is not counted as a modification.
    pub fn set_value(&mut self, value: V) -> Result<V> {
        let h = self.current()?;
        let table = self.table;
        let guard = table.inner.lock();
        let mut t = guard.borrow_mut();
        self.check(t.mod_count())?;
        match t.replace_at(h, value) {
            Some(old) => Ok(old),
            None => {
                self.failed = true;
                Err(Error::ConcurrentModification)
            }
        }
    }
}

impl<'a, K, V, S, T> Iterator for Cursor<'a, K, V, S, T>
where
    T: Project<K, V>,
{
    type Item = Result<T::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.advance().transpose()
    }
}
