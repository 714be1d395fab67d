//! Live views of a [`Hashtable`]'s keys, values and entries.
//!
//! Views hold only a reference to the table. Reads and removals go through
//! the table's lock like any direct call; their cursors can remove.

use crate::cursor::{Elements, Entries, Keys};
use crate::hashtable::Hashtable;
use core::hash::{BuildHasher, Hash};

pub struct KeySet<'a, K, V, S> {
    table: &'a Hashtable<K, V, S>,
}

pub struct Values<'a, K, V, S> {
    table: &'a Hashtable<K, V, S>,
}

pub struct EntrySet<'a, K, V, S> {
    table: &'a Hashtable<K, V, S>,
}

macro_rules! view_common {
    ($view:ident, $cursor:ident) => {
        impl<'a, K, V, S> $view<'a, K, V, S> {
            pub(crate) fn new(table: &'a Hashtable<K, V, S>) -> Self {
                Self { table }
            }

            pub fn len(&self) -> usize {
                self.table.len()
            }

            pub fn is_empty(&self) -> bool {
                self.table.is_empty()
            }

            /// Clears the backing table.
            pub fn clear(&self) {
                self.table.clear()
            }

            pub fn iter(&self) -> $cursor<'a, K, V, S> {
                $cursor::new(self.table, true)
            }
        }

        impl<'a, 'v, K, V, S> IntoIterator for &'v $view<'a, K, V, S>
        where
            $cursor<'a, K, V, S>: Iterator,
        {
            type Item = <$cursor<'a, K, V, S> as Iterator>::Item;
            type IntoIter = $cursor<'a, K, V, S>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }
    };
}

view_common!(KeySet, Keys);
view_common!(Values, Elements);
view_common!(EntrySet, Entries);

impl<'a, K, V, S> KeySet<'a, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains_key(key)
    }

    /// Removes `key` and its value from the table.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove(key).is_some()
    }
}

impl<'a, K, V, S> Values<'a, K, V, S>
where
    V: PartialEq,
{
    pub fn contains(&self, value: &V) -> bool {
        self.table.contains_value(value)
    }

    /// Removes one entry holding `value`, the first met in traversal order.
    pub fn remove(&self, value: &V) -> bool {
        self.table.remove_value(value)
    }
}

impl<'a, K, V, S> EntrySet<'a, K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    pub fn contains<Q>(&self, key: &Q, value: &V) -> bool
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.table.get(key).map_or(false, |v| v == *value)
    }

    pub fn remove<Q>(&self, key: &Q, value: &V) -> bool
    where
        K: core::borrow::Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove_mapping(key, value)
    }
}
