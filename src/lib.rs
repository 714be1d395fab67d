//! chained-hashtable: a synchronized, separately-chained hash table with
//! fail-fast cursors, compute-style updates and a linear dump format.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a map that every thread can share by reference, where each
//!   public operation is atomic with respect to every other one.
//! - Layers:
//!   - ChainTable<K, V, S>: unsynchronized bucket array. Entries live in a
//!     generational arena and are chained through arena keys; each entry
//!     caches its hash so growing never calls `K: Hash` again.
//!   - Hashtable<K, V, S>: the public map. Wraps a ChainTable in one
//!     reentrant lock and exposes the whole API through `&self`.
//!   - Cursors and views: lazy traversals and live key/value/entry views
//!     that borrow the table and go back to it on every step.
//!
//! Constraints
//! - Bucket index is `(hash & 0x7FFF_FFFF) % capacity`; chains insert at
//!   the head.
//! - Growth happens on insert once `len >= threshold`, to `2 * cap + 1`
//!   buckets, capped at [`MAX_CAPACITY`].
//! - Missing keys and values are `None`; nothing is ever "null".
//!
//! Locking and reentrancy
//! - The monitor is a `parking_lot::ReentrantMutex` around a `RefCell`.
//!   The owning thread may reenter any read operation from a user closure.
//! - User closures (compute family, `for_each`, `replace_all`) run with the
//!   lock held but no `RefCell` borrow outstanding. A closure that changes
//!   the table's structure is detected through the modification count and
//!   the operation fails with [`Error::ConcurrentModification`].
//! - Keys and values the table lets go of (removed entries, overwritten
//!   values, arguments a conditional write did not use) are dropped after
//!   the borrow is released, so a `Drop` impl may call back into the table.
//!
//! Modification count
//! - Counts structural changes: adding an entry, removing one, growing,
//!   clearing, and value updates made through the compute family.
//!   Overwrites via `put`, `replace` and cursor `set_value` are not
//!   counted and do not disturb live cursors.
//!
//! Cursors
//! - Lock once per step, never across a whole traversal.
//! - Enumerations ([`Hashtable::keys`], [`Hashtable::elements`]) only read;
//!   view and [`Hashtable::iter`] cursors can also remove and set values.

mod chain_table;
mod chain_table_proptest;
pub mod cursor;
mod error;
mod hashtable;
pub mod persist;
pub mod views;

// Public surface
pub use chain_table::{DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, MAX_CAPACITY};
pub use cursor::{Cursor, Elements, Entries, EntryKind, KeyKind, Keys, Project, ValueKind};
pub use error::{Error, Result};
pub use hashtable::{Hashtable, Remap};
pub use persist::Persist;
pub use views::{EntrySet, KeySet, Values};
