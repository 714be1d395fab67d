//! Linear dump format.
//!
//! Layout, big-endian: `[load_factor: f32][capacity: i32][count: i32]`
//! followed by `count` `[key][value]` pairs in traversal order. Loading
//! sizes a fresh bucket array from the count and re-inserts every pair on a
//! path that neither grows the table nor counts modifications, and that
//! treats a repeated key as corruption.

use crate::chain_table::{ChainTable, MAX_CAPACITY};
use crate::error::{Error, Result};
use crate::hashtable::Hashtable;
use core::hash::{BuildHasher, Hash};
use std::io::{self, Read, Write};
use tracing::{debug, warn};

/// Element encoding used by [`Hashtable::write_to`] and [`Hashtable::read_from`].
pub trait Persist: Sized {
    fn persist<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()>;

    fn restore<R: Read + ?Sized>(input: &mut R) -> Result<Self>;
}

macro_rules! persist_be_bytes {
    ($($t:ty),* $(,)?) => {
        $(
            impl Persist for $t {
                fn persist<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
                    out.write_all(&self.to_be_bytes())
                }

                fn restore<R: Read + ?Sized>(input: &mut R) -> Result<Self> {
                    let mut buf = [0u8; core::mem::size_of::<$t>()];
                    input.read_exact(&mut buf)?;
                    Ok(<$t>::from_be_bytes(buf))
                }
            }
        )*
    };
}

persist_be_bytes!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl Persist for usize {
    fn persist<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        (*self as u64).persist(out)
    }

    fn restore<R: Read + ?Sized>(input: &mut R) -> Result<Self> {
        let v = u64::restore(input)?;
        usize::try_from(v).map_err(|_| Error::Corrupt(format!("usize out of range: {v}")))
    }
}

impl Persist for bool {
    fn persist<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        u8::from(*self).persist(out)
    }

    fn restore<R: Read + ?Sized>(input: &mut R) -> Result<Self> {
        match u8::restore(input)? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(Error::Corrupt(format!("invalid bool byte: {b}"))),
        }
    }
}

impl Persist for char {
    fn persist<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        u32::from(*self).persist(out)
    }

    fn restore<R: Read + ?Sized>(input: &mut R) -> Result<Self> {
        let v = u32::restore(input)?;
        char::from_u32(v).ok_or_else(|| Error::Corrupt(format!("invalid char: {v:#x}")))
    }
}

impl Persist for String {
    /// `u32` byte length, then UTF-8 bytes.
    fn persist<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let len = u32::try_from(self.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
        len.persist(out)?;
        out.write_all(self.as_bytes())
    }

    fn restore<R: Read + ?Sized>(input: &mut R) -> Result<Self> {
        let len = u32::restore(input)? as usize;
        // Read through `take` so a corrupt length cannot force a huge allocation.
        let mut buf = Vec::new();
        input.take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        String::from_utf8(buf).map_err(|e| Error::Corrupt(format!("invalid UTF-8: {e}")))
    }
}

/// Most buckets allocated before any pair has been read. A larger table is
/// relinked to its full size once every pair is in.
const PREALLOCATED_BUCKETS: usize = 1 << 16;

fn corrupt(msg: String) -> Error {
    warn!(reason = %msg, "rejecting serialized table");
    Error::Corrupt(msg)
}

/// Bucket count for a table restored with `elements` entries.
///
/// Leaves about 5% + 3 slots of headroom, prefers an odd count, and never
/// exceeds the original capacity once that is raised to hold every entry.
pub(crate) fn restored_capacity(original: usize, elements: usize, load_factor: f32) -> usize {
    let needed = (elements as f32 / load_factor) as usize;
    let original = original.max(needed.saturating_add(1));
    let padded = elements + elements / 20;
    let mut length = ((padded as f32 / load_factor) as usize).saturating_add(3);
    if length > elements && length % 2 == 0 {
        length -= 1;
    }
    length.min(original).clamp(1, MAX_CAPACITY)
}

impl<K, V, S> Hashtable<K, V, S>
where
    K: Eq + Hash + Persist,
    V: Persist,
    S: BuildHasher,
{
    /// Writes the table in the linear dump format.
    ///
    /// Pairs are copied under the lock; the writing itself happens after the
    /// lock is released.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()>
    where
        K: Clone,
        V: Clone,
    {
        let (load_factor, capacity, pairs) = {
            let guard = self.inner.lock();
            let t = guard.borrow();
            let pairs: Vec<(K, V)> = t.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            (t.load_factor(), t.capacity(), pairs)
        };
        let capacity = i32::try_from(capacity)
            .map_err(|_| Error::IllegalCapacity(capacity))?;
        let count = i32::try_from(pairs.len())
            .map_err(|_| Error::Corrupt(format!("too many entries to persist: {}", pairs.len())))?;

        load_factor.persist(out)?;
        capacity.persist(out)?;
        count.persist(out)?;
        for (k, v) in &pairs {
            k.persist(out)?;
            v.persist(out)?;
        }
        debug!(count, capacity, "table written");
        Ok(())
    }

    /// Reads a table written by [`write_to`](Self::write_to).
    ///
    /// Fails with [`Error::Corrupt`] on a non-positive or NaN load factor, a
    /// negative capacity or count, an undecodable element, or a duplicate
    /// key; with [`Error::Io`] if the input ends early.
    pub fn read_from<R: Read + ?Sized>(input: &mut R) -> Result<Self>
    where
        S: Default,
    {
        let load_factor = f32::restore(input)?;
        if !(load_factor > 0.0) {
            return Err(corrupt(format!("illegal load factor: {load_factor}")));
        }
        let original = i32::restore(input)?;
        if original < 0 {
            return Err(corrupt(format!("illegal capacity: {original}")));
        }
        let elements = i32::restore(input)?;
        if elements < 0 {
            return Err(corrupt(format!("illegal element count: {elements}")));
        }

        let capacity = restored_capacity(original as usize, elements as usize, load_factor);
        let mut table = ChainTable::with_exact_capacity(
            capacity.min(PREALLOCATED_BUCKETS),
            load_factor,
            S::default(),
        );
        for _ in 0..elements {
            let key = K::restore(input)?;
            let value = V::restore(input)?;
            if let Err(e) = table.reconstitute(key, value) {
                warn!(error = %e, "rejecting serialized table");
                return Err(e);
            }
        }
        if table.capacity() < capacity {
            table.relink(capacity);
        }
        debug!(elements, capacity, "table loaded");
        Ok(Self::from_table(table))
    }
}
