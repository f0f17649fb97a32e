//! # Name Table
//!
//! String-keyed hashtable with separate chaining and per-key reference counts.
//!
//! The bucket count is fixed at creation; chains absorb any overflow, so the
//! table never rehashes. Bucket selection is FNV-1a (64-bit) reduced modulo
//! the bucket count, for every operation.

use crate::error::TableError;

/// Longest key, in bytes, that is stored without truncation.
pub const MAX_KEY_LEN: usize = 127;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over the key bytes.
#[inline]
fn fnv1a(key: &str) -> u64 {
    key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Cuts `key` down to [`MAX_KEY_LEN`] bytes on a char boundary.
fn bounded_key(key: &str) -> &str {
    if key.len() <= MAX_KEY_LEN {
        return key;
    }

    let mut end = MAX_KEY_LEN;
    while !key.is_char_boundary(end) {
        end -= 1;
    }
    tracing::warn!(key, max = MAX_KEY_LEN, "name table key truncated");
    &key[..end]
}

#[derive(Debug)]
struct Entry<V> {
    key: String,
    value: V,
    ref_count: u32,
}

/// Chaining hashtable mapping names to owned values.
///
/// `set` on a bound key does not overwrite: it bumps the key's reference
/// count and hands the new value back. `remove` only unbinds a key once its
/// count drops to zero.
///
/// # Example
///
/// ```rust
/// use fzy_core::NameTable;
///
/// let mut table = NameTable::new(16)?;
/// assert_eq!(table.set("shader", 1u8), None);
/// assert_eq!(table.set("shader", 2u8), Some(2)); // already bound, value kept
/// assert_eq!(table.remove("shader")?, None);      // count 2 -> 1
/// assert_eq!(table.remove("shader")?, Some(1));   // count 1 -> 0, unbound
/// # Ok::<(), fzy_core::TableError>(())
/// ```
#[derive(Debug)]
pub struct NameTable<V> {
    buckets: Box<[Vec<Entry<V>>]>,
    len: usize,
}

impl<V> NameTable<V> {
    /// Creates a table with `capacity` buckets.
    ///
    /// # Errors
    ///
    /// [`TableError::ZeroCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, TableError> {
        if capacity == 0 {
            return Err(TableError::ZeroCapacity);
        }

        let buckets = (0..capacity).map(|_| Vec::new()).collect();
        Ok(Self { buckets, len: 0 })
    }

    /// Returns the fixed bucket count.
    #[inline]
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the number of bound keys.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Checks if no key is bound.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn slot(&self, key: &str) -> usize {
        // The remainder is below the bucket count, which is a usize.
        (fnv1a(key) % self.buckets.len() as u64) as usize
    }

    fn entry(&self, key: &str) -> Option<&Entry<V>> {
        let key = bounded_key(key);
        self.buckets[self.slot(key)].iter().find(|entry| entry.key == key)
    }

    fn entry_mut(&mut self, key: &str) -> Option<&mut Entry<V>> {
        let key = bounded_key(key);
        let slot = self.slot(key);
        self.buckets[slot].iter_mut().find(|entry| entry.key == key)
    }

    /// Binds `key` to `value`, or bumps the reference count of an existing binding.
    ///
    /// New keys go to the head of their bucket's chain.
    ///
    /// Returns `None` when the value was stored, or `Some(value)` handing the
    /// rejected value back when the key was already bound.
    pub fn set(&mut self, key: &str, value: V) -> Option<V> {
        let key = bounded_key(key);
        let slot = self.slot(key);
        let chain = &mut self.buckets[slot];

        if let Some(entry) = chain.iter_mut().find(|entry| entry.key == key) {
            entry.ref_count += 1;
            return Some(value);
        }

        chain.insert(0, Entry { key: key.to_owned(), value, ref_count: 1 });
        self.len += 1;
        None
    }

    /// Looks up `key` and takes a reference on it.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let entry = self.entry_mut(key)?;
        entry.ref_count += 1;
        Some(&entry.value)
    }

    /// Looks up `key` without touching its reference count.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entry(key).map(|entry| &entry.value)
    }

    /// Checks if `key` is bound.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    /// Returns the reference count of `key`, zero if unbound.
    #[must_use]
    pub fn ref_count(&self, key: &str) -> u32 {
        self.entry(key).map_or(0, |entry| entry.ref_count)
    }

    /// Drops one reference on `key`.
    ///
    /// Returns `Some(value)` once the last reference is gone and the key is
    /// unbound, `None` while references remain.
    ///
    /// # Errors
    ///
    /// [`TableError::KeyNotFound`] if `key` is not bound.
    pub fn remove(&mut self, key: &str) -> Result<Option<V>, TableError> {
        let key = bounded_key(key);
        let slot = self.slot(key);
        let chain = &mut self.buckets[slot];

        let Some(position) = chain.iter().position(|entry| entry.key == key) else {
            return Err(TableError::KeyNotFound(key.to_owned()));
        };

        let entry = &mut chain[position];
        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            return Ok(None);
        }

        let entry = chain.remove(position);
        self.len -= 1;
        Ok(Some(entry.value))
    }

    /// Iterates over all bindings in bucket order, newest first within a bucket.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.buckets
            .iter()
            .flatten()
            .map(|entry| (entry.key.as_str(), &entry.value))
    }

    /// Unbinds every key, handing each value to `destructor`.
    pub fn destroy<F: FnMut(String, V)>(mut self, mut destructor: F) {
        for chain in self.buckets.iter_mut() {
            for entry in chain.drain(..) {
                destructor(entry.key, entry.value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a("a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a("foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn test_set_does_not_overwrite() {
        let mut table = NameTable::new(8).unwrap();
        assert_eq!(table.set("position", 3u8), None);
        assert_eq!(table.set("position", 9u8), Some(9));
        assert_eq!(table.peek("position"), Some(&3));
        assert_eq!(table.ref_count("position"), 2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_get_takes_reference() {
        let mut table = NameTable::new(8).unwrap();
        table.set("mesh", 1u32);
        assert_eq!(table.get("mesh"), Some(&1));
        assert_eq!(table.ref_count("mesh"), 2);

        assert_eq!(table.remove("mesh"), Ok(None));
        assert!(table.contains("mesh"));
        assert_eq!(table.remove("mesh"), Ok(Some(1)));
        assert!(!table.contains("mesh"));
        assert_eq!(table.get("mesh"), None);
    }

    #[test]
    fn test_remove_missing_key() {
        let mut table: NameTable<u8> = NameTable::new(4).unwrap();
        assert_eq!(
            table.remove("ghost"),
            Err(TableError::KeyNotFound("ghost".to_owned()))
        );
    }

    #[test]
    fn test_single_bucket_chaining() {
        let mut table = NameTable::new(1).unwrap();
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            table.set(name, i);
        }
        assert_eq!(table.len(), 4);

        assert_eq!(table.remove("b"), Ok(Some(1)));
        assert_eq!(table.peek("a"), Some(&0));
        assert_eq!(table.peek("c"), Some(&2));
        assert_eq!(table.peek("d"), Some(&3));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_chain_head_insertion_order() {
        let mut table = NameTable::new(1).unwrap();
        for (i, name) in ["first", "second", "third"].iter().enumerate() {
            table.set(name, i);
        }
        let keys: Vec<&str> = table.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["third", "second", "first"]);

        // Unlinking keeps the rest of the chain in order
        table.remove("second").unwrap();
        let keys: Vec<&str> = table.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["third", "first"]);
    }

    #[test]
    fn test_long_keys_truncate_consistently() {
        let mut table = NameTable::new(8).unwrap();
        let long = "x".repeat(MAX_KEY_LEN + 40);
        table.set(&long, 5u8);

        let cut = "x".repeat(MAX_KEY_LEN);
        assert_eq!(table.peek(&cut), Some(&5));
        assert_eq!(table.peek(&long), Some(&5));
        assert_eq!(table.iter().next().map(|(key, _)| key.len()), Some(MAX_KEY_LEN));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let mut table = NameTable::new(8).unwrap();
        // 'é' is two bytes, so byte 127 falls inside a char
        let long = "é".repeat(MAX_KEY_LEN);
        table.set(&long, 1u8);

        let (key, _) = table.iter().next().unwrap();
        assert!(key.len() <= MAX_KEY_LEN);
        assert_eq!(key.len() % 2, 0);
    }

    #[test]
    fn test_destroy_visits_every_value() {
        let mut table = NameTable::new(3).unwrap();
        for i in 0..10u32 {
            table.set(&format!("resource_{i}"), i);
        }

        let mut seen = Vec::new();
        table.destroy(|_, value| seen.push(value));
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(NameTable::<u8>::new(0).err(), Some(TableError::ZeroCapacity));
    }
}
