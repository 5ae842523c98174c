//! Interning tables for tags, clock infos, and tag groups.
//!
//! A table deduplicates values behind a mutex and hands out dense `u32`
//! indices. Worker threads read by index through a read lock while the
//! insert path holds the dedup mutex; the tables are grow-only within one
//! search, so an index handed to a worker stays valid for the whole pass.
//! Indices have an inclusive ceiling; exceeding it is a fatal capacity
//! error surfaced by the caller.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, RwLock};

/// Inclusive maximum for interned indices.
pub const INTERN_INDEX_MAX: u32 = i32::MAX as u32;

/// A mutex-guarded interning table.
pub struct InternTable<T> {
    index: Mutex<HashMap<T, u32>>,
    items: RwLock<Vec<T>>,
    ceiling: u32,
}

impl<T: Clone + Eq + Hash> InternTable<T> {
    /// Creates an empty table with the default index ceiling.
    pub fn new() -> Self {
        Self::with_ceiling(INTERN_INDEX_MAX)
    }

    /// Creates an empty table with an explicit index ceiling.
    pub fn with_ceiling(ceiling: u32) -> Self {
        Self {
            index: Mutex::new(HashMap::new()),
            items: RwLock::new(Vec::new()),
            ceiling,
        }
    }

    /// Returns the index of `value`, inserting it if new. `None` when the
    /// index ceiling is exceeded.
    pub fn intern(&self, value: T) -> Option<u32> {
        let mut index = self.index.lock().unwrap();
        if let Some(&id) = index.get(&value) {
            return Some(id);
        }
        let mut items = self.items.write().unwrap();
        let id = items.len() as u32;
        if id > self.ceiling {
            return None;
        }
        items.push(value.clone());
        index.insert(value, id);
        Some(id)
    }

    /// Interns two sibling values at adjacent indices (`a` at an even
    /// index, `b` at the next odd one), so flipping between them is index
    /// arithmetic. Returns the index of `a`, or `None` at the ceiling.
    ///
    /// Both siblings must be new or both present; the pairing is an
    /// invariant of the caller's key construction.
    pub fn intern_pair(&self, a: T, b: T) -> Option<u32> {
        let mut index = self.index.lock().unwrap();
        if let Some(&id) = index.get(&a) {
            return Some(id);
        }
        let mut items = self.items.write().unwrap();
        let id = items.len() as u32;
        if id + 1 > self.ceiling {
            return None;
        }
        debug_assert_eq!(id % 2, 0);
        items.push(a.clone());
        items.push(b.clone());
        index.insert(a, id);
        index.insert(b, id + 1);
        Some(id)
    }

    /// Looks up the index of `value` without inserting.
    pub fn find(&self, value: &T) -> Option<u32> {
        self.index.lock().unwrap().get(value).copied()
    }

    /// The value at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not returned by this table.
    pub fn get(&self, id: u32) -> T {
        self.items.read().unwrap()[id as usize].clone()
    }

    /// Number of interned values.
    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    /// Returns `true` when nothing is interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every interned value. Only valid between searches, when no
    /// indices are live.
    pub fn clear(&self) {
        self.index.lock().unwrap().clear();
        self.items.write().unwrap().clear();
    }
}

impl<T: Clone + Eq + Hash> Default for InternTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_dedups() {
        let table: InternTable<String> = InternTable::new();
        let a = table.intern("x".to_string()).unwrap();
        let b = table.intern("x".to_string()).unwrap();
        let c = table.intern("y".to_string()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn get_by_index() {
        let table: InternTable<String> = InternTable::new();
        let id = table.intern("hello".to_string()).unwrap();
        assert_eq!(table.get(id), "hello");
    }

    #[test]
    fn pair_adjacency() {
        let table: InternTable<(u32, bool)> = InternTable::new();
        let rise = table.intern_pair((7, false), (7, true)).unwrap();
        assert_eq!(rise % 2, 0);
        assert_eq!(table.get(rise), (7, false));
        assert_eq!(table.get(rise + 1), (7, true));
        // Looking up either sibling finds the pair.
        assert_eq!(table.find(&(7, true)), Some(rise + 1));
        assert_eq!(table.intern_pair((7, false), (7, true)), Some(rise));
    }

    #[test]
    fn ceiling_exceeded() {
        let table: InternTable<u32> = InternTable::with_ceiling(1);
        assert_eq!(table.intern(10), Some(0));
        assert_eq!(table.intern(20), Some(1));
        assert_eq!(table.intern(30), None);
    }

    #[test]
    fn equal_fingerprints_share_index() {
        // The interning law: equal values always return the same index.
        let table: InternTable<Vec<u32>> = InternTable::new();
        let a = table.intern(vec![1, 2, 3]).unwrap();
        let b = table.intern(vec![1, 2, 3]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn concurrent_intern() {
        use std::sync::Arc;
        use std::thread;

        let table: Arc<InternTable<u32>> = Arc::new(InternTable::new());
        let mut handles = Vec::new();
        for t in 0..4 {
            let table = Arc::clone(&table);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    table.intern((t * 100 + i) % 50).unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(table.len(), 50);
    }
}
