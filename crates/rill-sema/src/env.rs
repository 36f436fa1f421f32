//! Scoped symbol tables
//!
//! A `ScopedTable` maps keys to a stack of `(value, scope_level)` entries.
//! Opening a scope pushes a frame; closing one discards every entry added
//! in that frame, which is what releases borrows and kills lifetimes on
//! scope exit. Lookup returns the innermost binding together with the level
//! it was bound at, so shadowing works and callers can tell same-scope
//! redefinitions apart from legal shadowing.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct ScopedTable<K, V> {
    entries: HashMap<K, Vec<(V, usize)>>,
    /// Keys inserted per open frame, innermost last. A key appears once per
    /// insertion so closing pops exactly what the frame added.
    frames: Vec<Vec<K>>,
}

impl<K: Eq + Hash + Copy, V: Clone> ScopedTable<K, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            frames: vec![Vec::new()],
        }
    }

    /// Current scope level. The outermost (global) scope is level 0.
    pub fn level(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn open(&mut self) {
        self.frames.push(Vec::new());
    }

    pub fn close(&mut self) {
        let keys = self.frames.pop().expect("scope close without open");
        assert!(!self.frames.is_empty(), "closed the global scope");
        for key in keys {
            if let Some(stack) = self.entries.get_mut(&key) {
                stack.pop();
                if stack.is_empty() {
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// Binds `key` at the current frame, shadowing any outer binding.
    /// Same-scope redefinition policy is the caller's business.
    pub fn insert(&mut self, key: K, value: V) {
        let level = self.level();
        self.entries.entry(key).or_default().push((value, level));
        self.frames
            .last_mut()
            .expect("no open scope")
            .push(key);
    }

    /// Innermost binding for `key`, with the scope level it was bound at.
    pub fn find(&self, key: K) -> Option<(V, usize)> {
        self.entries
            .get(&key)
            .and_then(|stack| stack.last())
            .map(|(v, level)| (v.clone(), *level))
    }
}

impl<K: Eq + Hash + Copy, V: Clone> Default for ScopedTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outstanding borrow counts for one declaration at the current scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BorrowCounts {
    pub immutable: u32,
    pub mutable: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_returns_innermost() {
        let mut table = ScopedTable::new();
        table.insert("x", 1);
        table.open();
        table.insert("x", 2);
        assert_eq!(table.find("x"), Some((2, 1)));
        table.close();
        assert_eq!(table.find("x"), Some((1, 0)));
    }

    #[test]
    fn close_discards_frame_entries() {
        let mut table = ScopedTable::new();
        table.open();
        table.insert("a", 10);
        table.insert("b", 20);
        table.close();
        assert_eq!(table.find("a"), None);
        assert_eq!(table.find("b"), None);
    }

    #[test]
    fn reinsert_in_same_frame_shadows_and_unwinds() {
        let mut table = ScopedTable::new();
        table.insert("x", 1);
        table.open();
        table.insert("x", 2);
        table.insert("x", 3);
        assert_eq!(table.find("x"), Some((3, 1)));
        table.close();
        assert_eq!(table.find("x"), Some((1, 0)));
    }

    #[test]
    fn levels_track_nesting() {
        let mut table: ScopedTable<&str, i32> = ScopedTable::new();
        assert_eq!(table.level(), 0);
        table.open();
        table.open();
        assert_eq!(table.level(), 2);
        table.close();
        assert_eq!(table.level(), 1);
    }
}
