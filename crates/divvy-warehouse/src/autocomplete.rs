use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// Most names a single autocomplete lookup returns.
pub const AUTOCOMPLETE_LIMIT: usize = 10;

/// Prefix index over company names.
///
/// Presence-only: a name is either in the index or not. Results come back in
/// lexicographic order of the matching key (code point order, children of a
/// node are kept sorted), truncated to [`AUTOCOMPLETE_LIMIT`].
///
/// One lock covers the whole trie. Writers are exclusive, so a lookup never
/// sees a half-inserted or half-pruned path.
#[derive(Debug)]
pub struct AutocompleteIndex {
    trie: RwLock<Trie>,
    case_sensitive: bool,
}

#[derive(Debug, Default)]
struct Trie {
    root: Node,
    len: usize,
}

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<char, Node>,
    /// Names whose key ends here. More than one only when matching ignores
    /// case and names differ by case alone.
    names: BTreeSet<String>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.names.is_empty()
    }

    fn collect(&self, out: &mut Vec<String>, limit: usize) {
        for name in &self.names {
            if out.len() == limit {
                return;
            }
            out.push(name.clone());
        }
        for child in self.children.values() {
            if out.len() == limit {
                return;
            }
            child.collect(out, limit);
        }
    }

    /// Drop `name` from the node reached by `key`, pruning emptied branches.
    fn remove(&mut self, key: &[char], name: &str) -> bool {
        let Some((first, rest)) = key.split_first() else {
            return self.names.remove(name);
        };
        let Some(child) = self.children.get_mut(first) else {
            return false;
        };
        let removed = child.remove(rest, name);
        if child.is_empty() {
            self.children.remove(first);
        }
        removed
    }
}

impl Default for AutocompleteIndex {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AutocompleteIndex {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            trie: RwLock::new(Trie::default()),
            case_sensitive,
        }
    }

    /// Add `name`. Inserting a present name, or an empty one, changes nothing.
    pub fn insert(&self, name: &str) {
        if name.is_empty() {
            return;
        }
        let key = self.key(name);
        let mut guard = self.write();
        let trie = &mut *guard;
        let mut node = &mut trie.root;
        for ch in key.chars() {
            node = node.children.entry(ch).or_default();
        }
        if node.names.insert(name.to_string()) {
            trie.len += 1;
            trace!("indexed {name:?}");
        }
    }

    /// Up to [`AUTOCOMPLETE_LIMIT`] names starting with `prefix`.
    ///
    /// The empty prefix matches everything and is bounded like any other.
    pub fn search(&self, prefix: &str) -> Vec<String> {
        let key = self.key(prefix);
        let trie = self.read();
        let mut node = &trie.root;
        for ch in key.chars() {
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }
        let mut out = Vec::with_capacity(AUTOCOMPLETE_LIMIT);
        node.collect(&mut out, AUTOCOMPLETE_LIMIT);
        out
    }

    /// Drop `name`; returns whether it was present. Absent names are a no-op.
    pub fn remove(&self, name: &str) -> bool {
        let key: Vec<char> = self.key(name).chars().collect();
        let mut trie = self.write();
        let removed = trie.root.remove(&key, name);
        if removed {
            trie.len -= 1;
            trace!("unindexed {name:?}");
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        let key = self.key(name);
        let trie = self.read();
        let mut node = &trie.root;
        for ch in key.chars() {
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        *self.write() = Trie::default();
    }

    /// Replace the whole content in one step; lookups see either the old
    /// set or the new one.
    pub fn replace<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let staged = Self::new(self.case_sensitive);
        for name in names {
            staged.insert(name.as_ref());
        }
        let staged = staged.trie.into_inner().unwrap_or_else(PoisonError::into_inner);
        *self.write() = staged;
    }

    fn key(&self, s: &str) -> String {
        if self.case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    }

    // A panic while holding the lock cannot leave a path half-linked: every
    // mutation either completes or touches nothing, so the poison flag is
    // safe to ignore.
    fn read(&self) -> RwLockReadGuard<'_, Trie> {
        self.trie.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Trie> {
        self.trie.write().unwrap_or_else(PoisonError::into_inner)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////////////////////////
