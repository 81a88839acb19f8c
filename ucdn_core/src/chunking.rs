use std::collections::{HashMap, HashSet};

/// What the compressor learned about the name set before assigning offsets.
///
/// Strategies read it to decide where a name's trie node attaches.
#[derive(Default, Debug)]
pub struct Registry {
    /// Every string seen so far: registered names and all their prefixes.
    seen: HashSet<Vec<u8>>,
    /// Names passed to `register` directly.
    entries: HashSet<Vec<u8>>,
    /// For each prefix, how many distinct seen strings extend it by one byte.
    users: HashMap<Vec<u8>, u32>,
}

impl Registry {
    /// Record `entry` and walk its prefixes down to the empty string.
    pub(crate) fn register(&mut self, entry: &[u8]) {
        if entry.is_empty() {
            return;
        }
        self.entries.insert(entry.to_vec());
        for len in (1..=entry.len()).rev() {
            let s = &entry[..len];
            // Shorter prefixes of a seen string were already counted.
            if !self.seen.insert(s.to_vec()) {
                break;
            }
            *self.users.entry(s[..len - 1].to_vec()).or_insert(0) += 1;
        }
    }

    /// Number of distinct strings that extend `prefix` by exactly one byte.
    pub fn users(&self, prefix: &[u8]) -> u32 {
        self.users.get(prefix).copied().unwrap_or(0)
    }

    /// Whether `s` was registered as a whole name.
    pub fn is_entry(&self, s: &[u8]) -> bool {
        self.entries.contains(s)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Splitting policy of the name trie.
///
/// Each `Chunking` implementation:
/// - Is identified by the format version stamped into the file header.
/// - Picks, for a name, the prefix its trie node hangs from. The bytes after
///   that prefix become the node's suffix chunk.
///
/// All strategies produce tries the same reader can walk; they differ only
/// in how many nodes (and bytes) the trie needs.
pub trait Chunking: Send + Sync {
    /// Format version written to the header when this strategy is used.
    fn format_version(&self) -> u32;

    /// Human-readable strategy name for CLI display.
    fn name(&self) -> &'static str;

    /// Length of the prefix `entry` should attach to.
    ///
    /// `entry` is never empty and the result must be shorter than it.
    fn prefix_len(&self, entry: &[u8], registry: &Registry) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_counts_distinct_children() {
        let mut registry = Registry::default();
        for name in [&b"cat"[..], b"car", b"cab", b"cat"] {
            registry.register(name);
        }
        assert_eq!(registry.users(b"ca"), 3);
        assert_eq!(registry.users(b"c"), 1);
        assert_eq!(registry.users(b""), 1);
        assert_eq!(registry.users(b"cat"), 0);
        assert_eq!(registry.entry_count(), 3);
        assert!(registry.is_entry(b"car"));
        assert!(!registry.is_entry(b"ca"));
    }

    #[test]
    fn nested_names_count_once() {
        let mut registry = Registry::default();
        registry.register(b"ab");
        registry.register(b"abc");
        registry.register(b"a");
        assert_eq!(registry.users(b""), 1);
        assert_eq!(registry.users(b"a"), 1);
        assert_eq!(registry.users(b"ab"), 1);
        assert!(registry.is_entry(b"a"));
    }
}
