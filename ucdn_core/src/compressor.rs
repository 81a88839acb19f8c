use std::collections::HashMap;

use crate::chunking::{Chunking, Registry};
use crate::var_ascii::encode_var_ascii;
use crate::varint::encode_varint;

/// Shared-prefix trie over a set of names, laid out in one append-only buffer.
///
/// # Usage contract
/// Call [`register`] for every name first, then [`compress`] to get each
/// name's offset. Offsets are assigned on first use and memoized, so
/// compressing the same name twice returns the same offset.
///
/// # Buffer layout
/// ```text
/// [0x00]                                   ← offset 0: the empty name
/// [varint delta][var-ascii suffix] ...     ← one record per trie node
/// ```
/// A node at offset `o` with delta `d` continues the name stored at `o - d`.
/// Nodes are only ever appended after their prefix, so `d > 0`.
///
/// [`register`]: StringCompressor::register
/// [`compress`]: StringCompressor::compress
pub struct StringCompressor {
    chunking: Box<dyn Chunking>,
    registry: Registry,
    trie: Vec<u8>,
    /// Offset assigned to every string that owns a node.
    offsets: HashMap<Vec<u8>, u32>,
}

impl StringCompressor {
    pub fn new(chunking: Box<dyn Chunking>) -> Self {
        let mut offsets = HashMap::new();
        offsets.insert(Vec::new(), 0);
        Self {
            chunking,
            registry: Registry::default(),
            // One byte, so that offset 0 never belongs to a real node.
            trie: vec![0],
            offsets,
        }
    }

    pub fn chunking(&self) -> &dyn Chunking {
        self.chunking.as_ref()
    }

    /// Record `entry` so that shared prefixes are known before compression.
    pub fn register(&mut self, entry: &[u8]) -> anyhow::Result<()> {
        if let Some(pos) = entry.iter().position(|&b| !b.is_ascii() || b == 0) {
            anyhow::bail!(
                "name {:?} has byte {:#04x} at position {}; names must be ASCII without NUL",
                String::from_utf8_lossy(entry),
                entry[pos],
                pos
            );
        }
        self.registry.register(entry);
        Ok(())
    }

    /// Offset of `entry`'s node, appending nodes for it and any missing
    /// prefixes.
    pub fn compress(&mut self, entry: &[u8]) -> anyhow::Result<u32> {
        if let Some(&existing) = self.offsets.get(entry) {
            return Ok(existing);
        }

        let split = self.chunking.prefix_len(entry, &self.registry);
        if split >= entry.len() {
            anyhow::bail!(
                "{} chunking split a {}-byte name after {} bytes",
                self.chunking.name(),
                entry.len(),
                split
            );
        }
        let (prefix, suffix) = entry.split_at(split);
        let prefix_offset = self.compress(prefix)?;

        let inserted_offset = u32::try_from(self.trie.len())
            .map_err(|_| anyhow::anyhow!("name trie outgrew 32-bit offsets"))?;
        encode_varint((inserted_offset - prefix_offset) as u64, &mut self.trie);
        encode_var_ascii(suffix, &mut self.trie)?;

        self.offsets.insert(entry.to_vec(), inserted_offset);
        Ok(inserted_offset)
    }

    /// Offset already assigned to `s`, if it owns a node.
    pub fn offset_of(&self, s: &[u8]) -> Option<u32> {
        self.offsets.get(s).copied()
    }

    /// Number of nodes in the trie, excluding the empty-name sentinel.
    pub fn node_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn registered_count(&self) -> usize {
        self.registry.entry_count()
    }

    pub fn trie_bytes(&self) -> &[u8] {
        &self.trie
    }

    pub fn into_trie_bytes(self) -> Vec<u8> {
        self.trie
    }
}
