use ucdn_core::format::VERSION_SINGLE_BYTE;
use ucdn_core::{Chunking, Registry};

/// One trie node per byte: every name hangs off the name one byte shorter.
///
/// Simple and always correct, but a name with a long unshared tail pays a
/// full node (delta plus terminator) for every byte of it.
pub struct SingleByteChunking;

impl Chunking for SingleByteChunking {
    fn format_version(&self) -> u32 {
        VERSION_SINGLE_BYTE
    }

    fn name(&self) -> &'static str {
        "single-byte"
    }

    fn prefix_len(&self, entry: &[u8], _registry: &Registry) -> usize {
        entry.len() - 1
    }
}
