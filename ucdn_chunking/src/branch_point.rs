use ucdn_core::format::VERSION_BRANCH_POINT;
use ucdn_core::{Chunking, Registry};

/// Nodes only at branch points.
///
/// A name attaches to its longest proper prefix that is either empty, extended
/// by more than one distinct string, or itself a registered name. Prefixes
/// used by a single string get no node of their own, so an unshared tail is
/// stored as one multi-byte suffix chunk.
pub struct BranchPointChunking;

impl Chunking for BranchPointChunking {
    fn format_version(&self) -> u32 {
        VERSION_BRANCH_POINT
    }

    fn name(&self) -> &'static str {
        "branch-point"
    }

    fn prefix_len(&self, entry: &[u8], registry: &Registry) -> usize {
        (1..entry.len())
            .rev()
            .find(|&len| {
                let prefix = &entry[..len];
                registry.users(prefix) > 1 || registry.is_entry(prefix)
            })
            .unwrap_or(0)
    }
}
