mod branch_point;
mod single_byte;

pub use branch_point::BranchPointChunking;
pub use single_byte::SingleByteChunking;

use ucdn_core::format::{VERSION_BRANCH_POINT, VERSION_SINGLE_BYTE};
use ucdn_core::Chunking;

/// Resolve the strategy that writes format `version`.
pub fn chunking_by_version(version: u32) -> anyhow::Result<Box<dyn Chunking>> {
    match version {
        VERSION_SINGLE_BYTE => Ok(Box::new(SingleByteChunking)),
        VERSION_BRANCH_POINT => Ok(Box::new(BranchPointChunking)),
        _ => anyhow::bail!(
            "unknown format version {}; supported: {} (single-byte), {} (branch-point)",
            version,
            VERSION_SINGLE_BYTE,
            VERSION_BRANCH_POINT
        ),
    }
}

/// Resolve a strategy from its CLI name.
pub fn chunking_by_name(name: &str) -> anyhow::Result<Box<dyn Chunking>> {
    match name {
        "single-byte" | "single" => Ok(Box::new(SingleByteChunking)),
        "branch-point" | "branch" => Ok(Box::new(BranchPointChunking)),
        other => anyhow::bail!(
            "unknown chunking '{}'. Valid options: single-byte, branch-point",
            other
        ),
    }
}
