pub mod chunking;
pub mod compressor;
pub mod format;
pub mod range;
pub mod reader;
pub mod ucd;
pub mod var_ascii;
pub mod varint;
pub mod writer;

pub use chunking::{Chunking, Registry};
pub use compressor::StringCompressor;
pub use format::{UcdnHeader, HEADER_SIZE, MAGIC};
pub use range::{validate_coverage, CodepointRange, RangeClass};
pub use reader::{resolve_name, RangeRow, Reader};
pub use writer::{encode_to_vec, WriteSummary, Writer};
