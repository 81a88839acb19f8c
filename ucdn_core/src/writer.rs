use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::chunking::Chunking;
use crate::compressor::StringCompressor;
use crate::format::{
    RangeRecord, Section, UcdnHeader, HEADER_SIZE, MAX_AGES, RANGE_RECORD_SIZE, SECTION_ALIGNMENT,
};
use crate::range::{validate_coverage, CodepointRange};
use crate::var_ascii::encode_var_ascii;

/// What [`Writer::finish`] put on disk.
#[derive(Debug, Clone)]
pub struct WriteSummary {
    pub header: UcdnHeader,
    /// Total bytes written, including trailing padding.
    pub file_size: u64,
    pub trie_nodes: usize,
    pub distinct_names: usize,
    pub distinct_ages: usize,
}

/// Writer for UCDNAMES files.
///
/// # Write contract
/// [`create`] (or [`new`]) writes a zeroed header placeholder. [`finish`]
/// takes the complete range list, writes every section and then seeks back
/// to offset 0 to write the real header.
///
/// # Format layout written
/// ```text
/// [HEADER: 36 bytes placeholder]
/// [RANGES: 8 bytes × N]                    ← each section 4-byte aligned
/// [TRIE: compressed names]
/// [AGES: concatenated var-ascii strings]
/// ← seek back to 0, overwrite header with real values
/// ```
///
/// [`create`]: Writer::create
/// [`new`]: Writer::new
/// [`finish`]: Writer::finish
pub struct Writer<W: Write + Seek> {
    sink: SectionSink<W>,
    compressor: StringCompressor,
}

/// Output stream plus the position of its cursor.
struct SectionSink<W: Write + Seek> {
    out: W,
    /// Current write position (mirrors the output cursor).
    current_offset: u64,
}

impl<W: Write + Seek> SectionSink<W> {
    /// Pad with zeros up to the next section boundary.
    fn align(&mut self) -> anyhow::Result<()> {
        let padding = (SECTION_ALIGNMENT - self.current_offset % SECTION_ALIGNMENT) % SECTION_ALIGNMENT;
        self.out.write_all(&[0u8; SECTION_ALIGNMENT as usize][..padding as usize])?;
        self.current_offset += padding;
        Ok(())
    }

    /// Align, then write `bytes` as one section.
    fn write_section(&mut self, bytes: &[u8]) -> anyhow::Result<Section> {
        self.align()?;
        let location = u32::try_from(self.current_offset)
            .map_err(|_| anyhow::anyhow!("section starts past 4 GiB at {}", self.current_offset))?;
        let size = u32::try_from(bytes.len())
            .map_err(|_| anyhow::anyhow!("section of {} bytes exceeds 4 GiB", bytes.len()))?;
        self.out.write_all(bytes)?;
        self.current_offset += bytes.len() as u64;
        Ok(Section { location, size })
    }
}

impl Writer<File> {
    /// Create a new UCDNAMES file at `path`, overwriting any existing file.
    pub fn create(path: impl AsRef<Path>, chunking: Box<dyn Chunking>) -> anyhow::Result<Self> {
        Self::new(File::create(path)?, chunking)
    }
}

impl<W: Write + Seek> Writer<W> {
    /// Start a file on `out`, which must be positioned at its beginning.
    pub fn new(mut out: W, chunking: Box<dyn Chunking>) -> anyhow::Result<Self> {
        // Placeholder, overwritten in finish()
        out.write_all(&[0u8; HEADER_SIZE as usize])?;
        Ok(Self {
            sink: SectionSink {
                out,
                current_offset: HEADER_SIZE,
            },
            compressor: StringCompressor::new(chunking),
        })
    }

    /// Validate `ranges`, write all sections, and seal the file by writing the
    /// final header.
    pub fn finish(mut self, ranges: &[CodepointRange]) -> anyhow::Result<WriteSummary> {
        validate_coverage(ranges)?;

        for range in ranges {
            self.compressor.register(range.name.as_bytes())?;
        }

        // ── Range table ────────────────────────────────────────────────────
        let mut ages: Vec<&str> = Vec::new();
        let mut age_indices: HashMap<&str, u32> = HashMap::new();
        let mut range_table = Vec::with_capacity(ranges.len() * RANGE_RECORD_SIZE as usize);
        for range in ranges {
            let age_index = match age_indices.get(range.age.as_str()) {
                Some(&index) => index,
                None => {
                    if ages.len() == MAX_AGES {
                        anyhow::bail!(
                            "more than {} distinct ages; '{}' at U+{:04X} does not fit",
                            MAX_AGES,
                            range.age,
                            range.first
                        );
                    }
                    let index = ages.len() as u32;
                    ages.push(&range.age);
                    age_indices.insert(&range.age, index);
                    index
                }
            };
            let name_offset = self.compressor.compress(range.name.as_bytes())?;
            let record = RangeRecord::pack(range.first, range.class.index(), age_index, name_offset)?;
            range_table.extend_from_slice(&record.to_bytes());
        }
        let ranges_section = self.sink.write_section(&range_table)?;
        debug!(location = ranges_section.location, size = ranges_section.size, "wrote range table");

        // ── Name trie ──────────────────────────────────────────────────────
        let trie_section = self.sink.write_section(self.compressor.trie_bytes())?;
        debug!(
            location = trie_section.location,
            size = trie_section.size,
            nodes = self.compressor.node_count(),
            names = self.compressor.registered_count(),
            chunking = self.compressor.chunking().name(),
            "wrote name trie"
        );

        // ── Age table ──────────────────────────────────────────────────────
        let mut age_table = Vec::new();
        for age in &ages {
            encode_var_ascii(age.as_bytes(), &mut age_table)?;
        }
        let ages_section = self.sink.write_section(&age_table)?;
        debug!(location = ages_section.location, size = ages_section.size, count = ages.len(), "wrote age table");

        self.sink.align()?;

        // ── Seek back to 0 and write the real header ────────────────────────
        let header = UcdnHeader {
            version: self.compressor.chunking().format_version(),
            trie: trie_section,
            ages: ages_section,
            ranges: ranges_section,
        };
        self.sink.out.seek(SeekFrom::Start(0))?;
        self.sink.out.write_all(&header.to_bytes())?;
        self.sink.out.flush()?;

        Ok(WriteSummary {
            header,
            file_size: self.sink.current_offset,
            trie_nodes: self.compressor.node_count(),
            distinct_names: self.compressor.registered_count(),
            distinct_ages: ages.len(),
        })
    }
}

/// Encode `ranges` into an in-memory UCDNAMES image.
pub fn encode_to_vec(ranges: &[CodepointRange], chunking: Box<dyn Chunking>) -> anyhow::Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    Writer::new(&mut cursor, chunking)?.finish(ranges)?;
    Ok(cursor.into_inner())
}
