use std::fmt;
use std::path::Path;

use anyhow::Context;

use crate::format::{
    RangeRecord, Section, UcdnHeader, HEADER_SIZE, MAX_CODEPOINT, RANGE_RECORD_SIZE,
};
use crate::range::{validate_coverage, CodepointRange, RangeClass};
use crate::var_ascii::decode_var_ascii;
use crate::varint::decode_varint;

/// One decoded entry of the range table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRow {
    /// First codepoint of the range.
    pub first: u32,
    pub class: RangeClass,
    pub name: String,
    pub age: String,
}

impl fmt::Display for RangeRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "U+{:04X} '{}' (cls: {}, first introduced: {})",
            self.first, self.name, self.class, self.age
        )
    }
}

/// Reader for UCDNAMES files.
///
/// # Open sequence
/// 1. Load the whole file into memory; every offset in it is absolute.
/// 2. Parse the 36-byte header (magic and version check) and make sure every
///    section lies inside the file.
/// 3. Decode the age table.
///
/// Range records are decoded on demand. [`row`] touches only the record and
/// the trie nodes on its name's path; [`lookup`] binary-searches the table.
///
/// [`row`]: Reader::row
/// [`lookup`]: Reader::lookup
pub struct Reader {
    data: Vec<u8>,
    pub header: UcdnHeader,
    ages: Vec<String>,
}

impl Reader {
    /// Open and validate a UCDNAMES file.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).with_context(|| format!("reading {:?}", path))?;
        Self::from_bytes(data)
    }

    /// Validate an in-memory UCDNAMES image.
    pub fn from_bytes(data: Vec<u8>) -> anyhow::Result<Self> {
        let header_buf: &[u8; HEADER_SIZE as usize] = data
            .get(..HEADER_SIZE as usize)
            .and_then(|head| head.try_into().ok())
            .ok_or_else(|| anyhow::anyhow!("file is {} bytes, shorter than the header", data.len()))?;
        let header = UcdnHeader::from_bytes(header_buf)?;

        for (label, section) in [("trie", header.trie), ("ages", header.ages), ("ranges", header.ranges)] {
            if section.end() > data.len() as u64 {
                anyhow::bail!(
                    "{} section {}..{} runs past the end of the {}-byte file",
                    label,
                    section.location,
                    section.end(),
                    data.len()
                );
            }
        }
        if header.ranges.size as u64 % RANGE_RECORD_SIZE != 0 {
            anyhow::bail!(
                "range table is {} bytes, not a multiple of {}",
                header.ranges.size,
                RANGE_RECORD_SIZE
            );
        }

        let mut ages = Vec::new();
        let age_bytes = section_slice(&data, header.ages);
        let mut pos = 0;
        while pos < age_bytes.len() {
            let (age, consumed) = decode_var_ascii(&age_bytes[pos..])
                .with_context(|| format!("decoding age {} at offset {}", ages.len(), pos))?;
            ages.push(age);
            pos += consumed;
        }

        Ok(Self { data, header, ages })
    }

    /// Number of records in the range table.
    pub fn range_count(&self) -> usize {
        self.header.range_count()
    }

    /// Distinct ages, in table order.
    pub fn ages(&self) -> &[String] {
        &self.ages
    }

    pub fn trie_bytes(&self) -> &[u8] {
        section_slice(&self.data, self.header.trie)
    }

    /// Raw bytes of `section` (for fingerprints / inspection).
    pub fn section_bytes(&self, section: Section) -> &[u8] {
        section_slice(&self.data, section)
    }

    /// The packed record at `index`, undecoded.
    pub fn record(&self, index: usize) -> anyhow::Result<RangeRecord> {
        if index >= self.range_count() {
            anyhow::bail!("range index {} out of range (total {})", index, self.range_count());
        }
        let start = self.header.ranges.location as usize + index * RANGE_RECORD_SIZE as usize;
        let buf: &[u8; RANGE_RECORD_SIZE as usize] =
            self.data[start..start + RANGE_RECORD_SIZE as usize].try_into()?;
        RangeRecord::from_bytes(buf)
    }

    /// Decode the record at `index`, resolving its class, age and name.
    pub fn row(&self, index: usize) -> anyhow::Result<RangeRow> {
        let record = self.record(index)?;
        let class = RangeClass::from_index(record.class_index())?;
        let age = self
            .ages
            .get(record.age_index() as usize)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "range {} refers to age {} but the table has {}",
                    index,
                    record.age_index(),
                    self.ages.len()
                )
            })?
            .clone();
        let name = resolve_name(self.trie_bytes(), record.name_offset)
            .with_context(|| format!("resolving name of range {}", index))?;
        Ok(RangeRow {
            first: record.first(),
            class,
            name,
            age,
        })
    }

    /// All rows in file order.
    pub fn rows(&self) -> impl Iterator<Item = anyhow::Result<RangeRow>> + '_ {
        (0..self.range_count()).map(move |i| self.row(i))
    }

    /// Rebuild the encoder's input: each record ends where the next begins,
    /// the last one at U+10FFFF.
    pub fn ranges(&self) -> anyhow::Result<Vec<CodepointRange>> {
        let rows = self.rows().collect::<anyhow::Result<Vec<_>>>()?;
        let mut ranges = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let last = match rows.get(i + 1) {
                Some(next) if next.first > row.first => next.first - 1,
                Some(next) => anyhow::bail!(
                    "range {} starts at U+{:04X}, not after U+{:04X}",
                    i + 1,
                    next.first,
                    row.first
                ),
                None => MAX_CODEPOINT,
            };
            ranges.push(CodepointRange::new(
                row.first,
                last,
                row.class,
                row.name.clone(),
                row.age.clone(),
            ));
        }
        validate_coverage(&ranges)?;
        Ok(ranges)
    }

    /// Find the row whose range contains `codepoint`.
    pub fn lookup(&self, codepoint: u32) -> anyhow::Result<Option<RangeRow>> {
        if codepoint > MAX_CODEPOINT {
            return Ok(None);
        }
        // Count the records starting at or before `codepoint`.
        let (mut lo, mut hi) = (0, self.range_count());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.record(mid)?.first() <= codepoint {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        match lo {
            0 => Ok(None),
            n => self.row(n - 1).map(Some),
        }
    }
}

fn section_slice(data: &[u8], section: Section) -> &[u8] {
    &data[section.location as usize..section.end() as usize]
}

/// Rebuild the name stored at `offset` in `trie`.
///
/// Walks from the node back to offset 0 through each node's delta. Every
/// read is bounded by the end of `trie`, and deltas must point strictly
/// backwards, so corrupt input fails instead of looping.
pub fn resolve_name(trie: &[u8], offset: u32) -> anyhow::Result<String> {
    let mut suffixes = Vec::new();
    let mut offset = offset;
    while offset != 0 {
        let start = offset as usize;
        if start >= trie.len() {
            anyhow::bail!("name offset {} is outside the {}-byte trie", offset, trie.len());
        }
        let (delta, used) = decode_varint(&trie[start..])
            .with_context(|| format!("trie node at offset {}", offset))?;
        let (suffix, _) = decode_var_ascii(&trie[start + used..])
            .with_context(|| format!("trie node at offset {}", offset))?;
        if delta == 0 || delta > offset as u64 {
            anyhow::bail!("trie node at offset {} has invalid delta {}", offset, delta);
        }
        suffixes.push(suffix);
        offset -= delta as u32;
    }
    Ok(suffixes.iter().rev().map(String::as_str).collect())
}
