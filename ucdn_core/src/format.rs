/// Magic bytes at the start of every UCDNAMES file.
pub const MAGIC: &[u8; 8] = b"UCDNAMES";

/// Fixed size of the file header in bytes.
///   magic[8] + version:u32
///   + trie (location:u32, size:u32)
///   + ages (location:u32, size:u32)
///   + ranges (location:u32, size:u32)
///   = 8 + 4 + 8 + 8 + 8 = 36
pub const HEADER_SIZE: u64 = 36;

/// Size of each record in the range table, in bytes.
///   bits:u32 + name_offset:u32 = 8
pub const RANGE_RECORD_SIZE: u64 = 8;

/// Every section starts on a multiple of this many bytes.
pub const SECTION_ALIGNMENT: u64 = 4;

/// Highest valid Unicode scalar position.
pub const MAX_CODEPOINT: u32 = 0x10FFFF;

// ── Format versions ────────────────────────────────────────────────────────

/// Trie written with one byte per node.
pub const VERSION_SINGLE_BYTE: u32 = 1;

/// Trie written with singleton chains merged at branch points.
pub const VERSION_BRANCH_POINT: u32 = 2;

/// Both versions share the same decoder; anything else is rejected.
pub const SUPPORTED_VERSIONS: &[u32] = &[VERSION_SINGLE_BYTE, VERSION_BRANCH_POINT];

// ── Range record bit layout ────────────────────────────────────────────────

pub const FIRST_MASK: u32 = 0x00FF_FFFF;
pub const CLASS_SHIFT: u32 = 24;
pub const CLASS_MASK: u32 = 0b11;
pub const AGE_SHIFT: u32 = 26;

/// The age index gets the 6 bits above the class.
pub const MAX_AGES: usize = 1 << (32 - AGE_SHIFT);

// ── Header ─────────────────────────────────────────────────────────────────

/// Location and length of one section, in bytes from the start of the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Section {
    pub location: u32,
    pub size: u32,
}

impl Section {
    /// One past the last byte of the section.
    pub fn end(&self) -> u64 {
        self.location as u64 + self.size as u64
    }
}

/// Decoded representation of the 36-byte file header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UcdnHeader {
    pub version: u32,
    pub trie: Section,
    pub ages: Section,
    pub ranges: Section,
}

impl UcdnHeader {
    /// Serialize to exactly `HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE as usize] {
        let mut buf = [0u8; HEADER_SIZE as usize];
        buf[..8].copy_from_slice(MAGIC);
        buf[8..12].copy_from_slice(&self.version.to_le_bytes());
        buf[12..16].copy_from_slice(&self.trie.location.to_le_bytes());
        buf[16..20].copy_from_slice(&self.trie.size.to_le_bytes());
        buf[20..24].copy_from_slice(&self.ages.location.to_le_bytes());
        buf[24..28].copy_from_slice(&self.ages.size.to_le_bytes());
        buf[28..32].copy_from_slice(&self.ranges.location.to_le_bytes());
        buf[32..36].copy_from_slice(&self.ranges.size.to_le_bytes());
        buf
    }

    /// Deserialize from `HEADER_SIZE` bytes, checking magic and version.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE as usize]) -> anyhow::Result<Self> {
        if &buf[..8] != MAGIC {
            anyhow::bail!("invalid magic bytes, not a UCDNAMES file");
        }
        let version = u32::from_le_bytes(buf[8..12].try_into()?);
        if !SUPPORTED_VERSIONS.contains(&version) {
            anyhow::bail!(
                "unsupported UCDNAMES version {} (supported: {:?})",
                version,
                SUPPORTED_VERSIONS
            );
        }
        Ok(Self {
            version,
            trie: Section {
                location: u32::from_le_bytes(buf[12..16].try_into()?),
                size: u32::from_le_bytes(buf[16..20].try_into()?),
            },
            ages: Section {
                location: u32::from_le_bytes(buf[20..24].try_into()?),
                size: u32::from_le_bytes(buf[24..28].try_into()?),
            },
            ranges: Section {
                location: u32::from_le_bytes(buf[28..32].try_into()?),
                size: u32::from_le_bytes(buf[32..36].try_into()?),
            },
        })
    }

    /// Number of records in the range table.
    pub fn range_count(&self) -> usize {
        (self.ranges.size as u64 / RANGE_RECORD_SIZE) as usize
    }
}

// ── Range record ────────────────────────────────────────────────────────────

/// One 8-byte entry of the range table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeRecord {
    /// `first | class_index << 24 | age_index << 26`
    pub bits: u32,
    /// Trie offset of the name, 0 for no name.
    pub name_offset: u32,
}

impl RangeRecord {
    pub fn pack(first: u32, class_index: u32, age_index: u32, name_offset: u32) -> anyhow::Result<Self> {
        if first > FIRST_MASK {
            anyhow::bail!("codepoint {:#X} does not fit in 24 bits", first);
        }
        if class_index > CLASS_MASK {
            anyhow::bail!("class index {} does not fit in 2 bits", class_index);
        }
        if age_index as usize >= MAX_AGES {
            anyhow::bail!(
                "age index {} exceeds the {} distinct ages a record can address",
                age_index,
                MAX_AGES
            );
        }
        Ok(Self {
            bits: first | class_index << CLASS_SHIFT | age_index << AGE_SHIFT,
            name_offset,
        })
    }

    pub fn first(&self) -> u32 {
        self.bits & FIRST_MASK
    }

    pub fn class_index(&self) -> u32 {
        (self.bits >> CLASS_SHIFT) & CLASS_MASK
    }

    pub fn age_index(&self) -> u32 {
        self.bits >> AGE_SHIFT
    }

    /// Serialize to exactly `RANGE_RECORD_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; RANGE_RECORD_SIZE as usize] {
        let mut buf = [0u8; RANGE_RECORD_SIZE as usize];
        buf[0..4].copy_from_slice(&self.bits.to_le_bytes());
        buf[4..8].copy_from_slice(&self.name_offset.to_le_bytes());
        buf
    }

    /// Deserialize from `RANGE_RECORD_SIZE` bytes.
    pub fn from_bytes(buf: &[u8; RANGE_RECORD_SIZE as usize]) -> anyhow::Result<Self> {
        Ok(Self {
            bits: u32::from_le_bytes(buf[0..4].try_into()?),
            name_offset: u32::from_le_bytes(buf[4..8].try_into()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_little_endian() {
        let header = UcdnHeader {
            version: VERSION_BRANCH_POINT,
            trie: Section { location: 0x0102_0304, size: 5 },
            ages: Section { location: 6, size: 7 },
            ranges: Section { location: 8, size: 16 },
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..8], b"UCDNAMES");
        assert_eq!(&bytes[8..12], &[2, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(UcdnHeader::from_bytes(&bytes).unwrap(), header);
        assert_eq!(header.range_count(), 2);
    }

    #[test]
    fn header_rejects_bad_magic_and_version() {
        let mut bytes = UcdnHeader { version: 1, ..Default::default() }.to_bytes();
        bytes[8] = 3;
        let err = UcdnHeader::from_bytes(&bytes).unwrap_err().to_string();
        assert!(err.contains("unsupported UCDNAMES version 3"), "got: {err}");

        bytes[0] = b'X';
        let err = UcdnHeader::from_bytes(&bytes).unwrap_err().to_string();
        assert!(err.contains("magic"), "got: {err}");
    }

    #[test]
    fn range_record_packs_fields() {
        let record = RangeRecord::pack(0x10FFFF, 3, 63, 42).unwrap();
        assert_eq!(record.first(), 0x10FFFF);
        assert_eq!(record.class_index(), 3);
        assert_eq!(record.age_index(), 63);
        assert_eq!(record.bits, 0x10FFFF | 3 << 24 | 63 << 26);
        assert_eq!(RangeRecord::from_bytes(&record.to_bytes()).unwrap(), record);
    }

    #[test]
    fn range_record_rejects_age_overflow() {
        assert!(RangeRecord::pack(0, 0, 64, 0).is_err());
        assert!(RangeRecord::pack(0x0100_0000, 0, 0, 0).is_err());
    }
}
