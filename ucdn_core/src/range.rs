use std::fmt;
use std::str::FromStr;

use crate::format::MAX_CODEPOINT;

/// Structural status of a codepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeClass {
    Reserved,
    Noncharacter,
    Surrogate,
    Character,
}

impl RangeClass {
    /// All classes, in on-disk index order.
    pub const ALL: [RangeClass; 4] = [
        RangeClass::Reserved,
        RangeClass::Noncharacter,
        RangeClass::Surrogate,
        RangeClass::Character,
    ];

    /// The 2-bit value stored in a range record.
    pub fn index(self) -> u32 {
        match self {
            RangeClass::Reserved => 0,
            RangeClass::Noncharacter => 1,
            RangeClass::Surrogate => 2,
            RangeClass::Character => 3,
        }
    }

    pub fn from_index(index: u32) -> anyhow::Result<Self> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("class index {} out of range", index))
    }

    pub fn label(self) -> &'static str {
        match self {
            RangeClass::Reserved => "reserved",
            RangeClass::Noncharacter => "noncharacter",
            RangeClass::Surrogate => "surrogate",
            RangeClass::Character => "character",
        }
    }
}

impl fmt::Display for RangeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RangeClass {
    type Err = anyhow::Error;

    /// Accepts the labels above plus `char`, the UCD XML element name.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "reserved" => Ok(RangeClass::Reserved),
            "noncharacter" => Ok(RangeClass::Noncharacter),
            "surrogate" => Ok(RangeClass::Surrogate),
            "character" | "char" => Ok(RangeClass::Character),
            other => anyhow::bail!("unknown range class '{}'", other),
        }
    }
}

/// An inclusive run of codepoints sharing class, name and age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodepointRange {
    pub first: u32,
    pub last: u32,
    pub class: RangeClass,
    /// ASCII, empty when the range has no name.
    pub name: String,
    /// Unicode version that introduced the range, empty when unknown.
    pub age: String,
}

impl CodepointRange {
    pub fn new(
        first: u32,
        last: u32,
        class: RangeClass,
        name: impl Into<String>,
        age: impl Into<String>,
    ) -> Self {
        Self {
            first,
            last,
            class,
            name: name.into(),
            age: age.into(),
        }
    }

    /// Number of codepoints covered.
    pub fn span(&self) -> u32 {
        self.last - self.first + 1
    }

    pub fn contains(&self, codepoint: u32) -> bool {
        (self.first..=self.last).contains(&codepoint)
    }
}

/// Check that `ranges` are sorted, non-overlapping and cover every codepoint
/// from 0 to U+10FFFF exactly once.
pub fn validate_coverage(ranges: &[CodepointRange]) -> anyhow::Result<()> {
    let mut next: u32 = 0;
    for (i, range) in ranges.iter().enumerate() {
        if range.first > range.last {
            anyhow::bail!(
                "range {} is inverted: U+{:04X}..U+{:04X}",
                i,
                range.first,
                range.last
            );
        }
        if range.last > MAX_CODEPOINT {
            anyhow::bail!("range {} ends past U+10FFFF at U+{:04X}", i, range.last);
        }
        if range.first != next {
            let kind = if range.first > next { "gap" } else { "overlap" };
            anyhow::bail!(
                "{} at range {}: expected it to start at U+{:04X}, starts at U+{:04X}",
                kind,
                i,
                next,
                range.first
            );
        }
        if range.last == MAX_CODEPOINT {
            if i + 1 != ranges.len() {
                anyhow::bail!("range {} reaches U+10FFFF but {} ranges follow it", i, ranges.len() - i - 1);
            }
            return Ok(());
        }
        next = range.last + 1;
    }
    anyhow::bail!("ranges stop at U+{:04X} instead of covering up to U+10FFFF", next)
}
