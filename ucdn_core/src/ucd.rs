//! Loader for the Unicode Character Database in XML form (`ucd.all.*.xml`).
//!
//! Only the `repertoire` section is read. Each `char`, `reserved`,
//! `noncharacter` or `surrogate` element becomes one [`CodepointRange`]:
//! - range from `cp`, or from `first-cp` / `last-cp` (hex)
//! - name from `na`, falling back to the first `name-alias` child's `alias`
//! - age from `age`
//!
//! In the grouped variant of the file, members of a `group` element inherit
//! its attributes unless they set their own.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::range::{CodepointRange, RangeClass};

/// Read and parse the UCD XML file at `path`.
pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Vec<CodepointRange>> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    read_ranges(&xml).with_context(|| format!("parsing {:?}", path))
}

/// Parse UCD XML into ranges sorted by first codepoint.
pub fn read_ranges(xml: &str) -> anyhow::Result<Vec<CodepointRange>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut in_repertoire = false;
    let mut group: HashMap<String, String> = HashMap::new();
    let mut pending: Option<PendingRange> = None;
    let mut ranges = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"repertoire" => in_repertoire = true,
                b"group" if in_repertoire => group = attributes(&e)?,
                name if in_repertoire => {
                    if let Some(class) = class_of(name) {
                        pending = Some(PendingRange::new(class, &e, &group)?);
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"name-alias" => {
                    if let Some(range) = pending.as_mut() {
                        range.add_alias(&e)?;
                    }
                }
                name if in_repertoire => {
                    if let Some(class) = class_of(name) {
                        ranges.push(PendingRange::new(class, &e, &group)?.finish()?);
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"repertoire" => in_repertoire = false,
                b"group" => group.clear(),
                name if class_of(name).is_some() => {
                    if let Some(range) = pending.take() {
                        ranges.push(range.finish()?);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    ranges.sort_by_key(|range| range.first);
    debug!(count = ranges.len(), "read UCD ranges");
    Ok(ranges)
}

fn class_of(element: &[u8]) -> Option<RangeClass> {
    match element {
        b"char" => Some(RangeClass::Character),
        b"reserved" => Some(RangeClass::Reserved),
        b"noncharacter" => Some(RangeClass::Noncharacter),
        b"surrogate" => Some(RangeClass::Surrogate),
        _ => None,
    }
}

fn attributes(e: &BytesStart) -> anyhow::Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8(attr.key.local_name().as_ref().to_vec())?;
        map.insert(key, attr.unescape_value()?.into_owned());
    }
    Ok(map)
}

/// A range element whose children have not all been seen yet.
struct PendingRange {
    class: RangeClass,
    attrs: HashMap<String, String>,
    alias: Option<String>,
}

impl PendingRange {
    fn new(class: RangeClass, e: &BytesStart, group: &HashMap<String, String>) -> anyhow::Result<Self> {
        let mut attrs = group.clone();
        attrs.extend(attributes(e)?);
        Ok(Self {
            class,
            attrs,
            alias: None,
        })
    }

    fn add_alias(&mut self, e: &BytesStart) -> anyhow::Result<()> {
        if self.alias.is_none() {
            self.alias = attributes(e)?.remove("alias");
        }
        Ok(())
    }

    fn codepoint(&self, key: &str) -> anyhow::Result<Option<u32>> {
        self.attrs
            .get(key)
            .map(|hex| {
                u32::from_str_radix(hex, 16)
                    .with_context(|| format!("attribute {}=\"{}\" is not a hex codepoint", key, hex))
            })
            .transpose()
    }

    fn finish(mut self) -> anyhow::Result<CodepointRange> {
        let (first, last) = match self.codepoint("cp")? {
            Some(cp) => (cp, cp),
            None => match (self.codepoint("first-cp")?, self.codepoint("last-cp")?) {
                (Some(first), Some(last)) => (first, last),
                _ => anyhow::bail!(
                    "{} element has neither cp nor first-cp/last-cp",
                    self.class
                ),
            },
        };

        let mut name = self.attrs.remove("na").unwrap_or_default();
        if name.is_empty() {
            name = self.alias.take().unwrap_or_default();
        }
        let age = self.attrs.remove("age").unwrap_or_default();

        Ok(CodepointRange::new(first, last, self.class, name, age))
    }
}
