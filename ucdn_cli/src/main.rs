use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use xxhash_rust::xxh3::xxh3_64;

use ucdn_chunking::chunking_by_name;
use ucdn_core::{ucd, Reader, Writer};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "ucdn",
    about = "Compile Unicode codepoint names, classes and ages into a compact UCDNAMES file, and read them back",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Unicode Character Database XML file into UCDNAMES format
    Compile {
        /// Source UCD XML file (e.g. ucd.all.flat.xml)
        input: PathBuf,
        /// Destination UCDNAMES file
        #[arg(short, long)]
        out: PathBuf,
        /// Trie chunking: single-byte | branch-point
        #[arg(short, long, default_value = "branch-point")]
        chunking: String,
    },
    /// Print every range record, one line each
    Check {
        /// UCDNAMES file
        file: PathBuf,
    },
    /// Print header metadata, section table and the age list
    Inspect {
        /// UCDNAMES file
        file: PathBuf,
        /// Print an xxh3 hash of each section
        #[arg(long)]
        fingerprint: bool,
    },
    /// Show the range covering a single codepoint
    ///
    /// Only the records visited by a binary search and the trie nodes on the
    /// name's path are decoded.
    Lookup {
        /// UCDNAMES file
        file: PathBuf,
        /// Codepoint as U+XXXX, 0xXXXX or decimal
        codepoint: String,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

/// Run one compile step, logging how long it took.
fn phase<T>(name: &str, f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    let t0 = Instant::now();
    let result = f()?;
    info!(elapsed_ms = t0.elapsed().as_millis() as u64, "{} done", name);
    Ok(result)
}

fn parse_codepoint(s: &str) -> anyhow::Result<u32> {
    let trimmed = s.trim();
    let hex = trimmed
        .strip_prefix("U+")
        .or_else(|| trimmed.strip_prefix("u+"))
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"));
    let parsed = match hex {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => trimmed.parse(),
    };
    parsed.with_context(|| format!("'{}' is not a codepoint (use U+XXXX, 0xXXXX or decimal)", s))
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compile(input: PathBuf, out: PathBuf, chunking_name: &str) -> anyhow::Result<()> {
    let chunking = chunking_by_name(chunking_name)?;
    let chunking_display = chunking.name();

    let t0 = Instant::now();
    let ranges = phase("parsing XML", || ucd::load(&input))?;
    info!(ranges = ranges.len(), "read ranges from {:?}", input);

    let writer = Writer::create(&out, chunking)
        .with_context(|| format!("creating output file {:?}", out))?;
    let summary = phase("writing file", || writer.finish(&ranges))?;
    let elapsed = t0.elapsed();

    let header = &summary.header;
    eprintln!("  chunking    : {} (format version {})", chunking_display, header.version);
    eprintln!("  ranges      : {}", header.range_count());
    eprintln!("  names       : {}", summary.distinct_names);
    eprintln!("  trie nodes  : {}", summary.trie_nodes);
    eprintln!("  trie size   : {}", human_bytes(header.trie.size as u64));
    eprintln!("  ages        : {}", summary.distinct_ages);
    eprintln!("  file size   : {}", human_bytes(summary.file_size));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_check(file: PathBuf) -> anyhow::Result<()> {
    let reader = Reader::open(&file)?;
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    for row in reader.rows() {
        writeln!(out, "{}", row?)?;
    }
    out.flush()?;
    Ok(())
}

fn run_inspect(file: PathBuf, fingerprint: bool) -> anyhow::Result<()> {
    let reader = Reader::open(&file)?;
    let file_size = std::fs::metadata(&file)?.len();
    let header = &reader.header;

    println!("=== UCDNAMES File: {:?} ===", file);
    println!();
    println!("  format version : {}", header.version);
    println!("  range records  : {}", reader.range_count());
    println!("  distinct ages  : {}", reader.ages().len());
    println!("  file on disk   : {}", human_bytes(file_size));
    println!();
    println!("  {:>8}  {:>10}  {:>12}", "section", "location", "size");
    println!("  {}", "-".repeat(34));
    for (label, section) in [("ranges", header.ranges), ("trie", header.trie), ("ages", header.ages)] {
        print!(
            "  {:>8}  {:>10}  {:>12}",
            label,
            section.location,
            human_bytes(section.size as u64)
        );
        if fingerprint {
            print!("  {:016x}", xxh3_64(reader.section_bytes(section)));
        }
        println!();
    }
    println!();
    let ages: Vec<String> = reader
        .ages()
        .iter()
        .map(|age| if age.is_empty() { "(none)".to_string() } else { age.clone() })
        .collect();
    println!("  ages: {}", ages.join(", "));

    Ok(())
}

fn run_lookup(file: PathBuf, codepoint: &str) -> anyhow::Result<()> {
    let cp = parse_codepoint(codepoint)?;
    let reader = Reader::open(&file)?;
    match reader.lookup(cp)? {
        Some(row) => {
            println!("{}", row);
            if row.first != cp {
                println!("  (U+{:04X} lies in the range starting at U+{:04X})", cp, row.first);
            }
        }
        None => anyhow::bail!("U+{:04X} is outside the Unicode codespace", cp),
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile {
            input,
            out,
            chunking,
        } => run_compile(input, out, &chunking),
        Commands::Check { file } => run_check(file),
        Commands::Inspect { file, fingerprint } => run_inspect(file, fingerprint),
        Commands::Lookup { file, codepoint } => run_lookup(file, &codepoint),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codepoint_notations() {
        assert_eq!(parse_codepoint("U+0041").unwrap(), 0x41);
        assert_eq!(parse_codepoint("u+10ffff").unwrap(), 0x10FFFF);
        assert_eq!(parse_codepoint("0x1F600").unwrap(), 0x1F600);
        assert_eq!(parse_codepoint("65").unwrap(), 65);
        assert!(parse_codepoint("U+XYZ").is_err());
    }

    #[test]
    fn formats_sizes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.00 KiB");
    }
}
