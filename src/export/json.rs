use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::Location;
use crate::index::inverted::InvertedIndex;
use crate::query::QueryResults;

/// Serialize `value` as JSON indented with tabs.
pub fn write_pretty<T, W>(value: &T, writer: W) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    let mut serializer = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut serializer)?;
    Ok(())
}

pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    write_pretty(value, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| Error::new(ErrorKind::Internal, format!("Invalid UTF-8 in JSON: {}", e)))
}

fn write_file<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    write_pretty(value, &mut file)?;
    file.flush()?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Token counts worth exporting: locations with at least one token.
fn positive_counts(counts: &BTreeMap<Location, usize>) -> BTreeMap<&str, usize> {
    counts
        .iter()
        .filter(|&(_, &count)| count > 0)
        .map(|(location, &count)| (location.as_str(), count))
        .collect()
}

/// `{ term: { location: [positions] } }`
pub fn index_to_string(index: &InvertedIndex) -> Result<String> {
    to_pretty_string(index.postings())
}

pub fn write_index(index: &InvertedIndex, path: &Path) -> Result<()> {
    write_file(index.postings(), path)
}

/// `{ location: token_count }`
pub fn counts_to_string(counts: &BTreeMap<Location, usize>) -> Result<String> {
    to_pretty_string(&positive_counts(counts))
}

pub fn write_counts(counts: &BTreeMap<Location, usize>, path: &Path) -> Result<()> {
    write_file(&positive_counts(counts), path)
}

/// `{ query: [ { count, score, where } ] }`
pub fn results_to_string(results: &QueryResults) -> Result<String> {
    to_pretty_string(results)
}

pub fn write_results(results: &QueryResults, path: &Path) -> Result<()> {
    write_file(results, path)
}
