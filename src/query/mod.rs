pub mod processor;
pub mod concurrent;

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use crate::core::error::Result;
use crate::search::results::SearchResult;

/// Ranked results keyed by canonical query, in key order.
pub type QueryResults = BTreeMap<String, Vec<SearchResult>>;

/// Canonical form of a query: its unique sorted stems joined by one space.
pub fn canonical_key(stems: &BTreeSet<String>) -> String {
    stems.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Processes query lines against an index and keeps one result list per
/// distinct canonical query.
pub trait QueryHandler {
    /// Search one query line. Empty and repeated queries are skipped.
    fn parse_line(&mut self, line: &str, exact: bool);

    /// Search every line of `path`. Returns the number of lines read.
    fn parse_file(&mut self, path: &Path, exact: bool) -> Result<usize> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = 0;

        for line in reader.lines() {
            self.parse_line(&line?, exact);
            lines += 1;
        }

        tracing::debug!("Read {} query lines from {}", lines, path.display());
        Ok(lines)
    }

    /// Snapshot of every stored result list.
    fn results(&self) -> QueryResults;

    /// Number of distinct queries stored.
    fn query_count(&self) -> usize;
}
