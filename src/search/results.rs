use std::cmp::Ordering;
use std::collections::HashMap;
use serde::ser::{Error as _, Serialize, SerializeStruct, Serializer};
use serde_json::value::RawValue;
use crate::core::types::Location;

/// One ranked hit of a query
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub location: Location,
    pub count: usize,
    pub score: f64,
}

impl SearchResult {
    pub fn new(location: Location) -> Self {
        SearchResult {
            location,
            count: 0,
            score: 0.0,
        }
    }

    /// Fold `matches` more occurrences into this result.
    pub fn update(&mut self, matches: usize, token_count: usize) {
        self.count += matches;
        self.score = if token_count > 0 {
            self.count as f64 / token_count as f64
        } else {
            0.0
        };
    }
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchResult {}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ranking order: score descending, then count descending, then location
/// ascending ignoring case.
impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> Ordering {
        other.score.total_cmp(&self.score)
            .then_with(|| other.count.cmp(&self.count))
            .then_with(|| self.location.to_lowercase().cmp(&other.location.to_lowercase()))
            .then_with(|| self.location.cmp(&other.location))
    }
}

impl Serialize for SearchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Scores are written with exactly eight decimals
        let score = RawValue::from_string(format!("{:.8}", self.score))
            .map_err(S::Error::custom)?;

        let mut state = serializer.serialize_struct("SearchResult", 3)?;
        state.serialize_field("count", &self.count)?;
        state.serialize_field("score", &score)?;
        state.serialize_field("where", &self.location)?;
        state.end()
    }
}

/// Accumulates per-location results while one query is evaluated.
pub struct ResultCollector<'a> {
    results: HashMap<&'a str, SearchResult>,
}

impl<'a> ResultCollector<'a> {
    pub fn new() -> Self {
        ResultCollector {
            results: HashMap::new(),
        }
    }

    pub fn collect(&mut self, location: &'a str, matches: usize, token_count: usize) {
        self.results
            .entry(location)
            .or_insert_with(|| SearchResult::new(location.to_string()))
            .update(matches, token_count);
    }

    /// Ranked results.
    pub fn into_sorted(self) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self.results.into_values().collect();
        results.sort();
        results
    }
}

impl Default for ResultCollector<'_> {
    fn default() -> Self {
        ResultCollector::new()
    }
}
