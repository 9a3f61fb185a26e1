use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound;
use crate::core::types::{Location, Position, Posting};
use crate::search::results::{ResultCollector, SearchResult};

/// Inverted index structure
///
/// Maps term → location → ordered positions, and tracks the token count of
/// every location (the highest position recorded for it). Terms are kept in
/// sorted order so prefix matches form one contiguous range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    terms: BTreeMap<String, BTreeMap<Location, Posting>>,
    counts: BTreeMap<Location, usize>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex {
            terms: BTreeMap::new(),
            counts: BTreeMap::new(),
        }
    }

    /// Record `term` at `position` of `location`.
    ///
    /// Returns `false` if the triple was already present or `position` is 0.
    pub fn add(&mut self, term: &str, location: &str, position: Position) -> bool {
        if position == 0 {
            tracing::warn!("Ignoring position 0 for term '{}' in {}", term, location);
            return false;
        }

        let added = match self.terms.get_mut(term) {
            Some(locations) => match locations.get_mut(location) {
                Some(posting) => posting.insert(position),
                None => {
                    locations.insert(location.to_string(), BTreeSet::from([position]));
                    true
                }
            },
            None => {
                let locations = BTreeMap::from([(location.to_string(), BTreeSet::from([position]))]);
                self.terms.insert(term.to_string(), locations);
                true
            }
        };

        self.bump_count(location, position as usize);
        added
    }

    /// Add `terms` at positions `1..=terms.len()` of `location`.
    pub fn add_terms<S: AsRef<str>>(&mut self, terms: &[S], location: &str) {
        for (i, term) in terms.iter().enumerate() {
            self.add(term.as_ref(), location, (i + 1) as Position);
        }
    }

    /// Merge every term, location and position of `other` into this index.
    ///
    /// Nothing is ever removed; token counts keep the larger of the two.
    pub fn add_all(&mut self, other: InvertedIndex) {
        for (term, other_locations) in other.terms {
            match self.terms.get_mut(&term) {
                Some(locations) => {
                    for (location, positions) in other_locations {
                        match locations.get_mut(&location) {
                            Some(posting) => posting.extend(positions),
                            None => {
                                locations.insert(location, positions);
                            }
                        }
                    }
                }
                None => {
                    self.terms.insert(term, other_locations);
                }
            }
        }

        for (location, count) in other.counts {
            self.bump_count(&location, count);
        }
    }

    fn bump_count(&mut self, location: &str, count: usize) {
        match self.counts.get_mut(location) {
            Some(current) => *current = (*current).max(count),
            None => {
                self.counts.insert(location.to_string(), count);
            }
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    pub fn contains_location(&self, term: &str, location: &str) -> bool {
        self.terms
            .get(term)
            .is_some_and(|locations| locations.contains_key(location))
    }

    pub fn contains_position(&self, term: &str, location: &str, position: Position) -> bool {
        self.positions(term, location)
            .is_some_and(|posting| posting.contains(&position))
    }

    /// Run an exact or partial search.
    pub fn search<I, S>(&self, query: I, exact: bool) -> Vec<SearchResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if exact {
            self.exact_search(query)
        } else {
            self.partial_search(query)
        }
    }

    /// Results for index terms equal to a query term.
    pub fn exact_search<I, S>(&self, query: I) -> Vec<SearchResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut collector = ResultCollector::new();

        for term in query {
            if let Some(locations) = self.terms.get(term.as_ref()) {
                self.collect_locations(&mut collector, locations);
            }
        }

        collector.into_sorted()
    }

    /// Results for index terms starting with a query term.
    pub fn partial_search<I, S>(&self, query: I) -> Vec<SearchResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut collector = ResultCollector::new();

        for prefix in query {
            let prefix = prefix.as_ref();
            let range = self.terms.range::<str, _>((Bound::Included(prefix), Bound::Unbounded));

            for (term, locations) in range {
                if !term.starts_with(prefix) {
                    break;
                }
                self.collect_locations(&mut collector, locations);
            }
        }

        collector.into_sorted()
    }

    fn collect_locations<'a>(
        &'a self,
        collector: &mut ResultCollector<'a>,
        locations: &'a BTreeMap<Location, Posting>,
    ) {
        for (location, posting) in locations {
            collector.collect(location, posting.len(), self.count(location));
        }
    }

    /// Terms in sorted order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// Locations containing `term`, in sorted order.
    pub fn locations(&self, term: &str) -> impl Iterator<Item = &str> {
        self.terms
            .get(term)
            .into_iter()
            .flat_map(|locations| locations.keys().map(String::as_str))
    }

    pub fn positions(&self, term: &str, location: &str) -> Option<&Posting> {
        self.terms.get(term)?.get(location)
    }

    /// Read-only view of the whole term → location → positions map.
    pub fn postings(&self) -> &BTreeMap<String, BTreeMap<Location, Posting>> {
        &self.terms
    }

    /// Read-only view of the per-location token counts.
    pub fn counts(&self) -> &BTreeMap<Location, usize> {
        &self.counts
    }

    /// Token count of `location`, 0 if unknown.
    pub fn count(&self, location: &str) -> usize {
        self.counts.get(location).copied().unwrap_or(0)
    }

    /// Number of distinct terms.
    pub fn size(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of locations containing `term`.
    pub fn location_count(&self, term: &str) -> usize {
        self.terms.get(term).map_or(0, BTreeMap::len)
    }

    /// Number of positions of `term` in `location`.
    pub fn position_count(&self, term: &str, location: &str) -> usize {
        self.positions(term, location).map_or(0, BTreeSet::len)
    }
}

impl fmt::Display for InvertedIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvertedIndex({} terms, {} locations)", self.terms.len(), self.counts.len())
    }
}
