pub mod inverted;
pub mod concurrent;
pub mod builder;

use std::collections::BTreeSet;
use crate::core::types::Position;
use crate::search::results::SearchResult;

/// Read-side capability shared by the sequential and concurrent indexes.
pub trait IndexReader {
    fn contains(&self, term: &str) -> bool;

    fn contains_location(&self, term: &str, location: &str) -> bool;

    fn contains_position(&self, term: &str, location: &str, position: Position) -> bool;

    /// Number of distinct terms.
    fn size(&self) -> usize;

    /// Token count of `location`.
    fn count(&self, location: &str) -> usize;

    fn exact_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult>;

    fn partial_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult>;

    fn search(&self, query: &BTreeSet<String>, exact: bool) -> Vec<SearchResult> {
        if exact {
            self.exact_search(query)
        } else {
            self.partial_search(query)
        }
    }
}

impl IndexReader for inverted::InvertedIndex {
    fn contains(&self, term: &str) -> bool {
        inverted::InvertedIndex::contains(self, term)
    }

    fn contains_location(&self, term: &str, location: &str) -> bool {
        inverted::InvertedIndex::contains_location(self, term, location)
    }

    fn contains_position(&self, term: &str, location: &str, position: Position) -> bool {
        inverted::InvertedIndex::contains_position(self, term, location, position)
    }

    fn size(&self) -> usize {
        inverted::InvertedIndex::size(self)
    }

    fn count(&self, location: &str) -> usize {
        inverted::InvertedIndex::count(self, location)
    }

    fn exact_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        inverted::InvertedIndex::exact_search(self, query)
    }

    fn partial_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        inverted::InvertedIndex::partial_search(self, query)
    }
}
