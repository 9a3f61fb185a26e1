use std::cell::UnsafeCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use crate::core::types::{Location, Position, Posting};
use crate::index::IndexReader;
use crate::index::inverted::InvertedIndex;
use crate::parallel::rw_lock::ReadWriteLock;
use crate::search::results::SearchResult;

/// Thread-safe inverted index
///
/// Wraps an [`InvertedIndex`] with a [`ReadWriteLock`]: `add`/`add_all` take
/// the write lock, every other operation takes the read lock for the length
/// of the delegated call. Accessors return owned snapshots so no reference
/// outlives its lock.
pub struct ConcurrentInvertedIndex {
    lock: ReadWriteLock,
    index: UnsafeCell<InvertedIndex>,
}

// SAFETY: `index` is only reached through `read`/`write`, which hold the
// matching role of `lock` for the whole borrow. Neither helper is re-entered
// while a borrow is live, so a `&mut` is never aliased.
unsafe impl Sync for ConcurrentInvertedIndex {}

impl ConcurrentInvertedIndex {
    pub fn new() -> Self {
        ConcurrentInvertedIndex::from(InvertedIndex::new())
    }

    fn read<R>(&self, f: impl FnOnce(&InvertedIndex) -> R) -> R {
        let _guard = self.lock.read();
        // SAFETY: shared lock held, no writer can be active
        f(unsafe { &*self.index.get() })
    }

    fn write<R>(&self, f: impl FnOnce(&mut InvertedIndex) -> R) -> R {
        let _guard = self.lock.write();
        // SAFETY: exclusive lock held, no other borrow exists
        f(unsafe { &mut *self.index.get() })
    }

    pub fn add(&self, term: &str, location: &str, position: Position) -> bool {
        self.write(|index| index.add(term, location, position))
    }

    pub fn add_terms<S: AsRef<str>>(&self, terms: &[S], location: &str) {
        self.write(|index| index.add_terms(terms, location))
    }

    /// Merge a privately built index in one exclusive section.
    pub fn add_all(&self, other: InvertedIndex) {
        self.write(|index| index.add_all(other))
    }

    pub fn terms(&self) -> Vec<String> {
        self.read(|index| index.terms().map(String::from).collect())
    }

    pub fn locations(&self, term: &str) -> Vec<String> {
        self.read(|index| index.locations(term).map(String::from).collect())
    }

    pub fn positions(&self, term: &str, location: &str) -> Option<Posting> {
        self.read(|index| index.positions(term, location).cloned())
    }

    pub fn counts(&self) -> BTreeMap<Location, usize> {
        self.read(|index| index.counts().clone())
    }

    pub fn location_count(&self, term: &str) -> usize {
        self.read(|index| index.location_count(term))
    }

    pub fn position_count(&self, term: &str, location: &str) -> usize {
        self.read(|index| index.position_count(term, location))
    }

    pub fn is_empty(&self) -> bool {
        self.read(|index| index.is_empty())
    }

    /// Consistent copy of the whole index, e.g. for export.
    pub fn snapshot(&self) -> InvertedIndex {
        self.read(|index| index.clone())
    }

    pub fn into_inner(self) -> InvertedIndex {
        self.index.into_inner()
    }
}

impl Default for ConcurrentInvertedIndex {
    fn default() -> Self {
        ConcurrentInvertedIndex::new()
    }
}

impl From<InvertedIndex> for ConcurrentInvertedIndex {
    fn from(index: InvertedIndex) -> Self {
        ConcurrentInvertedIndex {
            lock: ReadWriteLock::new(),
            index: UnsafeCell::new(index),
        }
    }
}

impl IndexReader for ConcurrentInvertedIndex {
    fn contains(&self, term: &str) -> bool {
        self.read(|index| index.contains(term))
    }

    fn contains_location(&self, term: &str, location: &str) -> bool {
        self.read(|index| index.contains_location(term, location))
    }

    fn contains_position(&self, term: &str, location: &str, position: Position) -> bool {
        self.read(|index| index.contains_position(term, location, position))
    }

    fn size(&self) -> usize {
        self.read(|index| index.size())
    }

    fn count(&self, location: &str) -> usize {
        self.read(|index| index.count(location))
    }

    fn exact_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        self.read(|index| index.exact_search(query))
    }

    fn partial_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        self.read(|index| index.partial_search(query))
    }
}

impl fmt::Display for ConcurrentInvertedIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.read(|index| fmt::Display::fmt(index, f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn test_wrapper_matches_sequential_semantics() {
        let concurrent = ConcurrentInvertedIndex::new();
        let mut sequential = InvertedIndex::new();

        for (term, location, position) in [("apple", "a", 1), ("apple", "a", 3), ("banana", "b", 2)] {
            concurrent.add(term, location, position);
            sequential.add(term, location, position);
        }

        assert_eq!(concurrent.snapshot(), sequential);
        assert_eq!(concurrent.size(), 2);
        assert_eq!(concurrent.count("a"), 3);
        assert!(concurrent.contains_position("apple", "a", 3));

        let query = BTreeSet::from(["app".to_string()]);
        let results = concurrent.partial_search(&query);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].count, 2);
    }

    #[test]
    fn test_readers_never_see_partial_merge() {
        let index = Arc::new(ConcurrentInvertedIndex::new());
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let index = index.clone();
            let done = done.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let location = format!("doc{}", i);
                    let mut local = InvertedIndex::new();
                    local.add("left", &location, 1);
                    local.add("right", &location, 2);
                    index.add_all(local);
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let index = index.clone();
                let done = done.clone();
                thread::spawn(move || {
                    while !done.load(Ordering::SeqCst) {
                        let snapshot = index.snapshot();
                        // Both terms arrive in the same merge
                        assert_eq!(snapshot.location_count("left"), snapshot.location_count("right"));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(index.location_count("left"), 200);
    }
}
