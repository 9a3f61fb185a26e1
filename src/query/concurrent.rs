use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use parking_lot::Mutex;
use crate::analysis::analyzer::Analyzer;
use crate::core::error::Result;
use crate::index::IndexReader;
use crate::index::concurrent::ConcurrentInvertedIndex;
use crate::parallel::work_queue::WorkQueue;
use crate::query::{canonical_key, QueryHandler, QueryResults};

/// Multithreaded query processor
///
/// Each line is searched by its own task. The results map has its own lock,
/// held only for the duplicate check and the insert, never during a search.
pub struct ConcurrentQueryProcessor {
    index: Arc<ConcurrentInvertedIndex>,
    queue: Arc<WorkQueue>,
    analyzer: Arc<Analyzer>,
    results: Arc<Mutex<QueryResults>>,
}

impl ConcurrentQueryProcessor {
    pub fn new(index: Arc<ConcurrentInvertedIndex>, queue: Arc<WorkQueue>) -> Self {
        ConcurrentQueryProcessor::with_analyzer(index, queue, Analyzer::standard_english())
    }

    pub fn with_analyzer(
        index: Arc<ConcurrentInvertedIndex>,
        queue: Arc<WorkQueue>,
        analyzer: Analyzer,
    ) -> Self {
        ConcurrentQueryProcessor {
            index,
            queue,
            analyzer: Arc::new(analyzer),
            results: Arc::new(Mutex::new(QueryResults::new())),
        }
    }

    /// Wait for every submitted query.
    pub fn finish(&self) {
        self.queue.finish();
    }
}

impl QueryHandler for ConcurrentQueryProcessor {
    fn parse_line(&mut self, line: &str, exact: bool) {
        let line = line.to_string();
        let index = self.index.clone();
        let analyzer = self.analyzer.clone();
        let results = self.results.clone();

        self.queue.execute(move || {
            let stems = analyzer.unique_stems(&line);
            let key = canonical_key(&stems);

            if key.is_empty() || results.lock().contains_key(&key) {
                return Ok(());
            }

            let found = index.search(&stems, exact);
            tracing::debug!("Query '{}' matched {} locations", key, found.len());
            results.lock().insert(key, found);
            Ok(())
        });
    }

    fn parse_file(&mut self, path: &Path, exact: bool) -> Result<usize> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = 0;

        for line in reader.lines() {
            match line {
                Ok(line) => {
                    self.parse_line(&line, exact);
                    lines += 1;
                }
                Err(e) => {
                    // Queries already queued still run before the error is reported
                    self.finish();
                    return Err(e.into());
                }
            }
        }

        self.finish();
        tracing::debug!("Read {} query lines from {}", lines, path.display());
        Ok(lines)
    }

    fn results(&self) -> QueryResults {
        self.results.lock().clone()
    }

    fn query_count(&self) -> usize {
        self.results.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::inverted::InvertedIndex;
    use crate::query::processor::QueryProcessor;

    #[test]
    fn test_matches_sequential_results() {
        let mut base = InvertedIndex::new();
        base.add_terms(&["comput", "scienc", "comput", "game"], "a.txt");
        base.add_terms(&["compani", "game", "night"], "b.txt");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.txt");
        let lines: Vec<String> = (0..50)
            .map(|i| match i % 4 {
                0 => "computer".to_string(),
                1 => "games night".to_string(),
                2 => "night games".to_string(),
                _ => "comp".to_string(),
            })
            .collect();
        std::fs::write(&path, lines.join("\n")).unwrap();

        let mut sequential = QueryProcessor::new(&base);
        sequential.parse_file(&path, false).unwrap();

        let index = Arc::new(ConcurrentInvertedIndex::from(base.clone()));
        let queue = Arc::new(WorkQueue::new(4).unwrap());
        let mut concurrent = ConcurrentQueryProcessor::new(index, queue.clone());
        let read = concurrent.parse_file(&path, false).unwrap();

        assert_eq!(read, 50);
        assert_eq!(queue.pending(), 0);
        assert_eq!(concurrent.query_count(), 3);

        let expected = sequential.results();
        let actual = concurrent.results();
        assert_eq!(actual.keys().collect::<Vec<_>>(), expected.keys().collect::<Vec<_>>());
        for (key, results) in &expected {
            let locations: Vec<&str> = results.iter().map(|r| r.location.as_str()).collect();
            let other: Vec<&str> = actual[key].iter().map(|r| r.location.as_str()).collect();
            assert_eq!(locations, other);
        }
    }
}
