use crate::analysis::analyzer::Analyzer;
use crate::index::IndexReader;
use crate::query::{canonical_key, QueryHandler, QueryResults};

/// Single-threaded query processor
pub struct QueryProcessor<'a, R: IndexReader + ?Sized> {
    index: &'a R,
    analyzer: Analyzer,
    results: QueryResults,
}

impl<'a, R: IndexReader + ?Sized> QueryProcessor<'a, R> {
    pub fn new(index: &'a R) -> Self {
        QueryProcessor::with_analyzer(index, Analyzer::standard_english())
    }

    pub fn with_analyzer(index: &'a R, analyzer: Analyzer) -> Self {
        QueryProcessor {
            index,
            analyzer,
            results: QueryResults::new(),
        }
    }

    pub fn into_results(self) -> QueryResults {
        self.results
    }
}

impl<R: IndexReader + ?Sized> QueryHandler for QueryProcessor<'_, R> {
    fn parse_line(&mut self, line: &str, exact: bool) {
        let stems = self.analyzer.unique_stems(line);
        let key = canonical_key(&stems);

        if key.is_empty() || self.results.contains_key(&key) {
            return;
        }

        let results = self.index.search(&stems, exact);
        tracing::debug!("Query '{}' matched {} locations", key, results.len());
        self.results.insert(key, results);
    }

    fn results(&self) -> QueryResults {
        self.results.clone()
    }

    fn query_count(&self) -> usize {
        self.results.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::inverted::InvertedIndex;

    fn index() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.add_terms(&["appl", "banana", "cherri", "appl"], "fruit.txt");
        index.add_terms(&["applic", "form"], "job.txt");
        index
    }

    #[test]
    fn test_duplicate_and_empty_queries_skipped() {
        let index = index();
        let mut processor = QueryProcessor::new(&index);

        processor.parse_line("Apples", false);
        processor.parse_line("apple APPLES", false);
        processor.parse_line("   ", false);
        processor.parse_line("1234 !!", false);

        assert_eq!(processor.query_count(), 1);
        let results = processor.results();
        assert_eq!(results["appl"].len(), 2);
    }

    #[test]
    fn test_exact_mode() {
        let index = index();
        let mut processor = QueryProcessor::new(&index);

        processor.parse_line("apple", true);
        processor.parse_line("banana cherry", true);

        let results = processor.into_results();
        assert_eq!(results["appl"].len(), 1);
        assert_eq!(results["appl"][0].count, 2);
        assert_eq!(results["banana cherri"][0].count, 2);
        assert_eq!(results["banana cherri"][0].score, 0.5);
    }

    #[test]
    fn test_unmatched_query_keeps_empty_list() {
        let index = index();
        let mut processor = QueryProcessor::new(&index);

        processor.parse_line("zebra", false);

        assert!(processor.results()["zebra"].is_empty());
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.txt");
        std::fs::write(&path, "apple\nbanana\n\napple\n").unwrap();

        let index = index();
        let mut processor = QueryProcessor::new(&index);
        let lines = processor.parse_file(&path, false).unwrap();

        assert_eq!(lines, 4);
        assert_eq!(processor.query_count(), 2);
    }
}
