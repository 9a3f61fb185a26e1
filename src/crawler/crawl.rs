use std::collections::HashSet;
use std::sync::Arc;
use parking_lot::Mutex;
use url::Url;
use crate::analysis::analyzer::Analyzer;
use crate::core::error::{Error, ErrorKind, Result};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::html;
use crate::index::concurrent::ConcurrentInvertedIndex;
use crate::index::inverted::InvertedIndex;
use crate::parallel::work_queue::WorkQueue;

struct CrawlState {
    index: Arc<ConcurrentInvertedIndex>,
    queue: Arc<WorkQueue>,
    fetcher: Arc<dyn Fetcher>,
    analyzer: Analyzer,
    visited: Mutex<HashSet<Url>>,
    max_urls: usize,
}

impl CrawlState {
    fn schedule(self: &Arc<Self>, url: Url) {
        let state = self.clone();
        self.queue.execute(move || state.crawl_page(url));
    }

    fn crawl_page(self: &Arc<Self>, url: Url) -> Result<()> {
        let Some(page) = self.fetcher.fetch(&url) else {
            tracing::debug!("No content for {}", url);
            return Ok(());
        };

        let page = html::strip_block_elements(&page);

        {
            let mut visited = self.visited.lock();
            for link in html::links(&url, &page) {
                if visited.len() >= self.max_urls {
                    break;
                }
                if visited.insert(link.clone()) {
                    self.schedule(link);
                }
            }
        }

        let stems = self.analyzer.stems(&html::strip_html(&page));
        let mut local = InvertedIndex::new();
        local.add_terms(&stems, url.as_str());
        self.index.add_all(local);

        tracing::debug!("Crawled {} ({} tokens)", url, stems.len());
        Ok(())
    }
}

/// Bounded concurrent web crawler
///
/// Each page is fetched, scanned for links and indexed by its own task. At
/// most `max_urls` distinct URLs are ever scheduled, the seed included.
pub struct Crawler {
    state: Arc<CrawlState>,
}

impl Crawler {
    pub fn new(
        index: Arc<ConcurrentInvertedIndex>,
        queue: Arc<WorkQueue>,
        fetcher: Arc<dyn Fetcher>,
        max_urls: usize,
    ) -> Self {
        Crawler::with_analyzer(index, queue, fetcher, max_urls, Analyzer::standard_english())
    }

    pub fn with_analyzer(
        index: Arc<ConcurrentInvertedIndex>,
        queue: Arc<WorkQueue>,
        fetcher: Arc<dyn Fetcher>,
        max_urls: usize,
        analyzer: Analyzer,
    ) -> Self {
        Crawler {
            state: Arc::new(CrawlState {
                index,
                queue,
                fetcher,
                analyzer,
                visited: Mutex::new(HashSet::new()),
                max_urls: max_urls.max(1),
            }),
        }
    }

    /// Crawl from `seed` and wait for the whole fan-out to finish.
    ///
    /// A malformed seed fails before anything is scheduled. The URL limit
    /// covers every crawl made by this crawler, so a seed arriving after the
    /// limit is reached is skipped. Returns the number of URLs visited.
    pub fn crawl(&self, seed: &str) -> Result<usize> {
        let seed = Url::parse(seed)
            .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("Malformed seed URL '{}': {}", seed, e)))?;

        tracing::info!(
            "Crawling from {} (max {} URLs, {} workers)",
            seed,
            self.state.max_urls,
            self.state.queue.size()
        );

        {
            let mut visited = self.state.visited.lock();
            if visited.len() >= self.state.max_urls {
                tracing::warn!("URL limit of {} already reached, not crawling {}", self.state.max_urls, seed);
            } else if visited.insert(seed.clone()) {
                self.state.schedule(seed);
            }
        }

        self.state.queue.finish();

        let visited = self.state.visited.lock().len();
        tracing::info!("Crawl finished: {} URLs visited, {}", visited, self.state.index);
        Ok(visited)
    }

    /// Sorted snapshot of every scheduled URL.
    pub fn visited(&self) -> Vec<Url> {
        let mut visited: Vec<Url> = self.state.visited.lock().iter().cloned().collect();
        visited.sort();
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use crate::index::IndexReader;

    struct MapFetcher(HashMap<String, String>);

    impl Fetcher for MapFetcher {
        fn fetch(&self, url: &Url) -> Option<String> {
            self.0.get(url.as_str()).cloned()
        }
    }

    fn site() -> Arc<dyn Fetcher> {
        let mut pages = HashMap::new();
        pages.insert(
            "http://site.test/".to_string(),
            r#"<a href="/a">a</a><a href="/b">b</a><p>home page</p>"#.to_string(),
        );
        pages.insert(
            "http://site.test/a".to_string(),
            r#"<a href="/">home</a><a href="/b#frag">b</a><p>apples</p>"#.to_string(),
        );
        pages.insert(
            "http://site.test/b".to_string(),
            r#"<a href="/missing">gone</a><p>bananas</p>"#.to_string(),
        );
        Arc::new(MapFetcher(pages))
    }

    fn crawler(max_urls: usize) -> (Crawler, Arc<ConcurrentInvertedIndex>) {
        let index = Arc::new(ConcurrentInvertedIndex::new());
        let queue = Arc::new(WorkQueue::new(3).unwrap());
        (Crawler::new(index.clone(), queue, site(), max_urls), index)
    }

    #[test]
    fn test_crawl_follows_cycles_once() {
        let (crawler, index) = crawler(10);
        let visited = crawler.crawl("http://site.test/").unwrap();

        assert_eq!(visited, 4);
        assert!(index.contains_location("appl", "http://site.test/a"));
        assert!(index.contains_location("banana", "http://site.test/b"));
        assert_eq!(index.count("http://site.test/"), 4);
        // Failed fetch is visited but never indexed
        assert_eq!(index.counts().len(), 3);
    }

    #[test]
    fn test_crawl_max_one_indexes_seed_only() {
        let (crawler, index) = crawler(1);
        assert_eq!(crawler.crawl("http://site.test/").unwrap(), 1);

        let visited: Vec<String> = crawler.visited().into_iter().map(String::from).collect();
        assert_eq!(visited, vec!["http://site.test/"]);
        assert!(index.contains("home"));
        assert!(!index.contains("appl"));
    }

    #[test]
    fn test_second_seed_respects_limit() {
        let (crawler, index) = crawler(1);
        assert_eq!(crawler.crawl("http://site.test/").unwrap(), 1);
        assert_eq!(crawler.crawl("http://site.test/a").unwrap(), 1);

        let visited: Vec<String> = crawler.visited().into_iter().map(String::from).collect();
        assert_eq!(visited, vec!["http://site.test/"]);
        assert!(!index.contains("appl"));
    }

    #[test]
    fn test_second_seed_continues_under_limit() {
        let (crawler, index) = crawler(10);
        assert_eq!(crawler.crawl("http://site.test/b").unwrap(), 2);
        assert_eq!(crawler.crawl("http://site.test/").unwrap(), 4);

        assert!(index.contains_location("home", "http://site.test/"));
        assert_eq!(crawler.visited().len(), 4);
    }

    #[test]
    fn test_malformed_seed_is_fatal() {
        let (crawler, index) = crawler(5);
        let err = crawler.crawl("not a url").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(crawler.visited().is_empty());
        assert!(index.is_empty());
    }
}
