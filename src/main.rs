use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;
use webdex::core::config::{Config, DEFAULT_MAX_URLS, DEFAULT_SERVER_PORT, DEFAULT_THREADS};
use webdex::crawler::crawl::Crawler;
use webdex::crawler::fetcher::HttpFetcher;
use webdex::export::json;
use webdex::index::builder::IndexBuilder;
use webdex::index::concurrent::ConcurrentInvertedIndex;
use webdex::index::inverted::InvertedIndex;
use webdex::parallel::indexer::ConcurrentIndexBuilder;
use webdex::parallel::work_queue::WorkQueue;
use webdex::query::concurrent::ConcurrentQueryProcessor;
use webdex::query::processor::QueryProcessor;
use webdex::query::{QueryHandler, QueryResults};
use webdex::server::app::serve;

/// Build an inverted index from text files or a web crawl, run queries
/// against it and optionally serve a search form.
#[derive(Parser, Debug)]
#[command(name = "webdex", version, about)]
struct Cli {
    /// File or directory of text files to index
    #[arg(long, value_name = "PATH")]
    text: Option<PathBuf>,

    /// Seed URL to crawl (implies multithreading)
    #[arg(long, value_name = "URL")]
    html: Option<String>,

    /// Maximum number of URLs to crawl, seed included
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    max: Option<String>,

    /// Use a pool of N worker threads
    #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "5", allow_negative_numbers = true)]
    threads: Option<String>,

    /// File with one query per line
    #[arg(long, value_name = "PATH")]
    query: Option<PathBuf>,

    /// Match whole terms instead of prefixes
    #[arg(long)]
    exact: bool,

    /// Write the inverted index as JSON
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "index.json")]
    index: Option<PathBuf>,

    /// Write per-location token counts as JSON
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "counts.json")]
    counts: Option<PathBuf>,

    /// Write query results as JSON
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "results.json")]
    results: Option<PathBuf>,

    /// Serve the search form on PORT once everything else is done
    #[arg(long, value_name = "PORT", num_args = 0..=1, default_missing_value = "8080")]
    server: Option<String>,

    /// Log per-file, per-page and per-query detail
    #[arg(short, long)]
    verbose: bool,
}

/// Unparseable numbers fall back to `default`, like missing ones.
fn lenient<T: std::str::FromStr>(value: Option<&str>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl Cli {
    fn into_config(self) -> Config {
        let multithreaded = self.threads.is_some() || self.html.is_some();

        Config {
            text_path: self.text,
            seed_url: self.html,
            multithreaded,
            threads: lenient::<i64>(self.threads.as_deref(), DEFAULT_THREADS as i64).max(0) as usize,
            max_urls: lenient::<i64>(self.max.as_deref(), DEFAULT_MAX_URLS as i64).max(0) as usize,
            query_path: self.query,
            exact: self.exact,
            index_output: self.index,
            counts_output: self.counts,
            results_output: self.results,
            server_port: self
                .server
                .map(|port| lenient(Some(port.as_str()), DEFAULT_SERVER_PORT)),
            ..Config::default()
        }
    }
}

fn write_outputs(config: &Config, index: &InvertedIndex, results: &QueryResults) {
    if let Some(path) = &config.results_output {
        if let Err(e) = json::write_results(results, path) {
            tracing::error!("Unable to write results to {}: {}", path.display(), e);
        }
    }

    if let Some(path) = &config.counts_output {
        if let Err(e) = json::write_counts(index.counts(), path) {
            tracing::error!("Unable to write counts to {}: {}", path.display(), e);
        }
    }

    if let Some(path) = &config.index_output {
        if let Err(e) = json::write_index(index, path) {
            tracing::error!("Unable to write index to {}: {}", path.display(), e);
        }
    }
}

fn run_sequential(config: &Config) -> InvertedIndex {
    let mut index = InvertedIndex::new();

    match &config.text_path {
        Some(path) => {
            if let Err(e) = IndexBuilder::new(&mut index).build(path) {
                tracing::error!("Unable to build the index from {}: {}", path.display(), e);
            }
        }
        None => tracing::warn!("No --text path given, the index starts empty"),
    }

    let mut results = QueryResults::new();
    if let Some(path) = &config.query_path {
        let mut processor = QueryProcessor::new(&index);
        if let Err(e) = processor.parse_file(path, config.exact) {
            tracing::error!("Unable to read query file {}: {}", path.display(), e);
        }
        results = processor.into_results();
    }

    write_outputs(config, &index, &results);
    index
}

/// Log the task failures left on `queue` by the phase that just finished.
fn log_failures(queue: &WorkQueue, phase: &str) {
    for failure in queue.take_failures() {
        tracing::warn!("{} task failed: {}", phase, failure);
    }
}

fn run_concurrent(config: &Config) -> anyhow::Result<Arc<ConcurrentInvertedIndex>> {
    let index = Arc::new(ConcurrentInvertedIndex::new());
    let queue = Arc::new(WorkQueue::new(config.threads)?);

    match &config.text_path {
        Some(path) => {
            let builder = ConcurrentIndexBuilder::new(index.clone(), queue.clone());
            if let Err(e) = builder.build(path) {
                tracing::error!("Unable to build the index from {}: {}", path.display(), e);
            }
            log_failures(&queue, "Index");
        }
        None if config.seed_url.is_none() => tracing::warn!("No --text path given, the index starts empty"),
        None => {}
    }

    if let Some(seed) = &config.seed_url {
        match HttpFetcher::new(config.fetch_attempts) {
            Ok(fetcher) => {
                let crawler = Crawler::new(index.clone(), queue.clone(), Arc::new(fetcher), config.max_urls);
                if let Err(e) = crawler.crawl(seed) {
                    tracing::error!("Unable to crawl {}: {}", seed, e);
                }
                log_failures(&queue, "Crawl");
            }
            Err(e) => tracing::error!("Unable to create HTTP client: {}", e),
        }
    }

    let mut results = QueryResults::new();
    if let Some(path) = &config.query_path {
        let mut processor = ConcurrentQueryProcessor::new(index.clone(), queue.clone());
        if let Err(e) = processor.parse_file(path, config.exact) {
            tracing::error!("Unable to read query file {}: {}", path.display(), e);
        }
        results = processor.results();
        log_failures(&queue, "Query");
    }

    queue.shutdown();
    queue.join();

    write_outputs(config, &index.snapshot(), &results);
    Ok(index)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let config = cli.into_config().normalized();
    tracing::debug!("{:?}", config);

    let index = if config.multithreaded {
        run_concurrent(&config)?
    } else {
        Arc::new(ConcurrentInvertedIndex::from(run_sequential(&config)))
    };

    if let Some(port) = config.server_port {
        let runtime = tokio::runtime::Runtime::new()?;
        if let Err(e) = runtime.block_on(serve(port, index)) {
            tracing::error!("Cannot start server on port {}: {}", port, e);
        }
    }

    Ok(())
}
