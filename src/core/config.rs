use std::path::PathBuf;

pub const DEFAULT_THREADS: usize = 5;
pub const DEFAULT_MAX_URLS: usize = 1;
pub const DEFAULT_FETCH_ATTEMPTS: usize = 3;
pub const DEFAULT_SERVER_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    // Build sources
    pub text_path: Option<PathBuf>,
    pub seed_url: Option<String>,

    // Concurrency
    pub multithreaded: bool,
    pub threads: usize,

    // Crawl limits
    pub max_urls: usize,
    pub fetch_attempts: usize,

    // Queries
    pub query_path: Option<PathBuf>,
    pub exact: bool,

    // Outputs
    pub index_output: Option<PathBuf>,
    pub counts_output: Option<PathBuf>,
    pub results_output: Option<PathBuf>,
    pub server_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            text_path: None,
            seed_url: None,

            multithreaded: false,
            threads: DEFAULT_THREADS,

            max_urls: DEFAULT_MAX_URLS,
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,

            query_path: None,
            exact: false,

            index_output: None,
            counts_output: None,
            results_output: None,
            server_port: None,
        }
    }
}

impl Config {
    /// Replace out-of-range values with usable ones.
    ///
    /// A thread count below one falls back to the default pool size, while
    /// crawl and fetch limits are raised to one.
    pub fn normalized(mut self) -> Self {
        if self.threads < 1 {
            tracing::warn!(
                "Invalid thread count {}, using {}",
                self.threads,
                DEFAULT_THREADS
            );
            self.threads = DEFAULT_THREADS;
        }
        if self.max_urls < 1 {
            tracing::warn!("Invalid crawl limit {}, using 1", self.max_urls);
            self.max_urls = 1;
        }
        self.fetch_attempts = self.fetch_attempts.max(1);

        // Crawling always runs on the shared pool
        if self.seed_url.is_some() {
            self.multithreaded = true;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_replaces_zero_threads_with_default() {
        let config = Config {
            threads: 0,
            ..Config::default()
        }
        .normalized();

        assert_eq!(config.threads, DEFAULT_THREADS);
    }

    #[test]
    fn test_normalized_raises_crawl_limit_to_one() {
        let config = Config {
            max_urls: 0,
            fetch_attempts: 0,
            ..Config::default()
        }
        .normalized();

        assert_eq!(config.max_urls, 1);
        assert_eq!(config.fetch_attempts, 1);
    }

    #[test]
    fn test_seed_url_enables_multithreading() {
        let config = Config {
            seed_url: Some("https://example.com/".to_string()),
            ..Config::default()
        }
        .normalized();

        assert!(config.multithreaded);
    }
}
