use std::time::Duration;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use url::Url;
use crate::core::error::Result;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 3;

/// Source of page HTML for the crawler.
pub trait Fetcher: Send + Sync {
    /// HTML of `url`, or `None` if it cannot be fetched or is not HTML.
    fn fetch(&self, url: &Url) -> Option<String>;
}

/// Blocking HTTP fetcher with bounded retries
pub struct HttpFetcher {
    client: Client,
    attempts: usize,
}

impl HttpFetcher {
    pub fn new(attempts: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpFetcher {
            client,
            attempts: attempts.max(1),
        })
    }

    fn is_html(content_type: Option<&str>) -> bool {
        content_type.is_some_and(|value| value.trim_start().to_ascii_lowercase().starts_with("text/html"))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Option<String> {
        for attempt in 1..=self.attempts {
            let response = match self.client.get(url.clone()).send() {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!("Fetch {} attempt {}/{} failed: {}", url, attempt, self.attempts, e);
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                tracing::debug!("Fetch {} returned {}", url, status);
                return None;
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok());
            if !Self::is_html(content_type) {
                tracing::debug!("Skipping {}: not HTML", url);
                return None;
            }

            match response.text() {
                Ok(body) => return Some(body),
                Err(e) => {
                    tracing::debug!("Reading {} attempt {}/{} failed: {}", url, attempt, self.attempts, e);
                }
            }
        }

        tracing::warn!("Giving up on {} after {} attempts", url, self.attempts);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_content_type() {
        assert!(HttpFetcher::is_html(Some("text/html; charset=utf-8")));
        assert!(HttpFetcher::is_html(Some("Text/HTML")));
        assert!(!HttpFetcher::is_html(Some("application/json")));
        assert!(!HttpFetcher::is_html(None));
    }
}
