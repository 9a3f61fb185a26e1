pub mod crawl;
pub mod fetcher;
pub mod html;
