use std::net::SocketAddr;
use std::sync::Arc;
use axum::routing::get;
use axum::{Extension, Router};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use crate::core::error::Result;
use crate::index::concurrent::ConcurrentInvertedIndex;
use crate::server::handlers::{search_page, submit_search};

pub const SEARCH_PATH: &str = "/search";

/// State shared by every request
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<ConcurrentInvertedIndex>,

    /// Formatted result lines of every search, oldest first
    pub history: Arc<Mutex<Vec<String>>>,
}

impl AppState {
    pub fn new(index: Arc<ConcurrentInvertedIndex>) -> Self {
        AppState {
            index,
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(search_page))
        .route(SEARCH_PATH, get(search_page).post(submit_search))
        .layer(Extension(state))
}

/// Serve the search form on `port` until the process exits.
pub async fn serve(port: u16, index: Arc<ConcurrentInvertedIndex>) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Search server listening on http://{}{}", listener.local_addr()?, SEARCH_PATH);
    axum::serve(listener, router(AppState::new(index))).await?;
    Ok(())
}
