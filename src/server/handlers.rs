use std::collections::BTreeSet;
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use axum::{Extension, Form};
use serde::Deserialize;
use crate::index::IndexReader;
use crate::search::results::SearchResult;
use crate::server::app::{AppState, SEARCH_PATH};

const TITLE: &str = "Webdex Search";

#[derive(Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub word: String,
}

/// Escape the characters that are significant in HTML text and attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Timestamp shown next to each history entry, e.g. `03:07 PM on Monday, March 04 2024`.
pub fn posted_at() -> String {
    chrono::Local::now().format("%I:%M %p on %A, %B %d %Y").to_string()
}

/// One history line per result.
pub fn history_line(result: &SearchResult, posted: &str) -> String {
    format!(
        "<p>Location: {} Score: {:.8} Query Count: {}<br><font size=\"-2\">[ posted at {} ]</font></p>",
        escape_html(&result.location),
        result.score,
        result.count,
        posted
    )
}

pub fn render_page(history: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<h1>{title}</h1>
<form method="POST" action="{action}">
<input type="text" name="word" placeholder="Search terms" autofocus>
<button type="submit">Search</button>
</form>
<hr>
{history}
</body>
</html>
"#,
        title = TITLE,
        action = SEARCH_PATH,
        history = history.join("\n\n"),
    )
}

/// `GET /` and `GET /search`
pub async fn search_page(Extension(state): Extension<AppState>) -> Html<String> {
    let history = state.history.lock().clone();
    Html(render_page(&history))
}

/// `POST /search`: partial search for the escaped terms of `word`, record
/// every result and send the browser back to the form.
pub async fn submit_search(
    Extension(state): Extension<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Redirect, (StatusCode, String)> {
    let terms: BTreeSet<String> = form.word.split_whitespace().map(escape_html).collect();
    if terms.is_empty() {
        return Ok(Redirect::to(SEARCH_PATH));
    }

    let index = state.index.clone();
    let query = terms.clone();
    let results = tokio::task::spawn_blocking(move || index.partial_search(&query))
        .await
        .map_err(|e| {
            tracing::error!("Search task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "search failed".to_string())
        })?;

    tracing::info!("Search {:?} matched {} locations", terms, results.len());

    let posted = posted_at();
    state
        .history
        .lock()
        .extend(results.iter().map(|result| history_line(result, &posted)));

    Ok(Redirect::to(SEARCH_PATH))
}
