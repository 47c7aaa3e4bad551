//! HTTP server mode.
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `GET /` | last exported `index.html`, or a built-in landing page |
//! | `GET /api/articles` | runs the pipeline, returns `{ "articles": [...] }` |
//! | `GET /export` | runs the pipeline and writes JSON + HTML to disk |
//! | anything else | static files from the output directory |
//!
//! Every request runs its own pipeline; concurrent requests are not
//! coordinated and may repeat the same scraping work.

use crate::config::DigestConfig;
use crate::models::Digest;
use crate::outputs::{self, html::HTML_FILENAME};
use crate::pipeline::DigestPipeline;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info, instrument};

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>News Digest</title></head>
<body>
<h1>News Digest</h1>
<p>No digest has been exported yet.</p>
<ul>
  <li><a href="/api/articles">/api/articles</a>: build the digest and return it as JSON</li>
  <li><a href="/export">/export</a>: build the digest and publish it as this page</li>
</ul>
</body>
</html>
"#;

pub struct AppState {
    pub config: DigestConfig,
    pub pipeline: DigestPipeline,
}

/// JSON error body; `details` is only filled in development mode.
#[derive(Debug)]
pub struct ApiError {
    message: &'static str,
    details: Option<String>,
}

impl ApiError {
    pub fn new(message: &'static str, cause: &dyn Error, development: bool) -> Self {
        Self {
            message,
            details: development.then(|| cause.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.output_dir);
    Router::new()
        .route("/", get(landing))
        .route("/api/articles", get(list_articles))
        .route("/export", get(run_export))
        .fallback_service(static_files)
        .with_state(state)
}

async fn landing(State(state): State<Arc<AppState>>) -> Html<String> {
    let exported = Path::new(&state.config.output_dir).join(HTML_FILENAME);
    match tokio::fs::read_to_string(&exported).await {
        Ok(page) => Html(page),
        Err(_) => Html(LANDING_PAGE.to_string()),
    }
}

#[instrument(level = "info", skip_all)]
async fn list_articles(State(state): State<Arc<AppState>>) -> Result<Json<Digest>, ApiError> {
    match state.pipeline.run(state.config.article_limit).await {
        Ok(articles) => Ok(Json(Digest { articles })),
        Err(e) => {
            error!(error = %e, "Failed to build digest");
            Err(ApiError::new("Failed to fetch articles", &e, state.config.development))
        }
    }
}

#[instrument(level = "info", skip_all)]
async fn run_export(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    let failure = |e: &dyn Error| {
        error!(error = %e, "Export failed");
        let text = if state.config.development {
            format!("Export failed: {e}")
        } else {
            "Export failed".to_string()
        };
        (StatusCode::INTERNAL_SERVER_ERROR, text)
    };

    let entries = match state.pipeline.run(state.config.article_limit).await {
        Ok(entries) => entries,
        Err(e) => return failure(&e),
    };
    match outputs::export(&entries, &state.config.output_dir).await {
        Ok(paths) => (
            StatusCode::OK,
            format!(
                "Export completed: {} articles written to {} and {}",
                entries.len(),
                paths.json.display(),
                paths.html.display()
            ),
        ),
        Err(e) => failure(&e),
    }
}

/// Serve until the process is stopped.
pub async fn serve(config: DigestConfig) -> Result<(), Box<dyn Error>> {
    let pipeline = DigestPipeline::from_config(&config)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState { config, pipeline });

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
