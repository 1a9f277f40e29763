//! HTTP service around a [`CartScraper`]
//!
//! - `POST /scrape` with `{"url": "..."}`: 200 with the cart, 422 for a
//!   malformed URL, 500 with `{"detail": ...}` when the pipeline fails
//! - `GET /health`: always `{"status": "healthy"}`

use crate::error::{ErrorKind, ScrapeError};
use crate::model::CartResult;
use crate::pipeline::CartScraper;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /scrape`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapeRequest {
    pub url: String,
}

/// Error body, `{"detail": "..."}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Scrape failure mapped onto an HTTP response
pub struct ApiError(ScrapeError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ErrorKind::InvalidUrl => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorDetail {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the service router around a shared scraper
pub fn router(scraper: Arc<dyn CartScraper>) -> Router {
    Router::new()
        .route("/scrape", post(scrape))
        .route("/health", get(health))
        .with_state(scraper)
}

async fn scrape(
    State(scraper): State<Arc<dyn CartScraper>>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<CartResult>, ApiError> {
    log::info!("Scrape requested for {}", request.url);
    match scraper.scrape_cart(&request.url).await {
        Ok(cart) => Ok(Json(cart)),
        Err(error) => {
            log::error!("Scrape of {} failed: {}", request.url, error);
            Err(ApiError(error))
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
