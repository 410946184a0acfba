pub mod catalog_router;
pub mod quote_router;

use crate::service::catalog_service::CatalogServiceImpl;
use crate::service::quote_service::QuoteServiceImpl;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Every route the service exposes.
pub fn api_router(quotes: Arc<QuoteServiceImpl>, catalog: Arc<CatalogServiceImpl>) -> Router {
    Router::new()
        .merge(quote_router::quote_router(quotes))
        .merge(catalog_router::catalog_router(catalog))
        .route("/health", get(|| async { "OK" }))
}
