use crate::handler::quote_handler::{
    create_quote_handler, duplicate_quote_handler, get_quote_handler, get_resolved_quote_handler, history_handler,
    list_quotes_handler, next_number_handler, update_quote_handler, view_quotes_handler,
};
use crate::service::quote_service::QuoteServiceImpl;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn quote_router(service: Arc<QuoteServiceImpl>) -> Router {
    Router::new()
        .route("/quotes", post(create_quote_handler).get(list_quotes_handler))
        .route("/quotes/view", get(view_quotes_handler))
        .route("/quotes/history", get(history_handler))
        .route("/quotes/next-number", get(next_number_handler))
        .route("/quotes/{id}", get(get_quote_handler).put(update_quote_handler))
        .route("/quotes/{id}/resolved", get(get_resolved_quote_handler))
        .route("/quotes/{id}/duplicate", post(duplicate_quote_handler))
        .with_state(service)
}
