use crate::dto::list_dto::ListQueryParams;
use crate::dto::quote_dto::{HistoryQuery, QuoteRequest};
use crate::handler::parse_id;
use crate::repository::quote_repo::HistoryCursor;
use crate::service::quote_service::{QuoteService, QuoteServiceImpl};
use crate::util::error::HandlerError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

pub async fn create_quote_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Json(payload): Json<QuoteRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if let Err(e) = payload.validate() {
        error!("[create_quote_handler] Validation failed: {}", e);
        return Err(HandlerError::validation(e));
    }
    let created = service.create_quote(payload).await?;
    info!("[create_quote_handler] Quote {} created", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_quotes_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    let quotes = service.list_quotes().await?;
    Ok(Json(quotes))
}

pub async fn view_quotes_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Query(params): Query<ListQueryParams>,
) -> Result<impl IntoResponse, HandlerError> {
    let page = service.view_quotes(params).await?;
    Ok(Json(page))
}

pub async fn history_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let before = match query.before.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        Some(raw) => {
            let created_at = DateTime::parse_from_rfc3339(raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|_| HandlerError::bad_request("Invalid 'before' timestamp"))?;
            let id = match query.before_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
                Some(raw_id) => Some(parse_id(raw_id, "cursor")?),
                None => None,
            };
            Some(HistoryCursor { created_at, id })
        }
        None => None,
    };
    let page = service.history(before).await?;
    Ok(Json(page))
}

pub async fn next_number_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    let next = service.next_number().await?;
    Ok(Json(next))
}

pub async fn get_quote_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "quote")?;
    let quote = service.get_quote(id).await?;
    Ok(Json(quote))
}

pub async fn get_resolved_quote_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "quote")?;
    let resolved = service.get_resolved(id).await?;
    Ok(Json(resolved))
}

pub async fn update_quote_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Path(id): Path<String>,
    Json(payload): Json<QuoteRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "quote")?;
    if let Err(e) = payload.validate() {
        return Err(HandlerError::validation(e));
    }
    let updated = service.update_quote(id, payload).await?;
    Ok(Json(updated))
}

pub async fn duplicate_quote_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "quote")?;
    let copy = service.duplicate_quote(id).await?;
    info!("[duplicate_quote_handler] {} duplicated as {}", id, copy.running_number);
    Ok(Json(copy))
}
