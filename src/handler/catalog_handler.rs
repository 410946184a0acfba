use crate::dto::catalog_dto::CatalogEntryRequest;
use crate::handler::parse_id;
use crate::service::catalog_service::{CatalogService, CatalogServiceImpl};
use crate::util::error::HandlerError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

type Catalog = State<Arc<CatalogServiceImpl>>;

fn validated(payload: CatalogEntryRequest) -> Result<CatalogEntryRequest, HandlerError> {
    payload.validate().map_err(HandlerError::validation)?;
    Ok(payload)
}

// Brands

pub async fn list_brands_handler(State(service): Catalog) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.list_brands().await?))
}

pub async fn create_brand_handler(
    State(service): Catalog,
    Json(payload): Json<CatalogEntryRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let brand = service.create_brand(validated(payload)?).await?;
    Ok((StatusCode::CREATED, Json(brand)))
}

pub async fn rename_brand_handler(
    State(service): Catalog,
    Path(brand_id): Path<String>,
    Json(payload): Json<CatalogEntryRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&brand_id, "brand")?;
    Ok(Json(service.rename_brand(id, validated(payload)?).await?))
}

pub async fn delete_brand_handler(
    State(service): Catalog,
    Path(brand_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&brand_id, "brand")?;
    service.delete_brand(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Models, always addressed under their brand

pub async fn list_models_handler(
    State(service): Catalog,
    Path(brand_id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let brand_id = parse_id(&brand_id, "brand")?;
    Ok(Json(service.list_models(brand_id).await?))
}

pub async fn create_model_handler(
    State(service): Catalog,
    Path(brand_id): Path<String>,
    Json(payload): Json<CatalogEntryRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let brand_id = parse_id(&brand_id, "brand")?;
    let model = service.create_model(brand_id, validated(payload)?).await?;
    Ok((StatusCode::CREATED, Json(model)))
}

pub async fn rename_model_handler(
    State(service): Catalog,
    Path((brand_id, model_id)): Path<(String, String)>,
    Json(payload): Json<CatalogEntryRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let brand_id = parse_id(&brand_id, "brand")?;
    let id = parse_id(&model_id, "model")?;
    Ok(Json(service.rename_model(brand_id, id, validated(payload)?).await?))
}

pub async fn delete_model_handler(
    State(service): Catalog,
    Path((brand_id, model_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, HandlerError> {
    let brand_id = parse_id(&brand_id, "brand")?;
    let id = parse_id(&model_id, "model")?;
    service.delete_model(brand_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Services

pub async fn list_services_handler(State(service): Catalog) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.list_services().await?))
}

pub async fn create_service_handler(
    State(service): Catalog,
    Json(payload): Json<CatalogEntryRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let created = service.create_service(validated(payload)?).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_service_handler(
    State(service): Catalog,
    Path(id): Path<String>,
    Json(payload): Json<CatalogEntryRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "service")?;
    Ok(Json(service.update_service(id, validated(payload)?).await?))
}

pub async fn delete_service_handler(
    State(service): Catalog,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "service")?;
    service.delete_service(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Warranty conditions

pub async fn list_warranties_handler(State(service): Catalog) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.list_warranties().await?))
}

pub async fn create_warranty_handler(
    State(service): Catalog,
    Json(payload): Json<CatalogEntryRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let created = service.create_warranty(validated(payload)?).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_warranty_handler(
    State(service): Catalog,
    Path(id): Path<String>,
    Json(payload): Json<CatalogEntryRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "warranty condition")?;
    Ok(Json(service.update_warranty(id, validated(payload)?).await?))
}

pub async fn delete_warranty_handler(
    State(service): Catalog,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "warranty condition")?;
    service.delete_warranty(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
