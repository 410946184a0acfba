use crate::handler::catalog_handler::*;
use crate::service::catalog_service::CatalogServiceImpl;
use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

pub fn catalog_router(service: Arc<CatalogServiceImpl>) -> Router {
    Router::new()
        .route("/brands", get(list_brands_handler).post(create_brand_handler))
        .route("/brands/{brand_id}", put(rename_brand_handler).delete(delete_brand_handler))
        .route("/brands/{brand_id}/models", get(list_models_handler).post(create_model_handler))
        .route(
            "/brands/{brand_id}/models/{model_id}",
            put(rename_model_handler).delete(delete_model_handler),
        )
        .route("/services", get(list_services_handler).post(create_service_handler))
        .route("/services/{id}", put(update_service_handler).delete(delete_service_handler))
        .route("/warranties", get(list_warranties_handler).post(create_warranty_handler))
        .route("/warranties/{id}", put(update_warranty_handler).delete(delete_warranty_handler))
        .with_state(service)
}
