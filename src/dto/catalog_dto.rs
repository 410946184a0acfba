use crate::model::catalog::{Brand, Service, VehicleModel, WarrantyCondition};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body for creating or editing any catalog entry. `description` is ignored
/// for brands and models.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CatalogEntryRequest {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl CatalogEntryRequest {
    /// Trimmed name, `None` when only whitespace was sent.
    pub fn clean_name(&self) -> Option<String> {
        let name = self.name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    pub fn clean_description(&self) -> Option<String> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItemDto {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
}

fn hex(id: Option<bson::oid::ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

impl From<Brand> for CatalogItemDto {
    fn from(brand: Brand) -> Self {
        CatalogItemDto { id: hex(brand.id), name: brand.name, description: None, brand_id: None }
    }
}

impl From<VehicleModel> for CatalogItemDto {
    fn from(model: VehicleModel) -> Self {
        CatalogItemDto { id: hex(model.id), name: model.name, description: None, brand_id: Some(model.brand_id) }
    }
}

impl From<Service> for CatalogItemDto {
    fn from(service: Service) -> Self {
        CatalogItemDto { id: hex(service.id), name: service.name, description: service.description, brand_id: None }
    }
}

impl From<WarrantyCondition> for CatalogItemDto {
    fn from(warranty: WarrantyCondition) -> Self {
        CatalogItemDto { id: hex(warranty.id), name: warranty.name, description: warranty.description, brand_id: None }
    }
}
