use crate::dto::catalog_dto::{CatalogEntryRequest, CatalogItemDto};
use crate::model::catalog::{Brand, CatalogEntry, CatalogRef, Service, VehicleModel, WarrantyCondition};
use crate::repository::catalog_repo::{CatalogRepository, VehicleModelRepository};
use crate::repository::quote_repo::QuoteRepository;
use crate::util::error::ServiceError;
use async_trait::async_trait;
use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_brands(&self) -> Result<Vec<CatalogItemDto>, ServiceError>;
    async fn create_brand(&self, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError>;
    async fn rename_brand(&self, id: ObjectId, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError>;
    /// Refused while any quote points at the brand; otherwise its models go with it.
    async fn delete_brand(&self, id: ObjectId) -> Result<(), ServiceError>;

    async fn list_models(&self, brand_id: ObjectId) -> Result<Vec<CatalogItemDto>, ServiceError>;
    async fn create_model(&self, brand_id: ObjectId, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError>;
    async fn rename_model(
        &self,
        brand_id: ObjectId,
        id: ObjectId,
        request: CatalogEntryRequest,
    ) -> Result<CatalogItemDto, ServiceError>;
    async fn delete_model(&self, brand_id: ObjectId, id: ObjectId) -> Result<(), ServiceError>;

    async fn list_services(&self) -> Result<Vec<CatalogItemDto>, ServiceError>;
    async fn create_service(&self, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError>;
    async fn update_service(&self, id: ObjectId, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError>;
    async fn delete_service(&self, id: ObjectId) -> Result<(), ServiceError>;

    async fn list_warranties(&self) -> Result<Vec<CatalogItemDto>, ServiceError>;
    async fn create_warranty(&self, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError>;
    async fn update_warranty(&self, id: ObjectId, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError>;
    async fn delete_warranty(&self, id: ObjectId) -> Result<(), ServiceError>;
}

pub struct CatalogServiceImpl {
    pub brands: Arc<dyn CatalogRepository<Brand>>,
    pub models: Arc<dyn VehicleModelRepository>,
    pub services: Arc<dyn CatalogRepository<Service>>,
    pub warranties: Arc<dyn CatalogRepository<WarrantyCondition>>,
    pub quotes: Arc<dyn QuoteRepository>,
}

fn required_name(request: &CatalogEntryRequest) -> Result<String, ServiceError> {
    request
        .clean_name()
        .ok_or_else(|| ServiceError::InvalidInput("Name cannot be empty".to_string()))
}

impl CatalogServiceImpl {
    pub fn new(
        brands: Arc<dyn CatalogRepository<Brand>>,
        models: Arc<dyn VehicleModelRepository>,
        services: Arc<dyn CatalogRepository<Service>>,
        warranties: Arc<dyn CatalogRepository<WarrantyCondition>>,
        quotes: Arc<dyn QuoteRepository>,
    ) -> Self {
        CatalogServiceImpl { brands, models, services, warranties, quotes }
    }

    async fn ensure_unreferenced(&self, reference: CatalogRef) -> Result<(), ServiceError> {
        let count = self.quotes.count_references(&reference).await?;
        if count > 0 {
            warn!("Refusing to delete {}: used by {} quotes", reference, count);
            return Err(ServiceError::Conflict(format!("Cannot delete {}: used by {} quotes", reference, count)));
        }
        Ok(())
    }

    async fn list_entries<T>(repo: &dyn CatalogRepository<T>) -> Result<Vec<CatalogItemDto>, ServiceError>
    where
        T: CatalogEntry + Into<CatalogItemDto>,
    {
        let entries = repo.list().await.map_err(|e| {
            error!("Failed to list {}: {}", T::KIND, e);
            ServiceError::from(e)
        })?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    async fn delete_entry<T: CatalogEntry>(
        &self,
        repo: &dyn CatalogRepository<T>,
        id: ObjectId,
        reference: CatalogRef,
    ) -> Result<(), ServiceError> {
        self.ensure_unreferenced(reference).await?;
        repo.delete(id).await?;
        info!("Deleted {} {}", T::KIND, id);
        Ok(())
    }
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn list_brands(&self) -> Result<Vec<CatalogItemDto>, ServiceError> {
        Self::list_entries(self.brands.as_ref()).await
    }

    #[instrument(skip(self, request))]
    async fn create_brand(&self, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError> {
        let name = required_name(&request)?;
        let brand = self.brands.create(Brand { id: None, name }).await?;
        Ok(brand.into())
    }

    #[instrument(skip(self, request), fields(id = %id))]
    async fn rename_brand(&self, id: ObjectId, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError> {
        let name = required_name(&request)?;
        let brand = self.brands.update(id, Brand { id: Some(id), name }).await?;
        Ok(brand.into())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_brand(&self, id: ObjectId) -> Result<(), ServiceError> {
        let brand_id = id.to_hex();
        self.ensure_unreferenced(CatalogRef::Brand(brand_id.clone())).await?;
        self.brands.delete(id).await?;
        let removed = self.models.delete_by_brand(&brand_id).await.map_err(|e| {
            error!("Brand {} deleted but its models were not: {}", brand_id, e);
            ServiceError::from(e)
        })?;
        info!("Deleted brand {} and {} models", brand_id, removed);
        Ok(())
    }

    async fn list_models(&self, brand_id: ObjectId) -> Result<Vec<CatalogItemDto>, ServiceError> {
        let models = self.models.list_by_brand(&brand_id.to_hex()).await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), fields(brand_id = %brand_id))]
    async fn create_model(&self, brand_id: ObjectId, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError> {
        let name = required_name(&request)?;
        self.brands.get_by_id(brand_id).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::NotFound(format!("No brand {}", brand_id))
            } else {
                ServiceError::from(e)
            }
        })?;
        let model = self
            .models
            .create(VehicleModel { id: None, brand_id: brand_id.to_hex(), name })
            .await?;
        Ok(model.into())
    }

    #[instrument(skip(self, request), fields(brand_id = %brand_id, id = %id))]
    async fn rename_model(
        &self,
        brand_id: ObjectId,
        id: ObjectId,
        request: CatalogEntryRequest,
    ) -> Result<CatalogItemDto, ServiceError> {
        let name = required_name(&request)?;
        let model = self.models.rename(&brand_id.to_hex(), id, &name).await?;
        Ok(model.into())
    }

    #[instrument(skip(self), fields(brand_id = %brand_id, id = %id))]
    async fn delete_model(&self, brand_id: ObjectId, id: ObjectId) -> Result<(), ServiceError> {
        let brand_id = brand_id.to_hex();
        self.ensure_unreferenced(CatalogRef::Model { brand_id: brand_id.clone(), model_id: id.to_hex() })
            .await?;
        self.models.delete(&brand_id, id).await?;
        info!("Deleted model {}/{}", brand_id, id);
        Ok(())
    }

    async fn list_services(&self) -> Result<Vec<CatalogItemDto>, ServiceError> {
        Self::list_entries(self.services.as_ref()).await
    }

    #[instrument(skip(self, request))]
    async fn create_service(&self, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError> {
        let service = Service { id: None, name: required_name(&request)?, description: request.clean_description() };
        Ok(self.services.create(service).await?.into())
    }

    #[instrument(skip(self, request), fields(id = %id))]
    async fn update_service(&self, id: ObjectId, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError> {
        let service = Service { id: Some(id), name: required_name(&request)?, description: request.clean_description() };
        Ok(self.services.update(id, service).await?.into())
    }

    async fn delete_service(&self, id: ObjectId) -> Result<(), ServiceError> {
        self.delete_entry(self.services.as_ref(), id, CatalogRef::Service(id.to_hex())).await
    }

    async fn list_warranties(&self) -> Result<Vec<CatalogItemDto>, ServiceError> {
        Self::list_entries(self.warranties.as_ref()).await
    }

    #[instrument(skip(self, request))]
    async fn create_warranty(&self, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError> {
        let warranty = WarrantyCondition {
            id: None,
            name: required_name(&request)?,
            description: request.clean_description(),
        };
        Ok(self.warranties.create(warranty).await?.into())
    }

    #[instrument(skip(self, request), fields(id = %id))]
    async fn update_warranty(&self, id: ObjectId, request: CatalogEntryRequest) -> Result<CatalogItemDto, ServiceError> {
        let warranty = WarrantyCondition {
            id: Some(id),
            name: required_name(&request)?,
            description: request.clean_description(),
        };
        Ok(self.warranties.update(id, warranty).await?.into())
    }

    async fn delete_warranty(&self, id: ObjectId) -> Result<(), ServiceError> {
        self.delete_entry(self.warranties.as_ref(), id, CatalogRef::Warranty(id.to_hex())).await
    }
}
