use crate::model::catalog::{CatalogEntry, VehicleModel};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::StreamExt;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use tracing::{error, info};

#[async_trait]
pub trait CatalogRepository<T: CatalogEntry>: Send + Sync {
    async fn create(&self, entry: T) -> RepositoryResult<T>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<T>;
    /// One read for many ids; ids with no document are simply absent.
    async fn get_many(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<T>>;
    async fn list(&self) -> RepositoryResult<Vec<T>>;
    async fn update(&self, id: ObjectId, entry: T) -> RepositoryResult<T>;
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait VehicleModelRepository: Send + Sync {
    async fn create(&self, model: VehicleModel) -> RepositoryResult<VehicleModel>;
    async fn get_many(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<VehicleModel>>;
    async fn list_by_brand(&self, brand_id: &str) -> RepositoryResult<Vec<VehicleModel>>;
    async fn rename(&self, brand_id: &str, id: ObjectId, name: &str) -> RepositoryResult<VehicleModel>;
    async fn delete(&self, brand_id: &str, id: ObjectId) -> RepositoryResult<()>;
    async fn delete_by_brand(&self, brand_id: &str) -> RepositoryResult<u64>;
}

async fn collect<T>(mut cursor: mongodb::Cursor<T>, what: &str) -> RepositoryResult<Vec<T>>
where
    T: serde::de::DeserializeOwned + Unpin + Send + Sync,
{
    let mut out = Vec::new();
    while let Some(next) = cursor.next().await {
        match next {
            Ok(value) => out.push(value),
            Err(e) => {
                error!("Failed to deserialize {}: {}", what, e);
                return Err(RepositoryError::serialization(format!("Failed to deserialize {}: {}", what, e)));
            }
        }
    }
    Ok(out)
}

fn by_name() -> FindOptions {
    FindOptions::builder().sort(doc! { "name": 1 }).build()
}

pub struct MongoCatalogRepository<T: CatalogEntry> {
    collection: Collection<T>,
}

impl<T: CatalogEntry> MongoCatalogRepository<T> {
    pub fn new(db: &Database) -> Self {
        MongoCatalogRepository { collection: db.collection::<T>(T::COLLECTION) }
    }
}

#[async_trait]
impl<T: CatalogEntry> CatalogRepository<T> for MongoCatalogRepository<T> {
    #[tracing::instrument(skip(self, entry), fields(kind = T::KIND, name = %entry.name()))]
    async fn create(&self, mut entry: T) -> RepositoryResult<T> {
        entry.set_id(ObjectId::new());
        self.collection.insert_one(&entry, None).await.map_err(|e| {
            error!("Failed to create {}: {}", T::KIND, e);
            RepositoryError::from(e)
        })?;
        info!("Created {}", T::KIND);
        Ok(entry)
    }

    #[tracing::instrument(skip(self), fields(kind = T::KIND, id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<T> {
        match self.collection.find_one(doc! { "_id": id }, None).await {
            Ok(Some(entry)) => Ok(entry),
            Ok(None) => Err(RepositoryError::not_found(format!("No {} with ID: {}", T::KIND, id))),
            Err(e) => {
                error!("Failed to fetch {}: {}", T::KIND, e);
                Err(RepositoryError::database(format!("Failed to fetch {}: {}", T::KIND, e)))
            }
        }
    }

    #[tracing::instrument(skip(self, ids), fields(kind = T::KIND, count = ids.len()))]
    async fn get_many(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self.collection.find(doc! { "_id": { "$in": ids } }, None).await?;
        collect(cursor, T::KIND).await
    }

    #[tracing::instrument(skip(self), fields(kind = T::KIND))]
    async fn list(&self) -> RepositoryResult<Vec<T>> {
        let cursor = self.collection.find(None, by_name()).await.map_err(|e| {
            error!("Failed to list {}: {}", T::COLLECTION, e);
            RepositoryError::database(format!("Failed to list {}: {}", T::COLLECTION, e))
        })?;
        let entries = collect(cursor, T::KIND).await?;
        info!("Fetched {} {} entries", entries.len(), T::KIND);
        Ok(entries)
    }

    #[tracing::instrument(skip(self, entry), fields(kind = T::KIND, id = %id))]
    async fn update(&self, id: ObjectId, mut entry: T) -> RepositoryResult<T> {
        let mut fields = bson::to_document(&entry)?;
        fields.remove("_id");
        let result = self.collection.update_one(doc! { "_id": id }, doc! { "$set": fields }, None).await?;
        if result.matched_count == 0 {
            error!("No {} found to update for ID: {}", T::KIND, id);
            return Err(RepositoryError::not_found(format!("No {} found to update for ID: {}", T::KIND, id)));
        }
        entry.set_id(id);
        Ok(entry)
    }

    #[tracing::instrument(skip(self), fields(kind = T::KIND, id = %id))]
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::not_found(format!("No {} found to delete for ID: {}", T::KIND, id)));
        }
        info!("Deleted {}", T::KIND);
        Ok(())
    }
}

pub struct MongoVehicleModelRepository {
    collection: Collection<VehicleModel>,
}

impl MongoVehicleModelRepository {
    pub fn new(db: &Database) -> Self {
        MongoVehicleModelRepository { collection: db.collection::<VehicleModel>("models") }
    }
}

#[async_trait]
impl VehicleModelRepository for MongoVehicleModelRepository {
    #[tracing::instrument(skip(self, model), fields(brand_id = %model.brand_id, name = %model.name))]
    async fn create(&self, mut model: VehicleModel) -> RepositoryResult<VehicleModel> {
        model.id = Some(ObjectId::new());
        self.collection.insert_one(&model, None).await?;
        info!("Created model");
        Ok(model)
    }

    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_many(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<VehicleModel>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self.collection.find(doc! { "_id": { "$in": ids } }, None).await?;
        collect(cursor, "model").await
    }

    #[tracing::instrument(skip(self))]
    async fn list_by_brand(&self, brand_id: &str) -> RepositoryResult<Vec<VehicleModel>> {
        let cursor = self.collection.find(doc! { "brandId": brand_id }, by_name()).await?;
        collect(cursor, "model").await
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn rename(&self, brand_id: &str, id: ObjectId, name: &str) -> RepositoryResult<VehicleModel> {
        let result = self
            .collection
            .update_one(doc! { "_id": id, "brandId": brand_id }, doc! { "$set": { "name": name } }, None)
            .await?;
        if result.matched_count == 0 {
            return Err(RepositoryError::not_found(format!("No model {}/{} to rename", brand_id, id)));
        }
        Ok(VehicleModel { id: Some(id), brand_id: brand_id.to_string(), name: name.to_string() })
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn delete(&self, brand_id: &str, id: ObjectId) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id, "brandId": brand_id }, None).await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::not_found(format!("No model {}/{} to delete", brand_id, id)));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_brand(&self, brand_id: &str) -> RepositoryResult<u64> {
        let result = self.collection.delete_many(doc! { "brandId": brand_id }, None).await?;
        info!("Deleted {} models of brand {}", result.deleted_count, brand_id);
        Ok(result.deleted_count)
    }
}
