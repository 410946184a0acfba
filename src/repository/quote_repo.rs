use crate::model::catalog::CatalogRef;
use crate::model::quote::{timestamp, Quote};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use mongodb::error::ErrorKind;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use tracing::{error, info, warn};

/// Position of the last history row already shown. Rows sharing a
/// `createdAt` are told apart by `_id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryCursor {
    pub created_at: DateTime<Utc>,
    pub id: Option<ObjectId>,
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create(&self, quote: Quote) -> RepositoryResult<Quote>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Quote>;
    async fn update(&self, id: ObjectId, quote: Quote) -> RepositoryResult<Quote>;
    async fn list_all(&self) -> RepositoryResult<Vec<Quote>>;
    /// Newest first by `(createdAt, _id)`, strictly after `before` when given.
    async fn list_recent(&self, before: Option<HistoryCursor>, limit: u32) -> RepositoryResult<Vec<Quote>>;
    /// Every issued running number that starts with `prefix`.
    async fn running_numbers_with_prefix(&self, prefix: &str) -> RepositoryResult<Vec<String>>;
    async fn count_references(&self, reference: &CatalogRef) -> RepositoryResult<u64>;
}

pub struct MongoQuoteRepository {
    collection: Collection<Quote>,
}

impl MongoQuoteRepository {
    pub fn new(db: &Database) -> Self {
        MongoQuoteRepository { collection: db.collection::<Quote>("quotes") }
    }
}

/// Collects a quote cursor. Documents that no longer fit the model are
/// logged and skipped so one bad record does not hide the rest.
async fn drain<S>(mut cursor: S) -> RepositoryResult<Vec<Quote>>
where
    S: Stream<Item = mongodb::error::Result<Quote>> + Unpin,
{
    let mut quotes = Vec::new();
    let mut skipped = 0usize;
    while let Some(quote) = cursor.next().await {
        match quote {
            Ok(q) => quotes.push(q),
            Err(e) if matches!(*e.kind, ErrorKind::BsonDeserialization(_)) => {
                warn!("Skipping unreadable quote: {}", e);
                skipped += 1;
            }
            Err(e) => {
                error!("Failed to read quotes: {}", e);
                return Err(RepositoryError::database(format!("Failed to read quotes: {}", e)));
            }
        }
    }
    if skipped > 0 {
        warn!("Skipped {} unreadable quotes", skipped);
    }
    Ok(quotes)
}

fn history_filter(before: Option<&HistoryCursor>) -> Document {
    match before {
        None => doc! {},
        Some(HistoryCursor { created_at, id: None }) => {
            doc! { "createdAt": { "$lt": timestamp::format(created_at) } }
        }
        Some(HistoryCursor { created_at, id: Some(id) }) => {
            let ts = timestamp::format(created_at);
            doc! {
                "$or": [
                    { "createdAt": { "$lt": ts.clone() } },
                    { "createdAt": ts, "_id": { "$lt": *id } },
                ]
            }
        }
    }
}

fn reference_filter(reference: &CatalogRef) -> Document {
    match reference {
        CatalogRef::Brand(id) => doc! { "brand": id },
        CatalogRef::Model { brand_id, model_id } => doc! { "brand": brand_id, "model": model_id },
        CatalogRef::Service(id) => doc! { "items.serviceId": id },
        // matches both the list shape and a legacy single id
        CatalogRef::Warranty(id) => doc! { "warranty": id },
    }
}

#[async_trait]
impl QuoteRepository for MongoQuoteRepository {
    #[tracing::instrument(skip(self, quote), fields(running_number = %quote.running_number))]
    async fn create(&self, mut quote: Quote) -> RepositoryResult<Quote> {
        quote.id = Some(ObjectId::new());
        match self.collection.insert_one(&quote, None).await {
            Ok(_) => {
                info!("Quote created successfully");
                Ok(quote)
            }
            Err(e) => {
                error!("Failed to create quote: {}", e);
                Err(RepositoryError::database(format!("Failed to create quote: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Quote> {
        match self.collection.find_one(doc! { "_id": id }, None).await {
            Ok(Some(quote)) => Ok(quote),
            Ok(None) => {
                info!("Quote not found for ID: {}", id);
                Err(RepositoryError::not_found(format!("Quote not found for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to fetch quote by ID: {}", e);
                Err(RepositoryError::database(format!("Failed to fetch quote by ID: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self, quote), fields(id = %id))]
    async fn update(&self, id: ObjectId, mut quote: Quote) -> RepositoryResult<Quote> {
        let mut fields = bson::to_document(&quote)
            .map_err(|e| RepositoryError::serialization(format!("Failed to serialize quote: {}", e)))?;
        fields.remove("_id");
        match self.collection.update_one(doc! { "_id": id }, doc! { "$set": fields }, None).await {
            Ok(result) if result.matched_count > 0 => {
                info!("Quote updated successfully for ID: {}", id);
                quote.id = Some(id);
                Ok(quote)
            }
            Ok(_) => {
                error!("No quote found to update for ID: {}", id);
                Err(RepositoryError::not_found(format!("No quote found to update for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to update quote: {}", e);
                Err(RepositoryError::database(format!("Failed to update quote: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list_all(&self) -> RepositoryResult<Vec<Quote>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        let cursor = self.collection.find(None, options).await.map_err(|e| {
            error!("Failed to list quotes: {}", e);
            RepositoryError::database(format!("Failed to list quotes: {}", e))
        })?;
        let quotes = drain(cursor).await?;
        info!("Fetched {} quotes", quotes.len());
        Ok(quotes)
    }

    #[tracing::instrument(skip(self), fields(before = ?before, limit))]
    async fn list_recent(&self, before: Option<HistoryCursor>, limit: u32) -> RepositoryResult<Vec<Quote>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .limit(i64::from(limit))
            .build();
        let cursor = self.collection.find(history_filter(before.as_ref()), options).await?;
        drain(cursor).await
    }

    #[tracing::instrument(skip(self))]
    async fn running_numbers_with_prefix(&self, prefix: &str) -> RepositoryResult<Vec<String>> {
        let raw = self.collection.clone_with_type::<Document>();
        let filter = doc! { "runningNumber": { "$regex": format!("^{}", prefix) } };
        let options = FindOptions::builder().projection(doc! { "runningNumber": 1 }).build();
        let mut cursor = raw.find(filter, options).await?;
        let mut numbers = Vec::new();
        while let Some(next) = cursor.next().await {
            let document = next?;
            if let Ok(number) = document.get_str("runningNumber") {
                numbers.push(number.to_string());
            }
        }
        info!("Found {} numbers issued under prefix {}", numbers.len(), prefix);
        Ok(numbers)
    }

    #[tracing::instrument(skip(self), fields(reference = %reference))]
    async fn count_references(&self, reference: &CatalogRef) -> RepositoryResult<u64> {
        let count = self.collection.count_documents(reference_filter(reference), None).await?;
        Ok(count)
    }
}
