use crate::model::counter::RunningCounter;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions};
use mongodb::{Collection, Database};
use tracing::{debug, info};

/// Monotonic per-key sequences backed by single-document atomic updates.
#[async_trait]
pub trait CounterRepository: Send + Sync {
    /// Current value, or `None` when the key has never been used.
    async fn current(&self, key: &str) -> RepositoryResult<Option<u32>>;
    /// Raise the counter to at least `floor`, creating it if needed. Never lowers it.
    async fn raise_to(&self, key: &str, floor: u32) -> RepositoryResult<()>;
    /// Atomically add one and return the new value.
    async fn increment(&self, key: &str) -> RepositoryResult<u32>;
}

pub struct MongoCounterRepository {
    collection: Collection<RunningCounter>,
}

impl MongoCounterRepository {
    pub fn new(db: &Database) -> Self {
        MongoCounterRepository { collection: db.collection::<RunningCounter>("counters") }
    }
}

fn to_sequence(counter: &RunningCounter) -> RepositoryResult<u32> {
    u32::try_from(counter.seq)
        .map_err(|_| RepositoryError::validation(format!("Counter {} out of range: {}", counter.key, counter.seq)))
}

#[async_trait]
impl CounterRepository for MongoCounterRepository {
    #[tracing::instrument(skip(self))]
    async fn current(&self, key: &str) -> RepositoryResult<Option<u32>> {
        match self.collection.find_one(doc! { "_id": key }, None).await? {
            Some(counter) => Ok(Some(to_sequence(&counter)?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn raise_to(&self, key: &str, floor: u32) -> RepositoryResult<()> {
        let options = UpdateOptions::builder().upsert(true).build();
        self.collection
            .update_one(doc! { "_id": key }, doc! { "$max": { "seq": i64::from(floor) } }, options)
            .await?;
        info!("Counter {} seeded to at least {}", key, floor);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn increment(&self, key: &str) -> RepositoryResult<u32> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = self
            .collection
            .find_one_and_update(doc! { "_id": key }, doc! { "$inc": { "seq": 1_i64 } }, options)
            .await?
            .ok_or_else(|| RepositoryError::database(format!("Counter {} was not returned after increment", key)))?;
        let seq = to_sequence(&counter)?;
        debug!("Counter {} now at {}", key, seq);
        Ok(seq)
    }
}
