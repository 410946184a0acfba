#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use bson::oid::ObjectId;
use detailing_backend::config::DocumentConfig;
use detailing_backend::model::catalog::{Brand, CatalogEntry, CatalogRef, Service, VehicleModel, WarrantyCondition};
use detailing_backend::model::quote::Quote;
use detailing_backend::repository::catalog_repo::{CatalogRepository, VehicleModelRepository};
use detailing_backend::repository::counter_repo::CounterRepository;
use detailing_backend::repository::quote_repo::{HistoryCursor, QuoteRepository};
use detailing_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use detailing_backend::router::api_router;
use detailing_backend::service::catalog_service::CatalogServiceImpl;
use detailing_backend::service::quote_service::QuoteServiceImpl;
use detailing_backend::service::resolver::ReferenceResolver;
use detailing_backend::service::running_number::RunningNumberGenerator;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct FakeCatalog<T> {
    pub entries: Mutex<Vec<T>>,
    pub get_many_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl<T> Default for FakeCatalog<T> {
    fn default() -> Self {
        FakeCatalog { entries: Mutex::new(Vec::new()), get_many_calls: AtomicUsize::new(0), fail: AtomicBool::new(false) }
    }
}

impl<T: CatalogEntry> FakeCatalog<T> {
    pub fn insert(&self, mut entry: T) -> String {
        let id = ObjectId::new();
        entry.set_id(id);
        self.entries.lock().unwrap().push(entry);
        id.to_hex()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl<T: CatalogEntry> CatalogRepository<T> for FakeCatalog<T> {
    async fn create(&self, mut entry: T) -> RepositoryResult<T> {
        entry.set_id(ObjectId::new());
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<T> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id() == Some(id))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("No {} {}", T::KIND, id)))
    }

    async fn get_many(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<T>> {
        self.get_many_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepositoryError::database("store offline"));
        }
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.id().map(|id| ids.contains(&id)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn list(&self) -> RepositoryResult<Vec<T>> {
        let mut entries = self.entries.lock().unwrap().clone();
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(entries)
    }

    async fn update(&self, id: ObjectId, mut entry: T) -> RepositoryResult<T> {
        let mut entries = self.entries.lock().unwrap();
        let slot = entries
            .iter_mut()
            .find(|e| e.id() == Some(id))
            .ok_or_else(|| RepositoryError::not_found(format!("No {} {}", T::KIND, id)))?;
        entry.set_id(id);
        *slot = entry.clone();
        Ok(entry)
    }

    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.id() != Some(id));
        if entries.len() == before {
            return Err(RepositoryError::not_found(format!("No {} {}", T::KIND, id)));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeModels {
    pub entries: Mutex<Vec<VehicleModel>>,
    pub get_many_calls: AtomicUsize,
}

impl FakeModels {
    pub fn insert(&self, brand_id: &str, name: &str) -> String {
        let id = ObjectId::new();
        self.entries.lock().unwrap().push(VehicleModel {
            id: Some(id),
            brand_id: brand_id.to_string(),
            name: name.to_string(),
        });
        id.to_hex()
    }

    pub fn count_for(&self, brand_id: &str) -> usize {
        self.entries.lock().unwrap().iter().filter(|m| m.brand_id == brand_id).count()
    }
}

#[async_trait]
impl VehicleModelRepository for FakeModels {
    async fn create(&self, mut model: VehicleModel) -> RepositoryResult<VehicleModel> {
        model.id = Some(ObjectId::new());
        self.entries.lock().unwrap().push(model.clone());
        Ok(model)
    }

    async fn get_many(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<VehicleModel>> {
        self.get_many_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.id.map(|id| ids.contains(&id)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn list_by_brand(&self, brand_id: &str) -> RepositoryResult<Vec<VehicleModel>> {
        Ok(self.entries.lock().unwrap().iter().filter(|m| m.brand_id == brand_id).cloned().collect())
    }

    async fn rename(&self, brand_id: &str, id: ObjectId, name: &str) -> RepositoryResult<VehicleModel> {
        let mut entries = self.entries.lock().unwrap();
        let model = entries
            .iter_mut()
            .find(|m| m.id == Some(id) && m.brand_id == brand_id)
            .ok_or_else(|| RepositoryError::not_found("model"))?;
        model.name = name.to_string();
        Ok(model.clone())
    }

    async fn delete(&self, brand_id: &str, id: ObjectId) -> RepositoryResult<()> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|m| !(m.id == Some(id) && m.brand_id == brand_id));
        if entries.len() == before {
            return Err(RepositoryError::not_found("model"));
        }
        Ok(())
    }

    async fn delete_by_brand(&self, brand_id: &str) -> RepositoryResult<u64> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|m| m.brand_id != brand_id);
        Ok((before - entries.len()) as u64)
    }
}

#[derive(Default)]
pub struct FakeQuotes {
    pub quotes: Mutex<Vec<Quote>>,
}

impl FakeQuotes {
    pub fn insert(&self, mut quote: Quote) -> ObjectId {
        let id = ObjectId::new();
        quote.id = Some(id);
        self.quotes.lock().unwrap().push(quote);
        id
    }

    pub fn find(&self, id: ObjectId) -> Option<Quote> {
        self.quotes.lock().unwrap().iter().find(|q| q.id == Some(id)).cloned()
    }

    pub fn len(&self) -> usize {
        self.quotes.lock().unwrap().len()
    }
}

#[async_trait]
impl QuoteRepository for FakeQuotes {
    async fn create(&self, mut quote: Quote) -> RepositoryResult<Quote> {
        quote.id = Some(ObjectId::new());
        self.quotes.lock().unwrap().push(quote.clone());
        Ok(quote)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Quote> {
        self.find(id).ok_or_else(|| RepositoryError::not_found(format!("Quote not found for ID: {}", id)))
    }

    async fn update(&self, id: ObjectId, mut quote: Quote) -> RepositoryResult<Quote> {
        let mut quotes = self.quotes.lock().unwrap();
        let slot = quotes
            .iter_mut()
            .find(|q| q.id == Some(id))
            .ok_or_else(|| RepositoryError::not_found("quote"))?;
        quote.id = Some(id);
        *slot = quote.clone();
        Ok(quote)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Quote>> {
        let mut quotes = self.quotes.lock().unwrap().clone();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quotes)
    }

    async fn list_recent(&self, before: Option<HistoryCursor>, limit: u32) -> RepositoryResult<Vec<Quote>> {
        let mut quotes: Vec<Quote> = self
            .quotes
            .lock()
            .unwrap()
            .iter()
            .filter(|q| match (before, q.created_at) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(cursor), Some(created)) => match cursor.id {
                    Some(id) => (created, q.id) < (cursor.created_at, Some(id)),
                    None => created < cursor.created_at,
                },
            })
            .cloned()
            .collect();
        quotes.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        quotes.truncate(limit as usize);
        Ok(quotes)
    }

    async fn running_numbers_with_prefix(&self, prefix: &str) -> RepositoryResult<Vec<String>> {
        Ok(self
            .quotes
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.running_number.clone())
            .filter(|n| n.starts_with(prefix))
            .collect())
    }

    async fn count_references(&self, reference: &CatalogRef) -> RepositoryResult<u64> {
        let quotes = self.quotes.lock().unwrap();
        let count = quotes
            .iter()
            .filter(|q| match reference {
                CatalogRef::Brand(id) => q.brand.as_deref() == Some(id.as_str()),
                CatalogRef::Model { brand_id, model_id } => {
                    q.brand.as_deref() == Some(brand_id.as_str()) && q.model.as_deref() == Some(model_id.as_str())
                }
                CatalogRef::Service(id) => q.items.iter().any(|item| &item.service_id == id),
                CatalogRef::Warranty(id) => q.has_warranty(id),
            })
            .count();
        Ok(count as u64)
    }
}

/// Counter whose read-modify-write happens under one lock, like the store's
/// single-document update.
#[derive(Default)]
pub struct FakeCounters {
    pub counters: Mutex<HashMap<String, u32>>,
}

#[async_trait]
impl CounterRepository for FakeCounters {
    async fn current(&self, key: &str) -> RepositoryResult<Option<u32>> {
        Ok(self.counters.lock().unwrap().get(key).copied())
    }

    async fn raise_to(&self, key: &str, floor: u32) -> RepositoryResult<()> {
        tokio::task::yield_now().await;
        let mut counters = self.counters.lock().unwrap();
        let seq = counters.entry(key.to_string()).or_insert(0);
        *seq = (*seq).max(floor);
        Ok(())
    }

    async fn increment(&self, key: &str) -> RepositoryResult<u32> {
        tokio::task::yield_now().await;
        let mut counters = self.counters.lock().unwrap();
        let seq = counters.entry(key.to_string()).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }
}

pub struct Harness {
    pub brands: Arc<FakeCatalog<Brand>>,
    pub models: Arc<FakeModels>,
    pub services: Arc<FakeCatalog<Service>>,
    pub warranties: Arc<FakeCatalog<WarrantyCondition>>,
    pub quotes: Arc<FakeQuotes>,
    pub counters: Arc<FakeCounters>,
    pub numbers: Arc<RunningNumberGenerator>,
    pub resolver: Arc<ReferenceResolver>,
    pub quote_service: Arc<QuoteServiceImpl>,
    pub catalog_service: Arc<CatalogServiceImpl>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    pub fn with_config(config: DocumentConfig) -> Self {
        let brands = Arc::new(FakeCatalog::<Brand>::default());
        let models = Arc::new(FakeModels::default());
        let services = Arc::new(FakeCatalog::<Service>::default());
        let warranties = Arc::new(FakeCatalog::<WarrantyCondition>::default());
        let quotes = Arc::new(FakeQuotes::default());
        let counters = Arc::new(FakeCounters::default());

        let numbers = Arc::new(RunningNumberGenerator::new(quotes.clone(), counters.clone(), &config));
        let resolver = Arc::new(ReferenceResolver::new(
            brands.clone(),
            models.clone(),
            services.clone(),
            warranties.clone(),
        ));
        let quote_service = Arc::new(QuoteServiceImpl::new(quotes.clone(), numbers.clone(), resolver.clone(), config));
        let catalog_service = Arc::new(CatalogServiceImpl::new(
            brands.clone(),
            models.clone(),
            services.clone(),
            warranties.clone(),
            quotes.clone(),
        ));

        Harness { brands, models, services, warranties, quotes, counters, numbers, resolver, quote_service, catalog_service }
    }

    pub fn router(&self) -> Router {
        api_router(self.quote_service.clone(), self.catalog_service.clone())
    }

    pub fn brand(&self, name: &str) -> String {
        self.brands.insert(Brand { id: None, name: name.to_string() })
    }

    pub fn service(&self, name: &str, description: &str) -> String {
        self.services.insert(Service {
            id: None,
            name: name.to_string(),
            description: Some(description.to_string()),
        })
    }

    pub fn warranty(&self, name: &str) -> String {
        self.warranties.insert(WarrantyCondition { id: None, name: name.to_string(), description: None })
    }
}

/// A stored quote built from its JSON shape, the way old documents look.
pub fn quote(value: serde_json::Value) -> Quote {
    serde_json::from_value(value).unwrap()
}
