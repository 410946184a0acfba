use crate::dto::quote_dto::{DocumentTotals, ResolvedLine, ResolvedQuote};
use crate::model::catalog::{Brand, CatalogEntry, Service, VehicleModel, WarrantyCondition};
use crate::model::quote::Quote;
use crate::repository::catalog_repo::{CatalogRepository, VehicleModelRepository};
use bson::oid::ObjectId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shown in place of a brand, model or warranty that did not resolve.
pub const UNRESOLVED: &str = "-";
/// Name given to a line item whose service no longer exists.
pub const SERVICE_NOT_FOUND: &str = "service not found";

/// Joins the catalog names onto stored quotes.
///
/// Every referenced collection is read once per call with a single `$in`
/// lookup, and the four lookups run concurrently. A failed or missing
/// reference only blanks its own field.
pub struct ReferenceResolver {
    brands: Arc<dyn CatalogRepository<Brand>>,
    models: Arc<dyn VehicleModelRepository>,
    services: Arc<dyn CatalogRepository<Service>>,
    warranties: Arc<dyn CatalogRepository<WarrantyCondition>>,
}

struct Lookups {
    brands: HashMap<String, Brand>,
    models: HashMap<String, VehicleModel>,
    services: HashMap<String, Service>,
    warranties: HashMap<String, WarrantyCondition>,
}

fn object_ids<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<ObjectId> {
    let mut seen = HashSet::new();
    raw.filter_map(|id| match ObjectId::parse_str(id.trim()) {
        Ok(oid) => Some(oid),
        Err(_) => {
            debug!("Skipping malformed reference: {}", id);
            None
        }
    })
    .filter(|oid| seen.insert(*oid))
    .collect()
}

fn by_hex<T: CatalogEntry>(entries: Vec<T>) -> HashMap<String, T> {
    entries
        .into_iter()
        .filter_map(|entry| entry.id().map(|id| (id.to_hex(), entry)))
        .collect()
}

async fn lookup<T: CatalogEntry>(repo: &dyn CatalogRepository<T>, ids: &[ObjectId]) -> HashMap<String, T> {
    match repo.get_many(ids).await {
        Ok(entries) => by_hex(entries),
        Err(e) => {
            warn!("Could not resolve {} references: {}", T::KIND, e);
            HashMap::new()
        }
    }
}

impl ReferenceResolver {
    pub fn new(
        brands: Arc<dyn CatalogRepository<Brand>>,
        models: Arc<dyn VehicleModelRepository>,
        services: Arc<dyn CatalogRepository<Service>>,
        warranties: Arc<dyn CatalogRepository<WarrantyCondition>>,
    ) -> Self {
        ReferenceResolver { brands, models, services, warranties }
    }

    async fn lookups(&self, quotes: &[Quote]) -> Lookups {
        let brand_ids = object_ids(quotes.iter().filter_map(Quote::brand_id));
        // a model id alone cannot name anything
        let model_ids = object_ids(quotes.iter().filter(|q| q.brand_id().is_some()).filter_map(Quote::model_id));
        let service_ids = object_ids(quotes.iter().flat_map(|q| q.items.iter().map(|item| item.service_id.as_str())));
        let warranty_ids = object_ids(quotes.iter().flat_map(|q| q.warranty.iter().map(String::as_str)));

        let models = async {
            match self.models.get_many(&model_ids).await {
                Ok(models) => models
                    .into_iter()
                    .filter_map(|m| m.id.map(|id| (id.to_hex(), m)))
                    .collect::<HashMap<String, VehicleModel>>(),
                Err(e) => {
                    warn!("Could not resolve model references: {}", e);
                    HashMap::new()
                }
            }
        };

        let (brands, models, services, warranties) = tokio::join!(
            lookup(self.brands.as_ref(), &brand_ids),
            models,
            lookup(self.services.as_ref(), &service_ids),
            lookup(self.warranties.as_ref(), &warranty_ids),
        );
        Lookups { brands, models, services, warranties }
    }

    #[tracing::instrument(skip(self, quotes), fields(count = quotes.len()))]
    pub async fn resolve_many(&self, quotes: Vec<Quote>) -> Vec<ResolvedQuote> {
        if quotes.is_empty() {
            return Vec::new();
        }
        let lookups = self.lookups(&quotes).await;
        let resolved: Vec<ResolvedQuote> = quotes.into_iter().map(|quote| lookups.compose(quote)).collect();
        info!("Resolved {} quotes", resolved.len());
        resolved
    }

    pub async fn resolve_one(&self, quote: Quote) -> ResolvedQuote {
        let lookups = self.lookups(std::slice::from_ref(&quote)).await;
        lookups.compose(quote)
    }
}

impl Lookups {
    fn compose(&self, mut quote: Quote) -> ResolvedQuote {
        let brand_id = quote.brand_id().map(str::trim);
        let brand_name = brand_id
            .and_then(|id| self.brands.get(id))
            .map(|brand| brand.name.clone())
            .unwrap_or_else(|| UNRESOLVED.to_string());

        let model_name = match (brand_id, quote.model_id().map(str::trim)) {
            (Some(brand_id), Some(model_id)) => self
                .models
                .get(model_id)
                .filter(|model| model.brand_id == brand_id)
                .map(|model| model.name.clone()),
            _ => None,
        }
        .unwrap_or_else(|| UNRESOLVED.to_string());

        let services: Vec<ResolvedLine> = quote
            .items
            .iter()
            .map(|item| match self.services.get(item.service_id.trim()) {
                Some(service) => ResolvedLine {
                    service_id: item.service_id.clone(),
                    name: service.name.clone(),
                    description: service.description.clone().unwrap_or_default(),
                    unit_price: item.unit_price,
                    resolved: true,
                },
                None => ResolvedLine {
                    service_id: item.service_id.clone(),
                    name: SERVICE_NOT_FOUND.to_string(),
                    description: String::new(),
                    unit_price: item.unit_price,
                    resolved: false,
                },
            })
            .collect();
        let service_names = services
            .iter()
            .filter(|line| line.resolved)
            .map(|line| line.name.clone())
            .collect();

        let warranty_names: Vec<String> = quote
            .warranty
            .iter()
            .filter_map(|id| self.warranties.get(id.trim()))
            .map(|warranty| warranty.name.clone())
            .collect();
        let warranty_name = if warranty_names.is_empty() {
            UNRESOLVED.to_string()
        } else {
            warranty_names.join(", ")
        };

        let totals = DocumentTotals::of(&quote);
        let id = quote.id.take().map(|id| id.to_hex()).unwrap_or_default();
        ResolvedQuote {
            id,
            document_title: quote.doc_type.title(),
            quote,
            brand_name,
            model_name,
            services,
            service_names,
            warranty_names,
            warranty_name,
            totals,
        }
    }
}
