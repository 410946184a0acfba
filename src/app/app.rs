use crate::config::{AppConfig, DocumentConfig, MongoConfig};
use crate::model::catalog::{Brand, Service, WarrantyCondition};
use crate::repository::catalog_repo::{MongoCatalogRepository, MongoVehicleModelRepository};
use crate::repository::counter_repo::MongoCounterRepository;
use crate::repository::mongo;
use crate::repository::quote_repo::{MongoQuoteRepository, QuoteRepository};
use crate::router::api_router;
use crate::service::catalog_service::CatalogServiceImpl;
use crate::service::quote_service::QuoteServiceImpl;
use crate::service::resolver::ReferenceResolver;
use crate::service::running_number::RunningNumberGenerator;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub struct App {
    config: AppConfig,
    router: Router,
    pub quote_service: Arc<QuoteServiceImpl>,
    pub catalog_service: Arc<CatalogServiceImpl>,
}

impl App {
    pub async fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let mongo_config = MongoConfig::from_env()?;
        let document_config = DocumentConfig::from_env()?;
        let db = mongo::connect(&mongo_config).await?;

        let quote_repo: Arc<dyn QuoteRepository> = Arc::new(MongoQuoteRepository::new(&db));
        let brand_repo = Arc::new(MongoCatalogRepository::<Brand>::new(&db));
        let model_repo = Arc::new(MongoVehicleModelRepository::new(&db));
        let service_repo = Arc::new(MongoCatalogRepository::<Service>::new(&db));
        let warranty_repo = Arc::new(MongoCatalogRepository::<WarrantyCondition>::new(&db));
        let counter_repo = Arc::new(MongoCounterRepository::new(&db));

        let numbers = Arc::new(RunningNumberGenerator::new(quote_repo.clone(), counter_repo, &document_config));
        let resolver = Arc::new(ReferenceResolver::new(
            brand_repo.clone(),
            model_repo.clone(),
            service_repo.clone(),
            warranty_repo.clone(),
        ));
        let quote_service = Arc::new(QuoteServiceImpl::new(quote_repo.clone(), numbers, resolver, document_config));
        let catalog_service = Arc::new(CatalogServiceImpl::new(
            brand_repo,
            model_repo,
            service_repo,
            warranty_repo,
            quote_repo,
        ));

        let router = api_router(quote_service.clone(), catalog_service.clone());
        Ok(App { config, router, quote_service, catalog_service })
    }

    pub async fn start(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = SocketAddr::new(self.config.host.parse()?, self.config.port);
        info!("🚀 Server running at http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
