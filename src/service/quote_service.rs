use crate::config::DocumentConfig;
use crate::dto::list_dto::{ListPageDto, ListQueryParams};
use crate::dto::quote_dto::{
    HistoryPageDto, IssuedQuoteDto, NextNumberDto, QuoteRequest, QuoteResponseDto, ResolvedQuote,
};
use crate::model::quote::{timestamp, DocumentType, Quote};
use crate::repository::quote_repo::{HistoryCursor, QuoteRepository};
use crate::repository::repository_error::RepositoryError;
use crate::service::duplicator::RecordDuplicator;
use crate::service::list_query::{ListAction, ListFilter, ListState, SortDirection, SortField, SortSpec};
use crate::service::resolver::ReferenceResolver;
use crate::service::running_number::RunningNumberGenerator;
use crate::util::error::ServiceError;
use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument};

#[async_trait]
pub trait QuoteService: Send + Sync {
    async fn create_quote(&self, request: QuoteRequest) -> Result<IssuedQuoteDto, ServiceError>;
    async fn get_quote(&self, id: ObjectId) -> Result<QuoteResponseDto, ServiceError>;
    async fn get_resolved(&self, id: ObjectId) -> Result<ResolvedQuote, ServiceError>;
    async fn update_quote(&self, id: ObjectId, request: QuoteRequest) -> Result<QuoteResponseDto, ServiceError>;
    async fn duplicate_quote(&self, id: ObjectId) -> Result<IssuedQuoteDto, ServiceError>;
    async fn list_quotes(&self) -> Result<Vec<QuoteResponseDto>, ServiceError>;
    async fn view_quotes(&self, params: ListQueryParams) -> Result<ListPageDto, ServiceError>;
    async fn history(&self, before: Option<HistoryCursor>) -> Result<HistoryPageDto, ServiceError>;
    async fn next_number(&self) -> Result<NextNumberDto, ServiceError>;
}

pub struct QuoteServiceImpl {
    pub quote_repo: Arc<dyn QuoteRepository>,
    pub numbers: Arc<RunningNumberGenerator>,
    pub resolver: Arc<ReferenceResolver>,
    pub duplicator: RecordDuplicator,
    pub config: DocumentConfig,
}

impl QuoteServiceImpl {
    pub fn new(
        quote_repo: Arc<dyn QuoteRepository>,
        numbers: Arc<RunningNumberGenerator>,
        resolver: Arc<ReferenceResolver>,
        config: DocumentConfig,
    ) -> Self {
        let duplicator = RecordDuplicator::new(quote_repo.clone(), numbers.clone(), config.copy_prefix.clone());
        QuoteServiceImpl { quote_repo, numbers, resolver, duplicator, config }
    }

    async fn load(&self, id: ObjectId) -> Result<Quote, ServiceError> {
        self.quote_repo.get_by_id(id).await.map_err(|e| no_data(id, e))
    }
}

/// A missing root record is "no data"; anything else keeps its category.
fn no_data(id: ObjectId, e: RepositoryError) -> ServiceError {
    if e.is_not_found() {
        ServiceError::NotFound(format!("No data for quote {}", id))
    } else {
        error!("Failed to fetch quote {}: {}", id, e);
        ServiceError::from(e)
    }
}

fn list_filter(params: &ListQueryParams) -> Result<ListFilter, ServiceError> {
    if let Some(warranty) = params.warranty.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
        return Ok(ListFilter::Warranty(warranty.to_string()));
    }
    match params.doc_type.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(ListFilter::All),
        Some(raw) => raw.parse::<DocumentType>().map(ListFilter::Type).map_err(ServiceError::InvalidInput),
    }
}

fn sort_spec(params: &ListQueryParams) -> Result<SortSpec, ServiceError> {
    let default = SortSpec::default();
    let field = match params.sort.as_deref() {
        Some(raw) => raw.parse::<SortField>().map_err(ServiceError::InvalidInput)?,
        None => default.field,
    };
    let direction = match params.dir.as_deref() {
        Some(raw) => raw.parse::<SortDirection>().map_err(ServiceError::InvalidInput)?,
        None if field == default.field => default.direction,
        None => SortDirection::Asc,
    };
    Ok(SortSpec { field, direction })
}

#[async_trait]
impl QuoteService for QuoteServiceImpl {
    #[instrument(skip(self, request), fields(customer = %request.customer_name))]
    async fn create_quote(&self, request: QuoteRequest) -> Result<IssuedQuoteDto, ServiceError> {
        info!("Creating quote");
        let number = self.numbers.next().await?;
        let mut quote = request.into_quote();
        quote.id_number = number.clone();
        quote.running_number = number.clone();
        quote.created_at = Some(Utc::now());

        let created = self.quote_repo.create(quote).await.map_err(|e| {
            error!("Failed to create quote: {}", e);
            ServiceError::from(e)
        })?;
        let id = created
            .id
            .ok_or_else(|| ServiceError::InternalError("Failed to get inserted quote id".to_string()))?;
        info!("Quote {} created with number {}", id, number);
        Ok(IssuedQuoteDto { id: id.to_hex(), running_number: number })
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_quote(&self, id: ObjectId) -> Result<QuoteResponseDto, ServiceError> {
        let quote = self.load(id).await?;
        Ok(QuoteResponseDto::from(quote))
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_resolved(&self, id: ObjectId) -> Result<ResolvedQuote, ServiceError> {
        let quote = self.load(id).await?;
        Ok(self.resolver.resolve_one(quote).await)
    }

    #[instrument(skip(self, request), fields(id = %id))]
    async fn update_quote(&self, id: ObjectId, request: QuoteRequest) -> Result<QuoteResponseDto, ServiceError> {
        let existing = self.load(id).await?;
        let mut quote = request.into_quote();
        let mut extra = existing.extra;
        for (key, value) in std::mem::take(&mut quote.extra) {
            extra.insert(key, value);
        }
        quote.extra = extra;
        quote.id_number = existing.id_number;
        quote.running_number = existing.running_number;
        quote.created_at = existing.created_at;
        quote.updated_at = Some(Utc::now());

        let updated = self.quote_repo.update(id, quote).await.map_err(|e| {
            error!("Failed to update quote: {}", e);
            ServiceError::from(e)
        })?;
        info!("Quote updated");
        Ok(QuoteResponseDto::from(updated))
    }

    async fn duplicate_quote(&self, id: ObjectId) -> Result<IssuedQuoteDto, ServiceError> {
        self.duplicator.duplicate(id).await
    }

    #[instrument(skip(self))]
    async fn list_quotes(&self) -> Result<Vec<QuoteResponseDto>, ServiceError> {
        let quotes = self.quote_repo.list_all().await.map_err(|e| {
            error!("Failed to list quotes: {}", e);
            ServiceError::from(e)
        })?;
        Ok(quotes.into_iter().map(QuoteResponseDto::from).collect())
    }

    #[instrument(skip(self))]
    async fn view_quotes(&self, params: ListQueryParams) -> Result<ListPageDto, ServiceError> {
        let filter = list_filter(&params)?;
        let sort = sort_spec(&params)?;
        let quotes = self.quote_repo.list_all().await?;
        let records = self.resolver.resolve_many(quotes).await;

        let mut state = ListState::new(self.config.list_page_size, self.config.scroll_threshold);
        state.dispatch(ListAction::SetRecords(records));
        state.dispatch(ListAction::Search(params.search.unwrap_or_default()));
        state.dispatch(ListAction::Filter(filter));
        state.dispatch(ListAction::SetSort(sort));
        for _ in 1..params.pages.unwrap_or(1).max(1) {
            if !state.has_more() {
                break;
            }
            state.load_more();
        }

        let rows: Vec<ResolvedQuote> = state.visible().into_iter().cloned().collect();
        Ok(ListPageDto { total: state.total(), shown: rows.len(), has_more: state.has_more(), rows })
    }

    #[instrument(skip(self))]
    async fn history(&self, before: Option<HistoryCursor>) -> Result<HistoryPageDto, ServiceError> {
        let page_size = self.config.history_page_size;
        // one extra row tells whether another page exists
        let limit = u32::try_from(page_size + 1).unwrap_or(u32::MAX);
        let mut quotes = self.quote_repo.list_recent(before, limit).await?;
        let has_more = quotes.len() > page_size;
        quotes.truncate(page_size);

        let last = quotes.last().filter(|_| has_more);
        let next_before = last.and_then(|q| q.created_at).map(|ts| timestamp::format(&ts));
        let next_before_id = last.and_then(|q| q.id).map(|id| id.to_hex());
        let rows = self.resolver.resolve_many(quotes).await;
        Ok(HistoryPageDto { rows, next_before, next_before_id, has_more })
    }

    async fn next_number(&self) -> Result<NextNumberDto, ServiceError> {
        let running_number = self.numbers.peek().await?;
        Ok(NextNumberDto { running_number })
    }
}
