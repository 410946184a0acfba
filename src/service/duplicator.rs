use crate::dto::quote_dto::IssuedQuoteDto;
use crate::model::quote::Quote;
use crate::repository::quote_repo::QuoteRepository;
use crate::service::running_number::RunningNumberGenerator;
use crate::util::error::ServiceError;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};

/// Copy of `source` as a brand-new record carrying `number`.
pub fn copy_of(source: &Quote, number: &str, marker: &str, now: DateTime<Utc>) -> Quote {
    let mut copy = source.clone();
    copy.id = None;
    copy.customer_name = format!("{}{}", marker, source.customer_name);
    copy.id_number = number.to_string();
    copy.running_number = number.to_string();
    copy.created_at = Some(now);
    copy.updated_at = None;
    copy
}

pub struct RecordDuplicator {
    quote_repo: Arc<dyn QuoteRepository>,
    numbers: Arc<RunningNumberGenerator>,
    marker: String,
}

impl RecordDuplicator {
    pub fn new(quote_repo: Arc<dyn QuoteRepository>, numbers: Arc<RunningNumberGenerator>, marker: String) -> Self {
        RecordDuplicator { quote_repo, numbers, marker }
    }

    /// Stores a copy of quote `id` under a fresh number. The source is not touched.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn duplicate(&self, id: ObjectId) -> Result<IssuedQuoteDto, ServiceError> {
        let source = self.quote_repo.get_by_id(id).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::NotFound(format!("No data for quote {}", id))
            } else {
                error!("Failed to load quote to duplicate: {}", e);
                ServiceError::from(e)
            }
        })?;

        let number = self.numbers.next().await?;
        let copy = copy_of(&source, &number, &self.marker, Utc::now());
        let created = self.quote_repo.create(copy).await.map_err(|e| {
            error!("Failed to store duplicate of {}: {}", id, e);
            ServiceError::from(e)
        })?;

        let new_id = created
            .id
            .ok_or_else(|| ServiceError::InternalError("Duplicate was stored without an id".to_string()))?;
        info!("Duplicated quote {} as {} ({})", id, new_id, number);
        Ok(IssuedQuoteDto { id: new_id.to_hex(), running_number: number })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::quote::LineItem;

    #[test]
    fn copy_gets_new_identity_and_keeps_content() {
        let created = DateTime::parse_from_rfc3339("2025-04-01T08:00:00Z").unwrap().with_timezone(&Utc);
        let source = Quote {
            id: Some(ObjectId::new()),
            customer_name: "Somchai".to_string(),
            running_number: "2504010".to_string(),
            id_number: "2504010".to_string(),
            items: vec![LineItem { service_id: "s1".to_string(), unit_price: 900.0 }],
            warranty: vec!["w1".to_string()],
            created_at: Some(created),
            updated_at: Some(created),
            ..serde_json::from_value(serde_json::json!({})).unwrap()
        };
        let now = Utc::now();

        let copy = copy_of(&source, "2505001", "[copy] ", now);

        assert_eq!(copy.id, None);
        assert_eq!(copy.customer_name, "[copy] Somchai");
        assert_eq!(copy.running_number, "2505001");
        assert_eq!(copy.id_number, "2505001");
        assert_eq!(copy.created_at, Some(now));
        assert_eq!(copy.updated_at, None);
        assert_eq!(copy.items, source.items);
        assert_eq!(copy.warranty, source.warranty);
        assert_eq!(source.customer_name, "Somchai");
    }

    #[test]
    fn copy_keeps_fields_outside_the_model() {
        let source: Quote = serde_json::from_value(serde_json::json!({
            "customerName": "Somchai",
            "khonkaenWarranty": "Khonkaen Care"
        }))
        .unwrap();

        let copy = copy_of(&source, "2505002", "[copy] ", Utc::now());

        assert_eq!(copy.extra.get_str("khonkaenWarranty").unwrap(), "Khonkaen Care");
        let stored = bson::to_document(&copy).unwrap();
        assert_eq!(stored.get_str("khonkaenWarranty").unwrap(), "Khonkaen Care");
        assert_eq!(stored.get_str("runningNumber").unwrap(), "2505002");
    }
}
