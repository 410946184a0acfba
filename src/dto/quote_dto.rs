use crate::model::quote::{warranty_ids, DocumentType, LineItem, Quote};
use crate::util::thai_text::baht_text;
use bson::Document;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[validate(length(min = 1, message = "serviceId is required"))]
    pub service_id: String,

    #[validate(range(min = 0.0))]
    pub unit_price: f64,
}

/// Body of `POST /quotes` and `PUT /quotes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[validate(custom(function = "known_document_type"))]
    #[serde(rename = "type", default)]
    pub doc_type: DocumentType,

    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,

    #[validate(length(max = 30))]
    #[serde(default)]
    pub phone: String,

    pub address: Option<String>,
    pub tax_number: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,

    #[validate(length(max = 20))]
    pub license: Option<String>,

    pub province: Option<String>,
    pub vin: Option<String>,
    pub mileage: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<LineItemInput>,

    #[serde(default, deserialize_with = "warranty_ids")]
    pub warranty: Vec<String>,

    #[validate(range(min = 0.0))]
    pub discount: Option<f64>,

    #[validate(range(min = 0.0))]
    pub deposit: Option<f64>,

    pub remark: Option<String>,

    /// Form fields without a dedicated column, stored as sent.
    #[serde(flatten)]
    pub extra: Document,
}

/// Keys that would clash with the record id if stored as extra fields.
const RESERVED_KEYS: [&str; 2] = ["_id", "id"];

fn known_document_type(doc_type: &DocumentType) -> Result<(), ValidationError> {
    if doc_type.is_known() {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_document_type"))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl QuoteRequest {
    /// Builds the stored shape. Number and timestamps are assigned by the service.
    pub fn into_quote(self) -> Quote {
        let items: Vec<LineItem> = self
            .items
            .into_iter()
            .map(|item| LineItem { service_id: item.service_id, unit_price: item.unit_price })
            .collect();
        let total_price = items.iter().map(|item| item.unit_price).sum::<f64>().max(0.0);
        let mut quote = Quote {
            id: None,
            doc_type: self.doc_type,
            customer_name: self.customer_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: non_blank(self.address),
            tax_number: non_blank(self.tax_number),
            brand: non_blank(self.brand),
            model: non_blank(self.model),
            year: non_blank(self.year),
            license: non_blank(self.license),
            province: non_blank(self.province),
            vin: non_blank(self.vin),
            mileage: non_blank(self.mileage),
            items,
            warranty: self.warranty,
            discount: self.discount,
            deposit: self.deposit,
            remark: non_blank(self.remark),
            total_price,
            id_number: String::new(),
            running_number: String::new(),
            created_at: None,
            updated_at: None,
            extra: self.extra,
        };
        for key in RESERVED_KEYS {
            quote.extra.remove(key);
        }
        quote
    }
}

/// A stored quote with its id as a plain hex string.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponseDto {
    pub id: String,
    #[serde(flatten)]
    pub quote: Quote,
}

impl From<Quote> for QuoteResponseDto {
    fn from(mut quote: Quote) -> Self {
        let id = quote.id.take().map(|id| id.to_hex()).unwrap_or_default();
        QuoteResponseDto { id, quote }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedQuoteDto {
    pub id: String,
    pub running_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextNumberDto {
    pub running_number: String,
}

/// Money block printed under the line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTotals {
    pub subtotal: f64,
    pub discount: f64,
    pub deposit: f64,
    pub grand_total: f64,
    pub amount_in_words: String,
}

impl DocumentTotals {
    pub fn of(quote: &Quote) -> Self {
        // legacy records without line items only stored the total
        let subtotal = if quote.items.is_empty() { quote.total_price } else { quote.items_total() };
        let discount = quote.discount.unwrap_or(0.0);
        let deposit = quote.deposit.unwrap_or(0.0);
        let grand_total = subtotal - discount - deposit;
        DocumentTotals {
            subtotal,
            discount,
            deposit,
            grand_total,
            amount_in_words: baht_text(grand_total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLine {
    pub service_id: String,
    pub name: String,
    pub description: String,
    pub unit_price: f64,
    pub resolved: bool,
}

/// A quote with every foreign id joined to a display name, ready for a
/// page or PDF template.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedQuote {
    pub id: String,
    #[serde(flatten)]
    pub quote: Quote,
    pub document_title: &'static str,
    pub brand_name: String,
    pub model_name: String,
    pub services: Vec<ResolvedLine>,
    /// Names of the services that resolved, in item order
    pub service_names: Vec<String>,
    pub warranty_names: Vec<String>,
    pub warranty_name: String,
    pub totals: DocumentTotals,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// `createdAt` of the last row already shown
    pub before: Option<String>,
    /// Hex id of that row
    pub before_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPageDto {
    pub rows: Vec<ResolvedQuote>,
    pub next_before: Option<String>,
    pub next_before_id: Option<String>,
    pub has_more: bool,
}
