use bson::{oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which printed document a quote record is rendered as. Records written
/// by other tools may carry any type string; those are kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DocumentType {
    #[default]
    Quote,
    Receipt,
    Invoice,
    VehicleReceive,
    Other(String),
}

impl DocumentType {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentType::Quote => "quote",
            DocumentType::Receipt => "receipt",
            DocumentType::Invoice => "invoice",
            DocumentType::VehicleReceive => "vehicle-receive",
            DocumentType::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DocumentType::Other(_))
    }

    /// Title printed on the document header. Unknown types print as a quotation.
    pub fn title(&self) -> &'static str {
        match self {
            DocumentType::Quote | DocumentType::Other(_) => "ใบเสนอราคา",
            DocumentType::Receipt => "ใบเสร็จรับเงิน",
            DocumentType::Invoice => "ใบแจ้งหนี้",
            DocumentType::VehicleReceive => "ใบรับรถ",
        }
    }

    fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "" | "quote" => DocumentType::Quote,
            "receipt" => DocumentType::Receipt,
            "invoice" => DocumentType::Invoice,
            "vehicle-receive" => DocumentType::VehicleReceive,
            other => DocumentType::Other(other.to_string()),
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("document type must not be empty".to_string());
        }
        Ok(DocumentType::from_raw(s))
    }
}

impl Serialize for DocumentType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DocumentType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(DocumentType::from_raw).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub service_id: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub unit_price: f64,
}

/// The central record behind every printed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "type", default)]
    pub doc_type: DocumentType,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "tax_number")]
    pub tax_number: Option<String>,
    /// Brand id
    #[serde(default)]
    pub brand: Option<String>,
    /// Model id, scoped to `brand`
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub mileage: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Warranty condition ids; legacy documents hold a single id string.
    #[serde(default, deserialize_with = "warranty_ids")]
    pub warranty: Vec<String>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub discount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub deposit: Option<f64>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub total_price: f64,
    #[serde(default, alias = "id_number", deserialize_with = "lenient::string_or_empty")]
    pub id_number: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub running_number: String,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Stored fields this model does not name. Carried through updates and copies.
    #[serde(flatten)]
    pub extra: Document,
}

impl Quote {
    /// Non-empty brand id
    pub fn brand_id(&self) -> Option<&str> {
        self.brand.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Non-empty model id; only meaningful when a brand id is present
    pub fn model_id(&self) -> Option<&str> {
        self.model.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|item| item.unit_price).sum()
    }

    pub fn has_warranty(&self, warranty_id: &str) -> bool {
        self.warranty.iter().any(|id| id == warranty_id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WarrantyShape {
    One(String),
    Many(Vec<String>),
}

/// Normalizes the legacy single-id shape into a list at the read boundary.
pub(crate) fn warranty_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let ids = match Option::<WarrantyShape>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(WarrantyShape::One(id)) => vec![id],
        Some(WarrantyShape::Many(ids)) => ids,
    };
    Ok(ids.into_iter().filter(|id| !id.trim().is_empty()).collect())
}

/// Number fields written by the old form were raw input strings.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    pub fn option_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
            None => None,
            Some(NumberOrText::Number(n)) => Some(n),
            Some(NumberOrText::Text(text)) => {
                let text = text.trim().replace(',', "");
                if text.is_empty() {
                    None
                } else {
                    text.parse::<f64>().ok()
                }
            }
        })
    }

    pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        option_f64(deserializer).map(|value| value.unwrap_or(0.0))
    }

    pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
    }
}

/// Fixed-width RFC 3339 (millisecond precision, `Z`) so stored timestamps
/// order the same as strings and as instants.
pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&format(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => match DateTime::parse_from_rfc3339(raw.trim()) {
                Ok(ts) => Ok(Some(ts.with_timezone(&Utc))),
                Err(e) => {
                    warn!("Ignoring unreadable timestamp {:?}: {}", raw, e);
                    Ok(None)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_single_warranty_reads_as_list() {
        let single: Quote = serde_json::from_value(json!({ "warranty": "w1" })).unwrap();
        let many: Quote = serde_json::from_value(json!({ "warranty": ["w1"] })).unwrap();
        assert_eq!(single.warranty, vec!["w1".to_string()]);
        assert_eq!(single.warranty, many.warranty);
    }

    #[test]
    fn missing_or_blank_warranty_is_empty() {
        let missing: Quote = serde_json::from_value(json!({})).unwrap();
        let blank: Quote = serde_json::from_value(json!({ "warranty": "" })).unwrap();
        let null: Quote = serde_json::from_value(json!({ "warranty": null })).unwrap();
        assert!(missing.warranty.is_empty());
        assert!(blank.warranty.is_empty());
        assert!(null.warranty.is_empty());
    }

    #[test]
    fn string_amounts_from_old_form_are_parsed() {
        let quote: Quote = serde_json::from_value(json!({
            "items": [{ "serviceId": "s1", "unitPrice": "1,500" }, { "serviceId": "s2", "unitPrice": 250 }],
            "discount": "",
            "deposit": "300",
            "totalPrice": "1750"
        }))
        .unwrap();
        assert_eq!(quote.items[0].unit_price, 1500.0);
        assert_eq!(quote.items[1].unit_price, 250.0);
        assert_eq!(quote.discount, None);
        assert_eq!(quote.deposit, Some(300.0));
        assert_eq!(quote.total_price, 1750.0);
        assert_eq!(quote.items_total(), 1750.0);
    }

    #[test]
    fn legacy_field_spellings_are_accepted() {
        let quote: Quote = serde_json::from_value(json!({
            "id_number": "2505001",
            "tax_number": "0405566002141",
            "type": "receipt"
        }))
        .unwrap();
        assert_eq!(quote.id_number, "2505001");
        assert_eq!(quote.tax_number.as_deref(), Some("0405566002141"));
        assert_eq!(quote.doc_type, DocumentType::Receipt);
    }

    #[test]
    fn timestamps_serialize_fixed_width() {
        let ts = DateTime::parse_from_rfc3339("2025-05-01T10:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(timestamp::format(&ts), "2025-05-01T10:00:00.000Z");
    }

    #[test]
    fn blank_brand_is_treated_as_absent() {
        let quote: Quote = serde_json::from_value(json!({ "brand": " ", "model": "m1" })).unwrap();
        assert_eq!(quote.brand_id(), None);
        assert_eq!(quote.model_id(), Some("m1"));
    }

    #[test]
    fn odd_legacy_records_still_read() {
        let legacy: Quote = serde_json::from_value(json!({
            "type": "vehicle_receive",
            "customerName": null,
            "phone": null,
            "items": [{ "serviceId": null, "unitPrice": "100" }],
            "createdAt": "last tuesday"
        }))
        .unwrap();
        assert_eq!(legacy.doc_type, DocumentType::Other("vehicle_receive".to_string()));
        assert_eq!(legacy.doc_type.as_str(), "vehicle_receive");
        assert_eq!(legacy.customer_name, "");
        assert_eq!(legacy.items[0].service_id, "");
        assert_eq!(legacy.created_at, None);

        let untyped: Quote = serde_json::from_value(json!({ "type": null })).unwrap();
        assert_eq!(untyped.doc_type, DocumentType::Quote);
    }

    #[test]
    fn unlisted_fields_survive_a_round_trip() {
        let quote: Quote = serde_json::from_value(json!({
            "customerName": "Somchai",
            "khonkaenWarranty": "Khonkaen Care"
        }))
        .unwrap();
        assert_eq!(quote.extra.get_str("khonkaenWarranty").unwrap(), "Khonkaen Care");
        assert!(!quote.extra.contains_key("customerName"));

        let value = serde_json::to_value(&quote).unwrap();
        assert_eq!(value["khonkaenWarranty"], json!("Khonkaen Care"));
        assert_eq!(value["type"], json!("quote"));
    }
}
