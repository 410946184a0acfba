use bson::oid::ObjectId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A top-level catalog document that is looked up by id and displayed by name.
pub trait CatalogEntry: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;
    /// Human label used in log lines and error messages
    const KIND: &'static str;

    fn id(&self) -> Option<ObjectId>;
    fn set_id(&mut self, id: ObjectId);
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
}

/// A vehicle model. Only meaningful together with its parent brand id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleModel {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub brand_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarrantyCondition {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

macro_rules! catalog_entry {
    ($ty:ty, $collection:expr, $kind:expr) => {
        impl CatalogEntry for $ty {
            const COLLECTION: &'static str = $collection;
            const KIND: &'static str = $kind;

            fn id(&self) -> Option<ObjectId> {
                self.id
            }

            fn set_id(&mut self, id: ObjectId) {
                self.id = Some(id);
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

catalog_entry!(Brand, "brands", "brand");
catalog_entry!(Service, "services", "service");
catalog_entry!(WarrantyCondition, "warrantyConditions", "warranty condition");

/// A catalog entry a quote may point at; used to block deletes of referenced entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogRef {
    Brand(String),
    Model { brand_id: String, model_id: String },
    Service(String),
    Warranty(String),
}

impl std::fmt::Display for CatalogRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogRef::Brand(id) => write!(f, "brand {}", id),
            CatalogRef::Model { brand_id, model_id } => write!(f, "model {}/{}", brand_id, model_id),
            CatalogRef::Service(id) => write!(f, "service {}", id),
            CatalogRef::Warranty(id) => write!(f, "warranty condition {}", id),
        }
    }
}
