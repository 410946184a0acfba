use serde::{Deserialize, Serialize};

/// Per-month sequence document, keyed like "quotes-2505".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningCounter {
    #[serde(rename = "_id")]
    pub key: String,
    pub seq: i64,
}
