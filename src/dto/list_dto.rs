use crate::dto::quote_dto::ResolvedQuote;
use serde::{Deserialize, Serialize};

/// Query string of `GET /quotes/view`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQueryParams {
    pub search: Option<String>,
    /// `all`, a document type, or omitted
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    /// Warranty condition id; takes precedence over `type`
    pub warranty: Option<String>,
    pub sort: Option<String>,
    /// `asc` or `desc`
    pub dir: Option<String>,
    /// Number of pages revealed so far, at least one
    pub pages: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPageDto {
    pub rows: Vec<ResolvedQuote>,
    /// Records matching search and filter
    pub total: usize,
    pub shown: usize,
    pub has_more: bool,
}
