//! Search, filter, sort and incremental display over resolved quotes.
//!
//! All state lives in [`ListState`] and only changes through
//! [`ListState::dispatch`].

use crate::dto::quote_dto::ResolvedQuote;
use crate::model::quote::DocumentType;
use icu::collator::{Collator, CollatorOptions};
use icu::locid::locale;
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    RunningNumber,
    CustomerName,
    BrandName,
    ModelName,
    ServiceNames,
    License,
    DocType,
    GrandTotal,
}

impl SortField {
    fn is_text(&self) -> bool {
        matches!(
            self,
            SortField::CustomerName
                | SortField::BrandName
                | SortField::ModelName
                | SortField::ServiceNames
                | SortField::License
        )
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(SortField::CreatedAt),
            "runningNumber" | "idNumber" => Ok(SortField::RunningNumber),
            "customerName" => Ok(SortField::CustomerName),
            "brandName" => Ok(SortField::BrandName),
            "modelName" => Ok(SortField::ModelName),
            "serviceNames" => Ok(SortField::ServiceNames),
            "license" => Ok(SortField::License),
            "type" => Ok(SortField::DocType),
            "grandTotal" | "totalPrice" => Ok(SortField::GrandTotal),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec { field: SortField::CreatedAt, direction: SortDirection::Desc }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
    Type(DocumentType),
    /// Quotes that carry this warranty condition id
    Warranty(String),
}

impl ListFilter {
    pub fn matches(&self, row: &ResolvedQuote) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Type(doc_type) => row.quote.doc_type == *doc_type,
            ListFilter::Warranty(id) => row.quote.has_warranty(id),
        }
    }
}

/// Case-insensitive substring match on the visible text columns.
/// `term` must already be lowercased.
fn matches_search(row: &ResolvedQuote, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let hit = |text: &str| text.to_lowercase().contains(term);
    hit(&row.quote.customer_name)
        || hit(&row.brand_name)
        || hit(&row.model_name)
        || row.service_names.iter().any(|name| hit(name))
        || row.quote.license.as_deref().map(hit).unwrap_or(false)
}

fn text_key(row: &ResolvedQuote, field: SortField) -> String {
    match field {
        SortField::CustomerName => row.quote.customer_name.clone(),
        SortField::BrandName => row.brand_name.clone(),
        SortField::ModelName => row.model_name.clone(),
        SortField::ServiceNames => row.service_names.join(", "),
        SortField::License => row.quote.license.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Longer numbers are later; equal lengths compare digit by digit.
fn compare_numbers(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_natural(a: &ResolvedQuote, b: &ResolvedQuote, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.quote.created_at.cmp(&b.quote.created_at),
        SortField::RunningNumber => compare_numbers(&a.quote.running_number, &b.quote.running_number),
        SortField::DocType => a.quote.doc_type.as_str().cmp(b.quote.doc_type.as_str()),
        SortField::GrandTotal => a.totals.grand_total.total_cmp(&b.totals.grand_total),
        _ => Ordering::Equal,
    }
}

fn thai_collator() -> Option<Collator> {
    match Collator::try_new(&locale!("th").into(), CollatorOptions::new()) {
        Ok(collator) => Some(collator),
        Err(e) => {
            debug!("Thai collation unavailable, falling back to code point order: {}", e);
            None
        }
    }
}

/// Stable sort of `rows` by `spec`.
pub fn sort_rows(rows: &mut [&ResolvedQuote], spec: SortSpec) {
    let collator = if spec.field.is_text() { thai_collator() } else { None };
    let compare = |a: &&ResolvedQuote, b: &&ResolvedQuote| -> Ordering {
        let ordering = if spec.field.is_text() {
            let (ka, kb) = (text_key(a, spec.field), text_key(b, spec.field));
            match &collator {
                Some(collator) => collator.compare(&ka, &kb),
                None => ka.cmp(&kb),
            }
        } else {
            compare_natural(a, b, spec.field)
        };
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    };
    rows.sort_by(compare);
}

#[derive(Debug, Clone)]
pub enum ListAction {
    SetRecords(Vec<ResolvedQuote>),
    Search(String),
    Filter(ListFilter),
    /// Header click: same field toggles direction, a new field starts ascending
    SortBy(SortField),
    SetSort(SortSpec),
    LoadMore,
    LoadMoreFinished,
    /// Scroll position as a ratio of the scrollable height
    Scrolled(f64),
}

#[derive(Debug, Clone)]
pub struct ListState {
    records: Vec<ResolvedQuote>,
    search: String,
    filter: ListFilter,
    sort: SortSpec,
    page_size: usize,
    scroll_threshold: f64,
    window: usize,
    loading: bool,
}

impl ListState {
    pub fn new(page_size: usize, scroll_threshold: f64) -> Self {
        let page_size = page_size.max(1);
        ListState {
            records: Vec::new(),
            search: String::new(),
            filter: ListFilter::All,
            sort: SortSpec::default(),
            page_size,
            scroll_threshold,
            window: page_size,
            loading: false,
        }
    }

    fn reset_window(&mut self) {
        self.window = self.page_size;
        self.loading = false;
    }

    pub fn dispatch(&mut self, action: ListAction) {
        match action {
            ListAction::SetRecords(records) => {
                self.records = records;
                self.reset_window();
            }
            ListAction::Search(term) => {
                self.search = term.to_lowercase();
                self.reset_window();
            }
            ListAction::Filter(filter) => {
                self.filter = filter;
                self.reset_window();
            }
            ListAction::SortBy(field) => {
                self.sort = if self.sort.field == field {
                    SortSpec { field, direction: self.sort.direction.toggled() }
                } else {
                    SortSpec { field, direction: SortDirection::Asc }
                };
                self.reset_window();
            }
            ListAction::SetSort(spec) => {
                self.sort = spec;
                self.reset_window();
            }
            ListAction::LoadMore => {
                if self.loading || !self.has_more() {
                    debug!("Ignoring load more (loading: {})", self.loading);
                    return;
                }
                self.loading = true;
            }
            ListAction::LoadMoreFinished => {
                if self.loading {
                    self.window += self.page_size;
                    self.loading = false;
                }
            }
            ListAction::Scrolled(ratio) => {
                if ratio >= self.scroll_threshold {
                    self.dispatch(ListAction::LoadMore);
                }
            }
        }
    }

    /// Starts and completes one expansion.
    pub fn load_more(&mut self) {
        self.dispatch(ListAction::LoadMore);
        self.dispatch(ListAction::LoadMoreFinished);
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Every record passing search and filter, in sort order.
    pub fn matching(&self) -> Vec<&ResolvedQuote> {
        let mut rows: Vec<&ResolvedQuote> = self
            .records
            .iter()
            .filter(|row| matches_search(row, &self.search) && self.filter.matches(row))
            .collect();
        sort_rows(&mut rows, self.sort);
        rows
    }

    pub fn total(&self) -> usize {
        self.records
            .iter()
            .filter(|row| matches_search(row, &self.search) && self.filter.matches(row))
            .count()
    }

    pub fn visible(&self) -> Vec<&ResolvedQuote> {
        let mut rows = self.matching();
        rows.truncate(self.window);
        rows
    }

    pub fn has_more(&self) -> bool {
        self.window < self.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::quote_dto::DocumentTotals;
    use crate::model::quote::Quote;
    use chrono::{Duration, TimeZone, Utc};

    fn row(customer: &str, service: &str, doc_type: DocumentType, minutes: i64) -> ResolvedQuote {
        let mut quote: Quote = serde_json::from_value(serde_json::json!({})).unwrap();
        quote.customer_name = customer.to_string();
        quote.doc_type = doc_type;
        quote.created_at = Some(Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes));
        ResolvedQuote {
            id: format!("id-{}", minutes),
            totals: DocumentTotals::of(&quote),
            document_title: quote.doc_type.title(),
            quote,
            brand_name: "-".to_string(),
            model_name: "-".to_string(),
            services: Vec::new(),
            service_names: vec![service.to_string()],
            warranty_names: Vec::new(),
            warranty_name: "-".to_string(),
        }
    }

    fn apple_banana() -> ListState {
        let mut state = ListState::new(20, 0.8);
        state.dispatch(ListAction::SetRecords(vec![
            row("Apple", "Wash", DocumentType::Quote, 0),
            row("Banana", "Coating", DocumentType::Receipt, 1),
        ]));
        state
    }

    fn names(rows: &[&ResolvedQuote]) -> Vec<String> {
        rows.iter().map(|r| r.quote.customer_name.clone()).collect()
    }

    #[test]
    fn default_order_is_newest_first() {
        let state = apple_banana();
        assert_eq!(names(&state.visible()), vec!["Banana", "Apple"]);
    }

    #[test]
    fn search_is_case_insensitive_and_spans_service_names() {
        let mut state = apple_banana();
        state.dispatch(ListAction::Search("aPp".to_string()));
        assert_eq!(names(&state.visible()), vec!["Apple"]);

        state.dispatch(ListAction::Search("coat".to_string()));
        assert_eq!(names(&state.visible()), vec!["Banana"]);

        state.dispatch(ListAction::Search(String::new()));
        assert_eq!(state.total(), 2);
    }

    #[test]
    fn search_term_is_not_trimmed() {
        let mut state = apple_banana();
        state.dispatch(ListAction::Search(" ".to_string()));
        assert_eq!(state.total(), 0);

        state.dispatch(ListAction::Search("Apple ".to_string()));
        assert_eq!(state.total(), 0);
    }

    #[test]
    fn type_filter_matches_unlisted_types() {
        let mut state = ListState::new(20, 0.8);
        state.dispatch(ListAction::SetRecords(vec![
            row("Legacy", "", DocumentType::Other("vehicle_receive".to_string()), 0),
            row("Plain", "", DocumentType::Quote, 1),
        ]));
        state.dispatch(ListAction::Filter(ListFilter::Type("vehicle_receive".parse().unwrap())));
        assert_eq!(names(&state.visible()), vec!["Legacy"]);
    }

    #[test]
    fn type_filter_combines_with_search() {
        let mut state = apple_banana();
        state.dispatch(ListAction::Filter(ListFilter::Type(DocumentType::Receipt)));
        assert_eq!(names(&state.visible()), vec!["Banana"]);

        state.dispatch(ListAction::Search("apple".to_string()));
        assert!(state.visible().is_empty());
    }

    #[test]
    fn sort_by_toggles_on_the_same_field() {
        let mut state = apple_banana();
        state.dispatch(ListAction::SortBy(SortField::CustomerName));
        assert_eq!(state.sort().direction, SortDirection::Asc);
        assert_eq!(names(&state.visible()), vec!["Apple", "Banana"]);

        state.dispatch(ListAction::SortBy(SortField::CustomerName));
        assert_eq!(state.sort().direction, SortDirection::Desc);
        assert_eq!(names(&state.visible()), vec!["Banana", "Apple"]);

        state.dispatch(ListAction::SortBy(SortField::CreatedAt));
        assert_eq!(state.sort().direction, SortDirection::Asc);
    }

    #[test]
    fn thai_names_sort_by_collation() {
        let mut state = ListState::new(20, 0.8);
        state.dispatch(ListAction::SetRecords(vec![
            row("สมหญิง", "", DocumentType::Quote, 0),
            row("กมล", "", DocumentType::Quote, 1),
            row("ชัยวัฒน์", "", DocumentType::Quote, 2),
        ]));
        state.dispatch(ListAction::SortBy(SortField::CustomerName));
        assert_eq!(names(&state.visible()), vec!["กมล", "ชัยวัฒน์", "สมหญิง"]);
    }

    #[test]
    fn leading_vowels_sort_by_their_consonant() {
        assert!(thai_collator().is_some());
        // code point order would put ขา first
        assert!("ขา" < "เก");

        let mut state = ListState::new(20, 0.8);
        state.dispatch(ListAction::SetRecords(vec![
            row("ขา", "", DocumentType::Quote, 0),
            row("เก", "", DocumentType::Quote, 1),
        ]));
        state.dispatch(ListAction::SortBy(SortField::CustomerName));
        assert_eq!(names(&state.visible()), vec!["เก", "ขา"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut state = ListState::new(20, 0.8);
        state.dispatch(ListAction::SetRecords(vec![
            row("Same", "", DocumentType::Quote, 0),
            row("Same", "", DocumentType::Quote, 1),
            row("Same", "", DocumentType::Quote, 2),
        ]));
        state.dispatch(ListAction::SetSort(SortSpec { field: SortField::CustomerName, direction: SortDirection::Desc }));
        let ids: Vec<&str> = state.visible().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["id-0", "id-1", "id-2"]);
    }

    #[test]
    fn window_grows_a_page_at_a_time() {
        let mut state = ListState::new(20, 0.8);
        state.dispatch(ListAction::SetRecords((0..45).map(|i| row("C", "", DocumentType::Quote, i)).collect()));
        assert_eq!(state.visible().len(), 20);
        assert!(state.has_more());

        state.load_more();
        assert_eq!(state.visible().len(), 40);

        state.load_more();
        assert_eq!(state.visible().len(), 45);
        assert!(!state.has_more());

        state.load_more();
        assert_eq!(state.visible().len(), 45);
    }

    #[test]
    fn only_one_expansion_in_flight() {
        let mut state = ListState::new(20, 0.8);
        state.dispatch(ListAction::SetRecords((0..45).map(|i| row("C", "", DocumentType::Quote, i)).collect()));

        state.dispatch(ListAction::LoadMore);
        state.dispatch(ListAction::LoadMore);
        state.dispatch(ListAction::Scrolled(0.95));
        assert!(state.is_loading());
        state.dispatch(ListAction::LoadMoreFinished);

        assert_eq!(state.visible().len(), 40);
        assert!(!state.is_loading());
    }

    #[test]
    fn scroll_below_threshold_does_nothing() {
        let mut state = ListState::new(20, 0.8);
        state.dispatch(ListAction::SetRecords((0..45).map(|i| row("C", "", DocumentType::Quote, i)).collect()));
        state.dispatch(ListAction::Scrolled(0.5));
        assert!(!state.is_loading());
        state.dispatch(ListAction::Scrolled(0.8));
        assert!(state.is_loading());
    }

    #[test]
    fn changing_the_query_resets_the_window() {
        let mut state = ListState::new(20, 0.8);
        state.dispatch(ListAction::SetRecords((0..45).map(|i| row("C", "", DocumentType::Quote, i)).collect()));
        state.load_more();
        assert_eq!(state.visible().len(), 40);

        state.dispatch(ListAction::Search("c".to_string()));
        assert_eq!(state.visible().len(), 20);
    }

    #[test]
    fn warranty_filter_checks_membership() {
        let mut with = row("With", "", DocumentType::Quote, 0);
        with.quote.warranty = vec!["w1".to_string(), "w2".to_string()];
        let without = row("Without", "", DocumentType::Quote, 1);
        let mut state = ListState::new(20, 0.8);
        state.dispatch(ListAction::SetRecords(vec![with, without]));
        state.dispatch(ListAction::Filter(ListFilter::Warranty("w2".to_string())));
        assert_eq!(names(&state.visible()), vec!["With"]);
    }
}
