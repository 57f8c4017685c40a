use std::collections::BTreeSet;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// An entity that can be listed, created, updated and deleted through a
/// paginated collection endpoint.
pub trait Resource: Clone + Debug + PartialEq + Send + Sync + 'static {
    type Filter: Predicates;
    type Draft: Clone + Debug + Serialize + Send + Sync + 'static;
    type Changes: Clone + Debug + Serialize + Send + Sync + 'static;

    /// Key of the item array inside the list envelope, e.g. `"leads"`.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// Entity-specific filter predicates.
pub trait Predicates: Clone + Debug + Default + PartialEq + Send + Sync + 'static {
    /// Partial update of these predicates, one [`Change`] per field.
    type Patch: Clone + Debug + Default + PartialEq + Send + Sync + 'static;

    fn merge(&mut self, patch: Self::Patch);

    fn query_pairs(&self) -> Vec<(&'static str, String)>;
}

/// What a filter patch does to one optional predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Default for Change<T> {
    fn default() -> Self {
        Change::Keep
    }
}

impl<T> Change<T> {
    /// `Set` for a value, `Keep` for `None`.
    pub fn set_or_keep(value: Option<T>) -> Self {
        value.map_or(Change::Keep, Change::Set)
    }

    pub fn apply(self, slot: &mut Option<T>) {
        match self {
            Change::Keep => {}
            Change::Clear => *slot = None,
            Change::Set(value) => *slot = Some(value),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListFilters<P> {
    pub page: u32,
    pub limit: u32,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub predicates: P,
}

impl<P: Predicates> Default for ListFilters<P> {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: "createdAt".to_string(),
            sort_order: SortOrder::Desc,
            predicates: P::default(),
        }
    }
}

impl<P: Predicates> ListFilters<P> {
    /// Merges `patch` into these filters. Unless the patch names a page the
    /// page goes back to 1, and a page is never below 1.
    pub fn merge(&mut self, patch: FilterPatch<P>) {
        self.page = patch.page.unwrap_or(DEFAULT_PAGE).max(1);
        if let Some(limit) = patch.limit {
            self.limit = limit.max(1);
        }
        if let Some(sort_by) = patch.sort_by {
            self.sort_by = sort_by;
        }
        if let Some(sort_order) = patch.sort_order {
            self.sort_order = sort_order;
        }
        self.predicates.merge(patch.predicates);
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sortBy", self.sort_by.clone()),
            ("sortOrder", self.sort_order.as_str().to_string()),
        ];
        pairs.extend(self.predicates.query_pairs());
        pairs
    }
}

/// A partial filter update. Unset fields keep their current value, except
/// `page` which falls back to 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch<P: Predicates> {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub predicates: P::Patch,
}

impl<P: Predicates> FilterPatch<P> {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::blank()
        }
    }

    pub fn predicates(predicates: impl Into<P::Patch>) -> Self {
        Self {
            predicates: predicates.into(),
            ..Self::blank()
        }
    }

    pub fn sort(sort_by: impl Into<String>, sort_order: SortOrder) -> Self {
        Self {
            sort_by: Some(sort_by.into()),
            sort_order: Some(sort_order),
            ..Self::blank()
        }
    }

    fn blank() -> Self {
        Self {
            page: None,
            limit: None,
            sort_by: None,
            sort_order: None,
            predicates: P::Patch::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(alias = "pages")]
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            total: 0,
            total_pages: 0,
        }
    }
}

impl Pagination {
    fn with_total(mut self, total: u64) -> Self {
        let limit = u64::from(self.limit.max(1));
        self.total = total;
        self.total_pages = u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListAction<R: Resource> {
    FiltersChanged(FilterPatch<R::Filter>),
    FiltersReset,
    FetchStarted,
    FetchSucceeded { request: u64, page: Page<R> },
    FetchFailed { request: u64, message: String },
    Created(R),
    Updated(R),
    Deleted { id: String },
    MutationFailed { message: String },
    ToggleSelection { id: String },
    SelectAll,
    ClearSelection,
}

/// Client-side mirror of one paginated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<R: Resource> {
    pub items: Vec<R>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub filters: ListFilters<R::Filter>,
    pub pagination: Pagination,
    pub selected_ids: BTreeSet<String>,
    /// Token of the most recently started fetch.
    pub latest_request: u64,
}

impl<R: Resource> Default for ListState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            error: None,
            filters: ListFilters::default(),
            pagination: Pagination::default(),
            selected_ids: BTreeSet::new(),
            latest_request: 0,
        }
    }
}

impl<R: Resource> ListState<R> {
    pub fn with_filters(filters: ListFilters<R::Filter>) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    pub fn reduce(mut self, action: ListAction<R>) -> Self {
        match action {
            ListAction::FiltersChanged(patch) => self.filters.merge(patch),
            ListAction::FiltersReset => self.filters = ListFilters::default(),
            ListAction::FetchStarted => {
                self.latest_request += 1;
                self.is_loading = true;
                self.error = None;
            }
            ListAction::FetchSucceeded { request, page } => {
                if self.is_stale(request) {
                    return self;
                }
                self.is_loading = false;
                self.items = page.items;
                self.pagination = page.pagination;
            }
            ListAction::FetchFailed { request, message } => {
                if self.is_stale(request) {
                    return self;
                }
                self.is_loading = false;
                self.items.clear();
                self.error = Some(message);
            }
            ListAction::Created(item) => {
                self.items.insert(0, item);
                let total = self.pagination.total + 1;
                self.pagination = self.pagination.with_total(total);
            }
            ListAction::Updated(item) => {
                for existing in self.items.iter_mut().filter(|e| e.id() == item.id()) {
                    *existing = item.clone();
                }
            }
            ListAction::Deleted { id } => {
                let before = self.items.len();
                self.items.retain(|item| item.id() != id);
                if self.items.len() < before {
                    let total = self.pagination.total.saturating_sub(1);
                    self.pagination = self.pagination.with_total(total);
                    self.selected_ids.remove(&id);
                }
            }
            ListAction::MutationFailed { message } => self.error = Some(message),
            ListAction::ToggleSelection { id } => {
                if !self.selected_ids.remove(&id) {
                    self.selected_ids.insert(id);
                }
            }
            ListAction::SelectAll => {
                self.selected_ids = self.items.iter().map(|i| i.id().to_string()).collect();
            }
            ListAction::ClearSelection => self.selected_ids.clear(),
        }
        self
    }

    fn is_stale(&self, request: u64) -> bool {
        if request < self.latest_request {
            log::warn!(
                "discarding stale {} response (request {request}, latest {})",
                R::COLLECTION,
                self.latest_request
            );
            return true;
        }
        false
    }
}
