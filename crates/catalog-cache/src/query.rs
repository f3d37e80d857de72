//! List requests and their translation into store queries

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Page size used for the store query when the request leaves it unset
pub const DEFAULT_FETCH_PAGE_SIZE: u32 = 20;

/// Largest page size a request may ask for
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw list request as received from a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            filter: None,
            sort_column: None,
            sort_order: None,
            page: 1,
            page_size: None,
        }
    }
}

impl ListRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, term: impl Into<String>) -> Self {
        self.filter = Some(term.into());
        self
    }

    pub fn sort_by(mut self, column: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort_column = Some(column.into());
        self.sort_order = Some(order.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Reject requests outside the accepted paging bounds
    pub fn validate(&self) -> CatalogResult<()> {
        if self.page < 1 {
            return Err(CatalogError::InvalidArgument(
                "page must be at least 1".to_string(),
            ));
        }
        if let Some(size) = self.page_size {
            if !(1..=MAX_PAGE_SIZE).contains(&size) {
                return Err(CatalogError::InvalidArgument(format!(
                    "pageSize must be between 1 and {MAX_PAGE_SIZE}"
                )));
            }
        }
        Ok(())
    }
}

/// Column a product list can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Name,
    Price,
    CreatedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::CreatedAt => "createdAt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Resolved ordering for a store query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

/// Resolve a sort column and direction.
///
/// Unrecognized or missing columns fall back to newest first. The direction is
/// ascending only for a case-insensitive `asc`; anything else is descending.
pub fn build_sort(column: Option<&str>, direction: &str) -> SortSpec {
    let field = match column.map(|c| c.trim().to_lowercase()).as_deref() {
        Some("name") => SortField::Name,
        Some("price") => SortField::Price,
        Some("createdat") => SortField::CreatedAt,
        _ => return SortSpec::default(),
    };

    let direction = if direction.trim().eq_ignore_ascii_case("asc") {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    };

    SortSpec { field, direction }
}

/// Product attribute a filter term is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Name,
    Description,
    CategoryName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Substring match under the store's collation
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: FilterField,
    pub operator: FilterOperator,
    pub value: String,
}

/// A disjunction of conditions; a product matches if any condition does
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub any_of: Vec<Condition>,
}

/// Build the filter predicate for a search term.
///
/// Blank terms produce no predicate. The term is passed through as given; case
/// and surrounding whitespace are left to the store's collation.
pub fn build_filter(term: Option<&str>) -> Option<Predicate> {
    let term = term.filter(|t| !t.trim().is_empty())?;

    let any_of = [
        FilterField::Name,
        FilterField::Description,
        FilterField::CategoryName,
    ]
    .into_iter()
    .map(|field| Condition {
        field,
        operator: FilterOperator::Contains,
        value: term.to_string(),
    })
    .collect();

    Some(Predicate { any_of })
}

/// Rows to skip for a 1-based page
pub fn compute_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

/// Normalized query handed to the entity store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub filter: Option<Predicate>,
    pub sort: SortSpec,
    pub page: u32,
    pub page_size: u32,
}

impl QuerySpec {
    pub fn from_request(request: &ListRequest) -> Self {
        Self {
            filter: build_filter(request.filter.as_deref()),
            sort: build_sort(
                request.sort_column.as_deref(),
                request.sort_order.as_deref().unwrap_or("desc"),
            ),
            page: request.page,
            page_size: request.page_size.unwrap_or(DEFAULT_FETCH_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        compute_offset(self.page, self.page_size)
    }
}
