//! Pagination utilities for list requests and responses.
//!
//! List endpoints accept page-based parameters and answer with either a bare
//! JSON array or an envelope carrying pagination metadata:
//!
//! ```json
//! {
//!   "data": [...],
//!   "meta": { "total": 100, "limit": 10, "page": 3, "has_more": true }
//! }
//! ```
//!
//! [`Page`] deserializes from both shapes so callers never care which one the
//! backend picked for a given resource.
//!
//! # Example
//!
//! ```ignore
//! use schoolbook_core::pagination::ListQuery;
//!
//! let query = ListQuery::page(3, 20).with_search("smith");
//! assert_eq!(query.offset(), 40);
//! assert_eq!(
//!     query.to_query_pairs(),
//!     vec![("page", "3".to_string()), ("limit", "20".to_string()), ("search", "smith".to_string())]
//! );
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Metadata about a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Maximum items per page (the limit that was applied)
    pub limit: i64,
    /// Number of items skipped (only present if offset-based pagination was used)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Current page number (only present if page-based pagination was used)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Whether there are more items after this page
    #[serde(default)]
    pub has_more: bool,
}

/// Parameters for a list request.
///
/// Every field is optional; absent fields are not sent, which lets the
/// backend apply its own defaults (typically "everything").
///
/// - `limit` is clamped to the range [1, 100] when sent
/// - `page` is clamped to a minimum of 1
/// - `search` is sent only when non-blank
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

impl ListQuery {
    /// Query for everything the backend is willing to return.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn page(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            search: None,
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search.trim().to_string())
        };
        self
    }

    /// Returns the effective limit, clamped to [1, 100].
    ///
    /// Defaults to 10 if not specified.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Returns the page number if provided, clamped to a minimum of 1.
    #[must_use]
    pub fn page_number(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }

    /// Offset implied by the page number (0 when no page is set).
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.page_number()
            .map(|page| (page - 1) * self.limit())
            .unwrap_or(0)
    }

    /// Query-string pairs for the request, omitting absent parameters.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(page) = self.page_number() {
            pairs.push(("page", page.to_string()));
        }
        if self.limit.is_some() {
            pairs.push(("limit", self.limit().to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PaginationMeta>,
}

impl<T> Page<T> {
    /// A page without metadata, as returned by endpoints that do not paginate.
    pub fn from_items(data: Vec<T>) -> Self {
        Self { data, meta: None }
    }

    /// Total count reported by the backend, falling back to the page length.
    pub fn total(&self) -> i64 {
        self.meta
            .as_ref()
            .map(|m| m.total)
            .unwrap_or(self.data.len() as i64)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageRepr<T> {
    Envelope {
        data: Vec<T>,
        #[serde(default)]
        meta: Option<PaginationMeta>,
    },
    Items(Vec<T>),
}

impl<'de, T> Deserialize<'de> for Page<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match PageRepr::deserialize(deserializer)? {
            PageRepr::Envelope { data, meta } => Page { data, meta },
            PageRepr::Items(data) => Page { data, meta: None },
        })
    }
}
