//! # Schoolbook Core
//!
//! Core types, errors, and utilities for the Schoolbook client.
//!
//! - [`errors`]: The backend error taxonomy ([`ApiError`], [`ErrorKind`])
//! - [`pagination`]: List query parameters and paginated responses
//! - [`serde`]: Custom serde deserialization helpers
//!
//! # Example
//!
//! ```ignore
//! use schoolbook_core::{ApiError, ListQuery};
//!
//! let error = ApiError::not_found("Student not found");
//! let query = ListQuery::page(1, 20).with_search("ada");
//! ```

pub mod errors;
pub mod pagination;
pub mod serde;

// Re-export commonly used types at crate root
pub use errors::{ApiError, ErrorKind};
pub use pagination::{ListQuery, Page, PaginationMeta};
