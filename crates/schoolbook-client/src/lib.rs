//! # Schoolbook Client
//!
//! Backend access for the Schoolbook stores.
//!
//! - [`api`]: The async contracts the stores depend on
//! - [`http`]: [`HttpBackend`], the reqwest implementation against the REST service
//! - `fake`: An in-memory backend for tests (feature `test-utils`)
//!
//! # Example
//!
//! ```ignore
//! use schoolbook_client::{HttpBackend, ResourceApi};
//! use schoolbook_config::ApiConfig;
//! use schoolbook_core::ListQuery;
//! use schoolbook_models::Student;
//!
//! let backend = HttpBackend::new(&ApiConfig::from_env())?;
//! let page = ResourceApi::<Student>::list(&backend, &ListQuery::page(1, 20)).await?;
//! ```

pub mod api;
#[cfg(feature = "test-utils")]
pub mod fake;
pub mod http;

pub use api::{AttendanceApi, Backend, EnrollmentApi, ResourceApi, ScopedListApi};
pub use http::HttpBackend;
