//! # Schoolbook Config
//!
//! Configuration types for the Schoolbook client.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`api`]: Backend base URL, bearer token and request timeout
//! - [`store`]: Store defaults such as page size and search debounce delay
//!
//! # Example
//!
//! ```ignore
//! use schoolbook_config::{ApiConfig, StoreConfig};
//!
//! dotenvy::dotenv().ok();
//! let api_config = ApiConfig::from_env();
//! let store_config = StoreConfig::from_env();
//! ```

pub mod api;
pub mod store;

// Re-export commonly used types at crate root
pub use api::ApiConfig;
pub use store::StoreConfig;
