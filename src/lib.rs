//! # Schoolbook
//!
//! Client-side core of the Schoolbook school management system: cached
//! stores over the REST backend and the attendance roll-call workflow.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── schoolbook-core/     # ApiError, ErrorKind, pagination
//! ├── schoolbook-config/   # ApiConfig, StoreConfig (from env)
//! ├── schoolbook-models/   # IDs, entities, DTOs, Resource trait
//! └── schoolbook-client/   # Backend traits, reqwest backend, fake backend
//! src/
//! ├── store/               # One cached store per resource kind
//! ├── rollcall/            # Attendance draft and roll-call controller
//! ├── notifications.rs     # Success/error notices posted by stores
//! ├── debounce.rs          # Search-as-you-type debouncing
//! ├── logging.rs           # tracing subscriber setup
//! └── metrics.rs           # Store and roll-call metrics
//! ```
//!
//! ## Stores
//!
//! Every store action follows the same contract: `loading` is set while the
//! request is in flight; on success the cache is updated and the error
//! cleared; on failure the error is set, a notification is posted and the
//! cache is left exactly as it was. Actions never return `Err`; they return
//! `None` (or `false`) and leave the message in the store state.
//!
//! ```ignore
//! use schoolbook::notifications::LogNotifier;
//! use schoolbook::store::Stores;
//! use schoolbook_client::HttpBackend;
//! use schoolbook_config::{ApiConfig, StoreConfig};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(HttpBackend::new(&ApiConfig::from_env())?);
//! let stores = Stores::new(backend, Arc::new(LogNotifier), &StoreConfig::from_env());
//! let students = stores.students.load_page(1).await;
//! ```
//!
//! ## Roll call
//!
//! [`rollcall::RollCallController`] keeps a draft with one entry per enrolled
//! student, overlays the persisted attendance of the selected session and
//! saves the whole draft with one bulk request.
//!
//! ## Environment Variables
//!
//! ```bash
//! API_BASE_URL=http://localhost:3000/api
//! API_TOKEN=...
//! API_TIMEOUT_SECS=30
//! STORE_PAGE_LIMIT=10
//! SEARCH_DEBOUNCE_MS=300
//! LOG_LEVEL=info
//! LOG_DIR=./logs
//! METRICS_ENABLED=true
//! ```

pub mod debounce;
pub mod logging;
pub mod metrics;
pub mod notifications;
pub mod rollcall;
pub mod store;

// Re-export workspace crates for convenience
pub use schoolbook_client;
pub use schoolbook_config;
pub use schoolbook_core;
pub use schoolbook_models;

pub use notifications::{Notification, Notifier};
pub use rollcall::{RollCallController, SaveOutcome, SessionSwitch};
pub use store::{ResourceStore, Stores};
