//! Per-resource cached stores.
//!
//! Every store caches one backend collection plus a `current` selection and
//! publishes its [`StoreState`] through a `tokio::sync::watch` channel.
//! Actions bracket `loading`, apply their effect only once the backend call
//! settles, and report the outcome through a [`Notifier`](crate::notifications::Notifier).

mod attendance;
mod classes;
mod registry;
mod resource;
mod scoped;
mod state;

pub use attendance::AttendanceStore;
pub use classes::ClassStore;
pub use registry::Stores;
pub use resource::ResourceStore;
pub use scoped::{ClassSessionStore, InvoiceStore, StudentStore};
pub use state::StoreState;

use std::fmt;

/// A store action, as reported in logs, metrics and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Get,
    Create,
    Update,
    Delete,
    CreateBulk,
    /// Read of a related collection that does not replace the cache.
    Lookup,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::CreateBulk => "create_bulk",
            Self::Lookup => "lookup",
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Create | Self::Update | Self::Delete | Self::CreateBulk
        )
    }

    fn past_tense(&self) -> &'static str {
        match self {
            Self::List | Self::Lookup => "loaded",
            Self::Get => "fetched",
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
            Self::CreateBulk => "saved",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
