use schoolbook_core::{ErrorKind, PaginationMeta};
use schoolbook_models::Resource;
use std::sync::Arc;

/// Observable state of one resource store.
///
/// `items` is shared: snapshots are cheap, and a failed action leaves the
/// very same allocation in place.
#[derive(Debug)]
pub struct StoreState<R: Resource> {
    pub items: Arc<Vec<R>>,
    pub current: Option<R>,
    pub loading: bool,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub meta: Option<PaginationMeta>,
    pub(crate) in_flight: usize,
}

impl<R: Resource> Default for StoreState<R> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            current: None,
            loading: false,
            error: None,
            error_kind: None,
            meta: None,
            in_flight: 0,
        }
    }
}

impl<R: Resource> Clone for StoreState<R> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            current: self.current.clone(),
            loading: self.loading,
            error: self.error.clone(),
            error_kind: self.error_kind,
            meta: self.meta.clone(),
            in_flight: self.in_flight,
        }
    }
}

impl<R: Resource> StoreState<R> {
    pub fn find(&self, id: &R::Id) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &R::Id) -> bool {
        self.find(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn set_error(&mut self, kind: ErrorKind, message: String) {
        self.error = Some(message);
        self.error_kind = Some(kind);
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
        self.error_kind = None;
    }

    /// Replaces the collection, keeping the first occurrence of each ID.
    pub(crate) fn replace_items(&mut self, items: Vec<R>, meta: Option<PaginationMeta>) {
        let mut unique: Vec<R> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.iter().any(|kept| kept.id() == item.id()) {
                unique.push(item);
            }
        }
        self.items = Arc::new(unique);
        self.meta = meta;
    }

    /// Replaces the cached entry with the same ID, or appends.
    pub(crate) fn upsert(&mut self, item: R) {
        let items = Arc::make_mut(&mut self.items);
        match items.iter_mut().find(|cached| cached.id() == item.id()) {
            Some(cached) => *cached = item,
            None => items.push(item),
        }
    }

    /// Replaces the cached entry with the same ID, and `current` if it is
    /// that entry. Entries that are not cached are not added.
    pub(crate) fn replace(&mut self, item: R) {
        if self.contains(item.id()) {
            let items = Arc::make_mut(&mut self.items);
            if let Some(cached) = items.iter_mut().find(|cached| cached.id() == item.id()) {
                *cached = item.clone();
            }
        }
        if self.current.as_ref().is_some_and(|c| c.id() == item.id()) {
            self.current = Some(item);
        }
    }

    pub(crate) fn remove(&mut self, id: &R::Id) {
        if self.contains(id) {
            Arc::make_mut(&mut self.items).retain(|item| item.id() != id);
        }
        if self.current.as_ref().is_some_and(|c| c.id() == id) {
            self.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use schoolbook_models::{Grade, GradeId};

    fn grade(id: &str, name: &str) -> Grade {
        Grade {
            id: GradeId::from(id),
            name: name.to_string(),
            level: 1,
            description: None,
            academic_year_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_replace_items_drops_duplicate_ids() {
        let mut state = StoreState::default();
        state.replace_items(vec![grade("g1", "A"), grade("g2", "B"), grade("g1", "C")], None);
        assert_eq!(state.len(), 2);
        assert_eq!(state.items[0].name, "A");
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let mut state = StoreState::default();
        state.upsert(grade("g1", "A"));
        state.upsert(grade("g2", "B"));
        state.upsert(grade("g1", "A2"));
        assert_eq!(state.len(), 2);
        assert_eq!(state.items[0].name, "A2");
        assert_eq!(state.items[1].name, "B");
    }

    #[test]
    fn test_replace_touches_current_only_when_matching() {
        let mut state = StoreState::default();
        state.replace_items(vec![grade("g1", "A"), grade("g2", "B")], None);
        state.current = Some(grade("g2", "B"));

        state.replace(grade("g1", "A2"));
        assert_eq!(state.items[0].name, "A2");
        assert_eq!(state.current.as_ref().unwrap().name, "B");

        state.replace(grade("g2", "B2"));
        assert_eq!(state.current.as_ref().unwrap().name, "B2");
    }

    #[test]
    fn test_replace_does_not_add_uncached() {
        let mut state: StoreState<Grade> = StoreState::default();
        state.replace(grade("g9", "Z"));
        assert!(state.is_empty());
    }

    #[test]
    fn test_remove_clears_matching_current() {
        let mut state = StoreState::default();
        state.replace_items(vec![grade("g1", "A")], None);
        state.current = Some(grade("g1", "A"));
        state.remove(&GradeId::from("g1"));
        assert!(state.is_empty());
        assert!(state.current.is_none());
    }

    #[test]
    fn test_snapshot_shares_items() {
        let mut state = StoreState::default();
        state.replace_items(vec![grade("g1", "A")], None);
        let snapshot = state.clone();
        assert!(Arc::ptr_eq(&snapshot.items, &state.items));

        state.upsert(grade("g2", "B"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(state.len(), 2);
    }
}
