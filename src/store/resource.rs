use super::Action;
use super::state::StoreState;
use crate::debounce::Debouncer;
use crate::metrics::{track_requests_in_flight, track_store_action};
use crate::notifications::{Notification, Notifier};
use schoolbook_client::ResourceApi;
use schoolbook_config::StoreConfig;
use schoolbook_core::{ApiError, ListQuery, Page};
use schoolbook_models::Resource;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use validator::Validate;

struct Inner<R: Resource> {
    api: Arc<dyn ResourceApi<R>>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<StoreState<R>>,
    debouncer: Debouncer,
    page_limit: i64,
}

/// Cached view of one backend collection.
///
/// Cloning is cheap and every clone observes the same state.
pub struct ResourceStore<R: Resource> {
    inner: Arc<Inner<R>>,
}

impl<R: Resource> Clone for ResourceStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resource> ResourceStore<R> {
    pub fn new(
        api: Arc<dyn ResourceApi<R>>,
        notifier: Arc<dyn Notifier>,
        config: &StoreConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                notifier,
                state: watch::Sender::new(StoreState::default()),
                debouncer: Debouncer::new(config.search_debounce),
                page_limit: config.page_limit,
            }),
        }
    }

    pub fn snapshot(&self) -> StoreState<R> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState<R>> {
        self.inner.state.subscribe()
    }

    pub fn items(&self) -> Arc<Vec<R>> {
        Arc::clone(&self.inner.state.borrow().items)
    }

    pub fn current(&self) -> Option<R> {
        self.inner.state.borrow().current.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn find(&self, id: &R::Id) -> Option<R> {
        self.inner.state.borrow().find(id).cloned()
    }

    pub fn set_current(&self, current: Option<R>) {
        self.inner.state.send_modify(|s| s.current = current);
    }

    pub fn clear_error(&self) {
        self.inner.state.send_modify(StoreState::clear_error);
    }

    /// Replaces the collection with the matching page.
    #[instrument(skip(self), fields(resource = %R::KIND))]
    pub async fn list(&self, query: ListQuery) -> Option<Arc<Vec<R>>> {
        let api = Arc::clone(&self.inner.api);
        self.run(
            Action::List,
            async move { api.list(&query).await },
            |s, page: Page<R>| {
                s.replace_items(page.data, page.meta);
                Arc::clone(&s.items)
            },
        )
        .await
    }

    /// Lists one page using the configured page size.
    pub async fn load_page(&self, page: i64) -> Option<Arc<Vec<R>>> {
        self.list(ListQuery::page(page, self.inner.page_limit)).await
    }

    /// Lists the first page matching `text` once typing has paused.
    ///
    /// The handle yields `None` when a newer search superseded this one.
    pub fn search_debounced(
        &self,
        text: impl Into<String>,
    ) -> JoinHandle<Option<Option<Arc<Vec<R>>>>> {
        let store = self.clone();
        let query = ListQuery::page(1, self.inner.page_limit).with_search(text);
        self.inner
            .debouncer
            .call(move || async move { store.list(query).await })
    }

    pub fn cancel_search(&self) {
        self.inner.debouncer.cancel();
    }

    /// Fetches one entity into `current`. The collection is not touched.
    #[instrument(skip(self), fields(resource = %R::KIND))]
    pub async fn get_by_id(&self, id: &R::Id) -> Option<R> {
        let api = Arc::clone(&self.inner.api);
        let id = id.clone();
        self.run(
            Action::Get,
            async move { api.get(&id).await },
            |s, item: R| {
                s.current = Some(item.clone());
                item
            },
        )
        .await
    }

    /// Creates an entity and appends it to the collection.
    #[instrument(skip(self, dto), fields(resource = %R::KIND))]
    pub async fn create(&self, dto: R::Create) -> Option<R> {
        let api = Arc::clone(&self.inner.api);
        self.run(
            Action::Create,
            async move {
                dto.validate()?;
                api.create(&dto).await
            },
            |s, item: R| {
                s.upsert(item.clone());
                item
            },
        )
        .await
    }

    #[instrument(skip(self, patch), fields(resource = %R::KIND))]
    pub async fn update(&self, id: &R::Id, patch: R::Update) -> Option<R> {
        let api = Arc::clone(&self.inner.api);
        let id = id.clone();
        self.run(
            Action::Update,
            async move {
                patch.validate()?;
                api.update(&id, &patch).await
            },
            |s, item: R| {
                s.replace(item.clone());
                item
            },
        )
        .await
    }

    #[instrument(skip(self), fields(resource = %R::KIND))]
    pub async fn delete(&self, id: &R::Id) -> bool {
        let api = Arc::clone(&self.inner.api);
        let id = id.clone();
        let target = id.clone();
        self.run(
            Action::Delete,
            async move { api.delete(&id).await },
            move |s, ()| s.remove(&target),
        )
        .await
        .is_some()
    }

    /// Runs one backend call inside the loading bracket and applies `apply`
    /// to the state only if it succeeds.
    pub(crate) async fn run<T, U, Fut, F>(&self, action: Action, call: Fut, apply: F) -> Option<U>
    where
        Fut: Future<Output = Result<T, ApiError>>,
        F: FnOnce(&mut StoreState<R>, T) -> U,
    {
        self.try_run(action, call, apply).await.ok()
    }

    /// Like [`run`](Self::run), but hands the failure back to the caller.
    pub(crate) async fn try_run<T, U, Fut, F>(
        &self,
        action: Action,
        call: Fut,
        apply: F,
    ) -> Result<U, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
        F: FnOnce(&mut StoreState<R>, T) -> U,
    {
        self.try_run_partial(action, call, |s, value| (apply(s, value), None))
            .await
    }

    /// Runs a call whose `apply` may report that it was only partially
    /// applied. The value is still returned; the error is surfaced on the
    /// state and notified.
    pub(crate) async fn try_run_partial<T, U, Fut, F>(
        &self,
        action: Action,
        call: Fut,
        apply: F,
    ) -> Result<U, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
        F: FnOnce(&mut StoreState<R>, T) -> (U, Option<ApiError>),
    {
        let guard = self.begin();
        let result = call.await;
        self.settle(action, guard, result, apply)
    }

    fn begin(&self) -> InFlight<'_, R> {
        self.inner.state.send_modify(|s| {
            s.in_flight += 1;
            s.loading = true;
        });
        track_requests_in_flight(R::KIND, 1.0);
        InFlight {
            state: &self.inner.state,
            started: Instant::now(),
            open: true,
        }
    }

    fn settle<T, U, F>(
        &self,
        action: Action,
        mut guard: InFlight<'_, R>,
        result: Result<T, ApiError>,
        apply: F,
    ) -> Result<U, ApiError>
    where
        F: FnOnce(&mut StoreState<R>, T) -> (U, Option<ApiError>),
    {
        let elapsed = guard.started.elapsed();

        match result {
            Ok(value) => {
                let mut outcome = None;
                self.inner.state.send_modify(|s| {
                    guard.close(s);
                    s.clear_error();
                    let (value, partial) = apply(s, value);
                    if let Some(err) = &partial {
                        s.set_error(err.kind, err.message.clone());
                    }
                    outcome = Some((value, partial));
                });
                drop(guard);
                let Some((value, partial)) = outcome else {
                    return Err(ApiError::unknown("Store state was not updated"));
                };

                track_store_action(R::KIND, action.as_str(), partial.is_none(), elapsed);
                match partial {
                    Some(err) => {
                        warn!(
                            resource = %R::KIND,
                            action = action.as_str(),
                            error.kind = %err.kind,
                            error.message = %err.message,
                            "Store action partially applied"
                        );
                        self.inner
                            .notifier
                            .notify(Notification::error(R::KIND, action.as_str(), err.message));
                    }
                    None => {
                        info!(
                            resource = %R::KIND,
                            action = action.as_str(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            "Store action succeeded"
                        );
                        if action.is_mutation() {
                            self.inner.notifier.notify(Notification::success(
                                R::KIND,
                                action.as_str(),
                                format!("{} {} successfully", R::KIND.title(), action.past_tense()),
                            ));
                        }
                    }
                }
                Ok(value)
            }
            Err(err) => {
                self.inner.state.send_modify(|s| {
                    guard.close(s);
                    s.set_error(err.kind, err.message.clone());
                });
                drop(guard);
                track_store_action(R::KIND, action.as_str(), false, elapsed);
                warn!(
                    resource = %R::KIND,
                    action = action.as_str(),
                    error.kind = %err.kind,
                    error.message = %err.message,
                    "Store action failed"
                );
                self.inner.notifier.notify(Notification::error(
                    R::KIND,
                    action.as_str(),
                    err.message.clone(),
                ));
                Err(err)
            }
        }
    }
}

/// One slot of the loading bracket.
///
/// Released when the action settles, or on drop if the action future is
/// cancelled before the backend answers.
struct InFlight<'a, R: Resource> {
    state: &'a watch::Sender<StoreState<R>>,
    started: Instant,
    open: bool,
}

impl<R: Resource> InFlight<'_, R> {
    fn close(&mut self, state: &mut StoreState<R>) {
        if std::mem::take(&mut self.open) {
            finish(state);
        }
    }
}

impl<R: Resource> Drop for InFlight<'_, R> {
    fn drop(&mut self) {
        track_requests_in_flight(R::KIND, -1.0);
        if self.open {
            self.state.send_modify(finish);
        }
    }
}

fn finish<R: Resource>(state: &mut StoreState<R>) {
    state.in_flight = state.in_flight.saturating_sub(1);
    state.loading = state.in_flight > 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::MemoryNotifier;
    use schoolbook_client::fake::FakeBackend;
    use schoolbook_core::ErrorKind;
    use schoolbook_models::{CreateGradeDto, Grade, GradeId, ResourceKind, UpdateGradeDto};
    use std::time::Duration;

    fn store(backend: &Arc<FakeBackend>) -> (ResourceStore<Grade>, Arc<MemoryNotifier>) {
        let notifier = Arc::new(MemoryNotifier::new());
        let config = StoreConfig {
            page_limit: 2,
            search_debounce: Duration::from_millis(300),
        };
        let api: Arc<dyn ResourceApi<Grade>> = backend.clone();
        (ResourceStore::new(api, notifier.clone(), &config), notifier)
    }

    fn grade_dto(name: &str, level: i32) -> CreateGradeDto {
        CreateGradeDto {
            name: name.to_string(),
            level,
            description: None,
            academic_year_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_appends_and_notifies() {
        let backend = FakeBackend::new();
        let (store, notifier) = store(&backend);

        let first = store.create(grade_dto("Grade 1", 1)).await.unwrap();
        let second = store.create(grade_dto("Grade 2", 2)).await.unwrap();

        let items = store.items();
        assert_eq!(items.as_slice(), &[first, second]);
        assert!(!store.is_loading());
        assert_eq!(notifier.successes()[0].message, "Grade created successfully");
    }

    #[tokio::test]
    async fn test_local_validation_failure_issues_no_request() {
        let backend = FakeBackend::new();
        let (store, notifier) = store(&backend);

        assert!(store.create(grade_dto("", 1)).await.is_none());

        assert_eq!(backend.call_count(), 0);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.error_kind, Some(ErrorKind::Validation));
        assert!(snapshot.error.unwrap().starts_with("Validation failed"));
        assert!(!snapshot.loading);
        assert_eq!(notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_list_keeps_same_items_allocation() {
        let backend = FakeBackend::new();
        let (store, _) = store(&backend);
        store.create(grade_dto("Grade 1", 1)).await.unwrap();
        let before = store.items();

        backend
            .fail_next(ResourceKind::Grade, ApiError::transport("offline"))
            .await;
        assert!(store.list(ListQuery::all()).await.is_none());

        assert!(Arc::ptr_eq(&before, &store.items()));
        assert_eq!(store.error().as_deref(), Some("offline"));
    }

    #[tokio::test]
    async fn test_list_success_clears_error() {
        let backend = FakeBackend::new();
        let (store, _) = store(&backend);
        backend
            .fail_next(ResourceKind::Grade, ApiError::transport("offline"))
            .await;
        store.list(ListQuery::all()).await;
        assert!(store.error().is_some());

        store.list(ListQuery::all()).await.unwrap();
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_load_page_uses_configured_limit() {
        let backend = FakeBackend::new();
        for level in 1..=3 {
            backend
                .seed::<Grade>(grade_dto(&format!("Grade {}", level), level))
                .await
                .unwrap();
        }
        let (store, _) = store(&backend);

        let items = store.load_page(1).await.unwrap();
        assert_eq!(items.len(), 2);
        let meta = store.snapshot().meta.unwrap();
        assert_eq!(meta.total, 3);
        assert!(meta.has_more);
    }

    #[tokio::test]
    async fn test_update_missing_leaves_state() {
        let backend = FakeBackend::new();
        let (store, notifier) = store(&backend);
        let patch = UpdateGradeDto {
            name: Some("Renamed".to_string()),
            ..UpdateGradeDto::default()
        };

        assert!(store.update(&GradeId::from("nope"), patch).await.is_none());
        assert!(store.items().is_empty());
        assert_eq!(notifier.errors()[0].message, "Grade not found");
    }

    #[tokio::test]
    async fn test_delete_clears_matching_current() {
        let backend = FakeBackend::new();
        let (store, _) = store(&backend);
        let grade = store.create(grade_dto("Grade 1", 1)).await.unwrap();
        store.set_current(Some(grade.clone()));

        assert!(store.delete(&grade.id).await);
        assert!(store.items().is_empty());
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_action_releases_loading() {
        let backend = FakeBackend::new();
        let (store, _) = store(&backend);
        let _gate = backend.hold().await;

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), store.list(ListQuery::all())).await;
        assert!(timed_out.is_err());
        assert!(!store.is_loading());
        assert_eq!(store.snapshot().in_flight, 0);

        backend.open().await;
        store.list(ListQuery::all()).await.unwrap();
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_try_run_returns_the_failure() {
        let backend = FakeBackend::new();
        let (store, _) = store(&backend);
        backend
            .fail_next(ResourceKind::Grade, ApiError::from_status(409, "Grade was modified"))
            .await;

        let api = Arc::clone(&store.inner.api);
        let err = store
            .try_run(
                Action::List,
                async move { api.list(&ListQuery::all()).await },
                |_, page: Page<Grade>| page.data.len(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.message, "Grade was modified");
        assert!(!store.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_debounced_runs_last_query() {
        let backend = FakeBackend::new();
        backend.seed::<Grade>(grade_dto("Alpha", 1)).await.unwrap();
        backend.seed::<Grade>(grade_dto("Beta", 2)).await.unwrap();
        let (store, _) = store(&backend);

        let stale = store.search_debounced("al");
        let latest = store.search_debounced("bet");

        assert_eq!(stale.await.unwrap(), None);
        let items = latest.await.unwrap().flatten().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Beta");
        assert_eq!(backend.call_count(), 1);
    }
}
