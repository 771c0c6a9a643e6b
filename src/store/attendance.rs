use super::Action;
use super::resource::ResourceStore;
use schoolbook_client::AttendanceApi;
use schoolbook_core::ApiError;
use schoolbook_models::{
    AttendanceRecord, BulkAttendanceRequest, BulkAttendanceResult, BulkAttendanceRow,
    ClassSessionId,
};
use std::ops::Deref;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

/// Attendance store with roll-call reads and bulk writes.
#[derive(Clone)]
pub struct AttendanceStore {
    store: ResourceStore<AttendanceRecord>,
    api: Arc<dyn AttendanceApi>,
}

impl AttendanceStore {
    pub fn new(store: ResourceStore<AttendanceRecord>, api: Arc<dyn AttendanceApi>) -> Self {
        Self { store, api }
    }

    /// Replaces the collection with the persisted records of one session.
    pub async fn list_by_class_session(
        &self,
        session_id: &ClassSessionId,
    ) -> Option<Arc<Vec<AttendanceRecord>>> {
        self.try_list_by_class_session(session_id).await.ok()
    }

    #[instrument(skip(self))]
    pub async fn try_list_by_class_session(
        &self,
        session_id: &ClassSessionId,
    ) -> Result<Arc<Vec<AttendanceRecord>>, ApiError> {
        let api = Arc::clone(&self.api);
        let session_id = session_id.clone();
        self.store
            .try_run(
                Action::List,
                async move { api.list_by_class_session(&session_id).await },
                |s, records: Vec<AttendanceRecord>| {
                    s.replace_items(records, None);
                    Arc::clone(&s.items)
                },
            )
            .await
    }

    /// Writes a whole roll call in one request.
    ///
    /// Rows the backend persisted are cached (replacing earlier records for
    /// the same student and session). When some rows were rejected the
    /// result is still returned, but the store error is set to a
    /// [`PartialBulk`](schoolbook_core::ErrorKind::PartialBulk) summary and
    /// an error notification is posted instead of a success one.
    pub async fn create_bulk(
        &self,
        session_id: &ClassSessionId,
        rows: Vec<BulkAttendanceRow>,
    ) -> Option<BulkAttendanceResult> {
        self.try_create_bulk(session_id, rows).await.ok()
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn try_create_bulk(
        &self,
        session_id: &ClassSessionId,
        rows: Vec<BulkAttendanceRow>,
    ) -> Result<BulkAttendanceResult, ApiError> {
        let api = Arc::clone(&self.api);
        let request = BulkAttendanceRequest {
            class_session_id: session_id.clone(),
            records: rows,
        };
        self.store
            .try_run_partial(
                Action::CreateBulk,
                async move {
                    request.validate()?;
                    api.create_bulk(&request.class_session_id, &request.records)
                        .await
                },
                |s, result: BulkAttendanceResult| {
                    for record in &result.created {
                        upsert_by_student(s, record.clone());
                    }
                    let partial =
                        (!result.is_complete()).then(|| ApiError::partial_bulk(result.failure_summary()));
                    (result, partial)
                },
            )
            .await
    }
}

/// Attendance rows are unique per (session, student) even when the backend
/// re-issues IDs on rewrite.
fn upsert_by_student(
    state: &mut super::StoreState<AttendanceRecord>,
    record: AttendanceRecord,
) {
    let duplicate = state.items.iter().any(|r| {
        r.id != record.id
            && r.class_session_id == record.class_session_id
            && r.student_id == record.student_id
    });
    if duplicate {
        Arc::make_mut(&mut state.items).retain(|r| {
            !(r.class_session_id == record.class_session_id && r.student_id == record.student_id)
        });
    }
    state.upsert(record);
}

impl Deref for AttendanceStore {
    type Target = ResourceStore<AttendanceRecord>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}
