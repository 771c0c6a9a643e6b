//! In-memory backend for tests.
//!
//! Behaves like the REST service closely enough for store and roll-call
//! tests: it validates DTOs, assigns IDs and timestamps, filters scoped
//! lists and reports per-row bulk failures. Tests can inject failures with
//! [`FakeBackend::fail_next`] and [`FakeBackend::fail_student`], and hold
//! requests in flight with [`FakeBackend::hold`].

use crate::api::{AttendanceApi, EnrollmentApi, ResourceApi, ScopedListApi};
use async_trait::async_trait;
use chrono::Utc;
use schoolbook_core::{ApiError, ListQuery, Page, PaginationMeta};
use schoolbook_models::{
    AttendanceRecord, BulkAttendanceRequest, BulkAttendanceResult, BulkAttendanceRow,
    BulkRowError, ClassId, ClassSession, ClassSessionId, Invoice, ParentId, Resource,
    ResourceKind, Student, StudentId,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, Semaphore};
use uuid::Uuid;
use validator::Validate;

/// Holds backend calls until permits are released.
///
/// Waiters are served in arrival order, so `release(1)` lets exactly the
/// oldest held request through.
#[derive(Debug, Clone)]
pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn release(&self, n: usize) {
        self.0.add_permits(n);
    }

    async fn pass(&self) {
        if let Ok(permit) = self.0.acquire().await {
            permit.forget();
        }
    }
}

#[derive(Default)]
struct FakeState {
    tables: HashMap<ResourceKind, Vec<Value>>,
    failures: HashMap<ResourceKind, VecDeque<ApiError>>,
    bulk_failures: HashMap<StudentId, String>,
    gate: Option<Gate>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
    pub calls: AtomicU64,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of backend calls issued so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes the next call touching `kind` fail with `error`.
    pub async fn fail_next(&self, kind: ResourceKind, error: ApiError) {
        self.state
            .lock()
            .await
            .failures
            .entry(kind)
            .or_default()
            .push_back(error);
    }

    /// Makes every bulk attendance row for `student_id` fail with `reason`.
    pub async fn fail_student(&self, student_id: &StudentId, reason: impl Into<String>) {
        self.state
            .lock()
            .await
            .bulk_failures
            .insert(student_id.clone(), reason.into());
    }

    pub async fn clear_student_failures(&self) {
        self.state.lock().await.bulk_failures.clear();
    }

    /// Holds every subsequent call until the returned gate releases it.
    pub async fn hold(&self) -> Gate {
        let gate = Gate(Arc::new(Semaphore::new(0)));
        self.state.lock().await.gate = Some(gate.clone());
        gate
    }

    /// Stops holding new calls. Calls already waiting stay held.
    pub async fn open(&self) {
        self.state.lock().await.gate = None;
    }

    /// Creates a record through the same path as [`ResourceApi::create`],
    /// without counting it as a call.
    pub async fn seed<R: Resource>(&self, dto: R::Create) -> Result<R, ApiError> {
        dto.validate()?;
        let mut state = self.state.lock().await;
        insert_new::<R>(&mut state, &dto)
    }

    /// Stores a fully formed record as-is.
    pub async fn insert<R: Resource>(&self, record: R) -> Result<(), ApiError> {
        let value = serde_json::to_value(&record)?;
        let mut state = self.state.lock().await;
        let table = state.tables.entry(R::KIND).or_default();
        table.retain(|row| !has_id(row, record.id().as_ref()));
        table.push(value);
        Ok(())
    }

    /// Everything currently stored for `R`, in insertion order.
    pub async fn rows<R: Resource>(&self) -> Vec<R> {
        let state = self.state.lock().await;
        state
            .tables
            .get(&R::KIND)
            .map(|rows| rows.iter().filter_map(|v| decode(v).ok()).collect())
            .unwrap_or_default()
    }

    async fn begin(&self, kind: ResourceKind) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.state.lock().await.gate.clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }

        let mut state = self.state.lock().await;
        match state.failures.get_mut(&kind).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn scoped<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        field: &str,
        id: &str,
    ) -> Result<Vec<T>, ApiError> {
        self.begin(kind).await?;
        let state = self.state.lock().await;
        state
            .tables
            .get(&kind)
            .into_iter()
            .flatten()
            .filter(|row| field_eq(row, field, id))
            .map(decode)
            .collect()
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value.clone())?)
}

fn has_id(row: &Value, id: &str) -> bool {
    field_eq(row, "id", id)
}

fn field_eq(row: &Value, field: &str, expected: &str) -> bool {
    row.get(field).and_then(Value::as_str) == Some(expected)
}

fn matches_search(row: &Value, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    row.as_object().is_some_and(|fields| {
        fields.iter().any(|(key, value)| {
            key != "id"
                && value
                    .as_str()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
        })
    })
}

fn not_found(kind: ResourceKind) -> ApiError {
    ApiError::from_status(404, format!("{} not found", kind.title()))
}

fn object(value: Value) -> Result<Map<String, Value>, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::validation(format!(
            "Expected a JSON object, got {}",
            other
        ))),
    }
}

fn insert_new<R: Resource>(state: &mut FakeState, dto: &R::Create) -> Result<R, ApiError> {
    let now = Value::String(Utc::now().to_rfc3339());
    let mut fields = object(serde_json::to_value(dto)?)?;
    fields.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    fields.insert("created_at".into(), now.clone());
    fields.insert("updated_at".into(), now);

    let value = Value::Object(fields);
    let record: R = decode(&value)?;
    state.tables.entry(R::KIND).or_default().push(value);
    Ok(record)
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for FakeBackend {
    async fn list(&self, query: &ListQuery) -> Result<Page<R>, ApiError> {
        self.begin(R::KIND).await?;
        let state = self.state.lock().await;
        let matching: Vec<&Value> = state
            .tables
            .get(&R::KIND)
            .into_iter()
            .flatten()
            .filter(|row| {
                query
                    .search
                    .as_deref()
                    .is_none_or(|needle| matches_search(row, needle))
            })
            .collect();

        if query.page.is_none() && query.limit.is_none() {
            let data = matching.into_iter().map(decode).collect::<Result<_, _>>()?;
            return Ok(Page::from_items(data));
        }

        let total = matching.len() as i64;
        let limit = query.limit();
        let offset = query.offset();
        let data = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(decode)
            .collect::<Result<Vec<R>, _>>()?;

        Ok(Page {
            data,
            meta: Some(PaginationMeta {
                total,
                limit,
                offset: None,
                page: query.page_number(),
                has_more: offset + limit < total,
            }),
        })
    }

    async fn get(&self, id: &R::Id) -> Result<R, ApiError> {
        self.begin(R::KIND).await?;
        let state = self.state.lock().await;
        state
            .tables
            .get(&R::KIND)
            .and_then(|rows| rows.iter().find(|row| has_id(row, id.as_ref())))
            .ok_or_else(|| not_found(R::KIND))
            .and_then(decode)
    }

    async fn create(&self, dto: &R::Create) -> Result<R, ApiError> {
        self.begin(R::KIND).await?;
        dto.validate()?;
        let mut state = self.state.lock().await;
        insert_new::<R>(&mut state, dto)
    }

    async fn update(&self, id: &R::Id, patch: &R::Update) -> Result<R, ApiError> {
        self.begin(R::KIND).await?;
        patch.validate()?;
        let changes = object(serde_json::to_value(patch)?)?;

        let mut state = self.state.lock().await;
        let row = state
            .tables
            .get_mut(&R::KIND)
            .and_then(|rows| rows.iter_mut().find(|row| has_id(row, id.as_ref())))
            .ok_or_else(|| not_found(R::KIND))?;

        let mut merged = object(row.clone())?;
        merged.extend(changes);
        merged.insert(
            "updated_at".into(),
            Value::String(Utc::now().to_rfc3339()),
        );
        let merged = Value::Object(merged);
        let record: R = decode(&merged)?;
        *row = merged;
        Ok(record)
    }

    async fn delete(&self, id: &R::Id) -> Result<(), ApiError> {
        self.begin(R::KIND).await?;
        let mut state = self.state.lock().await;
        let rows = state.tables.entry(R::KIND).or_default();
        let before = rows.len();
        rows.retain(|row| !has_id(row, id.as_ref()));
        if rows.len() == before {
            return Err(not_found(R::KIND));
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceApi for FakeBackend {
    async fn list_by_class_session(
        &self,
        session_id: &ClassSessionId,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.scoped(
            ResourceKind::Attendance,
            "class_session_id",
            session_id.as_str(),
        )
        .await
    }

    async fn create_bulk(
        &self,
        session_id: &ClassSessionId,
        rows: &[BulkAttendanceRow],
    ) -> Result<BulkAttendanceResult, ApiError> {
        self.begin(ResourceKind::Attendance).await?;
        BulkAttendanceRequest {
            class_session_id: session_id.clone(),
            records: rows.to_vec(),
        }
        .validate()?;

        let mut state = self.state.lock().await;
        let mut result = BulkAttendanceResult::default();
        let now = Utc::now().to_rfc3339();

        for row in rows {
            if let Some(reason) = state.bulk_failures.get(&row.student_id) {
                result.errors.push(BulkRowError {
                    student_id: row.student_id.clone(),
                    reason: reason.clone(),
                });
                continue;
            }

            let table = state.tables.entry(ResourceKind::Attendance).or_default();
            let existing = table.iter_mut().find(|r| {
                field_eq(r, "class_session_id", session_id.as_str())
                    && field_eq(r, "student_id", row.student_id.as_str())
            });

            let value = match existing {
                Some(record) => {
                    let mut fields = object(record.clone())?;
                    fields.insert("status".into(), Value::String(row.status.to_string()));
                    fields.insert("comment".into(), Value::String(row.comment.clone()));
                    fields.insert("updated_at".into(), Value::String(now.clone()));
                    *record = Value::Object(fields);
                    record.clone()
                }
                None => {
                    let value = serde_json::json!({
                        "id": Uuid::new_v4().to_string(),
                        "class_session_id": session_id,
                        "student_id": row.student_id,
                        "status": row.status,
                        "comment": row.comment,
                        "created_at": now,
                        "updated_at": now,
                    });
                    table.push(value.clone());
                    value
                }
            };
            result.created.push(decode(&value)?);
        }

        Ok(result)
    }
}

#[async_trait]
impl EnrollmentApi for FakeBackend {
    async fn students_by_class(&self, class_id: &ClassId) -> Result<Vec<Student>, ApiError> {
        self.scoped(ResourceKind::Student, "class_id", class_id.as_str())
            .await
    }
}

#[async_trait]
impl ScopedListApi for FakeBackend {
    async fn sessions_by_class(&self, class_id: &ClassId) -> Result<Vec<ClassSession>, ApiError> {
        self.scoped(ResourceKind::ClassSession, "class_id", class_id.as_str())
            .await
    }

    async fn invoices_by_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<Invoice>, ApiError> {
        self.scoped(ResourceKind::Invoice, "student_id", student_id.as_str())
            .await
    }

    async fn students_by_parent(&self, parent_id: &ParentId) -> Result<Vec<Student>, ApiError> {
        self.scoped(ResourceKind::Student, "parent_id", parent_id.as_str())
            .await
    }
}
