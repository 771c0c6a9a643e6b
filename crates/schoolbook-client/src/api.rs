//! Backend API contracts.
//!
//! The stores never talk HTTP directly; they hold trait objects for these
//! contracts. [`HttpBackend`](crate::HttpBackend) implements them against the
//! REST service and [`FakeBackend`](crate::fake::FakeBackend) in memory.

use async_trait::async_trait;
use schoolbook_core::{ApiError, ListQuery, Page};
use schoolbook_models::{
    AcademicYear, AttendanceRecord, BulkAttendanceResult, BulkAttendanceRow, Class, ClassId,
    ClassSession, ClassSessionId, Grade, Invoice, Parent, ParentId, Resource, Schedule, Student,
    StudentId, Teacher,
};

/// CRUD operations on one resource collection.
#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Page<R>, ApiError>;

    /// Fails with [`ErrorKind::NotFound`](schoolbook_core::ErrorKind::NotFound) if absent.
    async fn get(&self, id: &R::Id) -> Result<R, ApiError>;

    /// Fails with [`ErrorKind::Validation`](schoolbook_core::ErrorKind::Validation) on bad input.
    async fn create(&self, dto: &R::Create) -> Result<R, ApiError>;

    async fn update(&self, id: &R::Id, patch: &R::Update) -> Result<R, ApiError>;

    async fn delete(&self, id: &R::Id) -> Result<(), ApiError>;
}

/// Attendance operations beyond plain CRUD.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    /// Persisted records of one session; empty until a roll call was saved.
    async fn list_by_class_session(
        &self,
        session_id: &ClassSessionId,
    ) -> Result<Vec<AttendanceRecord>, ApiError>;

    /// Writes all rows in one request. Row-level rejections are reported in
    /// the result, not as an `Err`.
    async fn create_bulk(
        &self,
        session_id: &ClassSessionId,
        rows: &[BulkAttendanceRow],
    ) -> Result<BulkAttendanceResult, ApiError>;
}

#[async_trait]
pub trait EnrollmentApi: Send + Sync {
    async fn students_by_class(&self, class_id: &ClassId) -> Result<Vec<Student>, ApiError>;
}

/// Collections filtered by a parent entity.
#[async_trait]
pub trait ScopedListApi: Send + Sync {
    async fn sessions_by_class(&self, class_id: &ClassId) -> Result<Vec<ClassSession>, ApiError>;

    async fn invoices_by_student(&self, student_id: &StudentId)
    -> Result<Vec<Invoice>, ApiError>;

    async fn students_by_parent(&self, parent_id: &ParentId) -> Result<Vec<Student>, ApiError>;
}

/// Everything the stores need from a backend.
pub trait Backend:
    ResourceApi<Teacher>
    + ResourceApi<Student>
    + ResourceApi<Parent>
    + ResourceApi<Class>
    + ResourceApi<Schedule>
    + ResourceApi<ClassSession>
    + ResourceApi<AttendanceRecord>
    + ResourceApi<Invoice>
    + ResourceApi<AcademicYear>
    + ResourceApi<Grade>
    + AttendanceApi
    + EnrollmentApi
    + ScopedListApi
    + 'static
{
}

impl<T> Backend for T where
    T: ResourceApi<Teacher>
        + ResourceApi<Student>
        + ResourceApi<Parent>
        + ResourceApi<Class>
        + ResourceApi<Schedule>
        + ResourceApi<ClassSession>
        + ResourceApi<AttendanceRecord>
        + ResourceApi<Invoice>
        + ResourceApi<AcademicYear>
        + ResourceApi<Grade>
        + AttendanceApi
        + EnrollmentApi
        + ScopedListApi
        + 'static
{
}
