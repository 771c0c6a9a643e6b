#![allow(dead_code)]

use chrono::Utc;
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use schoolbook::notifications::MemoryNotifier;
use schoolbook::store::Stores;
use schoolbook_client::fake::FakeBackend;
use schoolbook_config::StoreConfig;
use schoolbook_models::{
    AcademicYearId, AttendanceId, AttendanceRecord, AttendanceStatus, Class, ClassId,
    ClassSession, ClassSessionId, CreateClassDto, CreateClassSessionDto, CreateInvoiceDto,
    CreateParentDto, CreateStudentDto, GradeId, Invoice, Parent, ParentId, Student, StudentId,
};
use std::sync::Arc;
use std::time::Duration;

pub struct TestEnv {
    pub backend: Arc<FakeBackend>,
    pub notifier: Arc<MemoryNotifier>,
    pub stores: Stores,
}

pub fn setup() -> TestEnv {
    let backend = FakeBackend::new();
    let notifier = Arc::new(MemoryNotifier::new());
    let config = StoreConfig {
        page_limit: 10,
        search_debounce: Duration::from_millis(50),
    };
    let stores = Stores::new(backend.clone(), notifier.clone(), &config);
    TestEnv {
        backend,
        notifier,
        stores,
    }
}

pub async fn seed_class(backend: &FakeBackend, name: &str) -> Class {
    backend
        .seed::<Class>(CreateClassDto {
            name: name.to_string(),
            grade_id: GradeId::from("g-5"),
            academic_year_id: AcademicYearId::from("ay-2024"),
            homeroom_teacher_id: None,
            capacity: Some(30),
            room: None,
        })
        .await
        .unwrap()
}

pub async fn seed_student(
    backend: &FakeBackend,
    class_id: Option<&ClassId>,
    parent_id: Option<&ParentId>,
) -> Student {
    backend
        .seed::<Student>(CreateStudentDto {
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            email: None,
            date_of_birth: None,
            gender: None,
            class_id: class_id.cloned(),
            parent_id: parent_id.cloned(),
        })
        .await
        .unwrap()
}

pub async fn seed_parent(backend: &FakeBackend) -> Parent {
    backend
        .seed::<Parent>(CreateParentDto {
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            email: SafeEmail().fake(),
            phone: None,
            address: None,
            relationship: Some("Guardian".to_string()),
        })
        .await
        .unwrap()
}

pub async fn seed_session(backend: &FakeBackend, class_id: &ClassId, topic: &str) -> ClassSession {
    backend
        .seed::<ClassSession>(CreateClassSessionDto {
            class_id: class_id.clone(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            start_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: chrono::NaiveTime::from_hms_opt(9, 45, 0).unwrap(),
            topic: Some(topic.to_string()),
            note: None,
            status: None,
        })
        .await
        .unwrap()
}

pub async fn seed_invoice(backend: &FakeBackend, student_id: &StudentId, amount: i64) -> Invoice {
    backend
        .seed::<Invoice>(CreateInvoiceDto {
            student_id: student_id.clone(),
            amount,
            currency: "USD".to_string(),
            due_date: chrono::NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            status: None,
            description: None,
        })
        .await
        .unwrap()
}

/// Stores a persisted attendance record without going through a bulk save.
pub async fn seed_attendance(
    backend: &FakeBackend,
    session_id: &ClassSessionId,
    student_id: &StudentId,
    status: AttendanceStatus,
    comment: &str,
) -> AttendanceRecord {
    let record = AttendanceRecord {
        id: AttendanceId::new(uuid::Uuid::new_v4().to_string()),
        class_session_id: session_id.clone(),
        student_id: student_id.clone(),
        status,
        comment: (!comment.is_empty()).then(|| comment.to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    backend.insert(record.clone()).await.unwrap();
    record
}

/// Yields until the backend has received `n` calls in total.
pub async fn wait_for_calls(backend: &FakeBackend, n: u64) {
    while backend.call_count() < n {
        tokio::task::yield_now().await;
    }
}
