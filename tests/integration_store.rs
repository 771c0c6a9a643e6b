mod common;

use common::{
    seed_class, seed_invoice, seed_parent, seed_session, seed_student, setup, wait_for_calls,
};
use schoolbook_core::{ApiError, ErrorKind, ListQuery};
use schoolbook_models::{
    AttendanceStatus, BulkAttendanceRow, ClassId, CreateTeacherDto, ResourceKind, StudentId,
    UpdateStudentDto,
};
use std::collections::HashSet;
use std::sync::Arc;

fn teacher_dto(email: &str) -> CreateTeacherDto {
    CreateTeacherDto {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: email.to_string(),
        phone: None,
        subject: Some("Mathematics".to_string()),
        hire_date: None,
    }
}

#[tokio::test]
async fn test_list_has_no_duplicate_ids() {
    let env = setup();
    let class = seed_class(&env.backend, "5A").await;
    for _ in 0..4 {
        seed_student(&env.backend, Some(&class.id), None).await;
    }

    let students = env.stores.students.list(ListQuery::all()).await.unwrap();
    let created = env
        .stores
        .students
        .create(schoolbook_models::CreateStudentDto {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: None,
            date_of_birth: None,
            gender: None,
            class_id: None,
            parent_id: None,
        })
        .await
        .unwrap();
    env.stores.students.list(ListQuery::all()).await.unwrap();

    let items = env.stores.students.items();
    let ids: HashSet<_> = items.iter().map(|s| s.id.clone()).collect();
    assert_eq!(students.len(), 4);
    assert_eq!(items.len(), 5);
    assert_eq!(ids.len(), items.len());
    assert_eq!(items.last().map(|s| &s.id), Some(&created.id));
}

#[tokio::test]
async fn test_failures_leave_cache_untouched() {
    let env = setup();
    let store = &env.stores.teachers;
    let teacher = store.create(teacher_dto("grace@example.com")).await.unwrap();
    let before = store.items();

    env.backend
        .fail_next(ResourceKind::Teacher, ApiError::transport("connection refused"))
        .await;
    assert!(store.list(ListQuery::all()).await.is_none());
    assert!(Arc::ptr_eq(&before, &store.items()));

    env.backend
        .fail_next(ResourceKind::Teacher, ApiError::from_status(409, "Teacher was modified"))
        .await;
    assert!(!store.delete(&teacher.id).await);
    assert!(Arc::ptr_eq(&before, &store.items()));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.error.as_deref(), Some("Teacher was modified"));
    assert_eq!(snapshot.error_kind, Some(ErrorKind::Conflict));
    assert!(!snapshot.loading);

    let errors = env.notifier.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].message, "connection refused");
}

#[tokio::test]
async fn test_create_with_invalid_email_issues_no_request() {
    let env = setup();

    let created = env.stores.teachers.create(teacher_dto("not-an-email")).await;

    assert!(created.is_none());
    assert_eq!(env.backend.call_count(), 0);
    assert_eq!(
        env.stores.teachers.snapshot().error_kind,
        Some(ErrorKind::Validation)
    );
}

#[tokio::test]
async fn test_selection_independent_of_collection() {
    let env = setup();
    let store = &env.stores.students;
    let first = seed_student(&env.backend, None, None).await;
    let second = seed_student(&env.backend, None, None).await;

    store.get_by_id(&first.id).await.unwrap();
    assert_eq!(store.current().map(|s| s.id), Some(first.id.clone()));
    assert!(store.items().is_empty());

    store.list(ListQuery::all()).await.unwrap();
    assert_eq!(store.current().map(|s| s.id), Some(first.id.clone()));

    let patch = UpdateStudentDto {
        first_name: Some("Renamed".to_string()),
        ..UpdateStudentDto::default()
    };
    store.update(&second.id, patch.clone()).await.unwrap();
    assert_eq!(store.current().unwrap().first_name, first.first_name);

    store.update(&first.id, patch).await.unwrap();
    assert_eq!(store.current().unwrap().first_name, "Renamed");
    assert_eq!(store.find(&first.id).unwrap().first_name, "Renamed");
}

#[tokio::test]
async fn test_get_missing_keeps_current() {
    let env = setup();
    let store = &env.stores.students;
    let student = seed_student(&env.backend, None, None).await;
    store.get_by_id(&student.id).await.unwrap();

    assert!(store.get_by_id(&StudentId::from("missing")).await.is_none());

    assert_eq!(store.current().map(|s| s.id), Some(student.id));
    assert_eq!(store.error().as_deref(), Some("Student not found"));
}

#[tokio::test]
async fn test_loading_brackets_concurrent_actions() {
    let env = setup();
    let store = env.stores.teachers.clone();
    let base = env.backend.call_count();
    let gate = env.backend.hold().await;

    let first = tokio::spawn({
        let store = store.clone();
        async move { store.list(ListQuery::all()).await }
    });
    let second = tokio::spawn({
        let store = store.clone();
        async move { store.create(teacher_dto("grace@example.com")).await }
    });
    wait_for_calls(&env.backend, base + 2).await;
    assert!(store.is_loading());

    gate.release(1);
    first.await.unwrap().unwrap();
    assert!(store.is_loading());

    gate.release(1);
    second.await.unwrap().unwrap();
    assert!(!store.is_loading());
    assert_eq!(store.items().len(), 1);
}

#[tokio::test]
async fn test_mutations_notify_success_but_reads_do_not() {
    let env = setup();
    let store = &env.stores.teachers;

    let teacher = store.create(teacher_dto("grace@example.com")).await.unwrap();
    store.list(ListQuery::all()).await.unwrap();
    store.get_by_id(&teacher.id).await.unwrap();
    assert!(store.delete(&teacher.id).await);

    let messages: Vec<String> = env
        .notifier
        .successes()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(
        messages,
        vec!["Teacher created successfully", "Teacher deleted successfully"]
    );
}

#[tokio::test]
async fn test_scoped_lists_replace_collection() {
    let env = setup();
    let class_a = seed_class(&env.backend, "5A").await;
    let class_b = seed_class(&env.backend, "5B").await;
    seed_session(&env.backend, &class_a.id, "Fractions").await;
    seed_session(&env.backend, &class_a.id, "Decimals").await;
    seed_session(&env.backend, &class_b.id, "Poetry").await;

    env.stores
        .class_sessions
        .list(ListQuery::all())
        .await
        .unwrap();
    assert_eq!(env.stores.class_sessions.items().len(), 3);

    let sessions = env
        .stores
        .class_sessions
        .list_by_class(&class_a.id)
        .await
        .unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.class_id == class_a.id));
    assert!(Arc::ptr_eq(&sessions, &env.stores.class_sessions.items()));
}

#[tokio::test]
async fn test_invoices_and_children_lookups() {
    let env = setup();
    let parent = seed_parent(&env.backend).await;
    let child = seed_student(&env.backend, None, Some(&parent.id)).await;
    let other = seed_student(&env.backend, None, None).await;
    seed_invoice(&env.backend, &child.id, 125_00).await;
    seed_invoice(&env.backend, &other.id, 80_00).await;

    let children = env
        .stores
        .students
        .list_by_parent(&parent.id)
        .await
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, child.id);

    let invoices = env
        .stores
        .invoices
        .list_by_student(&child.id)
        .await
        .unwrap();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].display_amount(), "125.00 USD");
}

#[tokio::test]
async fn test_students_by_class_leaves_class_collection() {
    let env = setup();
    let class = seed_class(&env.backend, "5A").await;
    seed_student(&env.backend, Some(&class.id), None).await;
    seed_student(&env.backend, Some(&class.id), None).await;
    seed_student(&env.backend, None, None).await;

    env.stores.classes.list(ListQuery::all()).await.unwrap();
    let classes = env.stores.classes.items();

    let enrolled = env
        .stores
        .classes
        .students_by_class(&class.id)
        .await
        .unwrap();

    assert_eq!(enrolled.len(), 2);
    assert!(Arc::ptr_eq(&classes, &env.stores.classes.items()));
    assert!(env.notifier.successes().is_empty());
}

#[tokio::test]
async fn test_students_by_class_failure_reports_error() {
    let env = setup();
    env.backend
        .fail_next(ResourceKind::Student, ApiError::from_status(500, "boom"))
        .await;

    let enrolled = env
        .stores
        .classes
        .students_by_class(&ClassId::from("c-1"))
        .await;

    assert!(enrolled.is_none());
    assert_eq!(env.stores.classes.error().as_deref(), Some("boom"));
    assert_eq!(env.notifier.errors()[0].resource, ResourceKind::Class);
}

#[tokio::test]
async fn test_partial_bulk_write_is_not_success() {
    let env = setup();
    let class = seed_class(&env.backend, "5A").await;
    let session = seed_session(&env.backend, &class.id, "Fractions").await;
    let s1 = seed_student(&env.backend, Some(&class.id), None).await;
    let s2 = seed_student(&env.backend, Some(&class.id), None).await;
    env.backend.fail_student(&s2.id, "student withdrawn").await;

    let rows = vec![
        BulkAttendanceRow {
            student_id: s1.id.clone(),
            status: AttendanceStatus::Present,
            comment: String::new(),
        },
        BulkAttendanceRow {
            student_id: s2.id.clone(),
            status: AttendanceStatus::Absent,
            comment: "sick".to_string(),
        },
    ];
    let result = env
        .stores
        .attendance
        .create_bulk(&session.id, rows)
        .await
        .unwrap();

    assert_eq!(result.created.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].student_id, s2.id);

    let snapshot = env.stores.attendance.snapshot();
    assert_eq!(snapshot.error_kind, Some(ErrorKind::PartialBulk));
    assert_eq!(snapshot.len(), 1);
    assert!(env.notifier.successes().is_empty());
    assert_eq!(env.notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_bulk_rewrite_keeps_one_record_per_student() {
    let env = setup();
    let class = seed_class(&env.backend, "5A").await;
    let session = seed_session(&env.backend, &class.id, "Fractions").await;
    let student = seed_student(&env.backend, Some(&class.id), None).await;
    let row = |status| BulkAttendanceRow {
        student_id: student.id.clone(),
        status,
        comment: String::new(),
    };

    let attendance = &env.stores.attendance;
    attendance
        .create_bulk(&session.id, vec![row(AttendanceStatus::Absent)])
        .await
        .unwrap();
    attendance
        .create_bulk(&session.id, vec![row(AttendanceStatus::Late)])
        .await
        .unwrap();

    let items = attendance.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, AttendanceStatus::Late);

    let persisted = attendance.list_by_class_session(&session.id).await.unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(
        env.notifier.successes()[0].message,
        "Attendance saved successfully"
    );
}

#[tokio::test]
async fn test_empty_bulk_write_is_rejected_locally() {
    let env = setup();

    let result = env
        .stores
        .attendance
        .create_bulk(&schoolbook_models::ClassSessionId::from("cs-1"), Vec::new())
        .await;

    assert!(result.is_none());
    assert_eq!(env.backend.call_count(), 0);
    assert_eq!(
        env.stores.attendance.snapshot().error_kind,
        Some(ErrorKind::Validation)
    );
}
