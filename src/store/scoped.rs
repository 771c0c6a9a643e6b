//! Stores whose collection can be narrowed to one parent entity.

use super::Action;
use super::resource::ResourceStore;
use schoolbook_client::ScopedListApi;
use schoolbook_models::{ClassId, ClassSession, Invoice, ParentId, Student, StudentId};
use std::ops::Deref;
use std::sync::Arc;
use tracing::instrument;

macro_rules! scoped_store {
    ($(#[$meta:meta])* $name:ident, $resource:ty) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            store: ResourceStore<$resource>,
            api: Arc<dyn ScopedListApi>,
        }

        impl $name {
            pub fn new(store: ResourceStore<$resource>, api: Arc<dyn ScopedListApi>) -> Self {
                Self { store, api }
            }
        }

        impl Deref for $name {
            type Target = ResourceStore<$resource>;

            fn deref(&self) -> &Self::Target {
                &self.store
            }
        }
    };
}

scoped_store!(
    /// Class sessions, optionally narrowed to one class.
    ClassSessionStore,
    ClassSession
);

scoped_store!(
    /// Invoices, optionally narrowed to one student.
    InvoiceStore,
    Invoice
);

scoped_store!(
    /// Students, optionally narrowed to the children of one parent.
    StudentStore,
    Student
);

impl ClassSessionStore {
    #[instrument(skip(self))]
    pub async fn list_by_class(&self, class_id: &ClassId) -> Option<Arc<Vec<ClassSession>>> {
        let api = Arc::clone(&self.api);
        let class_id = class_id.clone();
        self.store
            .run(
                Action::List,
                async move { api.sessions_by_class(&class_id).await },
                |s, sessions: Vec<ClassSession>| {
                    s.replace_items(sessions, None);
                    Arc::clone(&s.items)
                },
            )
            .await
    }
}

impl InvoiceStore {
    #[instrument(skip(self))]
    pub async fn list_by_student(&self, student_id: &StudentId) -> Option<Arc<Vec<Invoice>>> {
        let api = Arc::clone(&self.api);
        let student_id = student_id.clone();
        self.store
            .run(
                Action::List,
                async move { api.invoices_by_student(&student_id).await },
                |s, invoices: Vec<Invoice>| {
                    s.replace_items(invoices, None);
                    Arc::clone(&s.items)
                },
            )
            .await
    }
}

impl StudentStore {
    #[instrument(skip(self))]
    pub async fn list_by_parent(&self, parent_id: &ParentId) -> Option<Arc<Vec<Student>>> {
        let api = Arc::clone(&self.api);
        let parent_id = parent_id.clone();
        self.store
            .run(
                Action::List,
                async move { api.students_by_parent(&parent_id).await },
                |s, students: Vec<Student>| {
                    s.replace_items(students, None);
                    Arc::clone(&s.items)
                },
            )
            .await
    }
}
