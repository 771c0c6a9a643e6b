use super::Action;
use super::resource::ResourceStore;
use schoolbook_client::EnrollmentApi;
use schoolbook_core::ApiError;
use schoolbook_models::{Class, ClassId, Student};
use std::ops::Deref;
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone)]
pub struct ClassStore {
    store: ResourceStore<Class>,
    enrollment: Arc<dyn EnrollmentApi>,
}

impl ClassStore {
    pub fn new(store: ResourceStore<Class>, enrollment: Arc<dyn EnrollmentApi>) -> Self {
        Self { store, enrollment }
    }

    /// Students enrolled in `class_id`.
    ///
    /// Reported through the class store's loading and error state, but the
    /// class collection itself is left alone.
    pub async fn students_by_class(&self, class_id: &ClassId) -> Option<Vec<Student>> {
        self.try_students_by_class(class_id).await.ok()
    }

    #[instrument(skip(self))]
    pub async fn try_students_by_class(&self, class_id: &ClassId) -> Result<Vec<Student>, ApiError> {
        let api = Arc::clone(&self.enrollment);
        let class_id = class_id.clone();
        self.store
            .try_run(
                Action::Lookup,
                async move { api.students_by_class(&class_id).await },
                |_, students: Vec<Student>| students,
            )
            .await
    }
}

impl Deref for ClassStore {
    type Target = ResourceStore<Class>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}
