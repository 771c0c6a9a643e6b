use super::{AttendanceStore, ClassSessionStore, ClassStore, InvoiceStore, ResourceStore, StudentStore};
use crate::notifications::Notifier;
use schoolbook_client::{AttendanceApi, Backend, EnrollmentApi, ResourceApi, ScopedListApi};
use schoolbook_config::StoreConfig;
use schoolbook_models::{AcademicYear, Grade, Parent, Resource, Schedule, Teacher};
use std::sync::Arc;

/// One store per resource kind, all sharing one backend and one notifier.
///
/// Build it once at startup and hand clones to whatever needs a store.
#[derive(Clone)]
pub struct Stores {
    pub teachers: ResourceStore<Teacher>,
    pub students: StudentStore,
    pub parents: ResourceStore<Parent>,
    pub classes: ClassStore,
    pub schedules: ResourceStore<Schedule>,
    pub class_sessions: ClassSessionStore,
    pub attendance: AttendanceStore,
    pub invoices: InvoiceStore,
    pub academic_years: ResourceStore<AcademicYear>,
    pub grades: ResourceStore<Grade>,
}

impl Stores {
    pub fn new<B: Backend>(backend: Arc<B>, notifier: Arc<dyn Notifier>, config: &StoreConfig) -> Self {
        let scoped: Arc<dyn ScopedListApi> = backend.clone();
        let enrollment: Arc<dyn EnrollmentApi> = backend.clone();
        let attendance: Arc<dyn AttendanceApi> = backend.clone();

        Self {
            teachers: store(&backend, &notifier, config),
            students: StudentStore::new(store(&backend, &notifier, config), scoped.clone()),
            parents: store(&backend, &notifier, config),
            classes: ClassStore::new(store(&backend, &notifier, config), enrollment),
            schedules: store(&backend, &notifier, config),
            class_sessions: ClassSessionStore::new(
                store(&backend, &notifier, config),
                scoped.clone(),
            ),
            attendance: AttendanceStore::new(store(&backend, &notifier, config), attendance),
            invoices: InvoiceStore::new(store(&backend, &notifier, config), scoped),
            academic_years: store(&backend, &notifier, config),
            grades: store(&backend, &notifier, config),
        }
    }
}

fn store<R, B>(backend: &Arc<B>, notifier: &Arc<dyn Notifier>, config: &StoreConfig) -> ResourceStore<R>
where
    R: Resource,
    B: ResourceApi<R> + 'static,
{
    let api: Arc<dyn ResourceApi<R>> = backend.clone();
    ResourceStore::new(api, Arc::clone(notifier), config)
}
