use super::draft::AttendanceDraft;
use crate::metrics::track_roll_call_save;
use crate::store::{AttendanceStore, ClassStore};
use schoolbook_models::{
    AttendanceRecord, AttendanceStatus, BulkAttendanceRow, BulkRowError, ClassId, ClassSessionId,
    Student, StudentId,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Draft holds enrollment defaults; saving is disabled.
    NoSession,
    /// Persisted attendance for the selected session is being fetched.
    Loading,
    Loaded,
    /// The fetch failed; `reload` retries it.
    LoadFailed,
}

#[derive(Debug, Clone)]
pub struct RollCallState {
    pub phase: Phase,
    pub class_id: Option<ClassId>,
    pub session_id: Option<ClassSessionId>,
    pub students: Arc<Vec<Student>>,
    pub draft: AttendanceDraft,
    pub saving: bool,
    /// Rows rejected by the last save, until they are saved successfully.
    pub failed: Vec<BulkRowError>,
    pub error: Option<String>,
}

impl Default for RollCallState {
    fn default() -> Self {
        Self {
            phase: Phase::NoSession,
            class_id: None,
            session_id: None,
            students: Arc::new(Vec::new()),
            draft: AttendanceDraft::default(),
            saving: false,
            failed: Vec::new(),
            error: None,
        }
    }
}

impl RollCallState {
    pub fn can_save(&self) -> bool {
        self.phase == Phase::Loaded && !self.saving && !self.draft.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSwitch {
    Clean,
    /// The previous session had this many unsaved edits; they are gone.
    DiscardedEdits(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { saved: usize },
    Partial { saved: usize, failed: Vec<BulkRowError> },
}

impl SaveOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RollCallError {
    #[error("No class session selected")]
    NoSession,
    #[error("Attendance for this session is not loaded yet")]
    NotReady,
    #[error("A save is already in progress")]
    SaveInFlight,
    #[error("There are no enrolled students to save")]
    EmptyDraft,
    #[error("There are no failed rows to retry")]
    NothingToRetry,
    #[error("Student {0} is not enrolled in this class")]
    NotEnrolled(StudentId),
    #[error("Roll call has been closed")]
    Closed,
    #[error("{0}")]
    Request(String),
}

struct Inner {
    attendance: AttendanceStore,
    classes: ClassStore,
    state: watch::Sender<RollCallState>,
    generation: AtomicU64,
    closed: AtomicBool,
}

/// Drives the roll call of one class.
///
/// Every session selection bumps a generation counter; fetch results that
/// arrive for an older generation (or after [`close`](Self::close)) are
/// dropped instead of being merged into the draft.
#[derive(Clone)]
pub struct RollCallController {
    inner: Arc<Inner>,
}

impl RollCallController {
    pub fn new(attendance: AttendanceStore, classes: ClassStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                attendance,
                classes,
                state: watch::Sender::new(RollCallState::default()),
                generation: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn state(&self) -> RollCallState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RollCallState> {
        self.inner.state.subscribe()
    }

    pub fn pending_edits(&self) -> usize {
        self.inner.state.borrow().draft.dirty_count()
    }

    /// Loads the enrolled students of `class_id` and fits the draft to them.
    #[instrument(skip(self))]
    pub async fn load_enrolled(&self, class_id: &ClassId) -> Result<usize, RollCallError> {
        self.ensure_open()?;
        self.inner
            .state
            .send_modify(|s| s.class_id = Some(class_id.clone()));

        let students = self.inner.classes.try_students_by_class(class_id).await;
        self.ensure_open()?;
        let students = students.map_err(|e| RollCallError::Request(e.message))?;

        let mut applied = false;
        self.inner.state.send_modify(|s| {
            if s.class_id.as_ref() != Some(class_id) {
                return;
            }
            s.draft.sync_enrolled(&students);
            s.students = Arc::new(students);
            applied = true;
        });
        if !applied {
            debug!("Discarding enrollment for a class that is no longer selected");
        }
        Ok(self.inner.state.borrow().draft.len())
    }

    /// Switches to `session_id`: resets the draft to enrollment defaults and
    /// fetches the persisted attendance of the new session.
    ///
    /// Unsaved edits of the previous session are discarded and counted in
    /// the returned [`SessionSwitch`]; check [`pending_edits`](Self::pending_edits)
    /// first to warn about them.
    #[instrument(skip(self))]
    pub async fn select_session(
        &self,
        session_id: &ClassSessionId,
    ) -> Result<SessionSwitch, RollCallError> {
        self.ensure_open()?;
        let ticket = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut discarded = 0;
        self.inner.state.send_modify(|s| {
            discarded = s.draft.dirty_count();
            s.draft = AttendanceDraft::from_enrolled(&s.students);
            s.session_id = Some(session_id.clone());
            s.phase = Phase::Loading;
            s.failed.clear();
            s.error = None;
        });
        if discarded > 0 {
            warn!(discarded, "Unsaved roll-call edits discarded on session switch");
        }

        self.fetch_session(ticket, session_id).await;

        Ok(match discarded {
            0 => SessionSwitch::Clean,
            n => SessionSwitch::DiscardedEdits(n),
        })
    }

    /// Re-fetches the persisted attendance of the selected session.
    pub async fn reload(&self) -> Result<(), RollCallError> {
        self.ensure_open()?;
        let session_id = self.selected_session()?;
        let ticket = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_modify(|s| {
            s.phase = Phase::Loading;
            s.error = None;
        });
        self.fetch_session(ticket, &session_id).await;
        Ok(())
    }

    /// Edits stay local until the next save. While a save is in flight
    /// they are refused with [`RollCallError::SaveInFlight`].
    pub fn set_status(
        &self,
        student_id: &StudentId,
        status: AttendanceStatus,
    ) -> Result<(), RollCallError> {
        self.edit(student_id, |draft| draft.set_status(student_id, status))
    }

    pub fn set_comment(
        &self,
        student_id: &StudentId,
        comment: impl Into<String>,
    ) -> Result<(), RollCallError> {
        let comment = comment.into();
        self.edit(student_id, move |draft| draft.set_comment(student_id, comment))
    }

    /// Submits the whole draft as one bulk write.
    #[instrument(skip(self))]
    pub async fn save(&self) -> Result<SaveOutcome, RollCallError> {
        self.submit(|s| Ok(s.draft.to_bulk_rows())).await
    }

    /// Resubmits only the rows the last save reported as failed.
    #[instrument(skip(self))]
    pub async fn retry_failed(&self) -> Result<SaveOutcome, RollCallError> {
        self.submit(|s| {
            if s.failed.is_empty() {
                return Err(RollCallError::NothingToRetry);
            }
            let failed: HashSet<&StudentId> = s.failed.iter().map(|e| &e.student_id).collect();
            Ok(s.draft.rows_for(&failed))
        })
        .await
    }

    /// Stops applying results. Requests already in flight still complete
    /// at the backend, but their effects on this controller are dropped.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    async fn submit<F>(&self, rows_of: F) -> Result<SaveOutcome, RollCallError>
    where
        F: FnOnce(&RollCallState) -> Result<Vec<BulkAttendanceRow>, RollCallError>,
    {
        self.ensure_open()?;
        let ticket = self.inner.generation.load(Ordering::SeqCst);

        let mut prepared = Err(RollCallError::NoSession);
        self.inner.state.send_modify(|s| {
            prepared = check_can_save(s).and_then(|session_id| {
                let rows = rows_of(&*s)?;
                if rows.is_empty() {
                    return Err(RollCallError::EmptyDraft);
                }
                s.saving = true;
                Ok((session_id, rows))
            });
        });
        let (session_id, rows) = prepared?;
        let submitted = rows.len();
        let saving = SavingFlag(Some(&self.inner.state));

        let result = self.inner.attendance.try_create_bulk(&session_id, rows).await;
        saving.disarm();

        let result = match result {
            Ok(result) => result,
            Err(err) => {
                track_roll_call_save("failed", submitted);
                return Err(self.save_failed(ticket, err.message));
            }
        };

        let saved = result.created.len();
        if result.is_complete() {
            track_roll_call_save("complete", submitted);
            info!(session = %session_id, saved, "Roll call saved");
            let current = self.is_current(ticket);
            self.inner.state.send_modify(|s| {
                s.saving = false;
                if current {
                    s.draft.mark_clean();
                    s.failed.clear();
                    s.error = None;
                }
            });
            if current {
                self.fetch_session(ticket, &session_id).await;
            }
            return Ok(SaveOutcome::Saved { saved });
        }

        track_roll_call_save("partial", submitted);
        warn!(
            session = %session_id,
            saved,
            failed = result.errors.len(),
            "Roll call partially saved"
        );
        let current = self.is_current(ticket);
        let summary = result.failure_summary();
        self.inner.state.send_modify(|s| {
            s.saving = false;
            if current {
                s.draft.mark_saved_except(&result.failed_students());
                s.failed = result.errors.clone();
                s.error = Some(summary);
            }
        });
        Ok(SaveOutcome::Partial {
            saved,
            failed: result.errors,
        })
    }

    fn save_failed(&self, ticket: u64, message: String) -> RollCallError {
        let current = self.is_current(ticket);
        self.inner.state.send_modify(|s| {
            s.saving = false;
            if current {
                s.error = Some(message.clone());
            }
        });
        RollCallError::Request(message)
    }

    async fn fetch_session(&self, ticket: u64, session_id: &ClassSessionId) {
        let records = self
            .inner
            .attendance
            .try_list_by_class_session(session_id)
            .await;
        if !self.is_current(ticket) {
            debug!(session = %session_id, "Discarding stale attendance fetch");
            return;
        }

        match records {
            Ok(records) => self.apply_persisted(session_id, &records),
            Err(err) => {
                self.inner.state.send_modify(|s| {
                    s.phase = Phase::LoadFailed;
                    s.error = Some(err.message);
                });
            }
        }
    }

    fn apply_persisted(&self, session_id: &ClassSessionId, records: &[AttendanceRecord]) {
        self.inner.state.send_modify(|s| {
            s.draft.reconcile(session_id, records);
            s.phase = Phase::Loaded;
        });
    }

    fn edit<F>(&self, student_id: &StudentId, apply: F) -> Result<(), RollCallError>
    where
        F: FnOnce(&mut AttendanceDraft) -> bool,
    {
        self.ensure_open()?;
        let mut outcome = Ok(());
        self.inner.state.send_modify(|s| {
            outcome = if s.saving {
                Err(RollCallError::SaveInFlight)
            } else if apply(&mut s.draft) {
                Ok(())
            } else {
                Err(RollCallError::NotEnrolled(student_id.clone()))
            };
        });
        outcome
    }

    fn selected_session(&self) -> Result<ClassSessionId, RollCallError> {
        self.inner
            .state
            .borrow()
            .session_id
            .clone()
            .ok_or(RollCallError::NoSession)
    }

    fn is_current(&self, ticket: u64) -> bool {
        !self.is_closed() && self.inner.generation.load(Ordering::SeqCst) == ticket
    }

    fn ensure_open(&self) -> Result<(), RollCallError> {
        if self.is_closed() {
            Err(RollCallError::Closed)
        } else {
            Ok(())
        }
    }
}

/// Clears `saving` if the save future is dropped before the bulk request
/// returns.
struct SavingFlag<'a>(Option<&'a watch::Sender<RollCallState>>);

impl SavingFlag<'_> {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for SavingFlag<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.0 {
            state.send_if_modified(|s| std::mem::replace(&mut s.saving, false));
        }
    }
}

fn check_can_save(state: &RollCallState) -> Result<ClassSessionId, RollCallError> {
    let session_id = state.session_id.clone().ok_or(RollCallError::NoSession)?;
    if state.saving {
        return Err(RollCallError::SaveInFlight);
    }
    if state.phase != Phase::Loaded {
        return Err(RollCallError::NotReady);
    }
    if state.draft.is_empty() {
        return Err(RollCallError::EmptyDraft);
    }
    Ok(session_id)
}
