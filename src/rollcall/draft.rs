//! The attendance draft of one class session.
//!
//! A draft always holds exactly one entry per enrolled student, in
//! enrollment order. Entries start as PRESENT with an empty comment, take
//! persisted values on reconciliation, and remember whether the user edited
//! them so a late reconciliation never overwrites an edit.

use schoolbook_models::{
    AttendanceRecord, AttendanceStatus, BulkAttendanceRow, ClassSessionId, Student, StudentId,
};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEntry {
    pub student_id: StudentId,
    pub status: AttendanceStatus,
    pub comment: String,
    edited: bool,
}

impl DraftEntry {
    fn new(student_id: StudentId) -> Self {
        Self {
            student_id,
            status: AttendanceStatus::Present,
            comment: String::new(),
            edited: false,
        }
    }

    pub fn is_edited(&self) -> bool {
        self.edited
    }

    fn reset(&mut self) {
        self.status = AttendanceStatus::Present;
        self.comment.clear();
    }

    fn to_row(&self) -> BulkAttendanceRow {
        BulkAttendanceRow {
            student_id: self.student_id.clone(),
            status: self.status,
            comment: self.comment.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceDraft {
    entries: Vec<DraftEntry>,
}

impl AttendanceDraft {
    /// A default entry for every enrolled student. Duplicate students are
    /// listed once.
    pub fn from_enrolled(students: &[Student]) -> Self {
        let mut draft = Self::default();
        draft.sync_enrolled(students);
        draft
    }

    pub fn entries(&self) -> &[DraftEntry] {
        &self.entries
    }

    pub fn get(&self, student_id: &StudentId) -> Option<&DraftEntry> {
        self.entries.iter().find(|e| &e.student_id == student_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrites every unedited entry with the persisted record for its
    /// student in `session_id`, or with the default when there is none.
    ///
    /// Records of other sessions and of students who are not enrolled are
    /// ignored. Applying the same records twice gives the same draft.
    pub fn reconcile(&mut self, session_id: &ClassSessionId, persisted: &[AttendanceRecord]) {
        for entry in self.entries.iter_mut().filter(|e| !e.edited) {
            let record = persisted
                .iter()
                .find(|r| &r.class_session_id == session_id && r.student_id == entry.student_id);
            match record {
                Some(record) => {
                    entry.status = record.status;
                    entry.comment = record.comment.clone().unwrap_or_default();
                }
                None => entry.reset(),
            }
        }
    }

    /// Returns false if the student is not enrolled.
    pub fn set_status(&mut self, student_id: &StudentId, status: AttendanceStatus) -> bool {
        match self.entry_mut(student_id) {
            Some(entry) => {
                entry.status = status;
                entry.edited = true;
                true
            }
            None => false,
        }
    }

    /// Returns false if the student is not enrolled.
    pub fn set_comment(&mut self, student_id: &StudentId, comment: impl Into<String>) -> bool {
        match self.entry_mut(student_id) {
            Some(entry) => {
                entry.comment = comment.into();
                entry.edited = true;
                true
            }
            None => false,
        }
    }

    /// Follows a change of the enrolled set: new students get a default
    /// entry, removed students are dropped, everyone else is kept as is.
    pub fn sync_enrolled(&mut self, students: &[Student]) {
        let mut entries: Vec<DraftEntry> = Vec::with_capacity(students.len());
        for student in students {
            if entries.iter().any(|e| e.student_id == student.id) {
                continue;
            }
            let entry = match self.entries.iter().position(|e| e.student_id == student.id) {
                Some(index) => self.entries.swap_remove(index),
                None => DraftEntry::new(student.id.clone()),
            };
            entries.push(entry);
        }
        self.entries = entries;
    }

    pub fn is_dirty(&self) -> bool {
        self.entries.iter().any(|e| e.edited)
    }

    pub fn dirty_count(&self) -> usize {
        self.entries.iter().filter(|e| e.edited).count()
    }

    /// Marks every entry as matching the backend.
    pub fn mark_clean(&mut self) {
        for entry in &mut self.entries {
            entry.edited = false;
        }
    }

    /// After a partial save: the failed students stay (or become) edited so
    /// they survive reconciliation, everyone else is clean.
    pub fn mark_saved_except(&mut self, failed: &HashSet<&StudentId>) {
        for entry in &mut self.entries {
            entry.edited = failed.contains(&entry.student_id);
        }
    }

    /// One row per entry, i.e. per enrolled student.
    pub fn to_bulk_rows(&self) -> Vec<BulkAttendanceRow> {
        self.entries.iter().map(DraftEntry::to_row).collect()
    }

    /// Rows for the given students only, in draft order.
    pub fn rows_for(&self, students: &HashSet<&StudentId>) -> Vec<BulkAttendanceRow> {
        self.entries
            .iter()
            .filter(|e| students.contains(&e.student_id))
            .map(DraftEntry::to_row)
            .collect()
    }

    fn entry_mut(&mut self, student_id: &StudentId) -> Option<&mut DraftEntry> {
        self.entries.iter_mut().find(|e| &e.student_id == student_id)
    }
}
