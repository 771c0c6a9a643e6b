//! Attendance (roll call) models and DTOs.
//!
//! An attendance record exists for a (class session, student) pair only once
//! a teacher has saved the roll call for that session. Roll calls are saved
//! with a single bulk request; the backend applies each row independently
//! and reports the rows it rejected.

use crate::ids::{AttendanceId, ClassSessionId, StudentId};
use crate::resource::{ResourceKind, impl_resource};
use chrono::{DateTime, Utc};
use schoolbook_core::serde::deserialize_optional_string;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::Absent => "ABSENT",
            Self::Late => "LATE",
            Self::Excused => "EXCUSED",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub class_session_id: ClassSessionId,
    pub student_id: StudentId,
    pub status: AttendanceStatus,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateAttendanceDto {
    pub class_session_id: ClassSessionId,
    pub student_id: StudentId,
    pub status: AttendanceStatus,
    #[validate(length(max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UpdateAttendanceDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AttendanceStatus>,
    #[validate(length(max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl_resource!(
    AttendanceRecord,
    AttendanceId,
    CreateAttendanceDto,
    UpdateAttendanceDto,
    ResourceKind::Attendance
);

/// One row of a bulk attendance write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BulkAttendanceRow {
    pub student_id: StudentId,
    pub status: AttendanceStatus,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct BulkAttendanceRequest {
    pub class_session_id: ClassSessionId,
    #[validate(length(min = 1), nested)]
    pub records: Vec<BulkAttendanceRow>,
}

/// A row the backend refused to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRowError {
    pub student_id: StudentId,
    pub reason: String,
}

/// Outcome of a bulk write: rows persisted and rows rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkAttendanceResult {
    #[serde(default)]
    pub created: Vec<AttendanceRecord>,
    #[serde(default)]
    pub errors: Vec<BulkRowError>,
}

impl BulkAttendanceResult {
    /// True when every submitted row was persisted.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records a "not persisted" error for every submitted row the backend
    /// neither created nor rejected.
    pub fn account_for(mut self, submitted: &[BulkAttendanceRow]) -> Self {
        let reported: HashSet<StudentId> = self
            .created
            .iter()
            .map(|r| r.student_id.clone())
            .chain(self.errors.iter().map(|e| e.student_id.clone()))
            .collect();
        for row in submitted {
            if !reported.contains(&row.student_id) {
                self.errors.push(BulkRowError {
                    student_id: row.student_id.clone(),
                    reason: "not persisted".to_string(),
                });
            }
        }
        self
    }

    pub fn failed_students(&self) -> HashSet<&StudentId> {
        self.errors.iter().map(|e| &e.student_id).collect()
    }

    /// One-line summary used as the error message of a partial write.
    pub fn failure_summary(&self) -> String {
        let ids = self
            .errors
            .iter()
            .map(|e| format!("{} ({})", e.student_id, e.reason))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} of {} attendance rows failed: {}",
            self.errors.len(),
            self.errors.len() + self.created.len(),
            ids
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::Excused).unwrap(),
            r#""EXCUSED""#
        );
        let status: AttendanceStatus = serde_json::from_str(r#""LATE""#).unwrap();
        assert_eq!(status, AttendanceStatus::Late);
        assert_eq!(AttendanceStatus::default(), AttendanceStatus::Present);
    }

    #[test]
    fn test_record_empty_comment_is_none() {
        let json = r#"{
            "id": "a-1",
            "class_session_id": "cs-1",
            "student_id": "s-2",
            "status": "LATE",
            "comment": "",
            "created_at": "2024-03-01T09:00:00Z",
            "updated_at": "2024-03-01T09:00:00Z"
        }"#;
        let record: AttendanceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.comment, None);
        assert_eq!(record.status, AttendanceStatus::Late);
    }

    #[test]
    fn test_bulk_request_requires_rows() {
        let request = BulkAttendanceRequest {
            class_session_id: ClassSessionId::from("cs-1"),
            records: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_bulk_request_validates_nested_rows() {
        let request = BulkAttendanceRequest {
            class_session_id: ClassSessionId::from("cs-1"),
            records: vec![BulkAttendanceRow {
                student_id: StudentId::from("s-1"),
                status: AttendanceStatus::Absent,
                comment: "x".repeat(501),
            }],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_bulk_result_partial() {
        let result: BulkAttendanceResult = serde_json::from_str(
            r#"{"created":[],"errors":[{"student_id":"s-3","reason":"not enrolled"}]}"#,
        )
        .unwrap();
        assert!(!result.is_complete());
        assert!(result.failed_students().contains(&StudentId::from("s-3")));
        assert_eq!(
            result.failure_summary(),
            "1 of 1 attendance rows failed: s-3 (not enrolled)"
        );
    }

    #[test]
    fn test_bulk_result_missing_errors_is_complete() {
        let result: BulkAttendanceResult = serde_json::from_str(r#"{"created":[]}"#).unwrap();
        assert!(result.is_complete());
    }

    #[test]
    fn test_account_for_flags_unreported_rows() {
        let result: BulkAttendanceResult = serde_json::from_str(
            r#"{"created":[{
                "id": "a-1",
                "class_session_id": "cs-1",
                "student_id": "s-1",
                "status": "PRESENT",
                "created_at": "2024-03-01T09:00:00Z",
                "updated_at": "2024-03-01T09:00:00Z"
            }],"errors":[{"student_id":"s-2","reason":"not enrolled"}]}"#,
        )
        .unwrap();
        let submitted: Vec<BulkAttendanceRow> = ["s-1", "s-2", "s-3"]
            .into_iter()
            .map(|id| BulkAttendanceRow {
                student_id: StudentId::from(id),
                status: AttendanceStatus::Present,
                comment: String::new(),
            })
            .collect();

        let result = result.account_for(&submitted);

        assert!(!result.is_complete());
        assert_eq!(
            result.errors,
            vec![
                BulkRowError {
                    student_id: StudentId::from("s-2"),
                    reason: "not enrolled".to_string(),
                },
                BulkRowError {
                    student_id: StudentId::from("s-3"),
                    reason: "not persisted".to_string(),
                },
            ]
        );
    }
}
