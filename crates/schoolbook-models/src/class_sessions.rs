//! Class session (one dated occurrence of a class) models and DTOs.
//!
//! Sessions are created by teachers and are what attendance is recorded
//! against: one attendance record per (session, student).

use crate::ids::{ClassId, ClassSessionId};
use crate::resource::{ResourceKind, impl_resource};
use crate::schedules::check_time_range;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClassSessionStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSession {
    pub id: ClassSessionId,
    pub class_id: ClassId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub status: ClassSessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClassSession {
    /// Short label for pickers, e.g. `2024-03-01 09:00 Fractions`.
    pub fn label(&self) -> String {
        match &self.topic {
            Some(topic) => format!("{} {} {}", self.date, self.start_time.format("%H:%M"), topic),
            None => format!("{} {}", self.date, self.start_time.format("%H:%M")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
#[validate(schema(function = "validate_create_times"))]
pub struct CreateClassSessionDto {
    pub class_id: ClassId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(length(max = 200))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[validate(length(max = 1000))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ClassSessionStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[validate(schema(function = "validate_update_times"))]
pub struct UpdateClassSessionDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[validate(length(max = 200))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[validate(length(max = 1000))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ClassSessionStatus>,
}

fn validate_create_times(dto: &CreateClassSessionDto) -> Result<(), ValidationError> {
    check_time_range(dto.start_time, dto.end_time)
}

fn validate_update_times(dto: &UpdateClassSessionDto) -> Result<(), ValidationError> {
    match (dto.start_time, dto.end_time) {
        (Some(start), Some(end)) => check_time_range(start, end),
        _ => Ok(()),
    }
}

impl_resource!(
    ClassSession,
    ClassSessionId,
    CreateClassSessionDto,
    UpdateClassSessionDto,
    ResourceKind::ClassSession
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_scheduled() {
        let json = r#"{
            "id": "cs-1",
            "class_id": "c-1",
            "date": "2024-03-01",
            "start_time": "09:00:00",
            "end_time": "09:45:00",
            "created_at": "2024-02-20T10:00:00Z",
            "updated_at": "2024-02-20T10:00:00Z"
        }"#;
        let session: ClassSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.status, ClassSessionStatus::Scheduled);
        assert_eq!(session.label(), "2024-03-01 09:00");
    }

    #[test]
    fn test_create_class_session_dto_validation() {
        let dto = CreateClassSessionDto {
            class_id: ClassId::from("c-1"),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 45, 0).unwrap(),
            topic: Some("Fractions".to_string()),
            note: None,
            status: None,
        };
        assert!(dto.validate().is_ok());

        let dto = CreateClassSessionDto {
            end_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            ..dto
        };
        assert!(dto.validate().is_err());
    }
}
