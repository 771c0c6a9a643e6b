//! Weekly timetable entries.

use crate::ids::{ClassId, ScheduleId, TeacherId};
use crate::resource::{ResourceKind, impl_resource};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub class_id: ClassId,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    pub subject: String,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub room: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    /// Whether two entries of the same class overlap in time on the same day.
    pub fn overlaps(&self, other: &Schedule) -> bool {
        self.class_id == other.class_id
            && self.day_of_week == other.day_of_week
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
#[validate(schema(function = "validate_create_times"))]
pub struct CreateScheduleDto {
    pub class_id: ClassId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<TeacherId>,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(length(max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[validate(schema(function = "validate_update_times"))]
pub struct UpdateScheduleDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<TeacherId>,
    #[validate(length(min = 1, max = 100))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[validate(length(max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

pub(crate) fn check_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::new("time_range")
            .with_message("end_time must be after start_time".into()));
    }
    Ok(())
}

fn validate_create_times(dto: &CreateScheduleDto) -> Result<(), ValidationError> {
    check_time_range(dto.start_time, dto.end_time)
}

fn validate_update_times(dto: &UpdateScheduleDto) -> Result<(), ValidationError> {
    match (dto.start_time, dto.end_time) {
        (Some(start), Some(end)) => check_time_range(start, end),
        _ => Ok(()),
    }
}

impl_resource!(
    Schedule,
    ScheduleId,
    CreateScheduleDto,
    UpdateScheduleDto,
    ResourceKind::Schedule
);
