//! Academic Year domain models and DTOs.
//!
//! Academic years (e.g. "2024-2025") scope grades and classes. At most one is
//! flagged as current; the backend enforces that, the client only displays it.

use crate::ids::AcademicYearId;
use crate::resource::{ResourceKind, impl_resource};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    /// Display name, e.g. "2024-2025"
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AcademicYear {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
#[validate(schema(function = "validate_create_range"))]
pub struct CreateAcademicYearDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub start_date: NaiveDate,
    /// Must be after `start_date`
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_current: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
#[validate(schema(function = "validate_update_range"))]
pub struct UpdateAcademicYearDto {
    #[validate(length(min = 1, max = 100))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_current: Option<bool>,
}

pub(crate) fn check_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::new("date_range")
            .with_message("end_date must be after start_date".into()));
    }
    Ok(())
}

fn validate_create_range(dto: &CreateAcademicYearDto) -> Result<(), ValidationError> {
    check_date_range(dto.start_date, dto.end_date)
}

fn validate_update_range(dto: &UpdateAcademicYearDto) -> Result<(), ValidationError> {
    match (dto.start_date, dto.end_date) {
        (Some(start), Some(end)) => check_date_range(start, end),
        _ => Ok(()),
    }
}

impl_resource!(
    AcademicYear,
    AcademicYearId,
    CreateAcademicYearDto,
    UpdateAcademicYearDto,
    ResourceKind::AcademicYear
);
