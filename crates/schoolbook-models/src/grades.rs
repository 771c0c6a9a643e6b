//! Grade (year group) domain models and DTOs.

use crate::ids::{AcademicYearId, GradeId};
use crate::resource::{ResourceKind, impl_resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub name: String,
    /// Ordinal used for sorting, e.g. 1 for "Grade 1"
    pub level: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub academic_year_id: Option<AcademicYearId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateGradeDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 0, max = 20))]
    pub level: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<AcademicYearId>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UpdateGradeDto {
    #[validate(length(min = 1, max = 100))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(range(min = 0, max = 20))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<AcademicYearId>,
}

impl_resource!(
    Grade,
    GradeId,
    CreateGradeDto,
    UpdateGradeDto,
    ResourceKind::Grade
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_grade_dto_level_range() {
        let dto = CreateGradeDto {
            name: "Grade 5".to_string(),
            level: 5,
            description: None,
            academic_year_id: None,
        };
        assert!(dto.validate().is_ok());

        let dto = CreateGradeDto { level: 21, ..dto };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_grade_dto_negative_level() {
        let dto = UpdateGradeDto {
            level: Some(-1),
            ..UpdateGradeDto::default()
        };
        assert!(dto.validate().is_err());
    }
}
