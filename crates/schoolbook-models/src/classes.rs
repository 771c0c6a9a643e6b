//! Class domain models and DTOs.
//!
//! A class is a group of students in one grade for one academic year, with an
//! optional homeroom teacher. Enrollment is expressed on the student side
//! (`Student::class_id`) and read through the class' students endpoint.

use crate::ids::{AcademicYearId, ClassId, GradeId, TeacherId};
use crate::resource::{ResourceKind, impl_resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub grade_id: GradeId,
    pub academic_year_id: AcademicYearId,
    #[serde(default)]
    pub homeroom_teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub room: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateClassDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub grade_id: GradeId,
    pub academic_year_id: AcademicYearId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homeroom_teacher_id: Option<TeacherId>,
    #[validate(range(min = 1, max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[validate(length(max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UpdateClassDto {
    #[validate(length(min = 1, max = 100))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_id: Option<GradeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<AcademicYearId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homeroom_teacher_id: Option<TeacherId>,
    #[validate(range(min = 1, max = 500))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[validate(length(max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl_resource!(
    Class,
    ClassId,
    CreateClassDto,
    UpdateClassDto,
    ResourceKind::Class
);
