//! # Schoolbook Models
//!
//! Domain models and DTOs for the Schoolbook client.
//!
//! Every entity the backend exposes as a CRUD collection implements
//! [`Resource`], which ties it to its identifier type, its create/update DTOs
//! and its [`ResourceKind`] (collection path, log label).
//!
//! # Modules
//!
//! - [`academic_years`]: Academic years
//! - [`attendance`]: Attendance records and bulk roll-call payloads
//! - [`class_sessions`]: Dated class occurrences
//! - [`classes`]: Classes (grade + academic year groups)
//! - [`grades`]: Grades / year groups
//! - [`ids`]: Strongly-typed string identifiers
//! - [`invoices`]: Tuition and fee invoices
//! - [`parents`]: Parents and guardians
//! - [`schedules`]: Weekly timetable entries
//! - [`students`]: Students
//! - [`teachers`]: Teachers
//!
//! # Example
//!
//! ```ignore
//! use schoolbook_models::{Resource, ResourceKind, Student};
//!
//! assert_eq!(Student::KIND, ResourceKind::Student);
//! assert_eq!(Student::KIND.path(), "students");
//! ```

pub mod academic_years;
pub mod attendance;
pub mod class_sessions;
pub mod classes;
pub mod grades;
pub mod ids;
pub mod invoices;
pub mod parents;
pub mod resource;
pub mod schedules;
pub mod students;
pub mod teachers;

// Re-export commonly used types at crate root for convenience
pub use resource::{Resource, ResourceKind};

pub use ids::{
    AcademicYearId, AttendanceId, ClassId, ClassSessionId, GradeId, InvoiceId, ParentId,
    ScheduleId, StudentId, TeacherId,
};

pub use academic_years::{AcademicYear, CreateAcademicYearDto, UpdateAcademicYearDto};

pub use attendance::{
    AttendanceRecord, AttendanceStatus, BulkAttendanceRequest, BulkAttendanceResult,
    BulkAttendanceRow, BulkRowError, CreateAttendanceDto, UpdateAttendanceDto,
};

pub use class_sessions::{
    ClassSession, ClassSessionStatus, CreateClassSessionDto, UpdateClassSessionDto,
};

pub use classes::{Class, CreateClassDto, UpdateClassDto};

pub use grades::{CreateGradeDto, Grade, UpdateGradeDto};

pub use invoices::{CreateInvoiceDto, Invoice, InvoiceStatus, UpdateInvoiceDto};

pub use parents::{CreateParentDto, Parent, UpdateParentDto};

pub use schedules::{CreateScheduleDto, DayOfWeek, Schedule, UpdateScheduleDto};

pub use students::{CreateStudentDto, Gender, Student, UpdateStudentDto};

pub use teachers::{CreateTeacherDto, Teacher, UpdateTeacherDto};
