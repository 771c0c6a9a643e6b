//! The [`Resource`] trait tying an entity to its backend collection.

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::hash::Hash;
use validator::Validate;

/// Every kind of entity the backend exposes as a CRUD collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Teacher,
    Student,
    Parent,
    Class,
    Schedule,
    ClassSession,
    Attendance,
    Invoice,
    AcademicYear,
    Grade,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Teacher,
        ResourceKind::Student,
        ResourceKind::Parent,
        ResourceKind::Class,
        ResourceKind::Schedule,
        ResourceKind::ClassSession,
        ResourceKind::Attendance,
        ResourceKind::Invoice,
        ResourceKind::AcademicYear,
        ResourceKind::Grade,
    ];

    /// Collection path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Teacher => "teachers",
            Self::Student => "students",
            Self::Parent => "parents",
            Self::Class => "classes",
            Self::Schedule => "schedules",
            Self::ClassSession => "class-sessions",
            Self::Attendance => "attendance",
            Self::Invoice => "invoices",
            Self::AcademicYear => "academic-years",
            Self::Grade => "grades",
        }
    }

    /// Stable snake_case name used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Parent => "parent",
            Self::Class => "class",
            Self::Schedule => "schedule",
            Self::ClassSession => "class_session",
            Self::Attendance => "attendance",
            Self::Invoice => "invoice",
            Self::AcademicYear => "academic_year",
            Self::Grade => "grade",
        }
    }

    /// Human-readable singular name, capitalised for the start of a sentence.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Teacher => "Teacher",
            Self::Student => "Student",
            Self::Parent => "Parent",
            Self::Class => "Class",
            Self::Schedule => "Schedule",
            Self::ClassSession => "Class session",
            Self::Attendance => "Attendance",
            Self::Invoice => "Invoice",
            Self::AcademicYear => "Academic year",
            Self::Grade => "Grade",
        }
    }

    /// Human-readable singular name for the middle of a sentence.
    pub fn label(&self) -> String {
        self.title().to_lowercase()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity owned by the backend and cached by a store.
pub trait Resource:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Id: Clone
        + Eq
        + Hash
        + fmt::Debug
        + fmt::Display
        + AsRef<str>
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;
    type Create: Serialize + Validate + fmt::Debug + Send + Sync + 'static;
    type Update: Serialize + Validate + fmt::Debug + Send + Sync + 'static;

    const KIND: ResourceKind;

    fn id(&self) -> &Self::Id;
}

/// Implements [`Resource`] for an entity struct with an `id` field.
macro_rules! impl_resource {
    ($ty:ty, $id:ty, $create:ty, $update:ty, $kind:expr) => {
        impl $crate::resource::Resource for $ty {
            type Id = $id;
            type Create = $create;
            type Update = $update;

            const KIND: $crate::resource::ResourceKind = $kind;

            fn id(&self) -> &Self::Id {
                &self.id
            }
        }
    };
}

pub(crate) use impl_resource;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_paths_are_unique() {
        let paths: HashSet<_> = ResourceKind::ALL.iter().map(|k| k.path()).collect();
        assert_eq!(paths.len(), ResourceKind::ALL.len());
    }

    #[test]
    fn test_labels() {
        assert_eq!(ResourceKind::AcademicYear.title(), "Academic year");
        assert_eq!(ResourceKind::AcademicYear.label(), "academic year");
        assert_eq!(ResourceKind::ClassSession.as_str(), "class_session");
        assert_eq!(ResourceKind::ClassSession.path(), "class-sessions");
    }
}
