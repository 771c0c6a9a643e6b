//! Strongly-typed ID newtypes for domain entities.
//!
//! The backend hands out opaque string identifiers. Wrapping them per entity
//! prevents passing a `ClassId` where a `StudentId` is expected while keeping
//! the wire format a plain JSON string.
//!
//! # Example
//!
//! ```ignore
//! use schoolbook_models::ids::{ClassId, StudentId};
//!
//! fn enroll(class: &ClassId, student: &StudentId) { /* ... */ }
//!
//! let class_id = ClassId::from("c-1");
//! let student_id: StudentId = "s-1".parse().unwrap();
//! enroll(&class_id, &student_id);
//! // enroll(&student_id, &class_id); // Compile error! Type mismatch.
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a strongly-typed string ID newtype.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[inline]
            pub fn into_inner(self) -> String {
                self.0
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            #[inline]
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }
    };
}

define_id!(
    /// Strongly-typed ID for Teacher entities.
    TeacherId
);

define_id!(
    /// Strongly-typed ID for Student entities.
    StudentId
);

define_id!(
    /// Strongly-typed ID for Parent entities.
    ParentId
);

define_id!(
    /// Strongly-typed ID for Class entities.
    ClassId
);

define_id!(
    /// Strongly-typed ID for Schedule entries.
    ScheduleId
);

define_id!(
    /// Strongly-typed ID for Class Session entities.
    ClassSessionId
);

define_id!(
    /// Strongly-typed ID for Attendance records.
    AttendanceId
);

define_id!(
    /// Strongly-typed ID for Invoice entities.
    InvoiceId
);

define_id!(
    /// Strongly-typed ID for Academic Year entities.
    AcademicYearId
);

define_id!(
    /// Strongly-typed ID for Grade entities.
    GradeId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = StudentId::new("s-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""s-42""#);

        let parsed: StudentId = serde_json::from_str(r#""s-42""#).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_display_and_debug() {
        let id = ClassId::from("c-1");
        assert_eq!(id.to_string(), "c-1");
        assert_eq!(format!("{:?}", id), "ClassId(c-1)");
    }

    #[test]
    fn test_id_from_str() {
        let id: GradeId = "g-7".parse().unwrap();
        assert_eq!(id.as_str(), "g-7");
        assert_eq!(String::from(id), "g-7");
    }

    #[test]
    fn test_id_ordering_is_lexicographic() {
        let mut ids = vec![TeacherId::from("b"), TeacherId::from("a")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
    }
}
