//! Error taxonomy shared by the API client and the stores.
//!
//! Every failure that crosses the backend boundary is an [`ApiError`]: a
//! coarse [`ErrorKind`] plus a human-readable message. Stores only ever look
//! at the message, but callers that need to react differently (for example
//! to a partially applied bulk write) can match on the kind.

use std::fmt;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Coarse classification of a failed backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The backend could not be reached (connect failure, timeout, DNS).
    Transport,
    /// The identifier has no backend record.
    NotFound,
    /// The backend (or local pre-validation) rejected the input.
    Validation,
    /// The backend reported a conflicting concurrent write.
    Conflict,
    /// A bulk write was only partially applied.
    PartialBulk,
    /// Anything else, including malformed responses and 5xx statuses.
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::PartialBulk => "partial_bulk",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status reported by the backend, when there was a response at all.
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new<M>(kind: ErrorKind, message: M) -> Self
    where
        M: fmt::Display,
    {
        Self {
            kind,
            message: message.to_string(),
            status: None,
        }
    }

    pub fn transport<M: fmt::Display>(message: M) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn not_found<M: fmt::Display>(message: M) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn validation<M: fmt::Display>(message: M) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn conflict<M: fmt::Display>(message: M) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn partial_bulk<M: fmt::Display>(message: M) -> Self {
        Self::new(ErrorKind::PartialBulk, message)
    }

    pub fn unknown<M: fmt::Display>(message: M) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Classifies a non-success HTTP status returned by the backend.
    pub fn from_status<M: fmt::Display>(status: u16, message: M) -> Self {
        let kind = match status {
            404 => ErrorKind::NotFound,
            400 | 422 => ErrorKind::Validation,
            409 | 412 => ErrorKind::Conflict,
            _ => ErrorKind::Unknown,
        };
        Self {
            kind,
            message: message.to_string(),
            status: Some(status),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }
}

/// Flattens validator output into one line, ordered by field name.
///
/// Errors of nested structs and list items are included with a dotted path
/// (`records[2].comment is invalid`).
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, "", &mut messages);
    messages.join(", ")
}

fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = format!("{}{}", prefix, field);
        match kind {
            ValidationErrorsKind::Field(errors) => {
                out.extend(errors.iter().map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", path))
                }));
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_messages(nested, &format!("{}.", path), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(nested, &format!("{}[{}].", path, index), out);
                }
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation(format!(
            "Validation failed: {}",
            format_validation_errors(&errors)
        ))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::unknown(format!("Invalid response body: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{Validate, ValidationError};

    #[test]
    fn test_from_status_classification() {
        assert_eq!(ApiError::from_status(404, "x").kind, ErrorKind::NotFound);
        assert_eq!(ApiError::from_status(400, "x").kind, ErrorKind::Validation);
        assert_eq!(ApiError::from_status(422, "x").kind, ErrorKind::Validation);
        assert_eq!(ApiError::from_status(409, "x").kind, ErrorKind::Conflict);
        assert_eq!(ApiError::from_status(500, "x").kind, ErrorKind::Unknown);
        assert_eq!(ApiError::from_status(401, "x").kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_from_status_keeps_status_and_message() {
        let err = ApiError::from_status(404, "Student not found");
        assert_eq!(err.status, Some(404));
        assert_eq!(err.to_string(), "Student not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_constructors_have_no_status() {
        let err = ApiError::transport("connection refused");
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status, None);
    }

    #[test]
    fn test_validation_errors_conversion() {
        let mut errors = ValidationErrors::new();
        errors.add("last_name", ValidationError::new("length"));
        errors.add(
            "email",
            ValidationError::new("email").with_message("email must be valid".into()),
        );

        let err = ApiError::from(errors);
        assert!(err.is_validation());
        assert_eq!(
            err.message,
            "Validation failed: email must be valid, last_name is invalid"
        );
    }

    #[derive(validator::Validate)]
    struct Row {
        #[validate(length(max = 3))]
        comment: String,
    }

    #[derive(validator::Validate)]
    struct Batch {
        #[validate(length(min = 1))]
        name: String,
        #[validate(nested)]
        rows: Vec<Row>,
    }

    #[test]
    fn test_nested_list_errors_have_paths() {
        use validator::Validate;

        let batch = Batch {
            name: String::new(),
            rows: vec![
                Row {
                    comment: "ok".to_string(),
                },
                Row {
                    comment: "too long".to_string(),
                },
            ],
        };
        let errors = batch.validate().unwrap_err();

        assert_eq!(
            format_validation_errors(&errors),
            "name is invalid, rows[1].comment is invalid"
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::PartialBulk.to_string(), "partial_bulk");
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
    }
}
