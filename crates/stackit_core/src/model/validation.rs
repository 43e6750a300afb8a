//! Field-level validation errors shared by all model records.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 20;
pub const TITLE_MAX_CHARS: usize = 200;
pub const TAG_NAME_MAX_CHARS: usize = 50;
pub const NOTIFICATION_MESSAGE_MAX_CHARS: usize = 500;

/// Rejected field value on a model record or request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Field is empty after trimming (or after sanitizing, for bodies).
    Blank(&'static str),
    /// Field exceeds its maximum length in characters.
    TooLong { field: &'static str, max_chars: usize },
    /// Username breaks length or character rules.
    InvalidUsername(String),
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
    /// Vote value outside `{-1, 0, 1}`.
    InvalidVoteValue(i64),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank(field) => write!(f, "{field} cannot be empty"),
            Self::TooLong { field, max_chars } => {
                write!(f, "{field} must be at most {max_chars} characters")
            }
            Self::InvalidUsername(value) => write!(
                f,
                "invalid username `{value}`: expected {USERNAME_MIN_CHARS}-{USERNAME_MAX_CHARS} letters, digits or underscores"
            ),
            Self::InvalidEmail(value) => write!(f, "invalid email `{value}`"),
            Self::InvalidVoteValue(value) => {
                write!(f, "vote value must be -1, 0, or 1, got {value}")
            }
        }
    }
}

impl Error for ModelValidationError {}

/// Trims `value` and rejects blank or oversized input.
pub fn required_text(
    field: &'static str,
    value: &str,
    max_chars: Option<usize>,
) -> Result<String, ModelValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::Blank(field));
    }
    if let Some(max_chars) = max_chars {
        if trimmed.chars().count() > max_chars {
            return Err(ModelValidationError::TooLong { field, max_chars });
        }
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{required_text, ModelValidationError};

    #[test]
    fn required_text_trims_and_checks_length() {
        assert_eq!(required_text("title", "  hi  ", Some(5)).unwrap(), "hi");
        assert_eq!(
            required_text("title", "   ", None).unwrap_err(),
            ModelValidationError::Blank("title")
        );
        assert!(matches!(
            required_text("title", "abcdef", Some(5)),
            Err(ModelValidationError::TooLong { max_chars: 5, .. })
        ));
    }
}
