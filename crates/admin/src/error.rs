//! Form validation errors.
//!
//! Raised before any request is sent; a form that fails validation never
//! reaches the network.

use tableside_core::EmailError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} must be a number")]
    NotANumber(&'static str),

    #[error("{0} cannot be negative")]
    Negative(&'static str),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("{0} is already in use")]
    Duplicate(&'static str),
}

impl FormError {
    /// Text for the inline error slot.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Required(field) => format!("{} is required.", capitalize(field)),
            Self::TooShort { field, min } => {
                format!("{} must be at least {min} characters.", capitalize(field))
            }
            Self::TooLong { field, max } => {
                format!("{} must be at most {max} characters.", capitalize(field))
            }
            Self::NotANumber(field) => format!("{} must be a number.", capitalize(field)),
            Self::Negative(field) => format!("{} cannot be negative.", capitalize(field)),
            Self::PasswordMismatch => "The passwords do not match.".to_string(),
            Self::Email(_) => "Please enter a valid email address.".to_string(),
            Self::Duplicate(field) => format!("That {field} is already in use."),
        }
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Trimmed `value`, or `Required(field)` when blank.
///
/// # Errors
///
/// Returns [`FormError::Required`] for blank input.
pub fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::Required(field));
    }
    Ok(trimmed.to_string())
}

/// Trimmed `value`, or `None` when blank.
#[must_use]
pub fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            FormError::TooShort {
                field: "password",
                min: 6
            }
            .user_message(),
            "Password must be at least 6 characters."
        );
        assert_eq!(FormError::Required("name").user_message(), "Name is required.");
    }

    #[test]
    fn test_required_and_optional() {
        assert_eq!(required("name", "  Latte "), Ok("Latte".to_string()));
        assert_eq!(required("name", "   "), Err(FormError::Required("name")));
        assert_eq!(optional("  "), None);
        assert_eq!(optional(" 02-123 "), Some("02-123".to_string()));
    }
}
