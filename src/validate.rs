//! Request Field Validation
//!
//! Validation rules for the client-supplied fields: agent names, agent
//! descriptions, and message content. These run at the HTTP boundary before
//! any credential or rate-limit work is spent on a request.

use thiserror::Error;

/// Minimum agent name length in characters
pub const NAME_MIN_CHARS: usize = 3;
/// Maximum agent name length in characters
pub const NAME_MAX_CHARS: usize = 32;
/// Maximum agent description length in characters
pub const DESCRIPTION_MAX_CHARS: usize = 500;
/// Maximum message content length in characters
pub const CONTENT_MAX_CHARS: usize = 2000;

/// Validation failures, one variant per rejected field state
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    NameMissing,

    #[error("Name must be 3-32 characters, alphanumeric with underscores and hyphens only")]
    NameInvalid,

    #[error("Description is required")]
    DescriptionMissing,

    #[error("Description must be 500 characters or less")]
    DescriptionTooLong,

    #[error("Message content is required")]
    ContentMissing,

    #[error("Message content must be 1-2000 characters")]
    ContentTooLong,
}

impl ValidationError {
    /// Stable machine-readable code carried in the API error envelope
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::NameMissing | ValidationError::NameInvalid => "INVALID_NAME",
            ValidationError::DescriptionMissing | ValidationError::DescriptionTooLong => {
                "INVALID_DESCRIPTION"
            }
            ValidationError::ContentMissing | ValidationError::ContentTooLong => "INVALID_CONTENT",
        }
    }
}

/// Validate an agent name: 3-32 characters from `[A-Za-z0-9_-]`.
///
/// An absent or empty name is reported as missing rather than invalid so the
/// caller gets the more specific message.
pub fn agent_name(name: Option<&str>) -> Result<&str, ValidationError> {
    let name = match name {
        Some(n) if !n.is_empty() => n,
        _ => return Err(ValidationError::NameMissing),
    };

    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(ValidationError::NameInvalid);
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::NameInvalid);
    }

    Ok(name)
}

/// Validate an agent description: required, at most 500 characters.
pub fn agent_description(description: Option<&str>) -> Result<&str, ValidationError> {
    let description = match description {
        Some(d) if !d.is_empty() => d,
        _ => return Err(ValidationError::DescriptionMissing),
    };

    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ValidationError::DescriptionTooLong);
    }

    Ok(description)
}

/// Validate message content: required, 1-2000 characters.
pub fn message_content(content: Option<&str>) -> Result<&str, ValidationError> {
    let content = match content {
        Some(c) if !c.is_empty() => c,
        _ => return Err(ValidationError::ContentMissing),
    };

    if content.chars().count() > CONTENT_MAX_CHARS {
        return Err(ValidationError::ContentTooLong);
    }

    Ok(content)
}
