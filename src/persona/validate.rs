//! Input validation for persona operations.
//!
//! Pure functions: no filesystem access, no state. Each returns the trimmed
//! value on success. Lengths count characters, not bytes.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::{Error, Result};

use super::types::EditableField;

pub const MAX_SLUG_LEN: usize = 50;
pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MAX_DESCRIPTION_LEN: usize = 200;
pub const MIN_INSTRUCTIONS_LEN: usize = 20;

/// Instructions above this size are accepted but logged
pub const LARGE_INSTRUCTIONS_BYTES: usize = 10 * 1024;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

/// Check a persona slug (the filename stem)
pub fn validate_slug(slug: &str) -> Result<String> {
    let slug = slug.trim();
    let invalid = |reason: &str| Error::InvalidName {
        name: slug.to_string(),
        reason: reason.to_string(),
    };

    if slug.is_empty() {
        return Err(invalid("Persona name cannot be empty"));
    }
    if slug.chars().count() > MAX_SLUG_LEN {
        return Err(invalid("Persona name too long (max 50 characters)"));
    }
    if !SLUG_PATTERN.is_match(slug) {
        return Err(invalid(
            "Persona name must contain only lowercase letters, numbers, and hyphens",
        ));
    }

    Ok(slug.to_string())
}

pub fn validate_description(description: &str) -> Result<String> {
    let description = description.trim();
    let len = description.chars().count();
    let invalid = |reason: &str| Error::InvalidDescription {
        reason: reason.to_string(),
    };

    if len == 0 {
        return Err(invalid("Description cannot be empty"));
    }
    if len < MIN_DESCRIPTION_LEN {
        return Err(invalid("Description too short (minimum 10 characters)"));
    }
    if len > MAX_DESCRIPTION_LEN {
        return Err(invalid("Description too long (maximum 200 characters)"));
    }

    Ok(description.to_string())
}

pub fn validate_instructions(instructions: &str) -> Result<String> {
    let instructions = instructions.trim();
    let invalid = |reason: &str| Error::InvalidInstructions {
        reason: reason.to_string(),
    };

    if instructions.is_empty() {
        return Err(invalid("Instructions cannot be empty"));
    }
    if instructions.chars().count() < MIN_INSTRUCTIONS_LEN {
        return Err(invalid("Instructions too short (minimum 20 characters)"));
    }
    if instructions.len() > LARGE_INSTRUCTIONS_BYTES {
        warn!(
            bytes = instructions.len(),
            "Instructions are very large; hosts may truncate them"
        );
    }

    Ok(instructions.to_string())
}

/// Check that `field` names an editable field
pub fn validate_field_name(field: &str) -> Result<EditableField> {
    field.trim().parse()
}

/// Apply the per-field rule used by both create and edit
pub fn validate_field_value(field: EditableField, value: &str) -> Result<String> {
    match field {
        EditableField::Description => validate_description(value),
        EditableField::Instructions => validate_instructions(value),
        EditableField::Author | EditableField::Version => {
            let value = value.trim();
            if value.is_empty() {
                return Err(Error::InvalidValue {
                    field: field.to_string(),
                    reason: "Value cannot be empty".to_string(),
                });
            }
            Ok(value.to_string())
        }
    }
}
