//! Rules for post and comment content.

use time::{format_description::FormatItem, macros::format_description};

use super::error::DomainError;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[day padding:none] [month repr:long] [year]");

/// Number of characters a post contributes to page titles.
pub const TITLE_EXCERPT_CHARS: usize = 30;

const MAX_IMAGE_REF_LEN: usize = 512;

/// Content predicate applied by services before anything is persisted.
pub type TextValidator = fn(&str) -> Result<(), DomainError>;

/// Default validator: text must contain something other than whitespace.
pub fn validate_text(text: &str) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::validation("text", "This field is required."));
    }
    Ok(())
}

/// Trim an optional image reference, treating blank input as absent.
pub fn normalize_image_ref(raw: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    if value.len() > MAX_IMAGE_REF_LEN {
        return Err(DomainError::validation(
            "image",
            format!("Ensure this value has at most {MAX_IMAGE_REF_LEN} characters."),
        ));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(DomainError::validation(
            "image",
            "Image reference must not contain whitespace.",
        ));
    }

    Ok(Some(value.to_string()))
}

/// First characters of the text, used where a post needs a short title.
pub fn title_excerpt(text: &str) -> String {
    text.trim().chars().take(TITLE_EXCERPT_CHARS).collect()
}
