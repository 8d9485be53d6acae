//! Group slugs: derived from titles with the `slug` crate, validated when
//! operators supply them explicitly.

use slug::slugify;
use thiserror::Error;

const MAX_SLUG_LEN: usize = 50;
const MAX_SUFFIX_ATTEMPTS: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("slug `{slug}` may only contain lowercase letters, digits and hyphens")]
    InvalidCharacters { slug: String },
    #[error("slug `{slug}` is longer than {MAX_SLUG_LEN} characters")]
    TooLong { slug: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Derive a base slug from a human-readable title.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let mut candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    if candidate.len() > MAX_SLUG_LEN {
        candidate.truncate(MAX_SLUG_LEN);
        let trimmed = candidate.trim_end_matches('-').len();
        candidate.truncate(trimmed);
    }

    Ok(candidate)
}

/// Check an explicitly supplied slug.
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    if slug.is_empty() {
        return Err(SlugError::EmptyInput);
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(SlugError::TooLong {
            slug: slug.to_string(),
        });
    }
    let valid = slug
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_');
    if !valid {
        return Err(SlugError::InvalidCharacters {
            slug: slug.to_string(),
        });
    }
    Ok(())
}

/// Produce a slug that does not collide according to `is_taken`.
///
/// Retries by suffixing a counter (`-2`, `-3`, ...).
pub fn unique_slug<F>(base: &str, mut is_taken: F) -> Result<String, SlugError>
where
    F: FnMut(&str) -> bool,
{
    if !is_taken(base) {
        return Ok(base.to_string());
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted {
        base: base.to_string(),
    })
}
