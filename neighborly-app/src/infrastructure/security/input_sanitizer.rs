use crate::domain::limits::{MAX_COMMENT_CHARS, MAX_TITLE_CHARS};
use crate::domain::Coordinates;
use neighborly_errors::AppError;
use std::sync::LazyLock;

static RUN_OF_SPACES: LazyLock<Option<regex_lite::Regex>> =
    LazyLock::new(|| regex_lite::Regex::new(r"[ \t]{2,}").ok());

pub struct InputSanitizer;

impl InputSanitizer {
    /// Comment body: trimmed, control characters removed, 1..=2000 chars.
    pub fn comment(content: &str) -> Result<String, AppError> {
        let cleaned = Self::clean(content);
        Self::check_length("Comment", &cleaned, 1, MAX_COMMENT_CHARS)?;
        Ok(cleaned)
    }

    /// Need title: single line, runs of spaces collapsed.
    pub fn title(title: &str) -> Result<String, AppError> {
        let single_line = title.replace(['\n', '\r'], " ");
        let cleaned = Self::clean(&single_line);
        let cleaned = match RUN_OF_SPACES.as_ref() {
            Some(re) => re.replace_all(&cleaned, " ").into_owned(),
            None => cleaned,
        };
        Self::check_length("Title", &cleaned, 1, MAX_TITLE_CHARS)?;
        Ok(cleaned)
    }

    /// Optional free text; blank input becomes `None`.
    pub fn optional_text(
        field: &str,
        text: Option<&str>,
        max_chars: usize,
    ) -> Result<Option<String>, AppError> {
        let Some(text) = text else {
            return Ok(None);
        };
        let cleaned = Self::clean(text);
        if cleaned.is_empty() {
            return Ok(None);
        }
        Self::check_length(field, &cleaned, 1, max_chars)?;
        Ok(Some(cleaned))
    }

    pub fn coordinates(lat: f64, lng: f64) -> Result<Coordinates, AppError> {
        let coords = Coordinates::new(lat, lng);
        if !coords.is_valid() {
            return Err(AppError::invalid("Coordinates are out of range"));
        }
        Ok(coords)
    }

    fn clean(text: &str) -> String {
        text.trim()
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>()
            .trim()
            .to_string()
    }

    fn check_length(field: &str, text: &str, min: usize, max: usize) -> Result<(), AppError> {
        let len = text.chars().count();
        if len < min {
            return Err(AppError::invalid(format!("{field} must not be empty")));
        }
        if len > max {
            return Err(AppError::invalid(format!("{field} must be at most {max} characters")));
        }
        Ok(())
    }
}
