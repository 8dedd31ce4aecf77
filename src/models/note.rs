use std::sync::LazyLock;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use regex::Regex;
use serde::Deserialize;

use crate::schema::notes;

use super::{ModelValidationError, ValidationErrors, ValidationResult};

pub const MAX_TITLE_LENGTH: usize = 200;
pub const PREVIEW_LENGTH: usize = 150;
/// Appended to shortened previews; counted inside the preview length.
pub const TRUNCATION_MARKER: &str = "...";

static MARKDOWN_SYMBOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#*`_\[\]()]").expect("valid markdown symbol regex"));

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Note {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Note {
    pub fn preview(&self, max_length: usize) -> String {
        derive_preview(&self.content, max_length)
    }
}

/// The only client-writable fields of a note. Anything else in a submission
/// is rejected before it reaches the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl NoteInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn from_note(note: &Note) -> Self {
        Self::new(note.title.clone(), note.content.clone())
    }

    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();

        if let Err(err) = ensure_valid_title(&self.title) {
            errors.push(err);
        }
        if let Err(err) = ensure_valid_content(&self.content) {
            errors.push(err);
        }

        errors.into_result()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notes)]
pub struct NewNote<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl<'a> NewNote<'a> {
    pub fn from_input(input: &'a NoteInput, now: NaiveDateTime) -> ValidationResult<Self> {
        input.validate()?;

        Ok(Self {
            title: input.title.trim(),
            content: &input.content,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Blankness is judged on the trimmed title, length on the title as submitted.
fn ensure_valid_title(value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankTitle);
    }

    let len = value.chars().count();
    if len > MAX_TITLE_LENGTH {
        tracing::debug!(length = len, "Title validation failed: too long");
        return Err(ModelValidationError::TitleTooLong {
            max: MAX_TITLE_LENGTH,
        });
    }

    Ok(())
}

fn ensure_valid_content(value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        Err(ModelValidationError::BlankContent)
    } else {
        Ok(())
    }
}

/// Plain-text summary of Markdown content: syntax characters are removed
/// literally, surrounding whitespace trimmed, and the result cut to at most
/// `max_length` characters.
pub fn derive_preview(content: &str, max_length: usize) -> String {
    let stripped = MARKDOWN_SYMBOLS.replace_all(content, "");
    truncate(stripped.trim(), max_length)
}

fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_length <= marker_len {
        return text.chars().take(max_length).collect();
    }

    let mut shortened: String = text.chars().take(max_length - marker_len).collect();
    shortened.push_str(TRUNCATION_MARKER);
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteField;

    const FORBIDDEN: [char; 8] = ['#', '*', '`', '_', '[', ']', '(', ')'];

    #[test]
    fn test_requires_title() {
        let errors = NoteInput::new("", "Some content").validate().unwrap_err();
        assert!(errors.has_field(NoteField::Title));
        assert!(errors.to_string().contains("Title can't be blank"));
    }

    #[test]
    fn test_whitespace_title_is_blank() {
        let errors = NoteInput::new("   \t ", "Some content")
            .validate()
            .unwrap_err();
        assert_eq!(
            errors.iter().next(),
            Some(&ModelValidationError::BlankTitle)
        );
    }

    #[test]
    fn test_requires_content() {
        let errors = NoteInput::new("Some title", "").validate().unwrap_err();
        assert!(errors.has_field(NoteField::Content));
        assert!(errors.to_string().contains("Content can't be blank"));
    }

    #[test]
    fn test_valid_with_title_and_content() {
        assert!(NoteInput::new("Valid title", "Valid content").validate().is_ok());
    }

    #[test]
    fn test_title_length_boundary() {
        let exact = "a".repeat(MAX_TITLE_LENGTH);
        assert!(NoteInput::new(exact, "body").validate().is_ok());

        let too_long = "a".repeat(MAX_TITLE_LENGTH + 1);
        let errors = NoteInput::new(too_long, "body").validate().unwrap_err();
        assert_eq!(
            errors.to_string(),
            "Title is too long (maximum is 200 characters)"
        );
    }

    #[test]
    fn test_title_length_includes_surrounding_whitespace() {
        let padded = format!("{} ", "a".repeat(MAX_TITLE_LENGTH));
        let errors = NoteInput::new(padded, "body").validate().unwrap_err();
        assert!(errors.has_field(NoteField::Title));
    }

    #[test]
    fn test_title_length_counts_characters() {
        let title = "é".repeat(MAX_TITLE_LENGTH);
        assert!(NoteInput::new(title, "body").validate().is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let errors = NoteInput::default().validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_new_note_trims_title_only() {
        let input = NoteInput::new("  Spaced  ", "  body\n");
        let now = chrono::Utc::now().naive_utc();
        let new_note = NewNote::from_input(&input, now).unwrap();
        assert_eq!(new_note.title, "Spaced");
        assert_eq!(new_note.content, "  body\n");
        assert_eq!(new_note.created_at, new_note.updated_at);
    }

    #[test]
    fn test_preview_strips_markdown_and_truncates() {
        let preview = derive_preview("# Big title with **bold** text", 20);
        assert!(preview.contains("Big title"));
        assert!(!preview.contains('#'));
        assert!(!preview.contains("**"));
        assert!(preview.chars().count() <= 20 + TRUNCATION_MARKER.len());
        assert_eq!(preview, "Big title with bo...");
    }

    #[test]
    fn test_preview_keeps_short_content() {
        assert_eq!(derive_preview("  plain words  ", PREVIEW_LENGTH), "plain words");
    }

    #[test]
    fn test_preview_never_contains_markdown_symbols() {
        let samples = [
            "[link](http://example.com) and `code`",
            "__under__ *star* ## heading",
            "((((]]]]",
            "",
        ];
        for sample in samples {
            for max in [0, 2, 3, 4, 10, PREVIEW_LENGTH] {
                let preview = derive_preview(sample, max);
                assert!(!preview.contains(FORBIDDEN), "{preview:?}");
                assert!(preview.chars().count() <= max);
            }
        }
    }

    #[test]
    fn test_preview_truncates_on_character_boundaries() {
        let preview = derive_preview(&"ü".repeat(10), 6);
        assert_eq!(preview, "üüü...");
    }

    #[test]
    fn test_preview_without_room_for_marker() {
        assert_eq!(derive_preview("abcdef", 2), "ab");
    }
}
