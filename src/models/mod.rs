pub mod note;

use std::fmt;

use thiserror::Error;

/// Form fields a validation rule can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteField {
    Title,
    Content,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelValidationError {
    #[error("Title can't be blank")]
    BlankTitle,
    #[error("Title is too long (maximum is {max} characters)")]
    TitleTooLong { max: usize },
    #[error("Content can't be blank")]
    BlankContent,
}

impl ModelValidationError {
    pub fn field(&self) -> NoteField {
        match self {
            ModelValidationError::BlankTitle | ModelValidationError::TitleTooLong { .. } => {
                NoteField::Title
            }
            ModelValidationError::BlankContent => NoteField::Content,
        }
    }
}

/// Every rule a submission broke, in the order the rules were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ModelValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ModelValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelValidationError> {
        self.0.iter()
    }

    pub fn has_field(&self, field: NoteField) -> bool {
        self.0.iter().any(|error| error.field() == field)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ModelValidationError> for ValidationErrors {
    fn from(error: ModelValidationError) -> Self {
        Self(vec![error])
    }
}

pub type ValidationResult<T> = Result<T, ValidationErrors>;
