//! Add request and result types.

use super::{NewMemory, OptionalField};
use crate::Result;
use chrono::{DateTime, Utc};

/// Request to add a new memory, as received from a caller.
///
/// Nothing is validated here; [`AddMemory::validate`] produces the
/// [`NewMemory`] the store accepts.
#[derive(Debug, Clone, Default)]
pub struct AddMemory {
    /// The content to store.
    pub content: String,
    /// Optional title.
    pub title: Option<String>,
    /// Optional tags.
    pub tags: Option<String>,
    /// Optional status.
    pub status: Option<String>,
}

impl AddMemory {
    /// Creates a new add request with the given content.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Normalizes and validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if the content is blank.
    pub fn validate(&self) -> Result<NewMemory> {
        Ok(NewMemory::new(&self.content)?
            .with_field(OptionalField::Title, self.title.as_deref())
            .with_field(OptionalField::Tags, self.tags.as_deref())
            .with_field(OptionalField::Status, self.status.as_deref()))
    }
}

/// Result of an add operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// The ID assigned to the new memory.
    pub id: i64,
    /// The creation timestamp assigned by the store.
    pub created_at: DateTime<Utc>,
}

impl AddOutcome {
    /// Confirmation text for the caller.
    #[must_use]
    pub fn message(&self) -> String {
        format!("Simple-memory added. (id: {})", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_carries_optional_fields() {
        let memory = AddMemory::new("note")
            .with_title("X")
            .with_tags("go,db")
            .with_status("open")
            .validate()
            .unwrap();

        assert_eq!(memory.content(), "note");
        assert_eq!(memory.field(OptionalField::Title), Some("X"));
        assert_eq!(memory.field(OptionalField::Tags), Some("go,db"));
        assert_eq!(memory.field(OptionalField::Status), Some("open"));
    }

    #[test]
    fn test_validate_rejects_blank_content() {
        assert!(AddMemory::new("   ").with_title("ignored").validate().is_err());
    }
}
