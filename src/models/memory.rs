//! Memory record types.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A persisted memory.
///
/// `title`, `tags` and `status` are never absent: missing values (NULL in
/// the store, or a column the store could not add) surface as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Store-assigned identifier, strictly increasing and never reused.
    pub id: i64,
    /// Short title.
    pub title: String,
    /// Free-form tags, comma-separated by convention.
    pub tags: String,
    /// Free-form status label.
    pub status: String,
    /// The memory content. Never empty.
    pub content: String,
    /// Store-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Returns the value of an optional field.
    #[must_use]
    pub fn field(&self, field: OptionalField) -> &str {
        match field {
            OptionalField::Title => &self.title,
            OptionalField::Tags => &self.tags,
            OptionalField::Status => &self.status,
        }
    }
}

/// The optional metadata fields of a memory.
///
/// Each one maps to a nullable column that is added to older tables on
/// startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalField {
    /// The `title` column.
    Title,
    /// The `tags` column.
    Tags,
    /// The `status` column.
    Status,
}

impl OptionalField {
    /// All optional fields, in column order.
    pub const ALL: [Self; 3] = [Self::Title, Self::Tags, Self::Status];

    /// Returns the column name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Tags => "tags",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for OptionalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated insert request.
///
/// Content is trimmed and guaranteed non-empty. Optional fields are trimmed
/// and become `None` when blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemory {
    content: String,
    title: Option<String>,
    tags: Option<String>,
    status: Option<String>,
}

impl NewMemory {
    /// Creates a new insert request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `content` is empty after trimming.
    pub fn new(content: &str) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput("content cannot be empty".to_string()));
        }
        Ok(Self {
            content: content.to_string(),
            title: None,
            tags: None,
            status: None,
        })
    }

    /// Sets an optional field.
    #[must_use]
    pub fn with_field(mut self, field: OptionalField, value: Option<&str>) -> Self {
        let value = value.and_then(normalize_optional);
        match field {
            OptionalField::Title => self.title = value,
            OptionalField::Tags => self.tags = value,
            OptionalField::Status => self.status = value,
        }
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(self, title: &str) -> Self {
        self.with_field(OptionalField::Title, Some(title))
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(self, tags: &str) -> Self {
        self.with_field(OptionalField::Tags, Some(tags))
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(self, status: &str) -> Self {
        self.with_field(OptionalField::Status, Some(status))
    }

    /// Returns the trimmed content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns an optional field, if set.
    #[must_use]
    pub fn field(&self, field: OptionalField) -> Option<&str> {
        match field {
            OptionalField::Title => self.title.as_deref(),
            OptionalField::Tags => self.tags.as_deref(),
            OptionalField::Status => self.status.as_deref(),
        }
    }
}

fn normalize_optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Identity assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredMemory {
    /// Assigned identifier.
    pub id: i64,
    /// Assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}
