//! Issue model
//!
//! An issue is one published edition of the magazine. Every piece of content
//! belongs to exactly one issue.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    /// Unique identifier
    pub id: i64,
    /// Issue name, unique across issues
    pub name: String,
    /// Publication date
    pub pub_date: NaiveDate,
    /// Relative storage path of the cover image
    pub cover_image: Option<String>,
}

impl Issue {
    /// Create a new Issue without a cover.
    ///
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(name: String, pub_date: NaiveDate) -> Self {
        Self {
            id: 0,
            name,
            pub_date,
            cover_image: None,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Input for updating an existing issue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIssueInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New publication date (optional)
    pub pub_date: Option<NaiveDate>,
    /// New cover image: `Some(None)` removes the cover
    pub cover_image: Option<Option<String>>,
}

impl UpdateIssueInput {
    /// Create a new empty UpdateIssueInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Set the publication date
    pub fn with_pub_date(mut self, pub_date: NaiveDate) -> Self {
        self.pub_date = Some(pub_date);
        self
    }

    /// Set the cover image path
    pub fn with_cover_image(mut self, path: String) -> Self {
        self.cover_image = Some(Some(path));
        self
    }

    /// Remove the cover image
    pub fn without_cover_image(mut self) -> Self {
        self.cover_image = Some(None);
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.name.is_some() || self.pub_date.is_some() || self.cover_image.is_some()
    }
}
