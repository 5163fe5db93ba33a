//! Tag model
//!
//! Tags label content across issues and sections. Names may repeat; the slug
//! is assigned independently of the name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a tag slug
pub const TAG_SLUG_MAX_LEN: usize = 100;

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Tag name
    pub name: String,
    /// URL-friendly slug
    pub slug: String,
}

impl Tag {
    /// Create a new Tag with the given parameters.
    ///
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(name: String, slug: String) -> Self {
        Self { id: 0, name, slug }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
