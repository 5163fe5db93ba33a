//! Contributor model

use serde::{Deserialize, Serialize};
use std::fmt;

/// A writer, artist or photographer credited on content.
///
/// The display name is optional; an unnamed contributor displays as an empty string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contributor {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: Option<String>,
}

impl Contributor {
    /// Create a new Contributor; the ID is assigned by the database.
    pub fn new(name: Option<String>) -> Self {
        Self { id: 0, name }
    }
}

impl fmt::Display for Contributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_deref().unwrap_or(""))
    }
}
