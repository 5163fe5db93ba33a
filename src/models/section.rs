//! Section model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Section entity (e.g. "Poetry", "Reviews"), unique by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    /// Unique identifier
    pub id: i64,
    /// Section name
    pub name: String,
}

impl Section {
    /// Create a new Section; the ID is assigned by the database.
    pub fn new(name: String) -> Self {
        Self { id: 0, name }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
