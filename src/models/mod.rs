//! Data models
//!
//! Entities of the magazine schema:
//! - Issue, Section: owners of content
//! - Contributor, Tag: many-to-many labels on content
//! - Content with its Image and Article variants
//!
//! plus the input types used to create and update them.

mod content;
mod contributor;
mod issue;
mod section;
mod tag;

pub use content::{Content, ContentDetail, ContentKind, CreateContentInput, UpdateContentInput};
pub use contributor::Contributor;
pub use issue::{Issue, UpdateIssueInput};
pub use section::Section;
pub use tag::{Tag, TAG_SLUG_MAX_LEN};
