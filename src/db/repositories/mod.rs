//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod content;
pub mod contributor;
pub mod issue;
pub mod section;
pub mod tag;

pub use content::{ContentKindMismatch, ContentRepository, SqlxContentRepository};
pub use contributor::{ContributorRepository, SqlxContributorRepository};
pub use issue::{IssueRepository, SqlxIssueRepository};
pub use section::{SectionRepository, SqlxSectionRepository};
pub use tag::{SqlxTagRepository, TagRepository};
