//! Services layer - Business logic
//!
//! Services sit between callers and the repositories. They are responsible for:
//! - Validating input against the schema's limits
//! - Turning constraint violations into typed errors
//! - Running save hooks after every content write
//! - Placing uploaded media

pub mod content;
pub mod contributor;
pub mod featured;
pub mod issue;
pub mod section;
pub mod tag;

pub use content::{ContentService, ContentServiceError};
pub use contributor::{ContributorService, ContributorServiceError};
pub use featured::{ContentSaveHook, FeaturedContentEnforcer};
pub use issue::{IssueService, IssueServiceError};
pub use section::{SectionService, SectionServiceError};
pub use tag::{generate_tag_slug, TagService, TagServiceError};
