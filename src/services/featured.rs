//! Featured content enforcement
//!
//! Within one (issue, section) group at most one content item is featured
//! once a save completes. The [`FeaturedContentEnforcer`] runs after every
//! content save: when the saved item is featured it unflags every other
//! featured item of the group.
//!
//! There is no locking. Two concurrent featured saves into the same group
//! leave the later one featured, and a reader may briefly see two featured
//! items while the enforcer runs.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::db::repositories::ContentRepository;
use crate::models::Content;

/// Hook run after a content item has been persisted
///
/// Hooks see the committed row. A failing hook does not undo the save.
#[async_trait]
pub trait ContentSaveHook: Send + Sync {
    /// Short name used in logs and error context
    fn name(&self) -> &'static str;

    async fn after_save(&self, content: &Content) -> Result<()>;
}

/// Unflags the other featured items of a just-saved featured item's group
pub struct FeaturedContentEnforcer {
    repo: Arc<dyn ContentRepository>,
}

impl FeaturedContentEnforcer {
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self { repo }
    }

    pub fn boxed(repo: Arc<dyn ContentRepository>) -> Arc<dyn ContentSaveHook> {
        Arc::new(Self::new(repo))
    }

    /// Unflag every featured sibling of `saved`; returns how many were changed.
    ///
    /// Each sibling is corrected independently. A failed correction is logged
    /// and the remaining siblings are still attempted; the first failure is
    /// returned once all have been tried.
    pub async fn enforce(&self, saved: &Content) -> Result<usize> {
        if !saved.is_featured {
            return Ok(0);
        }

        let siblings: Vec<Content> = self
            .repo
            .list_featured(saved.issue_id, saved.section_id)
            .await?
            .into_iter()
            .filter(|other| other.id != saved.id && other.shares_group_with(saved))
            .collect();

        let mut unfeatured = 0;
        let mut first_error = None;

        for sibling in siblings {
            match self.repo.set_featured(sibling.id, false).await {
                Ok(()) => {
                    tracing::debug!(
                        "Unfeatured content {} in issue {} section {} after saving {}",
                        sibling.id,
                        sibling.issue_id,
                        sibling.section_id,
                        saved.id
                    );
                    unfeatured += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to unfeature content {}: {:#}", sibling.id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(unfeatured),
        }
    }
}

#[async_trait]
impl ContentSaveHook for FeaturedContentEnforcer {
    fn name(&self) -> &'static str {
        "featured_content"
    }

    async fn after_save(&self, content: &Content) -> Result<()> {
        self.enforce(content).await.map(|_| ())
    }
}
