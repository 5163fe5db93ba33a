//! Content service
//!
//! Implements business logic for content of every kind:
//! - create/update with field validation and a fixed variant kind
//! - save hooks run after every write (the featured enforcer by default)
//! - photo and related-image uploads
//!
//! Every write persists the row first and then runs the registered
//! [`ContentSaveHook`]s. A hook failure is reported as `InternalError`; the
//! content row itself stays committed.

use anyhow::anyhow;
use std::sync::Arc;

use super::featured::{ContentSaveHook, FeaturedContentEnforcer};
use crate::db::is_foreign_key_violation;
use crate::db::repositories::{ContentKindMismatch, ContentRepository, IssueRepository};
use crate::media::{MediaStorage, UploadPathDeriver};
use crate::models::{Content, ContentDetail, CreateContentInput, Issue, UpdateContentInput};

/// Longest title or subtitle the schema stores
pub const TITLE_MAX_LEN: usize = 255;

/// Longest content slug the schema stores
pub const CONTENT_SLUG_MAX_LEN: usize = 100;

/// Error types for content service operations
#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    /// Content not found
    #[error("Content not found: {0}")]
    NotFound(String),

    /// The issue, section, contributor or tag referenced does not exist
    #[error("Missing reference: {0}")]
    MissingReference(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Content service
pub struct ContentService {
    repo: Arc<dyn ContentRepository>,
    issues: Arc<dyn IssueRepository>,
    uploads: UploadPathDeriver,
    storage: MediaStorage,
    hooks: Vec<Arc<dyn ContentSaveHook>>,
}

impl ContentService {
    /// Create a content service with the featured enforcer registered
    pub fn new(
        repo: Arc<dyn ContentRepository>,
        issues: Arc<dyn IssueRepository>,
        uploads: UploadPathDeriver,
        storage: MediaStorage,
    ) -> Self {
        let enforcer = FeaturedContentEnforcer::boxed(repo.clone());
        Self {
            repo,
            issues,
            uploads,
            storage,
            hooks: vec![enforcer],
        }
    }

    /// Register another hook; hooks run in registration order
    pub fn with_hook(mut self, hook: Arc<dyn ContentSaveHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Create content and run the save hooks
    ///
    /// # Errors
    /// - `ValidationError` for blank titles, over-long fields or an empty photo
    /// - `MissingReference` if the issue, section, a contributor or a tag is unknown
    pub async fn create(&self, input: CreateContentInput) -> Result<Content, ContentServiceError> {
        validate_text(&input.title, &input.subtitle, &input.slug)?;
        validate_detail(&input.detail)?;

        let content = self.repo.create(&input).await.map_err(|e| {
            reference_error(
                e,
                format!(
                    "issue {}, section {}, contributors {:?} or tags {:?}",
                    input.issue_id, input.section_id, input.contributor_ids, input.tag_ids
                ),
            )
        })?;

        tracing::info!(
            "Created {} content {} in issue {} section {}",
            content.kind(),
            content.id,
            content.issue_id,
            content.section_id
        );
        self.run_hooks(&content).await?;
        Ok(content)
    }

    /// Apply the set fields of `input` and save
    ///
    /// # Errors
    /// - `NotFound` if the content doesn't exist
    /// - `ValidationError` if `photo` is set on non-image content or
    ///   `related_image` on a non-article
    pub async fn update(
        &self,
        id: i64,
        input: UpdateContentInput,
    ) -> Result<Content, ContentServiceError> {
        let mut content = self.require(id).await?;
        let kind = content.kind();

        if let Some(title) = input.title {
            content.title = title;
        }
        if let Some(subtitle) = input.subtitle {
            content.subtitle = subtitle;
        }
        if let Some(slug) = input.slug {
            content.slug = slug;
        }
        if let Some(teaser) = input.teaser {
            content.teaser = teaser;
        }
        if let Some(body) = input.body {
            content.body = body;
        }
        if let Some(is_featured) = input.is_featured {
            content.is_featured = is_featured;
        }
        if let Some(medium) = input.medium {
            content.medium = medium;
        }
        if let Some(size) = input.size {
            content.size = size;
        }
        if let Some(statement) = input.statement {
            content.statement = statement;
        }
        if let Some(issue_id) = input.issue_id {
            content.issue_id = issue_id;
        }
        if let Some(section_id) = input.section_id {
            content.section_id = section_id;
        }
        if let Some(new_photo) = input.photo {
            match &mut content.detail {
                ContentDetail::Image { photo } => *photo = new_photo,
                _ => {
                    return Err(ContentServiceError::ValidationError(format!(
                        "Content {} is {} content and has no photo",
                        id, kind
                    )))
                }
            }
        }
        if let Some(new_image) = input.related_image {
            match &mut content.detail {
                ContentDetail::Article { related_image } => *related_image = Some(new_image),
                _ => {
                    return Err(ContentServiceError::ValidationError(format!(
                        "Content {} is {} content and has no related image",
                        id, kind
                    )))
                }
            }
        }

        self.save(&content).await
    }

    /// Persist every field of `content` and run the save hooks
    ///
    /// Saving an unchanged featured item again leaves the group as it was.
    ///
    /// # Errors
    /// - `NotFound` if the content row no longer exists
    /// - `ValidationError` if `content` carries another variant than the stored one
    ///
    /// Hooks only run once the row has been written.
    pub async fn save(&self, content: &Content) -> Result<Content, ContentServiceError> {
        validate_text(&content.title, &content.subtitle, &content.slug)?;
        validate_detail(&content.detail)?;

        let saved = self
            .repo
            .update(content)
            .await
            .map_err(|e| {
                if let Some(mismatch) = kind_mismatch(&e) {
                    return ContentServiceError::ValidationError(mismatch.to_string());
                }
                reference_error(
                    e,
                    format!("issue {} or section {}", content.issue_id, content.section_id),
                )
            })?
            .ok_or_else(|| {
                ContentServiceError::NotFound(format!("Content with ID {} not found", content.id))
            })?;

        self.run_hooks(&saved).await?;
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Content>, ContentServiceError> {
        self.repo.get_by_id(id).await.map_err(Into::into)
    }

    pub async fn list_by_issue(&self, issue_id: i64) -> Result<Vec<Content>, ContentServiceError> {
        self.repo.list_by_issue(issue_id).await.map_err(Into::into)
    }

    pub async fn list_by_issue_and_section(
        &self,
        issue_id: i64,
        section_id: i64,
    ) -> Result<Vec<Content>, ContentServiceError> {
        self.repo
            .list_by_issue_and_section(issue_id, section_id)
            .await
            .map_err(Into::into)
    }

    /// The featured item of an (issue, section) group
    pub async fn featured_for(
        &self,
        issue_id: i64,
        section_id: i64,
    ) -> Result<Option<Content>, ContentServiceError> {
        self.repo
            .featured_for(issue_id, section_id)
            .await
            .map_err(Into::into)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentServiceError> {
        let content = self.require(id).await?;
        self.repo.delete(content.id).await?;
        tracing::info!("Deleted content {} ({})", content.id, content.title);
        Ok(())
    }

    /// Store a new photo for image content and save
    ///
    /// The file lands at `images/<issue slug>/<ts>_<name>`.
    pub async fn upload_photo(
        &self,
        id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Content, ContentServiceError> {
        let mut content = self.require(id).await?;
        let kind = content.kind();
        let issue = self.issue_of(&content).await?;

        let path = self.uploads.image_path(&issue, filename);
        match &mut content.detail {
            ContentDetail::Image { photo } => *photo = path.clone(),
            _ => {
                return Err(ContentServiceError::ValidationError(format!(
                    "Content {} is {} content and has no photo",
                    id, kind
                )))
            }
        }
        validate_detail(&content.detail)?;

        self.storage.save(&path, bytes).await?;
        self.save(&content).await
    }

    /// Store a new related image for an article and save
    ///
    /// The file lands at `article_images/<issue slug>/<ts>_<name>`.
    pub async fn upload_related_image(
        &self,
        id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Content, ContentServiceError> {
        let mut content = self.require(id).await?;
        let kind = content.kind();
        let issue = self.issue_of(&content).await?;

        let path = self.uploads.article_image_path(&issue, filename);
        match &mut content.detail {
            ContentDetail::Article { related_image } => *related_image = Some(path.clone()),
            _ => {
                return Err(ContentServiceError::ValidationError(format!(
                    "Content {} is {} content and has no related image",
                    id, kind
                )))
            }
        }
        validate_detail(&content.detail)?;

        self.storage.save(&path, bytes).await?;
        self.save(&content).await
    }

    /// Public URL of the photo or related image, if there is one
    pub fn asset_url(&self, content: &Content) -> Option<String> {
        content
            .photo()
            .or_else(|| content.related_image())
            .filter(|path| !path.is_empty())
            .map(|path| self.storage.url_for(path))
    }

    async fn run_hooks(&self, content: &Content) -> Result<(), ContentServiceError> {
        for hook in &self.hooks {
            if let Err(e) = hook.after_save(content).await {
                tracing::warn!(
                    "Save hook '{}' failed for content {}: {:#}",
                    hook.name(),
                    content.id,
                    e
                );
                return Err(e
                    .context(format!("Save hook '{}' failed", hook.name()))
                    .into());
            }
        }
        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Content, ContentServiceError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            ContentServiceError::NotFound(format!("Content with ID {} not found", id))
        })
    }

    async fn issue_of(&self, content: &Content) -> Result<Issue, ContentServiceError> {
        self.issues
            .get_by_id(content.issue_id)
            .await?
            .ok_or_else(|| {
                anyhow!("Issue {} of content {} is gone", content.issue_id, content.id).into()
            })
    }
}

fn validate_text(title: &str, subtitle: &str, slug: &str) -> Result<(), ContentServiceError> {
    if title.trim().is_empty() {
        return Err(ContentServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    for (field, value, max) in [
        ("Title", title, TITLE_MAX_LEN),
        ("Subtitle", subtitle, TITLE_MAX_LEN),
        ("Slug", slug, CONTENT_SLUG_MAX_LEN),
    ] {
        if value.chars().count() > max {
            return Err(ContentServiceError::ValidationError(format!(
                "{} cannot exceed {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

fn validate_detail(detail: &ContentDetail) -> Result<(), ContentServiceError> {
    match detail {
        ContentDetail::Image { photo } if photo.is_empty() => Err(
            ContentServiceError::ValidationError("Image content requires a photo".to_string()),
        ),
        _ => Ok(()),
    }
}

fn kind_mismatch(err: &anyhow::Error) -> Option<&ContentKindMismatch> {
    err.chain().find_map(|e| e.downcast_ref::<ContentKindMismatch>())
}

fn reference_error(err: anyhow::Error, what: String) -> ContentServiceError {
    if is_foreign_key_violation(&err) {
        ContentServiceError::MissingReference(what)
    } else {
        ContentServiceError::InternalError(err)
    }
}
