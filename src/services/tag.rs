//! Tag service
//!
//! Implements business logic for tag management:
//! - Create tags with an explicit or generated slug
//! - Tag-content associations
//!
//! Tag names repeat freely. A slug given by the caller is kept as is; only a
//! missing slug is generated from the name.

use crate::db::is_foreign_key_violation;
use crate::db::repositories::TagRepository;
use crate::models::{Tag, TAG_SLUG_MAX_LEN};
use anyhow::Context;
use std::sync::Arc;

/// Longest tag name the schema stores
pub const TAG_NAME_MAX_LEN: usize = 255;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    /// Tag not found
    #[error("Tag not found: {0}")]
    NotFound(String),

    /// The tag or content of an association does not exist
    #[error("Missing reference: {0}")]
    MissingReference(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Tag service for managing content tags
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    /// Create a new tag service
    ///
    /// # Arguments
    /// * `repo` - Tag repository for database operations
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// Create a new tag
    ///
    /// When `slug` is `None` the slug is generated from the name. Names are
    /// not checked for duplicates.
    ///
    /// # Errors
    /// - `ValidationError` if the name is empty, or the slug is empty or
    ///   longer than 100 characters
    pub async fn create(&self, name: &str, slug: Option<&str>) -> Result<Tag, TagServiceError> {
        let trimmed_name = name.trim();
        validate_name(trimmed_name)?;

        let slug = match slug {
            Some(slug) => slug.trim().to_string(),
            None => generate_tag_slug(trimmed_name),
        };
        validate_slug(&slug)?;

        let tag = Tag::new(trimmed_name.to_string(), slug);
        let created = self
            .repo
            .create(&tag)
            .await
            .context("Failed to create tag")?;

        Ok(created)
    }

    /// Get tag by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>, TagServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag by slug")
            .map_err(Into::into)
    }

    /// Get tag by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Tag>, TagServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get tag by ID")
            .map_err(Into::into)
    }

    /// Every tag with this exact name
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .list_by_name(name)
            .await
            .context("Failed to find tags by name")
            .map_err(Into::into)
    }

    /// List all tags
    ///
    /// Returns all tags ordered by name.
    pub async fn list(&self) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list tags")
            .map_err(Into::into)
    }

    /// Change a tag's name and/or slug
    ///
    /// Renaming never touches the slug.
    ///
    /// # Errors
    /// - `ValidationError` if the new name is blank or too long, or the new
    ///   slug is empty or too long
    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        slug: Option<&str>,
    ) -> Result<Tag, TagServiceError> {
        let mut tag = self.require(id).await?;

        if let Some(name) = name {
            let name = name.trim();
            validate_name(name)?;
            tag.name = name.to_string();
        }
        if let Some(slug) = slug {
            validate_slug(slug)?;
            tag.slug = slug.to_string();
        }

        self.repo
            .update(&tag)
            .await
            .context("Failed to update tag")
            .map_err(Into::into)
    }

    /// Delete a tag
    ///
    /// Content associations are removed by CASCADE delete.
    ///
    /// # Errors
    /// - `NotFound` if the tag doesn't exist
    pub async fn delete(&self, id: i64) -> Result<(), TagServiceError> {
        let tag = self.require(id).await?;

        self.repo
            .delete(tag.id)
            .await
            .context("Failed to delete tag")?;

        Ok(())
    }

    /// Add a tag to a content item
    ///
    /// If the association already exists, this is a no-op.
    pub async fn add_to_content(
        &self,
        tag_id: i64,
        content_id: i64,
    ) -> Result<(), TagServiceError> {
        self.repo
            .add_to_content(tag_id, content_id)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    TagServiceError::MissingReference(format!(
                        "tag {} or content {}",
                        tag_id, content_id
                    ))
                } else {
                    TagServiceError::InternalError(e.context("Failed to add tag to content"))
                }
            })
    }

    /// Remove a tag from a content item
    pub async fn remove_from_content(
        &self,
        tag_id: i64,
        content_id: i64,
    ) -> Result<(), TagServiceError> {
        self.repo
            .remove_from_content(tag_id, content_id)
            .await
            .context("Failed to remove tag from content")
            .map_err(Into::into)
    }

    /// Get tags for a content item
    pub async fn get_by_content_id(&self, content_id: i64) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .get_by_content_id(content_id)
            .await
            .context("Failed to get tags by content")
            .map_err(Into::into)
    }

    async fn require(&self, id: i64) -> Result<Tag, TagServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(format!("Tag with ID {} not found", id)))
    }
}

/// Generate a URL-friendly slug from a tag name
///
/// Unicode is transliterated to ASCII, the result lowercased, runs of other
/// characters collapsed to one hyphen, and the slug cut to 100 characters.
pub fn generate_tag_slug(name: &str) -> String {
    let slug = slug::slugify(name);
    match slug.char_indices().nth(TAG_SLUG_MAX_LEN) {
        Some((cut, _)) => slug[..cut].trim_end_matches('-').to_string(),
        None => slug,
    }
}

fn validate_name(name: &str) -> Result<(), TagServiceError> {
    if name.is_empty() {
        return Err(TagServiceError::ValidationError(
            "Tag name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > TAG_NAME_MAX_LEN {
        return Err(TagServiceError::ValidationError(format!(
            "Tag name cannot exceed {} characters",
            TAG_NAME_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<(), TagServiceError> {
    if slug.is_empty() {
        return Err(TagServiceError::ValidationError(
            "Tag slug cannot be empty".to_string(),
        ));
    }
    if slug.chars().count() > TAG_SLUG_MAX_LEN {
        return Err(TagServiceError::ValidationError(format!(
            "Tag slug cannot exceed {} characters",
            TAG_SLUG_MAX_LEN
        )));
    }
    Ok(())
}
