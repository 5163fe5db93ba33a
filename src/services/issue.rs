//! Issue service
//!
//! Business logic for issues:
//! - create and rename, with duplicate names reported as `DuplicateName`
//! - cover image upload through the upload path deriver and media storage

use chrono::NaiveDate;
use std::sync::Arc;

use crate::db::is_unique_violation;
use crate::db::repositories::IssueRepository;
use crate::media::{MediaStorage, UploadPathDeriver};
use crate::models::{Issue, UpdateIssueInput};

/// Longest issue name the schema stores
pub const ISSUE_NAME_MAX_LEN: usize = 255;

/// Error types for issue service operations
#[derive(Debug, thiserror::Error)]
pub enum IssueServiceError {
    /// Issue not found
    #[error("Issue not found: {0}")]
    NotFound(String),

    /// Another issue already has this name
    #[error("Issue name already exists: {0}")]
    DuplicateName(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Issue service
pub struct IssueService {
    repo: Arc<dyn IssueRepository>,
    uploads: UploadPathDeriver,
    storage: MediaStorage,
}

impl IssueService {
    pub fn new(
        repo: Arc<dyn IssueRepository>,
        uploads: UploadPathDeriver,
        storage: MediaStorage,
    ) -> Self {
        Self {
            repo,
            uploads,
            storage,
        }
    }

    /// Create a new issue
    ///
    /// # Errors
    /// - `ValidationError` if the name is blank or too long
    /// - `DuplicateName` if another issue has the same name
    pub async fn create(
        &self,
        name: &str,
        pub_date: NaiveDate,
    ) -> Result<Issue, IssueServiceError> {
        validate_name(name)?;

        let issue = Issue::new(name.to_string(), pub_date);
        let created = self
            .repo
            .create(&issue)
            .await
            .map_err(|e| write_error(e, name))?;

        tracing::info!("Created issue {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Issue>, IssueServiceError> {
        self.repo.get_by_id(id).await.map_err(Into::into)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Issue>, IssueServiceError> {
        self.repo.get_by_name(name).await.map_err(Into::into)
    }

    /// All issues, newest publication first
    pub async fn list(&self) -> Result<Vec<Issue>, IssueServiceError> {
        self.repo.list().await.map_err(Into::into)
    }

    /// Apply the set fields of `input` to an issue
    pub async fn update(
        &self,
        id: i64,
        input: UpdateIssueInput,
    ) -> Result<Issue, IssueServiceError> {
        let mut issue = self.require(id).await?;

        if let Some(name) = input.name {
            validate_name(&name)?;
            issue.name = name;
        }
        if let Some(pub_date) = input.pub_date {
            issue.pub_date = pub_date;
        }
        if let Some(cover_image) = input.cover_image {
            issue.cover_image = cover_image;
        }

        let name = issue.name.clone();
        self.repo
            .update(&issue)
            .await
            .map_err(|e| write_error(e, &name))
    }

    /// Store an uploaded cover image and point the issue at it
    ///
    /// The file lands at `issue_covers/<year>/<issue slug>/<ts>_<name>`.
    pub async fn set_cover(
        &self,
        id: i64,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Issue, IssueServiceError> {
        let issue = self.require(id).await?;

        let path = self.uploads.issue_cover_path(&issue, filename);
        self.storage.save(&path, bytes).await?;

        tracing::info!("Stored cover for issue {} at {}", issue.id, path);
        self.update(id, UpdateIssueInput::new().with_cover_image(path))
            .await
    }

    /// Public URL of an issue's cover, if it has one
    pub fn cover_url(&self, issue: &Issue) -> Option<String> {
        issue
            .cover_image
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| self.storage.url_for(path))
    }

    /// Delete an issue together with all of its content
    pub async fn delete(&self, id: i64) -> Result<(), IssueServiceError> {
        let issue = self.require(id).await?;
        self.repo.delete(issue.id).await?;
        tracing::info!("Deleted issue {} ({})", issue.id, issue.name);
        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Issue, IssueServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| IssueServiceError::NotFound(format!("Issue with ID {} not found", id)))
    }
}

fn validate_name(name: &str) -> Result<(), IssueServiceError> {
    if name.trim().is_empty() {
        return Err(IssueServiceError::ValidationError(
            "Issue name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > ISSUE_NAME_MAX_LEN {
        return Err(IssueServiceError::ValidationError(format!(
            "Issue name cannot exceed {} characters",
            ISSUE_NAME_MAX_LEN
        )));
    }
    Ok(())
}

fn write_error(err: anyhow::Error, name: &str) -> IssueServiceError {
    if is_unique_violation(&err) {
        IssueServiceError::DuplicateName(name.to_string())
    } else {
        IssueServiceError::InternalError(err)
    }
}
