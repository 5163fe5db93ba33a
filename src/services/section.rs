//! Section service

use std::sync::Arc;

use crate::db::is_unique_violation;
use crate::db::repositories::SectionRepository;
use crate::models::Section;

/// Longest section name the schema stores
pub const SECTION_NAME_MAX_LEN: usize = 255;

/// Error types for section service operations
#[derive(Debug, thiserror::Error)]
pub enum SectionServiceError {
    #[error("Section not found: {0}")]
    NotFound(String),

    #[error("Section name already exists: {0}")]
    DuplicateName(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Section service
pub struct SectionService {
    repo: Arc<dyn SectionRepository>,
}

impl SectionService {
    pub fn new(repo: Arc<dyn SectionRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, name: &str) -> Result<Section, SectionServiceError> {
        validate_name(name)?;

        self.repo
            .create(&Section::new(name.to_string()))
            .await
            .map_err(|e| write_error(e, name))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Section>, SectionServiceError> {
        self.repo.get_by_id(id).await.map_err(Into::into)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Section>, SectionServiceError> {
        self.repo.get_by_name(name).await.map_err(Into::into)
    }

    pub async fn list(&self) -> Result<Vec<Section>, SectionServiceError> {
        self.repo.list().await.map_err(Into::into)
    }

    pub async fn rename(&self, id: i64, name: &str) -> Result<Section, SectionServiceError> {
        validate_name(name)?;

        let mut section = self.require(id).await?;
        section.name = name.to_string();

        self.repo
            .update(&section)
            .await
            .map_err(|e| write_error(e, name))
    }

    /// Delete a section together with all of its content
    pub async fn delete(&self, id: i64) -> Result<(), SectionServiceError> {
        let section = self.require(id).await?;
        self.repo.delete(section.id).await?;
        tracing::info!("Deleted section {} ({})", section.id, section.name);
        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Section, SectionServiceError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            SectionServiceError::NotFound(format!("Section with ID {} not found", id))
        })
    }
}

fn validate_name(name: &str) -> Result<(), SectionServiceError> {
    if name.trim().is_empty() {
        return Err(SectionServiceError::ValidationError(
            "Section name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > SECTION_NAME_MAX_LEN {
        return Err(SectionServiceError::ValidationError(format!(
            "Section name cannot exceed {} characters",
            SECTION_NAME_MAX_LEN
        )));
    }
    Ok(())
}

fn write_error(err: anyhow::Error, name: &str) -> SectionServiceError {
    if is_unique_violation(&err) {
        SectionServiceError::DuplicateName(name.to_string())
    } else {
        SectionServiceError::InternalError(err)
    }
}
