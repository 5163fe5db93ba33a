//! Contributor service
//!
//! Contributors may be anonymous; a blank name is stored as no name.

use std::sync::Arc;

use crate::db::is_foreign_key_violation;
use crate::db::repositories::ContributorRepository;
use crate::models::Contributor;

/// Longest contributor name the schema stores
pub const CONTRIBUTOR_NAME_MAX_LEN: usize = 255;

/// Error types for contributor service operations
#[derive(Debug, thiserror::Error)]
pub enum ContributorServiceError {
    #[error("Contributor not found: {0}")]
    NotFound(String),

    /// The content or contributor of a credit does not exist
    #[error("Missing reference: {0}")]
    MissingReference(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Contributor service
pub struct ContributorService {
    repo: Arc<dyn ContributorRepository>,
}

impl ContributorService {
    pub fn new(repo: Arc<dyn ContributorRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, name: Option<&str>) -> Result<Contributor, ContributorServiceError> {
        let name = normalize_name(name)?;
        self.repo
            .create(&Contributor::new(name))
            .await
            .map_err(Into::into)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Contributor>, ContributorServiceError> {
        self.repo.get_by_id(id).await.map_err(Into::into)
    }

    pub async fn list(&self) -> Result<Vec<Contributor>, ContributorServiceError> {
        self.repo.list().await.map_err(Into::into)
    }

    pub async fn rename(
        &self,
        id: i64,
        name: Option<&str>,
    ) -> Result<Contributor, ContributorServiceError> {
        let mut contributor = self.require(id).await?;
        contributor.name = normalize_name(name)?;
        self.repo.update(&contributor).await.map_err(Into::into)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContributorServiceError> {
        let contributor = self.require(id).await?;
        self.repo.delete(contributor.id).await.map_err(Into::into)
    }

    /// Credit a contributor on a content item
    pub async fn credit(
        &self,
        contributor_id: i64,
        content_id: i64,
    ) -> Result<(), ContributorServiceError> {
        self.repo
            .add_to_content(contributor_id, content_id)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    ContributorServiceError::MissingReference(format!(
                        "contributor {} or content {}",
                        contributor_id, content_id
                    ))
                } else {
                    e.into()
                }
            })
    }

    pub async fn uncredit(
        &self,
        contributor_id: i64,
        content_id: i64,
    ) -> Result<(), ContributorServiceError> {
        self.repo
            .remove_from_content(contributor_id, content_id)
            .await
            .map_err(Into::into)
    }

    /// Contributors credited on a content item
    pub async fn for_content(
        &self,
        content_id: i64,
    ) -> Result<Vec<Contributor>, ContributorServiceError> {
        self.repo.get_by_content_id(content_id).await.map_err(Into::into)
    }

    async fn require(&self, id: i64) -> Result<Contributor, ContributorServiceError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            ContributorServiceError::NotFound(format!("Contributor with ID {} not found", id))
        })
    }
}

fn normalize_name(name: Option<&str>) -> Result<Option<String>, ContributorServiceError> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    if let Some(n) = name {
        if n.chars().count() > CONTRIBUTOR_NAME_MAX_LEN {
            return Err(ContributorServiceError::ValidationError(format!(
                "Contributor name cannot exceed {} characters",
                CONTRIBUTOR_NAME_MAX_LEN
            )));
        }
    }
    Ok(name.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxContributorRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup() -> (DynDatabasePool, ContributorService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = ContributorService::new(SqlxContributorRepository::boxed(pool.clone()));
        (pool, service)
    }

    async fn setup_test_service() -> ContributorService {
        setup().await.1
    }

    async fn create_test_content(pool: &DynDatabasePool) -> i64 {
        let sqlite = pool.require_sqlite().unwrap();
        let issue = sqlx::query("INSERT INTO issues (name, pub_date) VALUES ('I', '2015-01-01')")
            .execute(sqlite)
            .await
            .unwrap()
            .last_insert_rowid();
        let section = sqlx::query("INSERT INTO sections (name) VALUES ('S')")
            .execute(sqlite)
            .await
            .unwrap()
            .last_insert_rowid();
        sqlx::query(
            r#"INSERT INTO content (title, subtitle, slug, teaser, body, medium, size, statement, issue_id, section_id)
               VALUES ('T', '', 't', '', '', '', '', '', ?, ?)"#,
        )
        .bind(issue)
        .bind(section)
        .execute(sqlite)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_blank_name_is_anonymous() {
        let service = setup_test_service().await;

        let contributor = service.create(Some("   ")).await.unwrap();

        assert_eq!(contributor.name, None);
        assert_eq!(contributor.to_string(), "");
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let service = setup_test_service().await;
        let contributor = service.create(Some("Ada")).await.unwrap();

        let renamed = service.rename(contributor.id, Some("Ada L.")).await.unwrap();
        assert_eq!(renamed.name.as_deref(), Some("Ada L."));

        service.delete(contributor.id).await.unwrap();
        assert!(matches!(
            service.delete(contributor.id).await,
            Err(ContributorServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_credit_and_uncredit() {
        let (pool, service) = setup().await;
        let content_id = create_test_content(&pool).await;
        let ada = service.create(Some("Ada")).await.unwrap();
        let anonymous = service.create(None).await.unwrap();

        service.credit(ada.id, content_id).await.unwrap();
        service.credit(anonymous.id, content_id).await.unwrap();
        service.credit(ada.id, content_id).await.unwrap();
        assert_eq!(
            service.for_content(content_id).await.unwrap(),
            vec![ada.clone(), anonymous.clone()]
        );

        service.uncredit(ada.id, content_id).await.unwrap();
        assert_eq!(service.for_content(content_id).await.unwrap(), vec![anonymous]);
    }

    #[tokio::test]
    async fn test_credit_missing_content() {
        let service = setup_test_service().await;
        let contributor = service.create(Some("Ada")).await.unwrap();

        let result = service.credit(contributor.id, 12345).await;

        assert!(matches!(result, Err(ContributorServiceError::MissingReference(_))));
    }
}
