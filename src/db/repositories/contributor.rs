//! Contributor repository
//!
//! Database operations for contributors and their credits on content.
//!
//! This module provides:
//! - `ContributorRepository` trait defining the interface for contributor data access
//! - `SqlxContributorRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Contributor;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Contributor repository trait
#[async_trait]
pub trait ContributorRepository: Send + Sync {
    /// Create a new contributor
    async fn create(&self, contributor: &Contributor) -> Result<Contributor>;

    /// Get contributor by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Contributor>>;

    /// List all contributors, named ones first in name order
    async fn list(&self) -> Result<Vec<Contributor>>;

    /// Persist a changed display name
    async fn update(&self, contributor: &Contributor) -> Result<Contributor>;

    /// Delete a contributor and its credits
    async fn delete(&self, id: i64) -> Result<()>;

    /// Credit a contributor on a content item (no-op if already credited)
    async fn add_to_content(&self, contributor_id: i64, content_id: i64) -> Result<()>;

    /// Remove a contributor's credit from a content item
    async fn remove_from_content(&self, contributor_id: i64, content_id: i64) -> Result<()>;

    /// Contributors credited on a content item
    async fn get_by_content_id(&self, content_id: i64) -> Result<Vec<Contributor>>;
}

/// SQLx-based contributor repository implementation
pub struct SqlxContributorRepository {
    pool: DynDatabasePool,
}

impl SqlxContributorRepository {
    /// Create a new SQLx contributor repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContributorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContributorRepository for SqlxContributorRepository {
    async fn create(&self, contributor: &Contributor) -> Result<Contributor> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_contributor_sqlite(self.pool.require_sqlite()?, contributor).await
            }
            DatabaseDriver::Mysql => {
                create_contributor_mysql(self.pool.require_mysql()?, contributor).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Contributor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_contributor_by_id_sqlite(self.pool.require_sqlite()?, id).await
            }
            DatabaseDriver::Mysql => {
                get_contributor_by_id_mysql(self.pool.require_mysql()?, id).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Contributor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_contributors_sqlite(self.pool.require_sqlite()?).await,
            DatabaseDriver::Mysql => list_contributors_mysql(self.pool.require_mysql()?).await,
        }
    }

    async fn update(&self, contributor: &Contributor) -> Result<Contributor> {
        let sql = "UPDATE contributors SET name = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&contributor.name)
                    .bind(contributor.id)
                    .execute(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to update contributor")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&contributor.name)
                    .bind(contributor.id)
                    .execute(self.pool.require_mysql()?)
                    .await
                    .context("Failed to update contributor")?;
            }
        }
        Ok(contributor.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        // content_contributors rows go with it via ON DELETE CASCADE
        let sql = "DELETE FROM contributors WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to delete contributor")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.require_mysql()?)
                    .await
                    .context("Failed to delete contributor")?;
            }
        }
        Ok(())
    }

    async fn add_to_content(&self, contributor_id: i64, content_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(
                    "INSERT OR IGNORE INTO content_contributors (content_id, contributor_id) VALUES (?, ?)",
                )
                .bind(content_id)
                .bind(contributor_id)
                .execute(self.pool.require_sqlite()?)
                .await
                .context("Failed to add contributor to content")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(
                    "INSERT IGNORE INTO content_contributors (content_id, contributor_id) VALUES (?, ?)",
                )
                .bind(content_id)
                .bind(contributor_id)
                .execute(self.pool.require_mysql()?)
                .await
                .context("Failed to add contributor to content")?;
            }
        }
        Ok(())
    }

    async fn remove_from_content(&self, contributor_id: i64, content_id: i64) -> Result<()> {
        let sql = "DELETE FROM content_contributors WHERE content_id = ? AND contributor_id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(content_id)
                    .bind(contributor_id)
                    .execute(self.pool.require_sqlite()?)
                    .await
                    .context("Failed to remove contributor from content")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(content_id)
                    .bind(contributor_id)
                    .execute(self.pool.require_mysql()?)
                    .await
                    .context("Failed to remove contributor from content")?;
            }
        }
        Ok(())
    }

    async fn get_by_content_id(&self, content_id: i64) -> Result<Vec<Contributor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_contributors_by_content_sqlite(self.pool.require_sqlite()?, content_id).await
            }
            DatabaseDriver::Mysql => {
                get_contributors_by_content_mysql(self.pool.require_mysql()?, content_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_contributor_sqlite(
    pool: &SqlitePool,
    contributor: &Contributor,
) -> Result<Contributor> {
    let result = sqlx::query("INSERT INTO contributors (name) VALUES (?)")
        .bind(&contributor.name)
        .execute(pool)
        .await
        .context("Failed to create contributor")?;

    Ok(Contributor {
        id: result.last_insert_rowid(),
        name: contributor.name.clone(),
    })
}

async fn get_contributor_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Contributor>> {
    let row = sqlx::query("SELECT id, name FROM contributors WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get contributor by ID")?;

    row.map(|row| row_to_contributor_sqlite(&row)).transpose()
}

async fn list_contributors_sqlite(pool: &SqlitePool) -> Result<Vec<Contributor>> {
    let rows = sqlx::query(
        "SELECT id, name FROM contributors ORDER BY name IS NULL, name, id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list contributors")?;

    rows.iter().map(row_to_contributor_sqlite).collect()
}

async fn get_contributors_by_content_sqlite(
    pool: &SqlitePool,
    content_id: i64,
) -> Result<Vec<Contributor>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.name
        FROM contributors c
        INNER JOIN content_contributors cc ON c.id = cc.contributor_id
        WHERE cc.content_id = ?
        ORDER BY c.id
        "#,
    )
    .bind(content_id)
    .fetch_all(pool)
    .await
    .context("Failed to get contributors by content")?;

    rows.iter().map(row_to_contributor_sqlite).collect()
}

fn row_to_contributor_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Contributor> {
    Ok(Contributor {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_contributor_mysql(
    pool: &MySqlPool,
    contributor: &Contributor,
) -> Result<Contributor> {
    let result = sqlx::query("INSERT INTO contributors (name) VALUES (?)")
        .bind(&contributor.name)
        .execute(pool)
        .await
        .context("Failed to create contributor")?;

    Ok(Contributor {
        id: result.last_insert_id() as i64,
        name: contributor.name.clone(),
    })
}

async fn get_contributor_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Contributor>> {
    let row = sqlx::query("SELECT id, name FROM contributors WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get contributor by ID")?;

    row.map(|row| row_to_contributor_mysql(&row)).transpose()
}

async fn list_contributors_mysql(pool: &MySqlPool) -> Result<Vec<Contributor>> {
    let rows = sqlx::query(
        "SELECT id, name FROM contributors ORDER BY name IS NULL, name, id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list contributors")?;

    rows.iter().map(row_to_contributor_mysql).collect()
}

async fn get_contributors_by_content_mysql(
    pool: &MySqlPool,
    content_id: i64,
) -> Result<Vec<Contributor>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.name
        FROM contributors c
        INNER JOIN content_contributors cc ON c.id = cc.contributor_id
        WHERE cc.content_id = ?
        ORDER BY c.id
        "#,
    )
    .bind(content_id)
    .fetch_all(pool)
    .await
    .context("Failed to get contributors by content")?;

    rows.iter().map(row_to_contributor_mysql).collect()
}

fn row_to_contributor_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Contributor> {
    Ok(Contributor {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxContributorRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxContributorRepository::new(pool.clone());
        (pool, repo)
    }

    /// Insert an issue, a section and one content row; returns the content id
    async fn create_test_content(pool: &SqlitePool) -> i64 {
        let issue = sqlx::query("INSERT INTO issues (name, pub_date) VALUES ('I', '2015-01-01')")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        let section = sqlx::query("INSERT INTO sections (name) VALUES ('S')")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        sqlx::query(
            r#"INSERT INTO content (title, subtitle, slug, teaser, body, medium, size, statement, issue_id, section_id)
               VALUES ('T', '', 't', '', '', '', '', '', ?, ?)"#,
        )
        .bind(issue)
        .bind(section)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_create_contributor_with_and_without_name() {
        let (_pool, repo) = setup_test_repo().await;

        let named = repo
            .create(&Contributor::new(Some("Ada".to_string())))
            .await
            .unwrap();
        let anonymous = repo.create(&Contributor::new(None)).await.unwrap();

        assert_eq!(repo.get_by_id(named.id).await.unwrap(), Some(named.clone()));
        assert_eq!(repo.get_by_id(anonymous.id).await.unwrap().unwrap().name, None);

        let listed = repo.list().await.unwrap();
        assert_eq!(listed, vec![named, anonymous]);
    }

    #[tokio::test]
    async fn test_content_credits() {
        let (pool, repo) = setup_test_repo().await;
        let content_id = create_test_content(pool.require_sqlite().unwrap()).await;
        let ada = repo.create(&Contributor::new(Some("Ada".to_string()))).await.unwrap();
        let bob = repo.create(&Contributor::new(Some("Bob".to_string()))).await.unwrap();

        repo.add_to_content(ada.id, content_id).await.unwrap();
        repo.add_to_content(ada.id, content_id).await.unwrap();
        repo.add_to_content(bob.id, content_id).await.unwrap();
        assert_eq!(repo.get_by_content_id(content_id).await.unwrap().len(), 2);

        repo.remove_from_content(ada.id, content_id).await.unwrap();
        assert_eq!(repo.get_by_content_id(content_id).await.unwrap(), vec![bob.clone()]);

        repo.delete(bob.id).await.unwrap();
        assert!(repo.get_by_content_id(content_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_credit_unknown_content_fails() {
        let (_pool, repo) = setup_test_repo().await;
        let ada = repo.create(&Contributor::new(Some("Ada".to_string()))).await.unwrap();

        let err = repo.add_to_content(ada.id, 404).await.expect_err("FK should reject");

        assert!(crate::db::is_foreign_key_violation(&err));
    }
}
